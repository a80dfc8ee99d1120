use {
    crate::{
        dedup::SeenWindow,
        record::{EventRecord, RecordError},
        retriever::{ErrorKind, LogRetrieving, RetrieveError},
    },
    artifact::Abi,
    std::{future::Future, time::Duration},
};

/// What to do with the cursor when the event query fails.
///
/// The query range restarts at the cursor, so holding it retries the failed
/// range on the next iteration while advancing skips whatever the failed
/// query would have returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum CursorPolicy {
    /// Leave the cursor untouched; the failed range is queried again.
    HoldAndRetry,
    /// Move the cursor to the current height anyway, skipping the events of
    /// the failed range.
    AdvanceAndSkip,
}

#[derive(Clone, Debug)]
pub struct Settings {
    /// Blocks to look back from the current height on startup.
    pub lookback: u64,
    /// Sleep between successful polls.
    pub poll_interval: Duration,
    /// Sleep after a failed poll.
    pub backoff: Duration,
    pub cursor_policy: CursorPolicy,
    /// Capacity of the seen-hashes window.
    pub seen_capacity: usize,
    /// Print a progress line whenever the cursor advanced this many blocks
    /// past the last printed value.
    pub checkpoint_interval: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookback: 900,
            poll_interval: Duration::from_secs(2),
            backoff: Duration::from_secs(30),
            cursor_policy: CursorPolicy::HoldAndRetry,
            seen_capacity: 500,
            checkpoint_interval: 500,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Retrieve(#[from] RetrieveError),
    #[error(transparent)]
    Decode(#[from] RecordError),
}

/// The event monitoring loop: discovers new contract logs in
/// `[cursor, latest]`, suppresses duplicates, decodes and prints each new
/// event, and advances the cursor, surviving transient provider errors
/// indefinitely.
pub struct Monitor<R> {
    retriever: R,
    abi: Abi,
    event_name: String,
    settings: Settings,
    seen: SeenWindow,
    cursor: u64,
    checkpoint: u64,
}

impl<R: LogRetrieving> Monitor<R> {
    pub fn new(
        retriever: R,
        abi: Abi,
        event_name: String,
        settings: Settings,
        latest_block: u64,
    ) -> Self {
        let cursor = latest_block.saturating_sub(settings.lookback);
        Self {
            retriever,
            abi,
            event_name,
            seen: SeenWindow::new(settings.seen_capacity),
            cursor,
            checkpoint: cursor,
            settings,
        }
    }

    /// Block height the next query starts from.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// One iteration: query logs from the cursor, drop already seen hashes,
    /// decode the rest, then advance the cursor to the current height.
    /// Returns the newly observed events in the order the provider returned
    /// them, together with the error that cut the iteration short, if any.
    ///
    /// A hash is only marked seen once its record is part of the returned
    /// batch, so events cannot get stuck in the seen window without having
    /// been reported.
    pub async fn poll_once(&mut self) -> (Vec<EventRecord>, Option<PollError>) {
        let logs = match self.retriever.logs(self.cursor).await {
            Ok(logs) => logs,
            Err(err) => return (Vec::new(), Some(err.into())),
        };
        // Resolve the new cursor up front; after this point only decoding
        // can fail, and decoded records survive a mid-batch failure.
        let latest = match self.retriever.latest_block().await {
            Ok(latest) => latest,
            Err(err) => return (Vec::new(), Some(err.into())),
        };
        let mut fresh = Vec::new();
        for log in &logs {
            let Some(tx_hash) = log.transaction_hash else {
                tracing::debug!(?log, "skipping log without transaction hash");
                continue;
            };
            if self.seen.contains(&tx_hash) {
                continue;
            }
            match EventRecord::decode(&self.abi, &self.event_name, tx_hash, log) {
                Ok(record) => {
                    self.seen.insert(tx_hash);
                    fresh.push(record);
                }
                // The failing event is not marked seen, so a transiently
                // garbled payload is retried; records decoded before it
                // stay committed and get reported.
                Err(err) => return (fresh, Some(err.into())),
            }
        }
        self.cursor = latest;
        (fresh, None)
    }

    /// One iteration including failure handling. Returns the new records and
    /// how long to sleep before the next iteration.
    pub async fn step(&mut self) -> (Vec<EventRecord>, Duration) {
        let (records, error) = self.poll_once().await;
        let sleep = match error {
            None => self.settings.poll_interval,
            Some(PollError::Retrieve(err)) => {
                match err.kind {
                    ErrorKind::Transient => {
                        tracing::debug!(%err, "transient provider error, backing off")
                    }
                    ErrorKind::Rpc => tracing::warn!(%err, "event query failed, backing off"),
                }
                if self.settings.cursor_policy == CursorPolicy::AdvanceAndSkip {
                    match self.retriever.latest_block().await {
                        Ok(latest) => self.cursor = latest,
                        Err(err) => tracing::debug!(%err, "failed to advance cursor"),
                    }
                }
                self.settings.backoff
            }
            Some(PollError::Decode(err)) => {
                // Not a network hiccup: the ABI does not match what the
                // contract emitted. Kept retrying nonetheless so a fixed
                // contract or a transiently garbled response recovers.
                tracing::error!(%err, "failed to decode event, check the configured contract name and abi");
                self.settings.backoff
            }
        };
        (records, sleep)
    }

    /// Reports the cursor when it has advanced far enough past the last
    /// reported value, throttling the periodic "still alive" line.
    fn checkpoint_due(&mut self) -> Option<u64> {
        if self.cursor > self.checkpoint + self.settings.checkpoint_interval {
            self.checkpoint = self.cursor;
            Some(self.cursor)
        } else {
            None
        }
    }

    /// Polls until `shutdown` resolves. Event lines go to stdout, one line
    /// per newly observed event; everything else goes through the log.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);
        loop {
            let (records, sleep) = self.step().await;
            for record in records {
                println!("{record}");
            }
            if let Some(block) = self.checkpoint_due() {
                tracing::info!(block, "monitor progress");
            }
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutting down event monitor");
                    return;
                }
                () = tokio::time::sleep(sleep) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::retriever::MockLogRetrieving,
        alloy::{
            primitives::{Address, B256, LogData, U256},
            rpc::types::Log,
        },
        alloy_dyn_abi::DynSolValue,
        mockall::Sequence,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    fn test_abi() -> Abi {
        let json = r#"[
            {
                "type": "event",
                "name": "PrngEvent",
                "inputs": [
                    {"name": "caller", "type": "address", "indexed": false},
                    {"name": "randomNumber", "type": "uint256", "indexed": false},
                    {"name": "seedBytes", "type": "bytes", "indexed": false},
                    {"name": "timestamp", "type": "uint256", "indexed": false}
                ],
                "anonymous": false
            }
        ]"#;
        Abi::new(serde_json::from_str(json).unwrap())
    }

    fn test_log(abi: &Abi, tx: u8, number: u64) -> Log {
        let data = DynSolValue::Tuple(vec![
            DynSolValue::Address(Address::repeat_byte(0x11)),
            DynSolValue::Uint(U256::from(number), 256),
            DynSolValue::Bytes(vec![0xaa]),
            DynSolValue::Uint(U256::from(1_700_000_000_u64), 256),
        ])
        .abi_encode_params();
        let selector = abi.event("PrngEvent").unwrap().selector();
        Log {
            inner: alloy::primitives::Log {
                address: Address::ZERO,
                data: LogData::new_unchecked(vec![selector], data.into()),
            },
            transaction_hash: Some(B256::repeat_byte(tx)),
            ..Default::default()
        }
    }

    fn monitor(retriever: MockLogRetrieving, latest: u64) -> Monitor<MockLogRetrieving> {
        Monitor::new(
            retriever,
            test_abi(),
            "PrngEvent".to_string(),
            Settings::default(),
            latest,
        )
    }

    fn hashes(records: &[EventRecord]) -> Vec<B256> {
        records.iter().map(|record| record.tx_hash).collect()
    }

    /// Counts emitted events at warn level or above.
    struct WarnCounter(Arc<AtomicUsize>);

    impl tracing::Subscriber for WarnCounter {
        fn enabled(&self, metadata: &tracing::Metadata<'_>) -> bool {
            *metadata.level() <= tracing::Level::WARN
        }

        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }

        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}

        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}

        fn event(&self, _: &tracing::Event<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn enter(&self, _: &tracing::span::Id) {}

        fn exit(&self, _: &tracing::span::Id) {}
    }

    #[tokio::test]
    async fn overlapping_batches_are_reported_once_in_order() {
        let abi = test_abi();
        let (a, b, c) = (
            test_log(&abi, 0xaa, 1),
            test_log(&abi, 0xbb, 2),
            test_log(&abi, 0xcc, 3),
        );

        let mut retriever = MockLogRetrieving::new();
        let mut seq = Sequence::new();
        let (batch_one, batch_two) = (vec![a, b.clone()], vec![b, c]);
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|from| *from == 100)
            .return_once(move |_| Ok(batch_one));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1_110));
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|from| *from == 1_110)
            .return_once(move |_| Ok(batch_two));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1_120));

        let mut monitor = monitor(retriever, 1_000);
        assert_eq!(monitor.cursor(), 100);

        let (first, error) = monitor.poll_once().await;
        assert!(error.is_none());
        assert_eq!(
            hashes(&first),
            [B256::repeat_byte(0xaa), B256::repeat_byte(0xbb)]
        );
        assert_eq!(monitor.cursor(), 1_110);

        // B shows up again in the second batch but only C is new.
        let (second, error) = monitor.poll_once().await;
        assert!(error.is_none());
        assert_eq!(hashes(&second), [B256::repeat_byte(0xcc)]);
        assert_eq!(monitor.cursor(), 1_120);
    }

    #[tokio::test]
    async fn hold_policy_keeps_cursor_on_failed_query() {
        let mut retriever = MockLogRetrieving::new();
        retriever
            .expect_logs()
            .times(1)
            .returning(|_| Err(RetrieveError::rpc("boom")));
        // Hold-and-retry must not touch the height at all on failure.
        retriever.expect_latest_block().never();

        let mut monitor = monitor(retriever, 1_000);
        let (records, sleep) = monitor.step().await;
        assert!(records.is_empty());
        assert_eq!(sleep, Duration::from_secs(30));
        assert_eq!(monitor.cursor(), 100);
    }

    #[tokio::test]
    async fn advance_policy_skips_failed_range() {
        let mut retriever = MockLogRetrieving::new();
        retriever
            .expect_logs()
            .times(1)
            .returning(|_| Err(RetrieveError::rpc("boom")));
        retriever
            .expect_latest_block()
            .times(1)
            .returning(|| Ok(2_000));

        let settings = Settings {
            cursor_policy: CursorPolicy::AdvanceAndSkip,
            ..Settings::default()
        };
        let mut monitor = Monitor::new(
            retriever,
            test_abi(),
            "PrngEvent".to_string(),
            settings,
            1_000,
        );
        let (records, sleep) = monitor.step().await;
        assert!(records.is_empty());
        assert_eq!(sleep, Duration::from_secs(30));
        assert_eq!(monitor.cursor(), 2_000);
    }

    #[tokio::test(start_paused = true)]
    async fn survives_permanent_connection_failures_until_cancelled() {
        let warnings = Arc::new(AtomicUsize::new(0));
        let _guard = tracing::subscriber::set_default(WarnCounter(Arc::clone(&warnings)));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut retriever = MockLogRetrieving::new();
        retriever.expect_logs().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RetrieveError::transient("CONNECTION ERROR"))
        });

        let (cancel, cancelled) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(monitor(retriever, 1_000).run(async move {
            let _ = cancelled.await;
        }));

        // Auto-advancing paused time drives the loop through many backoff
        // sleeps; the loop must still be alive afterwards.
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert!(calls.load(Ordering::SeqCst) >= 3);

        // Connection noise must stay below warn level.
        assert_eq!(warnings.load(Ordering::SeqCst), 0);

        cancel.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn decode_failure_does_not_mark_event_as_seen() {
        let abi = test_abi();
        let good = test_log(&abi, 0xaa, 5);
        let mut bad = good.clone();
        bad.inner.data = LogData::new_unchecked(
            bad.inner.data.topics().to_vec(),
            vec![0x01, 0x02].into(),
        );

        let mut retriever = MockLogRetrieving::new();
        let mut seq = Sequence::new();
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(vec![bad]));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1_040));
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(vec![good]));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1_050));

        let mut monitor = monitor(retriever, 1_000);
        let (records, error) = monitor.poll_once().await;
        assert!(records.is_empty());
        assert!(matches!(error, Some(PollError::Decode(_))));
        // Cursor must not advance past the failed range either.
        assert_eq!(monitor.cursor(), 100);

        // The same transaction hash decodes fine on the retry.
        let (records, error) = monitor.poll_once().await;
        assert!(error.is_none());
        assert_eq!(hashes(&records), [B256::repeat_byte(0xaa)]);
        assert_eq!(monitor.cursor(), 1_050);
    }

    #[tokio::test]
    async fn batch_survives_failed_height_query() {
        let abi = test_abi();
        let (served, reserved) = (test_log(&abi, 0xaa, 1), test_log(&abi, 0xaa, 1));

        let mut retriever = MockLogRetrieving::new();
        let mut seq = Sequence::new();
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(vec![served]));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(RetrieveError::transient("CONNECTION ERROR")));
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(vec![reserved]));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1_050));

        let mut monitor = monitor(retriever, 1_000);

        // The failed height query aborts the iteration before anything is
        // marked seen, so nothing is reported yet.
        let (records, sleep) = monitor.step().await;
        assert!(records.is_empty());
        assert_eq!(sleep, Duration::from_secs(30));
        assert_eq!(monitor.cursor(), 100);

        // The provider re-serves the same log and it still gets reported.
        let (records, sleep) = monitor.step().await;
        assert_eq!(hashes(&records), [B256::repeat_byte(0xaa)]);
        assert_eq!(sleep, Duration::from_secs(2));
        assert_eq!(monitor.cursor(), 1_050);
    }

    #[tokio::test]
    async fn records_before_a_decode_failure_are_still_reported() {
        let abi = test_abi();
        let good = test_log(&abi, 0xaa, 1);
        let mut bad = test_log(&abi, 0xbb, 2);
        bad.inner.data =
            LogData::new_unchecked(bad.inner.data.topics().to_vec(), vec![0x01].into());
        let retry = vec![test_log(&abi, 0xaa, 1), test_log(&abi, 0xbb, 2)];

        let mut retriever = MockLogRetrieving::new();
        let mut seq = Sequence::new();
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(vec![good, bad]));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1_040));
        retriever
            .expect_logs()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(retry));
        retriever
            .expect_latest_block()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(1_050));

        let mut monitor = monitor(retriever, 1_000);

        // A decodes fine and is committed even though B cuts the batch short.
        let (records, error) = monitor.poll_once().await;
        assert_eq!(hashes(&records), [B256::repeat_byte(0xaa)]);
        assert!(matches!(error, Some(PollError::Decode(_))));

        // On the retry A is a duplicate and only the fixed B is new.
        let (records, error) = monitor.poll_once().await;
        assert!(error.is_none());
        assert_eq!(hashes(&records), [B256::repeat_byte(0xbb)]);
    }

    #[tokio::test]
    async fn progress_line_is_throttled() {
        let mut retriever = MockLogRetrieving::new();
        retriever.expect_logs().returning(|_| Ok(Vec::new()));
        let mut latest = 1_000;
        retriever.expect_latest_block().returning(move || {
            latest += 400;
            Ok(latest)
        });

        let mut monitor = monitor(retriever, 1_000);
        assert_eq!(monitor.checkpoint, 100);

        // 100 -> 1400: more than 500 past the checkpoint.
        monitor.poll_once().await;
        assert_eq!(monitor.checkpoint_due(), Some(1_400));

        // 1400 -> 1800: only 400 blocks of progress, stays quiet.
        monitor.poll_once().await;
        assert_eq!(monitor.checkpoint_due(), None);

        // 1800 -> 2200: now 800 past the last print.
        monitor.poll_once().await;
        assert_eq!(monitor.checkpoint_due(), Some(2_200));
    }
}
