use {
    alloy::{
        eips::BlockNumberOrTag,
        primitives::{Address, B256},
        providers::{DynProvider, Provider},
        rpc::types::{Filter, Log},
        transports::{RpcError, TransportError},
    },
    std::{future::Future, time::Duration},
};

/// Error from the log-query provider, classified so the loop can decide what
/// to log and whether to back off quietly.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct RetrieveError {
    pub kind: ErrorKind,
    #[source]
    source: anyhow::Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection level noise: unreachable relay, timed out call, garbled
    /// response. Expected on flaky endpoints and retried without a log line
    /// above debug.
    Transient,
    /// A proper error response from the provider.
    Rpc,
}

impl RetrieveError {
    fn timeout(after: Duration) -> Self {
        Self {
            kind: ErrorKind::Transient,
            source: anyhow::anyhow!("provider call timed out after {after:?}"),
        }
    }

    #[cfg(test)]
    pub fn transient(message: &str) -> Self {
        Self {
            kind: ErrorKind::Transient,
            source: anyhow::anyhow!("{message}"),
        }
    }

    #[cfg(test)]
    pub fn rpc(message: &str) -> Self {
        Self {
            kind: ErrorKind::Rpc,
            source: anyhow::anyhow!("{message}"),
        }
    }
}

impl From<TransportError> for RetrieveError {
    fn from(err: TransportError) -> Self {
        let kind = match &err {
            RpcError::Transport(_) => ErrorKind::Transient,
            RpcError::SerError(_) | RpcError::DeserError { .. } => ErrorKind::Transient,
            _ => ErrorKind::Rpc,
        };
        Self {
            kind,
            source: err.into(),
        }
    }
}

/// Abstraction over the provider's log-query surface so the monitor loop can
/// be driven by a fake in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LogRetrieving: Send + Sync {
    /// The current block height.
    async fn latest_block(&self) -> Result<u64, RetrieveError>;

    /// All logs matching the monitored event whose block number lies in
    /// `[from_block, latest]`.
    async fn logs(&self, from_block: u64) -> Result<Vec<Log>, RetrieveError>;
}

/// Queries one contract's logs filtered to a single event signature, with an
/// explicit timeout on every call.
pub struct EventRetriever {
    provider: DynProvider,
    filter: Filter,
    timeout: Duration,
}

impl EventRetriever {
    pub fn new(
        provider: DynProvider,
        contract: Address,
        event_signature: B256,
        timeout: Duration,
    ) -> Self {
        let filter = Filter::new()
            .address(contract)
            .event_signature(event_signature);
        Self {
            provider,
            filter,
            timeout,
        }
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, RetrieveError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(RetrieveError::timeout(self.timeout)),
        }
    }
}

#[async_trait::async_trait]
impl LogRetrieving for EventRetriever {
    async fn latest_block(&self) -> Result<u64, RetrieveError> {
        self.with_timeout(self.provider.get_block_number()).await
    }

    async fn logs(&self, from_block: u64) -> Result<Vec<Log>, RetrieveError> {
        let filter = self
            .filter
            .clone()
            .from_block(from_block)
            .to_block(BlockNumberOrTag::Latest);
        self.with_timeout(self.provider.get_logs(&filter)).await
    }
}
