use {
    crate::monitor::CursorPolicy,
    chain::{ContractId, Network},
    std::{path::PathBuf, time::Duration},
    url::Url,
};

#[derive(Debug, clap::Parser)]
pub struct Arguments {
    /// Which Hedera network to monitor, either "TEST" or "MAIN".
    #[clap(long, env)]
    pub environment: Network,

    /// Name of the compiled contract, used to locate the ABI artifact on
    /// disk.
    #[clap(long, env)]
    pub contract_name: String,

    /// The contract to filter events from, in `shard.realm.num` form.
    #[clap(long, env)]
    pub contract_id: ContractId,

    /// The ABI event name to query for.
    #[clap(long, env)]
    pub event_name: String,

    /// Directory holding the compiled contract artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// Overrides the JSON-RPC relay endpoint implied by the environment.
    #[clap(long, env)]
    pub node_url: Option<Url>,

    /// How many blocks to look back from the current height on startup, to
    /// catch recently missed events.
    #[clap(long, env, default_value = "900")]
    pub lookback: u64,

    /// Time between successful polls.
    #[clap(long, env, default_value = "2s", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,

    /// Time to wait before retrying after a failed poll.
    #[clap(long, env, default_value = "30s", value_parser = humantime::parse_duration)]
    pub backoff: Duration,

    /// Timeout applied to every individual provider call.
    #[clap(long, env, default_value = "10s", value_parser = humantime::parse_duration)]
    pub rpc_timeout: Duration,

    /// What to do with the cursor when the event query fails.
    #[clap(long, env, default_value = "hold-and-retry", value_enum)]
    pub cursor_policy: CursorPolicy,

    /// Transient connection noise is logged at debug, so the default keeps
    /// the monitor quiet unless something actually needs attention.
    #[clap(long, env, default_value = "warn,monitor=info")]
    pub log_filter: String,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "environment: {}", self.environment)?;
        writeln!(f, "contract_name: {}", self.contract_name)?;
        writeln!(f, "contract_id: {}", self.contract_id)?;
        writeln!(f, "event_name: {}", self.event_name)?;
        writeln!(f, "artifact_dir: {}", self.artifact_dir.display())?;
        writeln!(f, "node_url: {:?}", self.node_url)?;
        writeln!(f, "lookback: {}", self.lookback)?;
        writeln!(f, "poll_interval: {:?}", self.poll_interval)?;
        writeln!(f, "backoff: {:?}", self.backoff)?;
        writeln!(f, "rpc_timeout: {:?}", self.rpc_timeout)?;
        writeln!(f, "cursor_policy: {:?}", self.cursor_policy)?;
        writeln!(f, "log_filter: {}", self.log_filter)?;
        Ok(())
    }
}
