use {
    chain::{AccountId, Network},
    std::path::PathBuf,
    url::Url,
};

#[derive(clap::Parser)]
pub struct Arguments {
    /// Which Hedera network to deploy to, either "TEST" or "MAIN".
    #[clap(long, env)]
    pub environment: Network,

    /// Name of the compiled contract, used to locate the artifact on disk.
    #[clap(long, env)]
    pub contract_name: String,

    /// Directory holding the compiled contract artifacts.
    #[clap(long, env, default_value = "artifacts")]
    pub artifact_dir: PathBuf,

    /// The operator's signing key, hex encoded.
    #[clap(long, env)]
    pub private_key: String,

    /// The operator's account, in `shard.realm.num` form. Shown for
    /// operator confirmation; the transaction itself is signed with the
    /// private key.
    #[clap(long, env)]
    pub account_id: AccountId,

    /// Overrides the JSON-RPC relay endpoint implied by the environment.
    #[clap(long, env)]
    pub node_url: Option<Url>,

    /// Gas limit for the contract creation transaction.
    #[clap(long, env, default_value = "500000")]
    pub gas_limit: u64,

    /// Skip the interactive confirmation prompt.
    #[clap(long)]
    pub yes: bool,

    #[clap(long, env, default_value = "info,deploy=debug")]
    pub log_filter: String,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "environment: {}", self.environment)?;
        writeln!(f, "contract_name: {}", self.contract_name)?;
        writeln!(f, "artifact_dir: {}", self.artifact_dir.display())?;
        writeln!(f, "private_key: SECRET")?;
        writeln!(f, "account_id: {}", self.account_id)?;
        writeln!(f, "node_url: {:?}", self.node_url)?;
        writeln!(f, "gas_limit: {}", self.gas_limit)?;
        Ok(())
    }
}
