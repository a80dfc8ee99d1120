//! Near-real-time monitor for events emitted by a deployed PRNG contract.
//!
//! Polls a JSON-RPC relay for new contract logs, deduplicates them against a
//! bounded window of recently seen transaction hashes, decodes them with the
//! contract ABI and prints one human-readable line per event.

pub mod arguments;
pub mod dedup;
pub mod monitor;
pub mod record;
pub mod retriever;
pub mod shutdown;

use {
    crate::{
        monitor::{Monitor, Settings},
        retriever::{EventRetriever, LogRetrieving as _},
    },
    alloy::providers::{Provider as _, ProviderBuilder},
    anyhow::{Context, Result},
    artifact::{Abi, ContractArtifact},
};

pub async fn run(args: arguments::Arguments) -> Result<()> {
    let url = args
        .node_url
        .clone()
        .unwrap_or_else(|| args.environment.rpc_url());

    // Resolve all configuration before the first provider call so that a
    // bad contract name or event name fails fast.
    let artifact = ContractArtifact::for_contract(&args.artifact_dir, &args.contract_name)?;
    let abi = Abi::new(artifact.abi);
    let event_signature = abi.event(&args.event_name)?.selector();
    let contract_address = args.contract_id.to_evm_address();

    let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
    let retriever = EventRetriever::new(
        provider,
        contract_address,
        event_signature,
        args.rpc_timeout,
    );
    let latest_block = retriever
        .latest_block()
        .await
        .context("failed to query the current block height")?;

    tracing::info!(
        environment = %args.environment,
        contract = %args.contract_id,
        contract_name = %args.contract_name,
        evm_address = %contract_address,
        event = %args.event_name,
        provider = %url,
        block = latest_block,
        "connected, starting event monitor",
    );

    let settings = Settings {
        lookback: args.lookback,
        poll_interval: args.poll_interval,
        backoff: args.backoff,
        cursor_policy: args.cursor_policy,
        ..Settings::default()
    };
    Monitor::new(retriever, abi, args.event_name, settings, latest_block)
        .run(shutdown::signal_handler())
        .await;
    Ok(())
}
