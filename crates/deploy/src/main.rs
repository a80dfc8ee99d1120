//! One-shot deployment of the compiled PRNG contract through the JSON-RPC
//! relay. Loads the artifact, asks the operator for confirmation, submits a
//! contract creation transaction signed with the operator key and prints the
//! created contract's id.

mod arguments;

use {
    alloy::{
        network::{EthereumWallet, TransactionBuilder as _},
        providers::{Provider as _, ProviderBuilder},
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result},
    artifact::ContractArtifact,
    chain::ContractId,
    clap::Parser,
    std::io::Write as _,
};

#[tokio::main]
async fn main() {
    let args = arguments::Arguments::parse();
    observe::tracing::initialize(&args.log_filter, tracing::level_filters::LevelFilter::ERROR);
    tracing::info!("running deployer with validated arguments:\n{}", args);
    if let Err(err) = run(args).await {
        tracing::error!(?err, "deployment failed");
        std::process::exit(1);
    }
}

async fn run(args: arguments::Arguments) -> Result<()> {
    let artifact = ContractArtifact::for_contract(&args.artifact_dir, &args.contract_name)?;

    let prompt = format!(
        "deploy {} to {} as operator {}?",
        args.contract_name, args.environment, args.account_id,
    );
    if !args.yes && !confirm(&prompt)? {
        tracing::info!("user aborted");
        return Ok(());
    }

    let signer: PrivateKeySigner = args
        .private_key
        .parse()
        .context("PRIVATE_KEY is not a valid signing key")?;
    let url = args.node_url.unwrap_or_else(|| args.environment.rpc_url());
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url.clone());

    tracing::info!(provider = %url, gas_limit = args.gas_limit, "deploying contract");
    let tx = TransactionRequest::default()
        .with_deploy_code(artifact.bytecode.clone())
        .with_gas_limit(args.gas_limit);
    let receipt = provider
        .send_transaction(tx)
        .await
        .context("failed to submit the contract creation transaction")?
        .get_receipt()
        .await
        .context("failed to fetch the contract creation receipt")?;

    let address = receipt
        .contract_address
        .context("receipt carries no contract address")?;
    let contract_id = ContractId::from_evm_address(address);
    tracing::info!(%contract_id, %address, "contract created");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
