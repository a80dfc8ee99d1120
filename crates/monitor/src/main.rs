use clap::Parser;

#[tokio::main]
async fn main() {
    let args = monitor::arguments::Arguments::parse();
    observe::tracing::initialize(&args.log_filter, tracing::level_filters::LevelFilter::ERROR);
    tracing::info!("running monitor with validated arguments:\n{}", args);
    if let Err(err) = monitor::run(args).await {
        tracing::error!(?err, "monitor exited with an error");
        std::process::exit(1);
    }
}
