use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, anyhow};
use clap::Parser;
use csv_loader::{
    Pipeline, Response, config::Config, db::mysql::MySqlDatabase, storage::s3::S3Store,
};
use lambda_runtime::{LambdaEvent, service_fn};
use serde_json::Value;
use tracing::{error, info};

#[derive(Parser)]
struct Opts {
    /// Process the event in this file once and print the response, instead of
    /// serving the Lambda runtime API
    #[clap(long)]
    event: Option<PathBuf>,
    #[clap(flatten)]
    config: Config,
}

type LoaderPipeline = Pipeline<S3Store, MySqlDatabase>;

async fn handler(
    pipeline: &LoaderPipeline,
    event: LambdaEvent<Value>,
) -> Result<Response, lambda_runtime::Error> {
    info!(request_id = %event.context.request_id, "handler invoked");
    Ok(pipeline.handle(&event.payload).await)
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    info!(config = ?opts.config, "starting");
    let pipeline = Pipeline::new(
        &opts.config,
        S3Store::from_env().await,
        MySqlDatabase::from_config(&opts.config),
    )
    .with_context(|| "validate config")?;

    match opts.event {
        Some(path) => {
            let event = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("read event from {}", path.display()))?;
            let event: Value = serde_json::from_str(&event)
                .with_context(|| format!("parse event from {}", path.display()))?;
            let response = pipeline.handle(&event).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        None => lambda_runtime::run(service_fn(|event| handler(&pipeline, event)))
            .await
            .map_err(|error| anyhow!(error)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
    if let Err(e) = run(opts).await {
        error!(?e, "critical error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
