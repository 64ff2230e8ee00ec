//! Resource Uploadr - upload course resources to a learning-management API
//!
//! Files up to one part go out in a single request; larger files are split
//! into parts and committed with the chunked protocol.

use anyhow::Context;
use clap::Parser;
use resource_uploadr::api::HttpResourceApi;
use resource_uploadr::config::Config;
use resource_uploadr::logging::init_subscriber;
use resource_uploadr::metrics;
use resource_uploadr::upload::{
    CancelToken, LoggingObserver, ResourceType, UploadFile, UploadForm, UploadOrchestrator,
};
use std::path::PathBuf;
use tracing::info;

/// Resource Uploadr - upload an assignment or recording to a batch
#[derive(Parser, Debug)]
#[command(name = "resource-uploadr")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// File to upload
    #[arg(short, long)]
    file: PathBuf,

    /// Resource type (assignment, recording)
    #[arg(short = 't', long)]
    resource_type: ResourceType,

    /// Target batch id
    #[arg(long)]
    batch_id: String,

    /// Target batch name
    #[arg(long)]
    batch_name: String,

    /// Id of the uploading user
    #[arg(long)]
    uploader_id: String,

    /// Title (defaults to the file name without extension)
    #[arg(long)]
    title: Option<String>,

    /// Description
    #[arg(long, default_value = "")]
    description: String,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)
        .with_context(|| format!("loading configuration from {:?}", args.config))?;

    // Initialize logging
    init_subscriber(&config.logging, args.log_level.as_deref())?;

    info!("Starting Resource Uploadr v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {:?}", args.config);

    let api = HttpResourceApi::new((&config.api).into())?;
    let orchestrator = UploadOrchestrator::new(api, config.upload_settings());

    let mut form = UploadForm::new(orchestrator.validator(), args.resource_type);
    {
        let meta = form.metadata_mut();
        if let Some(title) = args.title {
            meta.title = title;
        }
        meta.description = args.description;
        meta.batch_id = args.batch_id;
        meta.batch_name = args.batch_name;
        meta.uploader_id = args.uploader_id;
    }

    let file = UploadFile::open(&args.file)
        .await
        .with_context(|| format!("opening {:?}", args.file))?;
    form.select_file(file)?;
    let mut session = form.submit()?;

    let cancel = CancelToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling upload");
            ctrl_c.cancel();
        }
    });

    let result = orchestrator
        .run(&mut session, &LoggingObserver, &cancel)
        .await;

    if config.metrics.enabled {
        tracing::debug!(metrics = %metrics::gather_text(), "Upload metrics");
    }

    let resource = result?;
    info!(resource_id = ?resource.id, "Done");
    Ok(())
}
