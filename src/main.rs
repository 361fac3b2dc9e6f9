//! Main entry point for vdl CLI

use anyhow::{anyhow, bail};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vdl::cli::{Args, OutputFormatter};
use vdl::core::{fetch_thumbnail, FormatStore};
use vdl::download::{DownloadEvent, DownloadJob, DownloadOutcome, DownloadSupervisor};
use vdl::tool::ToolRunner;
use vdl::utils::{to_safe_filename, validate_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    let mut formatter = OutputFormatter::new(args.verbosity_level());

    validate_url(&args.url)?;

    let runner = match &args.tool_path {
        Some(path) => ToolRunner::with_path(path.clone()),
        None => ToolRunner::discover(),
    }
    .with_timeout(args.timeout_duration());

    // Availability probe is a warning, not a hard failure.
    match runner.version().await {
        Ok(version) => formatter.info(&format!("external tool available (version {})", version)),
        Err(e) => formatter.warning(&e.to_string()),
    }

    // Metadata and listing fetches run concurrently off this task; either
    // may finish first.
    let metadata_task = tokio::spawn({
        let runner = runner.clone();
        let url = args.url.clone();
        async move { runner.fetch_metadata(&url).await }
    });
    let listing_task = tokio::spawn({
        let runner = runner.clone();
        let url = args.url.clone();
        async move { runner.fetch_listing(&url).await }
    });

    let metadata = match metadata_task.await? {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            formatter.warning(&format!("failed to fetch video info: {}", e));
            None
        }
    };
    if let Some(metadata) = &metadata {
        formatter.print_metadata(metadata);
    }

    let mut store = FormatStore::new();
    store.set_kind(args.download_kind());
    match listing_task.await? {
        Ok(catalog) => store.publish(catalog),
        Err(e) => {
            store.clear();
            formatter.error(&format!("failed to fetch formats: {}", e));
        }
    }

    formatter.print_formats(args.download_kind(), store.records());
    if args.list_formats {
        return Ok(());
    }

    if let Some(id) = &args.format {
        if !store.select(id) {
            bail!(
                "format id '{}' not found in the {} listing",
                id,
                args.download_kind().as_str()
            );
        }
    }
    let format_id = store
        .selected()
        .ok_or_else(|| anyhow!("no downloadable format available"))?
        .to_string();

    let output_dir = args.output_dir();

    // Independent of everything else; failure only gets logged.
    if args.save_thumbnail {
        if let Some(thumbnail_url) = metadata.as_ref().and_then(|m| m.thumbnail.clone()) {
            let title = metadata
                .as_ref()
                .map(|m| m.title.clone())
                .unwrap_or_default();
            let dir = output_dir.clone();
            tokio::spawn(async move {
                match fetch_thumbnail(&thumbnail_url).await {
                    Ok(bytes) => {
                        let path = dir.join(to_safe_filename(&title, "jpg"));
                        match tokio::fs::write(&path, bytes).await {
                            Ok(()) => info!("saved thumbnail to {:?}", path),
                            Err(e) => warn!("could not save thumbnail: {}", e),
                        }
                    }
                    Err(e) => warn!("could not load thumbnail: {}", e),
                }
            });
        }
    }

    let supervisor = Arc::new(DownloadSupervisor::new(runner.tool_path().to_path_buf()));
    let job = DownloadJob {
        url: args.url.clone(),
        kind: args.download_kind(),
        format_id: format_id.clone(),
        output_dir,
    };
    let mut events = supervisor.start(job)?;

    if !args.no_progress {
        formatter.create_progress_bar();
    }
    formatter.print_download_start(&args.url, &format_id);

    // Ctrl-C maps to cooperative cancellation of the running job.
    let signal_supervisor = Arc::clone(&supervisor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_supervisor.cancel();
        }
    });

    let mut outcome = None;
    while let Some(event) = events.recv().await {
        match event {
            DownloadEvent::Log(line) => formatter.debug(&line),
            DownloadEvent::Progress { fraction, status } => {
                formatter.update_progress(fraction, &status)
            }
            DownloadEvent::Finished(result) => outcome = Some(result),
        }
    }

    match outcome {
        Some(DownloadOutcome::Succeeded) => {
            formatter.finish_progress("completed");
            formatter.success("Download completed successfully!");
            Ok(())
        }
        Some(DownloadOutcome::Cancelled) => {
            formatter.finish_progress("cancelled");
            formatter.warning("Download cancelled");
            Ok(())
        }
        Some(DownloadOutcome::Failed(message)) => {
            formatter.finish_progress("failed");
            formatter.error("Download failed");
            bail!(message)
        }
        None => bail!("download ended without reporting an outcome"),
    }
}

/// Initialize logging system
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();
}
