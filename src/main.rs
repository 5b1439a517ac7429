//! Main entry point for the vidmux CLI

use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidmux::cli::{Args, Command, OutputFormatter};
use vidmux::core::{resolve_output_path, save_transfer, Downloader, OptionSelector, Progress};
use vidmux::provider::InnerTubeProvider;
use vidmux::transfer::MuxExit;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args = Args::parse();
    debug!("Starting vidmux with args: {:?}", args);

    let provider = InnerTubeProvider::new(args.innertube_config())
        .context("creating provider HTTP client")?;
    let downloader =
        Downloader::new(Arc::new(provider)).with_transfer_config(args.transfer_config());
    let mut formatter = OutputFormatter::new(args.verbosity_level());

    match args.command.clone() {
        Command::Serve { .. } => {
            let config = args.server_config().unwrap_or_default();
            info!(
                "Serving with download timeout {}",
                humantime::format_duration(args.download_timeout_duration())
            );
            vidmux::server::serve(config, downloader)
                .await
                .context("running API server")?;
        }
        Command::Analyze { url, json } => {
            let summary = downloader.analyze(&url).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                formatter.print_summary(&summary);
            }
        }
        Command::Fetch {
            url,
            quality,
            output,
            no_progress,
        } => {
            let result =
                fetch(&downloader, &mut formatter, &url, &quality, output, no_progress).await;
            if let Err(err) = result {
                formatter.error(&format!("{:#}", err));
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn fetch(
    downloader: &Downloader,
    formatter: &mut OutputFormatter,
    url: &str,
    quality: &str,
    output: Option<PathBuf>,
    no_progress: bool,
) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let selector = OptionSelector::from_str(quality).map_err(|e| anyhow!(e))?;

    let summary = downloader.analyze(url).await?;
    let option = selector.select(&summary.formats).ok_or_else(|| {
        let available: Vec<&str> = summary.formats.iter().map(|f| f.quality.as_str()).collect();
        anyhow!(
            "No option matches '{}'. Available: {}",
            quality,
            available.join(", ")
        )
    })?;

    let mut transfer = downloader.download(url, option).await?;
    let path = resolve_output_path(output.as_deref(), &transfer.filename)
        .context("choosing output path")?;
    let display_path = path.display().to_string();
    formatter.print_download_start(&option.quality, &display_path);
    info!("Saving {} to {}", option.quality, display_path);

    let mux_exit = transfer.mux_exit.take();
    let mut progress = Progress::new(transfer.content_length);
    if !no_progress {
        formatter.create_progress_bar(progress.total_size);
    }

    let result = save_transfer(transfer, &path, |n| {
        progress.advance(n);
        formatter.update_progress(&progress);
    })
    .await;

    let written = match result {
        Ok(written) => written,
        Err(err) => {
            formatter.abandon_progress("failed");
            return Err(err).with_context(|| format!("downloading to {}", display_path));
        }
    };
    formatter.finish_progress("done");

    if let Some(mut exit) = mux_exit {
        if let Ok(outcome) = exit.wait_for(|e| e.is_some()).await {
            if let Some(MuxExit::Failed(reason)) = &*outcome {
                formatter.warning(&format!("Muxer reported: {}", reason));
            }
        }
    }

    formatter.print_download_complete(&display_path, written, start_time.elapsed());
    Ok(())
}

/// Initialize logging system
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}
