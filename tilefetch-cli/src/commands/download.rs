//! Download command - fetch every tile covering a bounding box.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tilefetch::config::DownloadConfig;
use tilefetch::coord::enumerate;
use tilefetch::download::{DownloadCoordinator, DownloadProgress, SessionSummary};
use tilefetch::provider::{ReqwestClient, TileEndpoint};
use tilefetch::SessionError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::common::{format_bytes, RegionArgs, ServerArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the download command.
pub struct DownloadArgs {
    pub region: RegionArgs,
    pub server: ServerArgs,
    pub output: Option<PathBuf>,
    pub parallel: Option<usize>,
    pub timeout: Option<u64>,
    pub retries: Option<u32>,
    /// Already normalized by the argument parser.
    pub extension: Option<String>,
}

/// Run the download command.
pub fn run(args: DownloadArgs, runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("download");
    let config = runner.config();

    let service_url = args.server.require_service_url(config)?;
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.output.directory.clone());
    let extension = args
        .extension
        .clone()
        .unwrap_or_else(|| config.output.extension.clone());
    let path_order = args.server.path_order(config);
    let download_config = resolve_download_config(&args, config.download_config());

    let metadata = runner.block_on(args.server.load_metadata(config))?;
    metadata.resolution_for_zoom(args.region.zoom)?;

    let bbox = args.region.bounding_box();
    let range = enumerate(&bbox, args.region.zoom, &metadata).map_err(SessionError::from)?;

    println!("Downloading tiles from {}", metadata.map_name());
    println!("  Region: {}", bbox);
    println!("  Zoom:   {}", args.region.zoom);
    println!(
        "  Tiles:  {} ({} x {}), {} .. {}",
        range.tile_count(),
        range.width(),
        range.height(),
        range.upper_left(),
        range.lower_right()
    );
    println!("  Output: {}", output_dir.display());
    println!();

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling, waiting for downloads in flight...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("failed to install Ctrl-C handler: {}", e)))?;

    let client = Arc::new(ReqwestClient::new().map_err(|e| CliError::Runtime(e.to_string()))?);
    let endpoint = TileEndpoint::from_service_url(&service_url, path_order);
    let bar = progress_bar(range.tile_count());
    let bar_handle = bar.clone();

    let coordinator = DownloadCoordinator::new(client, endpoint, &output_dir)
        .with_config(download_config)
        .with_extension(extension)
        .with_logger(runner.logger())
        .with_cancellation(cancel)
        .with_progress(Box::new(move |p: DownloadProgress| {
            bar_handle.set_position(p.completed);
            bar_handle.set_message(format!(
                "{} new, {} skipped, {} failed",
                p.succeeded, p.skipped, p.failed
            ));
        }));

    let parallel = download_config.parallel_downloads();
    let summary = runner.block_on(coordinator.run_range(range, parallel))?;
    bar.finish_and_clear();

    print_summary(&summary);
    session_result(&summary)
}

fn resolve_download_config(args: &DownloadArgs, from_file: DownloadConfig) -> DownloadConfig {
    let mut config = from_file;
    if let Some(parallel) = args.parallel {
        config = config.with_parallel_downloads(parallel);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout_secs(timeout);
    }
    if let Some(retries) = args.retries {
        config = config.with_max_retries(retries);
    }
    config
}

fn progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn print_summary(summary: &SessionSummary) {
    println!(
        "Finished in {:.1}s: {} downloaded ({}), {} already present, {} failed",
        summary.elapsed.as_secs_f64(),
        summary.succeeded,
        format_bytes(summary.bytes_written),
        summary.skipped,
        summary.failed
    );
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "Download session complete"
    );

    if summary.cancelled && summary.not_dispatched > 0 {
        println!("{} tiles were not started", summary.not_dispatched);
    }

    if summary.has_failures() {
        eprintln!();
        eprintln!("Failed tiles:");
        for line in summary.failure_report() {
            warn!("{}", line);
            eprintln!("  {}", line);
        }
    }
}

/// Maps a finished session onto the process outcome.
fn session_result(summary: &SessionSummary) -> Result<(), CliError> {
    if summary.cancelled && summary.not_dispatched > 0 {
        return Err(CliError::Interrupted {
            completed: summary.attempted,
            total: summary.total,
        });
    }
    if summary.has_failures() {
        return Err(CliError::TilesFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilefetch::coord::TileId;
    use tilefetch::download::FailureReason;

    fn summary(failed: u64, cancelled: bool, not_dispatched: u64) -> SessionSummary {
        SessionSummary {
            total: 25,
            attempted: 25 - not_dispatched,
            succeeded: 25 - not_dispatched - failed,
            skipped: 0,
            failed,
            bytes_written: 0,
            not_dispatched,
            cancelled,
            elapsed: Duration::ZERO,
            failures: (0..failed)
                .map(|i| (TileId::new(14, 6785, 1716 + i as u32), FailureReason::Timeout))
                .collect(),
        }
    }

    fn args() -> DownloadArgs {
        DownloadArgs {
            region: RegionArgs {
                upper_left: (-35.258028, 149.085308),
                lower_right: (-35.333125, 149.175259),
                zoom: 14,
            },
            server: ServerArgs::default(),
            output: None,
            parallel: None,
            timeout: None,
            retries: None,
            extension: None,
        }
    }

    #[test]
    fn test_complete_session_is_ok() {
        assert!(session_result(&summary(0, false, 0)).is_ok());
    }

    #[test]
    fn test_failed_tiles_exit_nonzero() {
        let err = session_result(&summary(2, false, 0)).unwrap_err();
        assert!(matches!(err, CliError::TilesFailed { failed: 2, total: 25 }));
    }

    #[test]
    fn test_cancelled_session_is_interrupted() {
        let err = session_result(&summary(0, true, 10)).unwrap_err();
        assert!(matches!(
            err,
            CliError::Interrupted {
                completed: 15,
                total: 25
            }
        ));
    }

    #[test]
    fn test_cli_flags_override_file_settings() {
        let mut args = args();
        args.parallel = Some(16);
        args.retries = Some(0);

        let file = DownloadConfig::new().with_parallel_downloads(2).with_timeout_secs(5);
        let config = resolve_download_config(&args, file);

        assert_eq!(config.parallel_downloads(), 16);
        assert_eq!(config.max_retries(), 0);
        assert_eq!(config.timeout_secs(), 5);
    }
}
