//! tilefetch CLI - Command-line interface
//!
//! Downloads the raster tiles covering a bounding box from an ArcGIS
//! MapServer tile cache.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilefetch::config::{parse_extension, parse_timeout_secs};

use commands::common::{RegionArgs, ServerArgs};
use commands::{download, metadata, tiles};
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tilefetch")]
#[command(version, about = "Download map tiles for a bounding box from an ArcGIS MapServer", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tilefetch/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every tile covering a bounding box
    Download {
        #[command(flatten)]
        region: RegionArgs,

        #[command(flatten)]
        server: ServerArgs,

        /// Output directory (overrides [output] directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Tiles downloaded in parallel (1-64)
        #[arg(long, short)]
        parallel: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long, value_parser = parse_timeout_secs)]
        timeout: Option<u64>,

        /// Retries per tile after the first attempt
        #[arg(long)]
        retries: Option<u32>,

        /// Output file extension (overrides [output] extension)
        #[arg(long, value_parser = parse_extension)]
        extension: Option<String>,
    },

    /// Show the tile range for a bounding box without downloading
    Tiles {
        #[command(flatten)]
        region: RegionArgs,

        #[command(flatten)]
        server: ServerArgs,

        /// Print every tile with its file name and URL
        #[arg(long)]
        list: bool,
    },

    /// Show the zoom levels and extent a MapServer publishes
    Metadata {
        #[command(flatten)]
        server: ServerArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;

    match cli.command {
        Commands::Download {
            region,
            server,
            output,
            parallel,
            timeout,
            retries,
            extension,
        } => download::run(
            download::DownloadArgs {
                region,
                server,
                output,
                parallel,
                timeout,
                retries,
                extension,
            },
            &runner,
        ),
        Commands::Tiles {
            region,
            server,
            list,
        } => tiles::run(
            tiles::TilesArgs {
                region,
                server,
                list,
            },
            &runner,
        ),
        Commands::Metadata { server } => metadata::run(server, &runner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tilefetch::provider::PathOrder;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "tilefetch",
            "download",
            "--upper-left",
            "-35.258028,149.085308",
            "--lower-right",
            "-35.333125,149.175259",
            "--zoom",
            "14",
            "--url",
            "https://maps.test/MapServer",
            "--parallel",
            "8",
            "--path-order",
            "zoom/col/row",
        ])
        .unwrap();

        match cli.command {
            Commands::Download {
                region,
                server,
                parallel,
                ..
            } => {
                assert_eq!(region.upper_left, (-35.258028, 149.085308));
                assert_eq!(region.zoom, 14);
                assert_eq!(parallel, Some(8));
                assert_eq!(server.path_order, Some(PathOrder::ZoomColRow));
            }
            _ => panic!("expected download command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["tilefetch", "metadata", "--metadata", "nsw.json", "--debug"])
                .unwrap();
        assert!(cli.debug);
        assert!(matches!(cli.command, Commands::Metadata { .. }));
    }

    #[test]
    fn test_tiles_accepts_path_order() {
        let cli = Cli::try_parse_from([
            "tilefetch",
            "tiles",
            "--upper-left=-35.258,149.085",
            "--lower-right=-35.333,149.175",
            "--zoom",
            "14",
            "--list",
            "--path-order",
            "zoom/col/row",
        ])
        .unwrap();

        match cli.command {
            Commands::Tiles { server, list, .. } => {
                assert!(list);
                assert_eq!(server.path_order, Some(PathOrder::ZoomColRow));
            }
            _ => panic!("expected tiles command"),
        }
    }

    fn download_with(flag: &str, value: &str) -> Result<Cli, clap::Error> {
        Cli::try_parse_from([
            "tilefetch",
            "download",
            "--upper-left=-35.258,149.085",
            "--lower-right=-35.333,149.175",
            "--zoom",
            "14",
            flag,
            value,
        ])
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(download_with("--timeout", "0").is_err());
        assert!(download_with("--timeout", "15").is_ok());
    }

    #[test]
    fn test_extension_validated_and_normalized() {
        assert!(download_with("--extension", "png/../../x").is_err());
        assert!(download_with("--extension", "").is_err());

        match download_with("--extension", ".JPG").unwrap().command {
            Commands::Download { extension, .. } => assert_eq!(extension.as_deref(), Some("jpg")),
            _ => panic!("expected download command"),
        }
    }

    #[test]
    fn test_bad_point_rejected() {
        let result = Cli::try_parse_from([
            "tilefetch",
            "tiles",
            "--upper-left",
            "north",
            "--lower-right",
            "1,2",
            "--zoom",
            "3",
        ]);
        assert!(result.is_err());
    }
}
