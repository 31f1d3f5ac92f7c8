//! Tiles command - show which tiles a bounding box covers without
//! downloading them.

use tilefetch::coord::{enumerate, tile_origin_geo, TileRange};
use tilefetch::download::tile_file_name;
use tilefetch::metadata::ServerMetadata;
use tilefetch::provider::TileEndpoint;
use tilefetch::SessionError;

use super::common::{RegionArgs, ServerArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the tiles command.
pub struct TilesArgs {
    pub region: RegionArgs,
    pub server: ServerArgs,
    /// Print one line per tile
    pub list: bool,
}

/// Run the tiles command.
pub fn run(args: TilesArgs, runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("tiles");
    let config = runner.config();

    let metadata = runner.block_on(args.server.load_metadata(config))?;
    metadata.resolution_for_zoom(args.region.zoom)?;

    let bbox = args.region.bounding_box();
    let range = enumerate(&bbox, args.region.zoom, &metadata).map_err(SessionError::from)?;

    for line in describe_range(&metadata, &range) {
        println!("{}", line);
    }

    if args.list {
        let path_order = args.server.path_order(config);
        let endpoint = args
            .server
            .service_url(config)
            .map(|url| TileEndpoint::from_service_url(&url, path_order));
        println!();
        for line in list_tiles(&range, endpoint.as_ref(), &config.output.extension) {
            println!("{}", line);
        }
    }

    Ok(())
}

fn describe_range(metadata: &ServerMetadata, range: &TileRange) -> Vec<String> {
    let mut lines = vec![
        format!("Map:     {}", metadata.map_name()),
        format!("Zoom:    {}", range.zoom()),
        format!(
            "Columns: {}..={} ({})",
            range.upper_left().col,
            range.lower_right().col,
            range.width()
        ),
        format!(
            "Rows:    {}..={} ({})",
            range.upper_left().row,
            range.lower_right().row,
            range.height()
        ),
        format!("Tiles:   {}", range.tile_count()),
    ];

    if let Ok((lat, lon)) = tile_origin_geo(&range.upper_left(), metadata) {
        lines.push(format!("Origin:  {:.6}, {:.6}", lat, lon));
    }
    lines
}

fn list_tiles(
    range: &TileRange,
    endpoint: Option<&TileEndpoint>,
    extension: &str,
) -> Vec<String> {
    range
        .iter()
        .map(|tile| match endpoint {
            Some(endpoint) => format!(
                "{}\t{}\t{}",
                tile,
                tile_file_name(&tile, extension),
                endpoint.tile_url(&tile)
            ),
            None => format!("{}\t{}", tile, tile_file_name(&tile, extension)),
        })
        .collect()
}
