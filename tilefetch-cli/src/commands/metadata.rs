//! Metadata command - show what a MapServer tile cache publishes.

use tilefetch::metadata::ServerMetadata;

use super::common::ServerArgs;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the metadata command.
pub fn run(server: ServerArgs, runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("metadata");

    let metadata = runner.block_on(server.load_metadata(runner.config()))?;
    for line in describe(&metadata) {
        println!("{}", line);
    }
    Ok(())
}

fn describe(metadata: &ServerMetadata) -> Vec<String> {
    let grid = metadata.tile_grid();
    let extent = metadata.extent();

    let mut lines = vec![
        format!("Map:    {}", metadata.map_name()),
        format!("Tiles:  {}x{} px", grid.cols, grid.rows),
        format!(
            "Extent: x {:.3} .. {:.3}, y {:.3} .. {:.3}",
            extent.xmin, extent.xmax, extent.ymin, extent.ymax
        ),
    ];
    if let Some((x, y)) = metadata.origin() {
        lines.push(format!("Origin: {:.3}, {:.3}", x, y));
    }

    lines.push(String::new());
    lines.push(format!("{:>5}  {:>16}  {:>18}", "Zoom", "Resolution", "Scale"));
    for level in metadata.zoom_levels() {
        lines.push(format!(
            "{:>5}  {:>16.6}  {:>18.3}",
            level.zoom, level.resolution, level.scale
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "mapName": "Layers",
        "tileInfo": {
            "rows": 256, "cols": 256,
            "origin": {"x": -20037508.342787, "y": 20037508.342787},
            "lods": [
                {"level": 1, "resolution": 78271.51696399994, "scale": 295828763.795777},
                {"level": 0, "resolution": 156543.03392800014, "scale": 591657527.591555}
            ]
        },
        "fullExtent": {"xmin": -1.0, "ymin": -2.0, "xmax": 3.0, "ymax": 4.0}
    }"#;

    #[test]
    fn test_describe_lists_levels_in_order() {
        let metadata = ServerMetadata::from_json_str(DOCUMENT).unwrap();
        let lines = describe(&metadata);

        assert_eq!(lines[0], "Map:    Layers");
        assert_eq!(lines[1], "Tiles:  256x256 px");
        assert!(lines[3].starts_with("Origin: -20037508.343"));

        let levels: Vec<&String> = lines.iter().skip(6).collect();
        assert_eq!(levels.len(), 2);
        assert!(levels[0].trim_start().starts_with('0'));
        assert!(levels[1].trim_start().starts_with('1'));
    }
}
