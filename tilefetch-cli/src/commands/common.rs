//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use tilefetch::config::ConfigFile;
use tilefetch::coord::GeoBoundingBox;
use tilefetch::metadata::ServerMetadata;
use tilefetch::provider::{PathOrder, ReqwestClient};
use tracing::info;

use crate::error::CliError;

/// Bounding box and zoom level.
#[derive(Debug, Clone, Args)]
pub struct RegionArgs {
    /// Upper-left corner as LAT,LON (e.g. -35.258,149.085)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub upper_left: (f64, f64),

    /// Lower-right corner as LAT,LON (e.g. -35.333,149.175)
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub lower_right: (f64, f64),

    /// Zoom level (must be published by the server)
    #[arg(long, short)]
    pub zoom: u8,
}

impl RegionArgs {
    pub fn bounding_box(&self) -> GeoBoundingBox {
        let (lat1, lon1) = self.upper_left;
        let (lat2, lon2) = self.lower_right;
        GeoBoundingBox::new((lat1, lat2), (lon1, lon2))
    }
}

/// Where the server and its metadata come from.
#[derive(Debug, Clone, Default, Args)]
pub struct ServerArgs {
    /// MapServer service URL (overrides [server] url)
    #[arg(long)]
    pub url: Option<String>,

    /// Saved capability document (overrides [server] metadata)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Tile URL path order: zoom/row/col or zoom/col/row (overrides [server] path_order)
    #[arg(long)]
    pub path_order: Option<PathOrder>,
}

impl ServerArgs {
    /// Service URL from the command line, then the config file.
    pub fn service_url(&self, config: &ConfigFile) -> Option<String> {
        self.url
            .clone()
            .or_else(|| config.server.url.clone())
            .map(|url| url.trim_end_matches('/').to_string())
    }

    /// Path order from the command line, then the config file.
    pub fn path_order(&self, config: &ConfigFile) -> PathOrder {
        self.path_order.unwrap_or(config.server.path_order)
    }

    fn metadata_path(&self, config: &ConfigFile) -> Option<PathBuf> {
        self.metadata
            .clone()
            .or_else(|| config.server.metadata.clone())
    }

    /// Service URL, or a config error telling the user how to set one.
    pub fn require_service_url(&self, config: &ConfigFile) -> Result<String, CliError> {
        self.service_url(config).ok_or_else(|| {
            CliError::Config(
                "no MapServer URL given. Use --url or set url in the [server] \
                 section of config.ini"
                    .to_string(),
            )
        })
    }

    /// Loads metadata from a local document if one is configured, otherwise
    /// requests the capability document from the service.
    pub async fn load_metadata(&self, config: &ConfigFile) -> Result<ServerMetadata, CliError> {
        if let Some(path) = self.metadata_path(config) {
            info!("Reading server metadata from {}", path.display());
            return Ok(ServerMetadata::from_file(&path)?);
        }

        let url = self.require_service_url(config)?;
        info!("Requesting server metadata from {}", url);
        let client = ReqwestClient::new().map_err(|e| CliError::Runtime(e.to_string()))?;
        Ok(ServerMetadata::fetch(&client, &url).await?)
    }
}

/// Parses `LAT,LON` in decimal degrees.
pub fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got '{}'", s))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
    if !lat.is_finite() || !lon.is_finite() {
        return Err(format!("coordinates must be finite, got '{}'", s));
    }
    Ok((lat, lon))
}

/// Formats a byte count for humans.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_point("-35.258028,149.085308").unwrap(),
            (-35.258028, 149.085308)
        );
        assert_eq!(parse_point(" 40.7 , -74.0 ").unwrap(), (40.7, -74.0));
    }

    #[test]
    fn test_parse_point_errors() {
        assert!(parse_point("40.7").is_err());
        assert!(parse_point("north,-74").is_err());
        assert!(parse_point("40.7,west").is_err());
        assert!(parse_point("NaN,1").is_err());
    }

    #[test]
    fn test_bounding_box_normalizes_corners() {
        let region = RegionArgs {
            upper_left: (-35.333125, 149.175259),
            lower_right: (-35.258028, 149.085308),
            zoom: 14,
        };
        let bbox = region.bounding_box();
        assert_eq!(bbox.lat_max(), -35.258028);
        assert_eq!(bbox.lon_min(), 149.085308);
    }

    #[test]
    fn test_service_url_precedence() {
        let config =
            ConfigFile::from_ini_str("[server]\nurl = https://config.test/MapServer\n").unwrap();

        let from_config = ServerArgs::default();
        assert_eq!(
            from_config.service_url(&config).as_deref(),
            Some("https://config.test/MapServer")
        );

        let from_cli = ServerArgs {
            url: Some("https://cli.test/MapServer/".to_string()),
            ..ServerArgs::default()
        };
        assert_eq!(
            from_cli.service_url(&config).as_deref(),
            Some("https://cli.test/MapServer")
        );
    }

    #[test]
    fn test_path_order_precedence() {
        let config = ConfigFile::from_ini_str("[server]\npath_order = zoom/col/row\n").unwrap();
        assert_eq!(ServerArgs::default().path_order(&config), PathOrder::ZoomColRow);

        let from_cli = ServerArgs {
            path_order: Some(PathOrder::ZoomRowCol),
            ..ServerArgs::default()
        };
        assert_eq!(from_cli.path_order(&config), PathOrder::ZoomRowCol);
    }

    #[test]
    fn test_missing_url_is_config_error() {
        let err = ServerArgs::default()
            .require_service_url(&ConfigFile::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
