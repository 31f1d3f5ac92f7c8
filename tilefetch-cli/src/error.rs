//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilefetch::config::ConfigFileError;
use tilefetch::metadata::MetadataError;
use tilefetch::SessionError;

/// Exit code for a session that finished with failed tiles.
pub const EXIT_TILES_FAILED: i32 = 2;

/// Exit code for a session stopped by Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Config file could not be read or holds invalid values
    ConfigFile(ConfigFileError),
    /// Server metadata could not be loaded
    Metadata(MetadataError),
    /// The session could not start
    Session(SessionError),
    /// Async runtime or signal handler setup failed
    Runtime(String),
    /// The session finished but some tiles failed
    TilesFailed { failed: u64, total: u64 },
    /// The session was cancelled before every tile was dispatched
    Interrupted { completed: u64, total: u64 },
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::TilesFailed { .. } => EXIT_TILES_FAILED,
            CliError::Interrupted { .. } => EXIT_INTERRUPTED,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Metadata(MetadataError::Fetch { .. }) => {
                eprintln!();
                eprintln!("Check that the service URL points at a MapServer, e.g.");
                eprintln!("  https://host/arcgis/rest/services/<name>/MapServer");
                eprintln!("or pass a saved capability document with --metadata <file>.");
            }
            CliError::TilesFailed { .. } => {
                eprintln!();
                eprintln!("Run the same command again to retry; finished tiles are skipped.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Metadata(e) => write!(f, "{}", e),
            CliError::Session(e) => write!(f, "{}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::TilesFailed { failed, total } => {
                write!(f, "{} of {} tiles failed to download", failed, total)
            }
            CliError::Interrupted { completed, total } => {
                write!(f, "Interrupted after {} of {} tiles", completed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Metadata(e) => Some(e),
            CliError::Session(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<MetadataError> for CliError {
    fn from(e: MetadataError) -> Self {
        CliError::Metadata(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Config("x".into()).exit_code(), 1);
        assert_eq!(
            CliError::TilesFailed {
                failed: 1,
                total: 25
            }
            .exit_code(),
            EXIT_TILES_FAILED
        );
        assert_eq!(
            CliError::Interrupted {
                completed: 3,
                total: 25
            }
            .exit_code(),
            EXIT_INTERRUPTED
        );
    }

    #[test]
    fn test_unsupported_zoom_message() {
        let err = CliError::from(MetadataError::UnsupportedZoom {
            zoom: 19,
            min: 0,
            max: 17,
        });
        assert!(err.to_string().contains("19"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
