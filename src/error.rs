/*!
 * Error types for Homewatch
 */

use homewatch_connect::TransportError;
use homewatch_sentinel::SentinelError;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, HomewatchError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug)]
pub enum HomewatchError {
    /// Configuration error
    Config(String),

    /// Refusing to overwrite an existing config file
    ConfigExists(PathBuf),

    /// I/O error
    Io(io::Error),

    /// Status source exchange failed
    Transport(TransportError),

    /// Engine could not be set up
    Sentinel(SentinelError),

    /// Generic error with message
    Other(String),
}

impl HomewatchError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            HomewatchError::Config(_)
            | HomewatchError::ConfigExists(_)
            | HomewatchError::Sentinel(_) => EXIT_FATAL,
            // The source may come back; the command just could not finish
            HomewatchError::Transport(_) => EXIT_PARTIAL,
            _ => EXIT_PARTIAL,
        }
    }

    /// Check if this error is transient (temporary, worth retrying)
    pub fn is_transient(&self) -> bool {
        match self {
            HomewatchError::Transport(err) => matches!(
                err,
                TransportError::Timeout { .. }
                    | TransportError::Unreachable { .. }
                    | TransportError::HttpStatus { .. }
            ),
            HomewatchError::Io(err) => matches!(
                err.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            HomewatchError::Config(_) | HomewatchError::ConfigExists(_) => {
                ErrorCategory::Configuration
            }
            HomewatchError::Io(_) => ErrorCategory::IoError,
            HomewatchError::Transport(_) => ErrorCategory::Network,
            HomewatchError::Sentinel(_) => ErrorCategory::Engine,
            HomewatchError::Other(_) => ErrorCategory::Unknown,
        }
    }

    /// Suggestion printed under the error message
    pub fn hint(&self) -> Option<&'static str> {
        // The message already names --force
        if let HomewatchError::ConfigExists(_) = self {
            return None;
        }
        match self.category() {
            ErrorCategory::Configuration => Some("Run `homewatch init` to write a fresh config"),
            ErrorCategory::Network if self.is_transient() => {
                Some("Is the status source running? Retry once it is reachable")
            }
            ErrorCategory::Network => Some("Check that --url points at the status source"),
            ErrorCategory::Engine => Some("Check poll_interval_ms and history_capacity"),
            ErrorCategory::IoError | ErrorCategory::Unknown => None,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration errors
    Configuration,
    /// I/O operation errors
    IoError,
    /// Status source unreachable or misbehaving
    Network,
    /// Alert engine setup errors
    Engine,
    /// Uncategorized errors
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Engine => write!(f, "engine"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for HomewatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HomewatchError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            HomewatchError::ConfigExists(path) => {
                write!(
                    f,
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                )
            }
            HomewatchError::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
            HomewatchError::Transport(err) => {
                write!(f, "{}", err)
            }
            HomewatchError::Sentinel(err) => {
                write!(f, "{}", err)
            }
            HomewatchError::Other(msg) => {
                write!(f, "{}", msg)
            }
        }
    }
}

impl std::error::Error for HomewatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HomewatchError::Io(err) => Some(err),
            HomewatchError::Transport(err) => Some(err),
            HomewatchError::Sentinel(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HomewatchError {
    fn from(err: io::Error) -> Self {
        HomewatchError::Io(err)
    }
}

impl From<TransportError> for HomewatchError {
    fn from(err: TransportError) -> Self {
        HomewatchError::Transport(err)
    }
}

impl From<SentinelError> for HomewatchError {
    fn from(err: SentinelError) -> Self {
        HomewatchError::Sentinel(err)
    }
}

impl From<toml::de::Error> for HomewatchError {
    fn from(err: toml::de::Error) -> Self {
        HomewatchError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for HomewatchError {
    fn from(err: toml::ser::Error) -> Self {
        HomewatchError::Config(format!("TOML serialize error: {}", err))
    }
}
