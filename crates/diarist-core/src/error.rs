//! Error types for Diarist

use thiserror::Error;

/// Result type alias using Diarist's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Diarist error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E001-E099)
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Story {0} not found. Run `diarist stories list` to see all stories.")]
    StoryNotFound(i64),

    // Upstream errors (E100-E199)
    #[error("{service} unavailable{}: {message}", status_suffix(.status))]
    UpstreamUnavailable {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{service} timed out after {timeout_secs} seconds")]
    UpstreamTimeout {
        service: &'static str,
        timeout_secs: u64,
    },

    #[error("Model output could not be decoded: {0}")]
    MalformedModelOutput(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "E001",
            Self::StoryNotFound(_) => "E002",
            Self::UpstreamUnavailable { .. } => "E100",
            Self::UpstreamTimeout { .. } => "E101",
            Self::MalformedModelOutput(_) => "E102",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::Internal(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::MissingInput(_) => {
                Some("Provide both a diary entry and a personal id".to_string())
            }
            Self::StoryNotFound(_) => Some("diarist stories list".to_string()),
            Self::UpstreamUnavailable { service, .. } => {
                Some(format!("Check that the {} is running (`diarist doctor`)", service))
            }
            Self::UpstreamTimeout { service, .. } => {
                let section = if *service == "profile service" { "profile" } else { "llm" };
                Some(format!("diarist config set {}.timeout_secs <seconds>", section))
            }
            Self::ConfigError(_) => Some("diarist config list".to_string()),
            _ => None,
        }
    }

    /// Map a transport error from one of the HTTP collaborators.
    ///
    /// Timeouts get their own variant so callers can tell a slow model
    /// apart from one that is down.
    pub(crate) fn from_transport(
        service: &'static str,
        timeout_secs: u64,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            Self::UpstreamTimeout {
                service,
                timeout_secs,
            }
        } else {
            Self::UpstreamUnavailable {
                service,
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}
