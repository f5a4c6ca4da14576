// Error taxonomy shared by the client, the service layer and the metrics.

use thiserror::Error;

/// Failure while obtaining or interpreting collaborator data.
///
/// Every derived metric is all-or-nothing: any of these aborts the whole
/// computation and the caller sees a single failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FplError {
    /// The request could not be made, or the upstream answered with a
    /// non-success status.
    #[error("request to {path} failed: {message}")]
    FetchFailure {
        path: String,
        status: Option<u16>,
        message: String,
    },

    /// The payload arrived but a required substructure was absent or
    /// malformed.
    #[error("missing data: {what}")]
    MissingData { what: String },
}

impl FplError {
    pub fn fetch(path: impl Into<String>, message: impl Into<String>) -> Self {
        FplError::FetchFailure {
            path: path.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn status(path: impl Into<String>, status: u16) -> Self {
        FplError::FetchFailure {
            path: path.into(),
            status: Some(status),
            message: format!("upstream returned status {status}"),
        }
    }

    pub fn missing(what: impl Into<String>) -> Self {
        FplError::MissingData { what: what.into() }
    }

    /// Upstream HTTP status, when the failure came from a non-success response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            FplError::FetchFailure { status, .. } => *status,
            FplError::MissingData { .. } => None,
        }
    }
}
