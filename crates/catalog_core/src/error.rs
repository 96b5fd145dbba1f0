//! Failure taxonomy for remote catalog calls and its presentation mapping.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The request never reached the server or no response came back.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    /// A 2xx response whose body could not be decoded.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl CatalogError {
    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::server(status.as_u16(), err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayErrorCategory {
    Transport,
    Server,
    Decode,
}

/// Error state the list controller hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayError {
    category: DisplayErrorCategory,
    message: String,
}

impl DisplayError {
    pub fn from_catalog_error(err: &CatalogError) -> Self {
        let (category, message) = match err {
            CatalogError::Transport(_) => (
                DisplayErrorCategory::Transport,
                "Catalog server unreachable; check the API URL or network.".to_string(),
            ),
            CatalogError::Server { status, .. } if *status >= 500 => (
                DisplayErrorCategory::Server,
                format!("Catalog server failed with status {status}; retrying on next refresh."),
            ),
            CatalogError::Server { status, .. } => (
                DisplayErrorCategory::Server,
                format!("Catalog request rejected with status {status}."),
            ),
            CatalogError::Decode(_) => (
                DisplayErrorCategory::Decode,
                "Catalog server sent an unreadable product list.".to_string(),
            ),
        };

        Self { category, message }
    }

    pub fn category(&self) -> DisplayErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// A later auto-refresh tick may clear the condition.
    pub fn is_retryable(&self) -> bool {
        self.category != DisplayErrorCategory::Decode
    }
}
