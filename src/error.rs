//! Errors raised at the catalog service boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No response reached us (connection refused, DNS, TLS...).
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// Non-2xx status other than 401/403.
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Server { status: u16, message: Option<String> },

    #[error("authentication rejected (401)")]
    Unauthorized,

    #[error("access denied (403)")]
    Forbidden,

    /// The session holds no usable bearer token; nothing was sent.
    #[error("no bearer token available")]
    MissingCredential,

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),
}

impl CatalogError {
    /// Maps an HTTP status (and optional body message) to the matching variant.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => CatalogError::Unauthorized,
            403 => CatalogError::Forbidden,
            _ => CatalogError::Server { status, message },
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            CatalogError::Unauthorized | CatalogError::Forbidden | CatalogError::MissingCredential
        )
    }

    /// Text shown to the user when a fetch fails.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Network(_) => "Network error. Please check your connection.".into(),
            CatalogError::Timeout => "Request timeout. Please try again.".into(),
            CatalogError::Server { status, message } => match message {
                Some(m) if !m.is_empty() => format!("Server error: {status} - {m}"),
                _ => format!("Server error: {status}"),
            },
            CatalogError::Unauthorized => "Please login again.".into(),
            CatalogError::Forbidden => {
                "You do not have permission to access this resource.".into()
            }
            CatalogError::MissingCredential => "Please login to view books.".into(),
            CatalogError::Decode(_) => "Failed to fetch books. Please try again.".into(),
            CatalogError::Validation(m) => m.clone(),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CatalogError::Timeout
        } else if let Some(status) = e.status() {
            CatalogError::from_status(status.as_u16(), None)
        } else if e.is_decode() {
            CatalogError::Decode(e.to_string())
        } else {
            CatalogError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        CatalogError::Decode(e.to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
