use thiserror::Error;

/// Transport-level failure categories, mirrored by the user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    NotFound,
    Internal,
    Status(u16),
    Transport(String),
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkErrorKind::Timeout => write!(f, "request timed out"),
            NetworkErrorKind::NotFound => write!(f, "resource not found (404)"),
            NetworkErrorKind::Internal => write!(f, "internal server error (500)"),
            NetworkErrorKind::Status(code) => write!(f, "request failed with status {}", code),
            NetworkErrorKind::Transport(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplorerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Network error: {0}")]
    Network(NetworkErrorKind),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExplorerError {
    /// Short message suitable for a non-blocking notification.
    pub fn user_message(&self) -> String {
        match self {
            ExplorerError::InvalidAddress(_) => {
                "Address format is incorrect, please check and try again".to_string()
            }
            ExplorerError::Network(kind) => match kind {
                NetworkErrorKind::Timeout => "Request timed out, please try again".to_string(),
                NetworkErrorKind::NotFound => "The requested resource was not found".to_string(),
                NetworkErrorKind::Internal => "Internal server error".to_string(),
                NetworkErrorKind::Status(code) => format!("Request failed, status code: {}", code),
                NetworkErrorKind::Transport(msg) if msg.is_empty() => "Unknown".to_string(),
                NetworkErrorKind::Transport(msg) => msg.clone(),
            },
            ExplorerError::Backend(msg) => msg.clone(),
            ExplorerError::Decode(_) => "Unexpected response from server".to_string(),
            ExplorerError::InvalidAmount(_) => "Received an invalid amount".to_string(),
            ExplorerError::Storage(_) => "Failed to save local state".to_string(),
            ExplorerError::Config(msg) => msg.clone(),
        }
    }
}

impl From<reqwest::Error> for ExplorerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ExplorerError::Network(NetworkErrorKind::Timeout);
        }
        if let Some(status) = err.status() {
            return ExplorerError::Network(kind_for_status(status.as_u16()));
        }
        if err.is_decode() {
            return ExplorerError::Decode(err.to_string());
        }
        ExplorerError::Network(NetworkErrorKind::Transport(err.to_string()))
    }
}

impl From<serde_json::Error> for ExplorerError {
    fn from(err: serde_json::Error) -> Self {
        ExplorerError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ExplorerError {
    fn from(err: std::io::Error) -> Self {
        ExplorerError::Storage(err.to_string())
    }
}

pub(crate) fn kind_for_status(status: u16) -> NetworkErrorKind {
    match status {
        404 => NetworkErrorKind::NotFound,
        500 => NetworkErrorKind::Internal,
        other => NetworkErrorKind::Status(other),
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
