use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl ReelError {
    pub fn navigation(url: &str, message: impl std::fmt::Display) -> Self {
        Self::Navigation {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_error_message() {
        let err = ReelError::navigation("https://example.com", "timed out");
        assert_eq!(
            err.to_string(),
            "Navigation to https://example.com failed: timed out"
        );
    }

    #[test]
    fn test_url_error_converts() {
        let err: ReelError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, ReelError::InvalidUrl(_)));
    }
}
