use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("JIRA returned HTTP {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded, retries exhausted")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid date filter: {0}")]
    InvalidFilter(String),
}

impl Error {
    /// Failures tied to one project's search. Anything else (credentials,
    /// network, local files) would fail the next project the same way.
    pub fn is_project_scoped(&self) -> bool {
        matches!(
            self,
            Error::ApiError { .. } | Error::NotFound(_) | Error::JsonParsing(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = Error::ApiError {
            status: 400,
            message: "Field 'created' is invalid".to_string(),
        };
        assert_eq!(err.to_string(), "JIRA returned HTTP 400: Field 'created' is invalid");
        assert_eq!(
            Error::InvalidFilter("start after end".to_string()).to_string(),
            "Invalid date filter: start after end"
        );
    }

    #[test]
    fn test_project_scoped() {
        assert!(Error::NotFound("project".to_string()).is_project_scoped());
        assert!(
            Error::ApiError {
                status: 500,
                message: String::new()
            }
            .is_project_scoped()
        );
        assert!(!Error::AuthenticationFailed("HTTP 401".to_string()).is_project_scoped());
        assert!(!Error::RateLimitExceeded.is_project_scoped());
    }
}
