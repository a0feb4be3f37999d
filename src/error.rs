use thiserror::Error;

/// Errors raised while talking to the films API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: HTTP {status} - {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(e) if e.is_timeout() => {
                "The films server took too long to answer".to_string()
            }
            ApiError::Transport(e) if e.is_connect() => {
                "Could not reach the films server".to_string()
            }
            ApiError::Transport(e) => format!("Network error: {}", e),
            ApiError::Status { status, message } => {
                if message.is_empty() {
                    format!("The films server answered with HTTP {}", status)
                } else {
                    format!("The films server answered with HTTP {}: {}", status, message)
                }
            }
            ApiError::NotFound(what) => format!("{} not found", what),
            ApiError::Decode(msg) => format!("Unexpected data from the server: {}", msg),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Cancelled => "Request cancelled".to_string(),
        }
    }
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid API URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ApiError::NotFound("Film 42".to_string());
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Film 42 not found");
    }

    #[test]
    fn test_status_message_includes_detail() {
        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_not_found());
        assert!(err.user_message().contains("HTTP 500: boom"));

        let bare = ApiError::Status {
            status: 502,
            message: String::new(),
        };
        assert_eq!(bare.user_message(), "The films server answered with HTTP 502");
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = ApiError::Validation("Min rating must be a number".to_string());
        assert_eq!(err.user_message(), "Min rating must be a number");
    }
}
