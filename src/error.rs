use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend answered {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status { status: u16, message: Option<String> },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Text for the notification banner: the backend's `error` field when it sent one.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { message: Some(message), .. } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Outcome of a form operation that did not succeed. The banner has already been posted.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("{0}")]
    Validation(String),
    /// The backend answered, but its page reports the operation did not happen.
    #[error("{0}")]
    Refused(String),
    #[error("{message}")]
    Backend {
        message: String,
        #[source]
        source: ApiError,
    },
}
