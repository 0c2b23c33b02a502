use thiserror::Error;
use twilight_http::{error::ErrorType, response::DeserializeBodyError};

/// Failure taxonomy shared by the scanner, purge executor and scheduler.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// Bad argument shape or range; nothing was sent to the platform.
    #[error("invalid argument: {0}")]
    Validation(String),
    #[error("missing permission: {0}")]
    Permission(String),
    /// Throttled after the HTTP client's own retries were exhausted.
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("config persistence failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("platform request failed: {0}")]
    Platform(String),
}

impl ModerationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short text suitable for a channel reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Permission(_) => {
                "I don't have permission to do that in this channel.".to_owned()
            }
            Self::RateLimited(_) => "Discord is rate limiting me, try again shortly.".to_owned(),
            Self::Io(_) => "I couldn't save the cleanup settings.".to_owned(),
            Self::NotFound(_) => "That channel or message no longer exists.".to_owned(),
            Self::Platform(message) => format!("An error occurred: {message}"),
        }
    }

    /// Classify an HTTP failure by its response status.
    pub fn from_http(source: &twilight_http::Error) -> Self {
        let status = match source.kind() {
            ErrorType::Response { status, .. } => Some(status.get()),
            _ => None,
        };

        match status {
            Some(403) => Self::Permission(source.to_string()),
            Some(404) => Self::NotFound(source.to_string()),
            Some(429) => Self::RateLimited(source.to_string()),
            _ => Self::Platform(source.to_string()),
        }
    }
}

impl From<twilight_http::Error> for ModerationError {
    fn from(source: twilight_http::Error) -> Self {
        Self::from_http(&source)
    }
}

impl From<DeserializeBodyError> for ModerationError {
    fn from(source: DeserializeBodyError) -> Self {
        Self::Platform(source.to_string())
    }
}
