use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidqlError {
    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("invalid parameter '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("no query shape for intent {intent} over {table}.{field}")]
    UnknownIntentCombination {
        intent: &'static str,
        table: &'static str,
        field: &'static str,
    },

    #[error("reasoning service is rate limiting requests")]
    Throttled,

    #[error("reasoning service capacity exhausted")]
    ServiceUnavailable,

    #[error("query execution error: {0}")]
    Execution(String),

    #[error("{0}")]
    Generic(String),
}

impl VidqlError {
    /// Whether the resilience layer may spend retry budget on this failure.
    ///
    /// Throttling and transient extraction failures (dropped connections,
    /// a response missing its tool call) can succeed on a later attempt.
    /// Everything else is deterministic or needs operator action, so a
    /// retry would only burn time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VidqlError::Throttled | VidqlError::Extraction(_))
    }

    /// End-user text for this failure. Provider error bodies, credentials
    /// and internal detail must never pass through here.
    pub fn user_message(&self) -> &'static str {
        match self {
            VidqlError::Throttled => {
                "The service is temporarily overloaded. Please try again in a few minutes."
            }
            VidqlError::ServiceUnavailable => {
                "The service is out of capacity right now. Please try again later."
            }
            _ => "Could not process this request. Try rephrasing the question.",
        }
    }
}

pub type VidqlResult<T> = Result<T, VidqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(VidqlError::Throttled.is_retryable());
        assert!(VidqlError::Extraction("connection reset".to_string()).is_retryable());
        assert!(!VidqlError::ServiceUnavailable.is_retryable());
        assert!(!VidqlError::Generic("bad request".to_string()).is_retryable());
        assert!(!VidqlError::Execution("connection lost".to_string()).is_retryable());
        assert!(!VidqlError::Validation {
            field: "intent",
            reason: "unknown value".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_user_messages_hide_internal_detail() {
        let err = VidqlError::Generic("401 invalid api key sk-abc123".to_string());
        assert!(!err.user_message().contains("sk-abc123"));

        assert!(VidqlError::Throttled.user_message().contains("try again"));
        assert!(VidqlError::ServiceUnavailable
            .user_message()
            .contains("capacity"));
    }
}
