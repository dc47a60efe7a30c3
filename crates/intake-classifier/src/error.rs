//! Error types for the hosted classifier
//!
//! None of these reach callers of [`Classifier::classify`](crate::Classifier);
//! they are logged and answered by the rule path instead.

/// Hosted completion errors
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// No API key configured
    #[error("no API key configured for the hosted classifier")]
    MissingApiKey,

    /// HTTP client could not be built or the request failed in transit
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("completion endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response had no completion text
    #[error("empty completion")]
    EmptyCompletion,

    /// Completion text does not follow the response grammar
    #[error("unparseable completion: {0}")]
    Unparseable(String),
}

impl ClassifierError {
    /// Check if error came from the network or the remote service
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_error_display() {
        let err = ClassifierError::Status {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "completion endpoint returned 429: rate limited"
        );
        assert!(err.is_remote());
        assert!(!ClassifierError::EmptyCompletion.is_remote());
    }
}
