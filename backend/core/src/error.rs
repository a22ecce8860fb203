use thiserror::Error;

/// Top-level error type for the Timbang pipeline.
#[derive(Debug, Error)]
pub enum TimbangError {
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("categorization failed: {0}")]
    Categorization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Error from a vision inference call.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The request never completed (connect failure, timeout).
    #[error("vision request failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status.
    #[error("vision endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A response arrived but could not be parsed into the receipt schema.
    #[error("malformed vision response: {0}")]
    Malformed(String),
}

impl ExtractionError {
    /// Whether a retry could plausibly succeed. Malformed responses are a
    /// model/prompt problem, not a network one, and are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            Self::Malformed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_server_errors_are_transient() {
        assert!(ExtractionError::Transport("timed out".into()).is_transient());
        assert!(ExtractionError::Status { status: 500, body: String::new() }.is_transient());
        assert!(ExtractionError::Status { status: 429, body: String::new() }.is_transient());
    }

    #[test]
    fn client_errors_and_parse_failures_are_terminal() {
        assert!(!ExtractionError::Status { status: 400, body: String::new() }.is_transient());
        assert!(!ExtractionError::Malformed("not json".into()).is_transient());
    }

    #[test]
    fn extraction_error_converts_to_top_level() {
        let err: TimbangError = ExtractionError::Malformed("x".into()).into();
        assert!(matches!(err, TimbangError::Extraction(_)));
    }
}
