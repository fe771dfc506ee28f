use thiserror::Error;

#[derive(Debug, Error)]
pub enum KarloError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The external capability could not be reached (library missing, symbol
    /// missing, backend unreachable).
    #[error("External invocation error: {0}")]
    ExternalInvocation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl KarloError {
    /// True when the capability itself could not be invoked, or refused the
    /// credential, as opposed to failing while doing the work.
    pub fn is_invocation_failure(&self) -> bool {
        matches!(
            self,
            KarloError::ExternalInvocation(_) | KarloError::Auth(_) | KarloError::Network(_)
        )
    }
}

impl From<libloading::Error> for KarloError {
    fn from(err: libloading::Error) -> Self {
        KarloError::ExternalInvocation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KarloError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_failures() {
        assert!(KarloError::ExternalInvocation("no lib".into()).is_invocation_failure());
        assert!(KarloError::Auth("bad key".into()).is_invocation_failure());

        assert!(!KarloError::InvalidRequest("empty".into()).is_invocation_failure());
        assert!(!KarloError::Decode("bad base64".into()).is_invocation_failure());
        assert!(!KarloError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_invocation_failure());
    }

    #[test]
    fn test_error_display() {
        let err = KarloError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = KarloError::ExternalInvocation("libkarlo_php.so: not found".into());
        assert_eq!(
            err.to_string(),
            "External invocation error: libkarlo_php.so: not found"
        );
    }
}
