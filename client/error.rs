use thiserror::Error;
use tonic::Code;

/// Everything a call on [`crate::OperationsClient`] can fail with.
///
/// Server and transport errors are passed through as received; the client
/// never retries or recovers locally.
#[derive(Debug, Error)]
pub enum LroError {
    #[error("Method not supported by the server: {0}")]
    Unimplemented(String),
    #[error("Operation not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Transport failure: {0}")]
    TransportFailure(tonic::Status),
    #[error("Call was cancelled before a response arrived")]
    Cancelled,
    #[error("Gave up waiting for the operation to finish")]
    DeadlineExceeded,
    #[error("Invalid call option: {0}")]
    InvalidOption(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Connect(#[from] tonic::transport::Error),
}

impl From<tonic::Status> for LroError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            Code::Unimplemented => LroError::Unimplemented(status.message().to_string()),
            Code::NotFound => LroError::NotFound(status.message().to_string()),
            Code::InvalidArgument => LroError::InvalidArgument(status.message().to_string()),
            _ => LroError::TransportFailure(status),
        }
    }
}

impl LroError {
    /// The gRPC code this error corresponds to.
    pub fn code(&self) -> Code {
        match self {
            LroError::Unimplemented(_) => Code::Unimplemented,
            LroError::NotFound(_) => Code::NotFound,
            LroError::InvalidArgument(_) | LroError::InvalidOption(_) | LroError::Config(_) => {
                Code::InvalidArgument
            }
            LroError::TransportFailure(status) => status.code(),
            LroError::Cancelled => Code::Cancelled,
            LroError::DeadlineExceeded => Code::DeadlineExceeded,
            LroError::Connect(_) => Code::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_distinct_variants() {
        assert!(matches!(
            LroError::from(tonic::Status::unimplemented("no listing")),
            LroError::Unimplemented(m) if m == "no listing"
        ));
        assert!(matches!(
            LroError::from(tonic::Status::not_found("operations/x")),
            LroError::NotFound(m) if m == "operations/x"
        ));
        assert!(matches!(
            LroError::from(tonic::Status::invalid_argument("bad token")),
            LroError::InvalidArgument(m) if m == "bad token"
        ));
    }

    #[test]
    fn other_statuses_pass_through_unchanged() {
        let err = LroError::from(tonic::Status::unavailable("connection refused"));
        let LroError::TransportFailure(status) = &err else {
            panic!("expected a transport failure, got {err:?}");
        };
        assert_eq!(status.code(), Code::Unavailable);
        assert_eq!(status.message(), "connection refused");
        assert_eq!(err.code(), Code::Unavailable);
    }
}
