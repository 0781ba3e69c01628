use thiserror::Error;

/// Conditions a caller can match on after downcasting an `anyhow::Error`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Rejected locally before any remote call was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Raised by the engine; the message is passed through untouched.
    #[error("remote engine error: {0}")]
    Remote(String),

    #[error("unexpected response to {request}: {response}")]
    UnexpectedResponse {
        request: &'static str,
        response: String,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("gateway connection is closed")]
    Closed,
}

impl GatewayError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

/// Returns the typed gateway error behind `err`, if there is one.
pub fn gateway_error(err: &anyhow::Error) -> Option<&GatewayError> {
    err.downcast_ref::<GatewayError>()
}
