use thiserror::Error;

use crate::protocol::Topic;

/// Failure of a pull or command at the remote boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("remote service unavailable: {0}")]
    Unavailable(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("command rejected: {0}")]
    Rejected(String),
}

/// A push payload that matched none of the accepted shapes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("malformed payload on {topic}: {reason}")]
    Malformed { topic: Topic, reason: String },
}
