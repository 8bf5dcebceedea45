//! Error types for the test harness.
//!
//! Scripted-mock failures travel back to callers as [`tonic::Status`]; the
//! variants here cover the listener lifecycle and connection setup only.

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket-level failures while binding the loopback listener
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// gRPC transport layer errors
    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),

    /// Malformed endpoint URI while opening a client channel
    #[error(transparent)]
    InvalidUri(#[from] tonic::codegen::http::uri::InvalidUri),

    /// The listener was already consumed by a previous `start`
    #[error("test server can only be started once")]
    AlreadyStarted,
}
