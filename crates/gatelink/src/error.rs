//! Unified error type for the Gatelink crates.

use gatelink_protocol::ProtocolError;
use gatelink_service::ServiceError;
use gatelink_session::SessionError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each wrapped variant lets `?` convert sub-crate errors
/// without a `map_err`.
#[derive(Debug, thiserror::Error)]
pub enum GatelinkError {
    /// Encoding or decoding an app-life payload failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A service handle failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The session machine refused an operation.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The session driver is gone (shut down, or its future was dropped).
    #[error("session driver stopped")]
    DriverStopped,
}
