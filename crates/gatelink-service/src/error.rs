//! Error types for service handles.

/// Errors a service handle can report from its per-tick pump.
///
/// The pool never propagates these: a failing handle is logged and its
/// siblings keep running.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The underlying socket or HTTP client failed.
    #[error("transport failure on {service}: {reason}")]
    Transport { service: u32, reason: String },

    /// A frame couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] gatelink_protocol::ProtocolError),

    /// The handle was asked to do I/O before it connected.
    #[error("service {0} is not connected")]
    NotConnected(u32),

    /// Anything else the handle wants the log to see.
    #[error("service fault: {0}")]
    Fault(String),
}
