//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding frames.
///
/// Each crate in Gatelink defines its own error enum; a `ProtocolError`
/// always means "the bytes were wrong", never "the network was down".
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed content, missing fields, or the
    /// frame's `kind` promised a payload the bytes don't contain.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame decoded fine but violates a protocol rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
