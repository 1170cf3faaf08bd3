//! Codec trait and implementations for payload serialization.
//!
//! The session core never parses bytes itself. It asks a [`Codec`] to turn
//! a frame's content into a typed record exactly once, at the boundary, and
//! to turn outbound requests into bytes for the app-life channel.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes bytes back.
///
/// The methods are generic, so `Codec` is used as a type parameter
/// (`Connection<C: Codec>`), not as a trait object.
pub trait Codec: 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use gatelink_protocol::{Codec, GameId, JsonCodec, LeaveGameRequest};
///
/// let codec = JsonCodec;
/// let req = LeaveGameRequest { game_id: GameId(5001), theme_id: 7 };
/// let bytes = codec.encode(&req).unwrap();
/// let back: LeaveGameRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(req, back);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
