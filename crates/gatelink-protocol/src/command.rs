//! Frames on the multiplexed app-life channel.
//!
//! Every frame the backend pushes carries a numeric `kind` and an opaque
//! byte payload. A handful of kinds belong to the session itself (join and
//! leave acks, game notices); every other kind names the service type or
//! game id the frame should be forwarded to.
//!
//! Instead of parsing `content` ad hoc wherever it is needed, the session
//! calls [`AppLifeMessage::decode`] once. After that point the payload is a
//! typed record or an untouched [`Command`] on its way to a sub-service.

use serde::{Deserialize, Serialize};

use crate::{Codec, GameNotice, JoinGameAck, LeaveGameAck, ProtocolError};

/// Server → user frame kinds.
///
/// Kinds below 100 are reserved for app-life itself so they never collide
/// with a `ServiceType` (200+) or a `GameId` used as a routing key.
pub mod s2u {
    pub const ACK_CONNECT: u32 = 1;
    pub const ACK_USER_INFO: u32 = 2;
    pub const ACK_BACK_KICKED: u32 = 3;
    pub const NOTIFY_BACK_KICK: u32 = 4;
    pub const ACK_KEEPALIVE: u32 = 5;
    pub const ACK_JOIN_GAME: u32 = 10;
    pub const ACK_LEAVE_GAME: u32 = 11;
    pub const NOTIFY_LEAVE_GAME: u32 = 12;
    pub const EXPEL_GAME: u32 = 13;
}

/// User → server frame kinds.
pub mod u2s {
    pub const REQ_USER_INFO: u32 = 2;
    pub const REQ_BACK_KICKED: u32 = 3;
    pub const REQ_KEEPALIVE: u32 = 5;
    pub const REQ_LOGOUT: u32 = 6;
    pub const REQ_JOIN_GAME: u32 = 10;
    pub const REQ_LEAVE_GAME: u32 = 11;
}

/// A raw frame: a routing `kind` plus codec-encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: u32,
    pub content: Vec<u8>,
}

impl Command {
    pub fn new(kind: u32, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// A decoded app-life frame.
///
/// The four session-level kinds are decoded into their records; anything
/// else stays a [`Command`] and is routed by its `kind`.
#[derive(Debug, Clone, PartialEq)]
pub enum AppLifeMessage {
    JoinGameAck(JoinGameAck),
    LeaveGameAck(LeaveGameAck),
    NotifyLeaveGame(GameNotice),
    ExpelGame(GameNotice),
    Forward(Command),
}

impl AppLifeMessage {
    /// Decodes `command` with `codec`.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` when a session-level kind carries a
    /// payload that doesn't match its record. Forwarded kinds never fail.
    pub fn decode<C: Codec>(command: Command, codec: &C) -> Result<Self, ProtocolError> {
        let message = match command.kind {
            s2u::ACK_JOIN_GAME => Self::JoinGameAck(codec.decode(&command.content)?),
            s2u::ACK_LEAVE_GAME => Self::LeaveGameAck(codec.decode(&command.content)?),
            s2u::NOTIFY_LEAVE_GAME => Self::NotifyLeaveGame(codec.decode(&command.content)?),
            s2u::EXPEL_GAME => Self::ExpelGame(codec.decode(&command.content)?),
            _ => Self::Forward(command),
        };
        Ok(message)
    }
}
