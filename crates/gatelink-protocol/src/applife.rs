//! App-life records: the session channel's handshake, kick arbitration,
//! and the join/leave-game sub-protocol.

use serde::{Deserialize, Serialize};

use crate::GameId;

// ---------------------------------------------------------------------------
// Handshake and kick arbitration
// ---------------------------------------------------------------------------

/// The app-life service's answer to a connect or reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionResult {
    Success,
    /// The account is live on another device; the user must decide whether
    /// to kick that session.
    WaitBackKick,
    /// Any other backend refusal.
    Rejected { code: i32 },
}

impl ConnectionResult {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Outcome of asking the backend to kick the other session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KickResult {
    Success,
    Failed { code: i32 },
}

impl KickResult {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// The user record fetched once the app-life channel is up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub account_id: u64,
    pub nickname: String,
    pub balance: f64,
}

// ---------------------------------------------------------------------------
// Join / leave game
// ---------------------------------------------------------------------------

/// How a joined game is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    WebSocket,
    Http,
}

impl ConnectionType {
    pub fn is_http(self) -> bool {
        matches!(self, Self::Http)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinResult {
    Success,
    Failed(i32),
}

/// Answer to a [`JoinGameRequest`].
///
/// When `conn_type` is set, `uri` is a path relative to the game endpoint
/// and the session rewrites it into a full URL before handing it over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGameAck {
    pub game_id: GameId,
    pub theme_id: u32,
    pub result: JoinResult,
    pub conn_type: Option<ConnectionType>,
    pub uri: String,
}

/// Why a game session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveResult {
    Success,
    Expelled,
    Maintenance,
    Idle,
    Failed(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveGameAck {
    pub game_id: GameId,
    pub theme_id: u32,
    pub result: LeaveResult,
}

/// Server-initiated leave or expel notice for the active game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameNotice {
    pub game_id: GameId,
    pub reason: LeaveResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeType {
    #[default]
    Slot,
    Fishing,
    Table,
    Arcade,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinReason {
    #[default]
    Default,
    Reconnect,
    Switch,
}

/// Outbound request to enter a game, sent on the app-life channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinGameRequest {
    pub theme_name: String,
    pub game_id: GameId,
    pub theme_type: ThemeType,
    pub reason: JoinReason,
    pub client_version: String,
}

/// Outbound request to leave the active game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveGameRequest {
    pub game_id: GameId,
    pub theme_id: u32,
}
