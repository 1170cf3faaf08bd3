//! Wire vocabulary for Gatelink.
//!
//! This crate defines everything the session core and the service handles
//! agree on:
//!
//! - **Identifiers** ([`ServiceType`], [`GameId`]): which backend endpoint
//!   or game channel a handle or a frame belongs to.
//! - **Close codes** ([`CloseReason`]): the 4300–4998 range each terminal
//!   step closes its service with, so server logs can tell failures apart.
//! - **Records**: login ([`LoginAck`], [`Vendor`]) and app-life
//!   ([`ConnectionResult`], [`JoinGameAck`], ...) payloads.
//! - **Frames** ([`Command`], [`AppLifeMessage`]): a raw `(kind, bytes)`
//!   frame and its decoded, strongly-typed form.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how payloads become bytes.
//!
//! # Architecture
//!
//! ```text
//! Service handle (bytes) → Protocol (Command → AppLifeMessage) → Session (routing)
//! ```

mod applife;
mod close;
mod codec;
mod command;
mod error;
mod ids;
mod login;

pub use applife::{
    ConnectionResult, ConnectionType, GameNotice, JoinGameAck, JoinGameRequest,
    JoinReason, JoinResult, KickResult, LeaveGameAck, LeaveGameRequest,
    LeaveResult, ThemeType, UserInfo,
};
pub use close::CloseReason;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{AppLifeMessage, Command, s2u, u2s};
pub use error::ProtocolError;
pub use ids::{GameId, ServiceType};
pub use login::{AuthHeaders, LoginAck, Permission, Vendor};
