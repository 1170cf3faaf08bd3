//! Error types for the session layer.

use gatelink_protocol::{GameId, ServiceType};

/// Errors raised inside the session machine.
///
/// `Connection::main_process` never returns these. They are logged where
/// they happen and the tick carries on; the public methods that can fail
/// return them so callers can tell refusals apart.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The catalog has no entry for a service the machine needs.
    #[error("no catalog entry for {0}")]
    UnknownService(ServiceType),

    /// A catalog creator returned a handle of the wrong flavour.
    #[error("{service} was created as a {found} handle, expected {expected}")]
    WrongHandleKind {
        service: ServiceType,
        expected: &'static str,
        found: &'static str,
    },

    /// An operation needs the app-life service and there is none.
    #[error("app-life service is not running")]
    MissingAppLife,

    /// The app-life handle would not take an outbound frame.
    #[error("app-life refused frame kind {0}")]
    SendRefused(u32),

    /// The join request for a game never left the session, so no ack will
    /// come. The handle has been dropped from the pending pool.
    #[error("join request for {0} was not sent")]
    JoinNotSent(GameId),

    /// Only one game may be active at a time.
    #[error("a game is already active, {0} not joined")]
    GameAlreadyActive(GameId),

    /// Kick decisions are only taken while the machine is waiting for one.
    #[error("no kick decision is pending")]
    NoKickPending,

    /// Reconnect was asked for outside `APPLIFE_DISCONNECT`, after a kick
    /// by another device, or after a logout.
    #[error("reconnect not allowed now")]
    ReconnectRefused,

    /// An endpoint URL couldn't be built from the configured base.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    /// A frame on the app-life channel couldn't be decoded or encoded.
    #[error(transparent)]
    Protocol(#[from] gatelink_protocol::ProtocolError),
}
