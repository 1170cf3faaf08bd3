//! The contracts a network service handle fulfils.
//!
//! Gatelink never opens sockets itself. Each backend endpoint (login,
//! app-life, lobby, a game channel, ...) is driven by a handle the host
//! application provides. The session machine only needs the synchronous
//! surface defined here: it pumps the handle once per tick with
//! [`Service::main_process`] and then reads getters like
//! [`AppLifeService::connect_result`] to decide whether to move on.
//! "Waiting" is always modelled as staying in the same step and checking
//! again next tick, never as a blocking call.

use std::fmt;
use std::time::Duration;

use gatelink_protocol::{
    ConnectionResult, JoinGameAck, KickResult, LeaveGameAck, LeaveResult, LoginAck,
    UserInfo, Vendor,
};

use crate::{GameRequest, ServiceError};

// ---------------------------------------------------------------------------
// Status types
// ---------------------------------------------------------------------------

/// Lifecycle of a single handle's transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceStatus {
    #[default]
    Idle,
    Connecting,
    Connected,
    Closing,
    Closed,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A transport-level failure surfaced by a handle.
///
/// Once a handle reports one, the session machine routes to
/// `APPLIFE_SOCKET_ERROR` or `APPLIFE_DISCONNECT`; it never retries on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketError {
    /// Transport close code, e.g. 1006 for an abnormal WebSocket closure.
    pub code: u16,
    pub message: String,
}

impl SocketError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket error {}: {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Common surface of every service handle.
pub trait Service {
    /// The pool key: a `ServiceType` id or a `GameId`.
    fn id(&self) -> u32;

    fn is_connected(&self) -> bool;

    fn status(&self) -> ServiceStatus;

    /// The URL the handle was last connected to; empty before `connect`.
    fn url(&self) -> &str;

    /// Whether bulk pool `close`/`reconnect` sweeps include this handle.
    /// The app-life handle opts out; the session drives it by hand.
    fn is_auto_managed(&self) -> bool {
        true
    }

    /// Pumps the transport. Called once per tick by the owning pool.
    ///
    /// # Errors
    /// Any error is logged by the pool and otherwise ignored.
    fn main_process(&mut self, dt: Duration) -> Result<(), ServiceError>;

    fn connect(&mut self, url: &str) -> bool;

    /// Reconnects to the last URL.
    fn reconnect(&mut self) -> bool;

    /// Starts closing the transport with the given close code.
    fn close(&mut self, code: u16) -> bool;

    /// Releases everything. The handle is dropped right after.
    fn destroy(&mut self);

    fn send_command(&mut self, kind: u32, content: Vec<u8>) -> bool;

    /// The code the transport was last closed with, if any.
    fn close_code(&self) -> Option<u16>;

    fn socket_error(&self) -> Option<&SocketError>;

    /// Delivers a frame the app-life channel routed to this handle.
    fn on_redirect_message(&mut self, content: &[u8]);
}

/// The login endpoint.
pub trait LoginService: Service {
    fn login(&mut self, vendor: &Vendor);

    /// The backend's answer, once it has arrived.
    fn ack_data(&self) -> Option<&LoginAck>;
}

/// The long-lived session channel.
///
/// Its connectivity defines whether the whole session counts as connected.
pub trait AppLifeService: Service {
    /// Populated once `access_user_info` has been answered.
    fn user_info(&self) -> Option<&UserInfo>;

    fn access_user_info(&mut self);

    /// Starts the heartbeat.
    fn keep_alive(&mut self);

    fn connect_result(&self) -> Option<ConnectionResult>;

    /// Asks the backend to kick the account's other session.
    fn user_agree_to_kick(&mut self);

    fn kick_result(&self) -> Option<KickResult>;

    fn logout(&mut self);

    fn is_logout(&self) -> bool;

    /// True once another device has kicked this session.
    fn is_kicked_by_others(&self) -> bool;
}

/// A joinable game channel.
pub trait GameService: Service {
    /// Sends the join request. The ack arrives on the app-life channel.
    fn join(&mut self);

    /// Called with the join ack. `uri` is the composed game URL when the
    /// ack named a connection type. Returns false if the handle refuses.
    fn on_joined(&mut self, ack: &JoinGameAck, uri: Option<&str>) -> bool;

    fn on_left(&mut self, ack: &LeaveGameAck) -> bool;

    fn notify_leave(&mut self, reason: LeaveResult);

    fn on_expel(&mut self, reason: LeaveResult);

    /// A request this handle queued on its `GameLinks` could not be sent.
    /// For a join, the handle is dropped from the pending pool right after.
    fn on_request_failed(&mut self, _request: &GameRequest) {}
}
