//! Typed channels a handle uses to talk back to the session.
//!
//! A handle never holds a reference to the `Connection` that owns it.
//! Instead it gets one narrow, single-purpose link per thing it may need:
//!
//! - [`ServiceLinks`]: push unhandled inbound frames, read the cached
//!   auth headers. Every handle gets one.
//! - [`GameLinks`]: queue join/leave requests for the app-life channel.
//!   Only game handles get one.
//!
//! Both are plain `tokio::sync` channel ends, so a handle whose transport
//! runs on another task can still hold and use them.

use tokio::sync::{mpsc, watch};

use gatelink_protocol::{AuthHeaders, Command, JoinGameRequest, LeaveGameRequest};

/// A frame a handle received but does not handle itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    /// Id of the handle that received it.
    pub source: u32,
    pub command: Command,
}

/// An outbound game request waiting to be encoded and sent on app-life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameRequest {
    Join(JoinGameRequest),
    Leave(LeaveGameRequest),
}

/// Links handed to every service handle at creation.
#[derive(Debug, Clone)]
pub struct ServiceLinks {
    source: u32,
    commands: mpsc::UnboundedSender<InboundCommand>,
    headers: watch::Receiver<Option<AuthHeaders>>,
}

impl ServiceLinks {
    pub fn new(
        source: u32,
        commands: mpsc::UnboundedSender<InboundCommand>,
        headers: watch::Receiver<Option<AuthHeaders>>,
    ) -> Self {
        Self {
            source,
            commands,
            headers,
        }
    }

    /// The id frames pushed through this link are tagged with.
    pub fn source(&self) -> u32 {
        self.source
    }

    /// Hands a frame to the session for routing. Returns false if the
    /// session has been dropped.
    pub fn forward(&self, command: Command) -> bool {
        self.commands
            .send(InboundCommand {
                source: self.source,
                command,
            })
            .is_ok()
    }

    /// The auth headers of the current login, if one has completed.
    pub fn auth_headers(&self) -> Option<AuthHeaders> {
        self.headers.borrow().clone()
    }
}

/// Links handed to game handles in addition to [`ServiceLinks`].
#[derive(Debug, Clone)]
pub struct GameLinks {
    requests: mpsc::UnboundedSender<GameRequest>,
}

impl GameLinks {
    pub fn new(requests: mpsc::UnboundedSender<GameRequest>) -> Self {
        Self { requests }
    }

    /// Queues a join request. It goes out on the session's next flush.
    pub fn request_join(&self, request: JoinGameRequest) -> bool {
        self.requests.send(GameRequest::Join(request)).is_ok()
    }

    pub fn request_leave(&self, request: LeaveGameRequest) -> bool {
        self.requests.send(GameRequest::Leave(request)).is_ok()
    }
}
