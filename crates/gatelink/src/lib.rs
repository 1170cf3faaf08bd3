//! # Gatelink
//!
//! Client-side session core for casino game backends.
//!
//! Gatelink takes a client from credentials to a live session and keeps it
//! there: login over HTTP, the long-lived app-life channel, arbitration
//! when the account is already online elsewhere, reconnect after the
//! channel drops, and the join/leave sub-protocol of game sessions. The
//! transports themselves are yours: implement the handle traits from
//! [`gatelink_service`] and register them in a
//! [`ServiceCatalog`](gatelink_session::ServiceCatalog).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatelink::prelude::*;
//!
//! let mut conn = Connection::new(services, games);
//! conn.init("gw.example.com");
//! let (actor, handle) = SessionActor::new(conn, FrameConfig::default());
//! tokio::join!(actor.run(), async move {
//!     handle.login(Vendor::Guest { device_id: "abc".into() }).await?;
//!     handle.wait_for_step(|s| s == Step::AppLifeDidAccess).await
//! });
//! ```

mod driver;
mod error;
mod telemetry;

pub use driver::{SessionActor, SessionHandle};
pub use error::GatelinkError;
pub use telemetry::{DEFAULT_FILTER, init_tracing};

pub use gatelink_protocol as protocol;
pub use gatelink_service as service;
pub use gatelink_session as session;
pub use gatelink_state as state;
pub use gatelink_tick as tick;

pub mod prelude {
    pub use crate::{GatelinkError, SessionActor, SessionHandle, init_tracing};
    pub use gatelink_protocol::{
        AuthHeaders, CloseReason, Codec, Command, ConnectionResult, GameId, JsonCodec,
        KickResult, LoginAck, Permission, ServiceType, UserInfo, Vendor,
    };
    pub use gatelink_service::{
        AppLifeService, GameLinks, GameRequest, GameService, LoginService, PoolKind, Service,
        ServiceError, ServiceHandle, ServiceLinks, ServiceStatus, SocketError,
    };
    pub use gatelink_session::{
        Connection, ConnectionConfig, EndpointOverride, GameCatalog, Platform, ServiceCatalog,
        ServiceConfig, SessionError, Step,
    };
    pub use gatelink_state::{FiniteState, StateManager};
    pub use gatelink_tick::{FrameConfig, FramePacer, FramePolicy};
}
