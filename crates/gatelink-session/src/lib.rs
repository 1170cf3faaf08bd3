//! The Gatelink session state machine.
//!
//! [`Connection`] takes a client from credentials to a live session:
//! login, app-life handshake, kick arbitration when the account is already
//! online elsewhere, and reconnect after the channel drops. It also routes
//! inbound app-life frames to services and games and runs the join/leave
//! game sub-protocol.
//!
//! The machine is single-threaded and tick-driven. Call
//! [`Connection::main_process`] once per frame with the frame's `dt`:
//!
//! ```rust,ignore
//! let mut conn = Connection::new(services, games);
//! conn.init("gw.example.com");
//! conn.login(Vendor::Guest { device_id: "abc".into() });
//! loop {
//!     conn.main_process(dt);
//!     if conn.is_connected() { break; }
//! }
//! ```

mod config;
mod connection;
mod error;
mod platform;
mod step;
pub mod url;

pub use config::{
    ConnectionConfig, EndpointOverride, GameCatalog, GameCreator, ServiceCatalog, ServiceConfig,
    ServiceCreator,
};
pub use connection::Connection;
pub use error::SessionError;
pub use platform::{NetworkProbe, Platform};
pub use step::Step;
