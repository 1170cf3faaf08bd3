//! Service handles and pools for Gatelink.
//!
//! The session machine talks to the network only through handles that
//! implement the traits in this crate. The host application provides the
//! implementations (WebSocket, HTTP, in-memory mocks...). This crate
//! provides:
//!
//! - [`Service`], [`LoginService`], [`AppLifeService`], [`GameService`]:
//!   the synchronous contracts the session polls each tick.
//! - [`ServiceHandle`]: a boxed handle tagged with the contract it fulfils.
//! - [`ServiceLinks`] / [`GameLinks`]: typed channels back to the session.
//! - [`ServicePool`] / [`ServicePoolManager`]: keyed, insertion-ordered
//!   registries with bulk `process` / `close` / `reconnect` / `reset`.

mod error;
mod handle;
mod links;
mod manager;
mod pool;
mod service;

pub use error::ServiceError;
pub use handle::ServiceHandle;
pub use links::{GameLinks, GameRequest, InboundCommand, ServiceLinks};
pub use manager::{PoolKind, ServicePoolManager};
pub use pool::ServicePool;
pub use service::{
    AppLifeService, GameService, LoginService, Service, ServiceStatus, SocketError,
};
