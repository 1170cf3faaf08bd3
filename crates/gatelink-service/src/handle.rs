//! [`ServiceHandle`]: one pool slot, whichever contract it fulfils.

use std::fmt;
use std::time::Duration;

use crate::{AppLifeService, GameService, LoginService, Service, ServiceError, ServiceStatus, SocketError};

/// A boxed service handle tagged with the contract it implements.
///
/// Pools store handles of every flavour side by side. The tag lets the
/// session reach the extended surface (`login`, `connect_result`,
/// `on_joined`, ...) with a `match` instead of a downcast, and the common
/// [`Service`] methods are forwarded below for every variant.
pub enum ServiceHandle {
    Login(Box<dyn LoginService>),
    AppLife(Box<dyn AppLifeService>),
    General(Box<dyn Service>),
    Game(Box<dyn GameService>),
}

/// Runs `$body` with `$s` bound to the inner box, whatever the variant.
macro_rules! dispatch {
    ($handle:expr, $s:ident => $body:expr) => {
        match $handle {
            ServiceHandle::Login($s) => $body,
            ServiceHandle::AppLife($s) => $body,
            ServiceHandle::General($s) => $body,
            ServiceHandle::Game($s) => $body,
        }
    };
}

impl ServiceHandle {
    pub fn id(&self) -> u32 {
        dispatch!(self, s => s.id())
    }

    pub fn is_connected(&self) -> bool {
        dispatch!(self, s => s.is_connected())
    }

    pub fn status(&self) -> ServiceStatus {
        dispatch!(self, s => s.status())
    }

    pub fn url(&self) -> &str {
        dispatch!(self, s => s.url())
    }

    pub fn is_auto_managed(&self) -> bool {
        dispatch!(self, s => s.is_auto_managed())
    }

    /// # Errors
    /// Whatever the handle's own pump reports.
    pub fn main_process(&mut self, dt: Duration) -> Result<(), ServiceError> {
        dispatch!(self, s => s.main_process(dt))
    }

    pub fn connect(&mut self, url: &str) -> bool {
        dispatch!(self, s => s.connect(url))
    }

    pub fn reconnect(&mut self) -> bool {
        dispatch!(self, s => s.reconnect())
    }

    pub fn close(&mut self, code: u16) -> bool {
        dispatch!(self, s => s.close(code))
    }

    pub fn destroy(&mut self) {
        dispatch!(self, s => s.destroy())
    }

    pub fn send_command(&mut self, kind: u32, content: Vec<u8>) -> bool {
        dispatch!(self, s => s.send_command(kind, content))
    }

    pub fn close_code(&self) -> Option<u16> {
        dispatch!(self, s => s.close_code())
    }

    pub fn socket_error(&self) -> Option<&SocketError> {
        dispatch!(self, s => s.socket_error())
    }

    pub fn on_redirect_message(&mut self, content: &[u8]) {
        dispatch!(self, s => s.on_redirect_message(content))
    }

    // -- Extended surfaces --

    pub fn as_login(&self) -> Option<&dyn LoginService> {
        match self {
            Self::Login(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_login_mut(&mut self) -> Option<&mut dyn LoginService> {
        match self {
            Self::Login(s) => Some(s.as_mut()),
            _ => None,
        }
    }

    pub fn as_app_life(&self) -> Option<&dyn AppLifeService> {
        match self {
            Self::AppLife(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_app_life_mut(&mut self) -> Option<&mut dyn AppLifeService> {
        match self {
            Self::AppLife(s) => Some(s.as_mut()),
            _ => None,
        }
    }

    pub fn as_game_mut(&mut self) -> Option<&mut dyn GameService> {
        match self {
            Self::Game(s) => Some(s.as_mut()),
            _ => None,
        }
    }

    /// Short name of the contract, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::AppLife(_) => "app-life",
            Self::General(_) => "general",
            Self::Game(_) => "game",
        }
    }
}

impl fmt::Debug for ServiceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceHandle")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .field("status", &self.status())
            .field("url", &self.url())
            .finish()
    }
}
