//! Where the client runs, and how it learns the network is back.

use std::fmt;

/// Reports device connectivity on native builds.
pub trait NetworkProbe {
    fn has_network(&self) -> bool;
}

impl<F: Fn() -> bool> NetworkProbe for F {
    fn has_network(&self) -> bool {
        self()
    }
}

/// The runtime the session is hosted in.
///
/// Decides what `APPLIFE_WAIT_RECONNECT` waits for: on the web the browser
/// owns connectivity and only a simulated flight mode can hold the
/// reconnect back; natively the injected probe must report a network.
#[derive(Default)]
pub enum Platform {
    #[default]
    Web,
    Native(Box<dyn NetworkProbe>),
}

impl Platform {
    pub fn native(probe: impl NetworkProbe + 'static) -> Self {
        Self::Native(Box::new(probe))
    }

    pub fn is_web(&self) -> bool {
        matches!(self, Self::Web)
    }
}

impl fmt::Debug for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Web => f.write_str("Web"),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}
