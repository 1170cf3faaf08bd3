//! Session configuration: timing knobs and the service/game catalogs.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use gatelink_protocol::{GameId, ServiceType};
use gatelink_service::{GameLinks, GameService, ServiceHandle, ServiceLinks};

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Timeouts and retry policy for the session machine.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long LOGIN, APPLIFE_CONNECT and APPLIFE_CONNECTED may wait for
    /// an answer. Zero disables the timeout.
    pub stage_timeout: Duration,
    /// Back-off spent in a `*_WAIT_RETRY` step before trying again.
    pub wait_retry: Duration,
    /// How long the backend gets to kick the other session.
    pub kick_timeout: Duration,
    /// Timeouts tolerated per stage before giving up. With the default of
    /// 0 the first timeout is already fatal.
    pub retry_limit: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_millis(5_000),
            wait_retry: Duration::from_millis(100),
            kick_timeout: Duration::from_millis(10_000),
            retry_limit: 0,
        }
    }
}

impl ConnectionConfig {
    /// Shortest back-off accepted by [`validated`](Self::validated).
    pub const MIN_WAIT_RETRY: Duration = Duration::from_millis(1);

    /// Fixes values the machine can't work with.
    ///
    /// A `*_WAIT_RETRY` step only leaves on timeout, so a zero `wait_retry`
    /// would park the machine forever; it is raised to
    /// [`Self::MIN_WAIT_RETRY`].
    pub fn validated(mut self) -> Self {
        if self.wait_retry < Self::MIN_WAIT_RETRY {
            tracing::warn!(
                wait_retry = ?self.wait_retry,
                "wait_retry below minimum, clamping"
            );
            self.wait_retry = Self::MIN_WAIT_RETRY;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Service catalog
// ---------------------------------------------------------------------------

/// Builds a service handle for a catalog entry.
pub type ServiceCreator = Box<dyn Fn(ServiceType, ServiceLinks) -> ServiceHandle>;

/// Builds a game handle when a join is requested.
pub type GameCreator = Box<dyn Fn(GameId, ServiceLinks, GameLinks) -> Box<dyn GameService>>;

/// How one singleton service is built and reached.
pub struct ServiceConfig {
    pub creator: ServiceCreator,
    /// HTTP-backed (`http(s)://`) rather than a persistent socket (`ws(s)://`).
    pub is_http: bool,
    /// Replaces the base URL when non-empty.
    pub test_url: Option<String>,
    /// Use `test_url` verbatim: no `/service/{id}` and no `/client`.
    pub test_full_custom_path: bool,
    /// RESTful API service: created by `init` into the persistent pool.
    pub api: bool,
}

impl ServiceConfig {
    /// A socket service built by `creator`.
    pub fn new(creator: impl Fn(ServiceType, ServiceLinks) -> ServiceHandle + 'static) -> Self {
        Self {
            creator: Box::new(creator),
            is_http: false,
            test_url: None,
            test_full_custom_path: false,
            api: false,
        }
    }

    pub fn http(mut self) -> Self {
        self.is_http = true;
        self
    }

    /// Marks the entry as an HTTP API service.
    pub fn api(mut self) -> Self {
        self.is_http = true;
        self.api = true;
        self
    }

    pub fn test_url(mut self, url: impl Into<String>, full_custom_path: bool) -> Self {
        self.test_url = Some(url.into());
        self.test_full_custom_path = full_custom_path;
        self
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("is_http", &self.is_http)
            .field("test_url", &self.test_url)
            .field("test_full_custom_path", &self.test_full_custom_path)
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

/// Every singleton service the session may create, in creation order.
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    entries: Vec<(ServiceType, ServiceConfig)>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, service: ServiceType, config: ServiceConfig) -> Self {
        self.insert(service, config);
        self
    }

    /// Adds or replaces an entry. A replaced entry keeps its position.
    pub fn insert(&mut self, service: ServiceType, config: ServiceConfig) {
        match self.entries.iter_mut().find(|(s, _)| *s == service) {
            Some(entry) => entry.1 = config,
            None => self.entries.push((service, config)),
        }
    }

    pub fn get(&self, service: ServiceType) -> Option<&ServiceConfig> {
        self.entries.iter().find(|(s, _)| *s == service).map(|(_, c)| c)
    }

    pub fn contains(&self, service: ServiceType) -> bool {
        self.get(service).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ServiceType, &ServiceConfig)> {
        self.entries.iter().map(|(s, c)| (*s, c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Game catalog
// ---------------------------------------------------------------------------

/// Per-game endpoint override used when composing the join URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverride {
    pub test_url: Option<String>,
    pub test_full_custom_path: bool,
}

/// Builds game handles and knows each game's endpoint overrides.
pub struct GameCatalog {
    creator: GameCreator,
    overrides: HashMap<GameId, EndpointOverride>,
}

impl GameCatalog {
    pub fn new(
        creator: impl Fn(GameId, ServiceLinks, GameLinks) -> Box<dyn GameService> + 'static,
    ) -> Self {
        Self {
            creator: Box::new(creator),
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, game: GameId, endpoint: EndpointOverride) -> Self {
        self.overrides.insert(game, endpoint);
        self
    }

    /// The override for `game`, or an empty one.
    pub fn endpoint(&self, game: GameId) -> EndpointOverride {
        self.overrides.get(&game).cloned().unwrap_or_default()
    }

    pub fn create(&self, game: GameId, links: ServiceLinks, game_links: GameLinks) -> Box<dyn GameService> {
        (self.creator)(game, links, game_links)
    }
}

impl fmt::Debug for GameCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameCatalog")
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}
