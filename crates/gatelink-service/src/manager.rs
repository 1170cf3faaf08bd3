//! [`ServicePoolManager`]: the four named pools a session owns.

use std::fmt;
use std::time::Duration;

use crate::{ServiceHandle, ServicePool};

/// Which pool a handle lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Singleton services created once the session is up (lobby, VIP, ...).
    Service,
    /// RESTful API services. Persistent: they survive `reset`.
    ApiService,
    /// The active game.
    Game,
    /// A game between `join` and its ack.
    GamePending,
}

impl PoolKind {
    pub const ALL: [Self; 4] = [Self::Service, Self::ApiService, Self::Game, Self::GamePending];

    fn index(self) -> usize {
        match self {
            Self::Service => 0,
            Self::ApiService => 1,
            Self::Game => 2,
            Self::GamePending => 3,
        }
    }

    /// Service and API pools get a `/service/{id}` URL segment.
    pub fn is_service(self) -> bool {
        matches!(self, Self::Service | Self::ApiService)
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Service => "service",
            Self::ApiService => "api-service",
            Self::Game => "game",
            Self::GamePending => "game-pending",
        };
        f.write_str(s)
    }
}

/// Fans pool operations out over the four [`PoolKind`]s, in declaration
/// order.
#[derive(Debug)]
pub struct ServicePoolManager {
    pools: [ServicePool; 4],
}

impl ServicePoolManager {
    pub fn new() -> Self {
        let mut api = ServicePool::new("api-service");
        api.persist();
        Self {
            pools: [
                ServicePool::new("service"),
                api,
                ServicePool::new("game"),
                ServicePool::new("game-pending"),
            ],
        }
    }

    pub fn select(&self, kind: PoolKind) -> &ServicePool {
        &self.pools[kind.index()]
    }

    pub fn select_mut(&mut self, kind: PoolKind) -> &mut ServicePool {
        &mut self.pools[kind.index()]
    }

    pub fn add_to(&mut self, kind: PoolKind, key: u32, handle: ServiceHandle) -> bool {
        self.select_mut(kind).add(key, handle)
    }

    pub fn get_from(&self, kind: PoolKind, key: u32) -> Option<&ServiceHandle> {
        self.select(kind).get(key)
    }

    pub fn get_from_mut(&mut self, kind: PoolKind, key: u32) -> Option<&mut ServiceHandle> {
        self.select_mut(kind).get_mut(key)
    }

    pub fn delete_from(&mut self, kind: PoolKind, key: u32) -> Option<ServiceHandle> {
        self.select_mut(kind).delete(key)
    }

    pub fn has(&self, kind: PoolKind, key: u32) -> bool {
        self.select(kind).has(key)
    }

    pub fn len(&self, kind: PoolKind) -> usize {
        self.select(kind).len()
    }

    pub fn dump(&self, kind: PoolKind) -> String {
        self.select(kind).dump()
    }

    pub fn process(&mut self, dt: Duration) {
        for pool in &mut self.pools {
            pool.process(dt);
        }
    }

    /// Resets every non-persistent pool.
    pub fn reset(&mut self) {
        for pool in &mut self.pools {
            pool.reset();
        }
    }

    /// Closes auto-managed handles in every pool. False if any close failed.
    pub fn close(&mut self, code: u16) -> bool {
        self.pools.iter_mut().fold(true, |ok, pool| pool.close(code) & ok)
    }

    pub fn reconnect(&mut self) -> bool {
        self.pools.iter_mut().fold(true, |ok, pool| pool.reconnect() & ok)
    }
}

impl Default for ServicePoolManager {
    fn default() -> Self {
        Self::new()
    }
}
