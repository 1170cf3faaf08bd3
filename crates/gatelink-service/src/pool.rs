//! [`ServicePool`]: an insertion-ordered registry of live handles.
//!
//! # Concurrency note
//!
//! Like every other piece of the session core, a pool is owned and
//! mutated by one logical thread (the tick loop). It uses a plain
//! `HashMap` and takes `&mut self`; nothing here locks.

use std::collections::HashMap;
use std::time::Duration;

use crate::ServiceHandle;

/// Keyed handles, iterated in insertion order.
///
/// Keys are raw `u32`s so the same pool type can hold service handles
/// (keyed by `ServiceType`) and game handles (keyed by `GameId`).
///
/// ## Invariant
///
/// A key maps to at most one handle. [`add`](Self::add) refuses a key that
/// is already present instead of replacing the live handle.
pub struct ServicePool {
    name: &'static str,
    /// Insertion order of the keys in `handles`. Always kept in sync.
    order: Vec<u32>,
    handles: HashMap<u32, ServiceHandle>,
    /// Persistent pools survive [`reset`](Self::reset).
    persistent: bool,
}

impl ServicePool {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            order: Vec::new(),
            handles: HashMap::new(),
            persistent: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Marks the pool persistent: `reset` leaves its handles alone.
    pub fn persist(&mut self) {
        self.persistent = true;
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Inserts `handle` under `key`.
    ///
    /// Returns false, dropping `handle`, if the key is already taken.
    pub fn add(&mut self, key: u32, handle: ServiceHandle) -> bool {
        if self.handles.contains_key(&key) {
            tracing::warn!(pool = self.name, key, "key already present, handle not added");
            return false;
        }
        self.order.push(key);
        self.handles.insert(key, handle);
        true
    }

    pub fn get(&self, key: u32) -> Option<&ServiceHandle> {
        self.handles.get(&key)
    }

    pub fn get_mut(&mut self, key: u32) -> Option<&mut ServiceHandle> {
        self.handles.get_mut(&key)
    }

    pub fn has(&self, key: u32) -> bool {
        self.handles.contains_key(&key)
    }

    /// Removes and returns the handle. The caller owns its teardown.
    pub fn delete(&mut self, key: u32) -> Option<ServiceHandle> {
        let handle = self.handles.remove(&key)?;
        self.order.retain(|k| *k != key);
        Some(handle)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> &[u32] {
        &self.order
    }

    /// Pumps every handle once.
    ///
    /// A handle whose `main_process` fails is logged and skipped; the
    /// remaining handles still run this tick.
    pub fn process(&mut self, dt: Duration) {
        for key in &self.order {
            let Some(handle) = self.handles.get_mut(key) else {
                continue;
            };
            if let Err(e) = handle.main_process(dt) {
                tracing::error!(pool = self.name, key, error = %e, "service process failed");
            }
        }
    }

    /// Destroys and drops every handle, unless the pool is persistent.
    pub fn reset(&mut self) {
        if self.persistent {
            return;
        }
        self.clear();
    }

    /// Destroys and drops every handle, persistent or not.
    pub fn clear(&mut self) {
        for key in self.order.drain(..) {
            if let Some(mut handle) = self.handles.remove(&key) {
                handle.destroy();
            }
        }
        self.handles.clear();
    }

    /// Closes every auto-managed handle with `code`.
    ///
    /// Every handle is attempted even after one fails; the result is
    /// false if any of them returned false.
    pub fn close(&mut self, code: u16) -> bool {
        self.sweep(|h| h.close(code))
    }

    /// Reconnects every auto-managed handle. Same aggregation as `close`.
    pub fn reconnect(&mut self) -> bool {
        self.sweep(ServiceHandle::reconnect)
    }

    fn sweep(&mut self, mut op: impl FnMut(&mut ServiceHandle) -> bool) -> bool {
        let mut all_ok = true;
        for key in &self.order {
            if let Some(handle) = self.handles.get_mut(key) {
                if handle.is_auto_managed() {
                    // `&` not `&&`: the call must run for every handle.
                    all_ok &= op(handle);
                }
            }
        }
        all_ok
    }

    /// One line per handle, for logs.
    pub fn dump(&self) -> String {
        self.order
            .iter()
            .filter_map(|key| self.handles.get(key).map(|h| (key, h)))
            .map(|(key, h)| format!("{}[{key}] {h:?}", self.name))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Drop for ServicePool {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for ServicePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePool")
            .field("name", &self.name)
            .field("keys", &self.order)
            .field("persistent", &self.persistent)
            .finish()
    }
}
