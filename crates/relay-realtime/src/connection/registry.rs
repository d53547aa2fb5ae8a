//! Connection registry: the set of connections eligible for broadcasts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::RealtimeError;
use crate::message::types::OutboundMessage;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe, capacity-bounded registry of live connections.
///
/// Map locks are held only for insertion, removal, or while copying a
/// snapshot; never while anything is sent to a peer.
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// Connection ID → connection handle.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Last identifier handed out.
    last_id: AtomicU64,
    /// Slots taken, including registrations still in flight.
    occupied: AtomicUsize,
    /// Maximum number of registered connections.
    capacity: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry holding at most `capacity` connections.
    pub fn new(capacity: usize) -> Self {
        Self {
            by_id: DashMap::new(),
            last_id: AtomicU64::new(0),
            occupied: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Registers a new connection that delivers through `sender`.
    ///
    /// Fails with [`RealtimeError::CapacityExceeded`] when full; nothing is
    /// registered in that case.
    pub fn register(
        &self,
        sender: mpsc::Sender<OutboundMessage>,
    ) -> Result<Arc<ConnectionHandle>, RealtimeError> {
        let capacity = self.capacity;
        self.occupied
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then_some(n + 1)
            })
            .map_err(|_| RealtimeError::CapacityExceeded { capacity })?;

        let id = ConnectionId::from_raw(self.last_id.fetch_add(1, Ordering::Relaxed) + 1);
        let handle = Arc::new(ConnectionHandle::new(id, sender));
        self.by_id.insert(id, Arc::clone(&handle));

        Ok(handle)
    }

    /// Removes a connection and marks it closed.
    ///
    /// Returns `None` if it was already gone, so racing close and error
    /// paths can both call this safely.
    pub fn deregister(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        self.occupied.fetch_sub(1, Ordering::AcqRel);
        handle.mark_closed();
        Some(handle)
    }

    /// Whether `conn_id` is currently registered.
    pub fn contains(&self, conn_id: &ConnectionId) -> bool {
        self.by_id.contains_key(conn_id)
    }

    /// Copies the registered connections, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        let mut connections: Vec<Arc<ConnectionHandle>> = self
            .by_id
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        connections.sort_by_key(|conn| conn.id);
        connections
    }

    /// Visits every registered connection in registration order.
    ///
    /// Works on a snapshot; connections deregistered after the snapshot was
    /// taken are skipped.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&ConnectionHandle),
    {
        for conn in self.snapshot() {
            if conn.is_alive() {
                visitor(&conn);
            }
        }
    }

    /// Returns the number of registered connections.
    pub fn count(&self) -> usize {
        self.by_id.len()
    }

    /// Whether a registration attempted now would fit.
    ///
    /// Advisory only; [`ConnectionRegistry::register`] makes the binding decision.
    pub fn has_capacity(&self) -> bool {
        self.occupied.load(Ordering::Acquire) < self.capacity
    }

    /// Returns the configured maximum.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Removes and closes every connection.
    pub fn drain(&self) -> Vec<Arc<ConnectionHandle>> {
        let ids: Vec<ConnectionId> = self.by_id.iter().map(|entry| *entry.key()).collect();
        ids.iter().filter_map(|id| self.deregister(id)).collect()
    }
}
