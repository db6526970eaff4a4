use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use super::connection::{ConnectionHandle, ConnectionId};

/// Every live subscriber, plus the subset scoped to each organization.
///
/// Both views sit behind one lock, so a connection is never visible in an
/// organization set without also being in the global set. The lock is held
/// only while the sets are edited or copied, never during delivery.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    state: Arc<Mutex<RegistryState>>,
}

#[derive(Default)]
struct RegistryState {
    /// Insertion order is delivery order.
    global: Vec<ConnectionHandle>,
    organizations: HashMap<String, Vec<ConnectionHandle>>,
}

impl RegistryState {
    fn remove_from_organizations(&mut self, dead: &HashSet<ConnectionId>) {
        self.organizations.retain(|_, members| {
            members.retain(|c| !dead.contains(&c.id()));
            !members.is_empty()
        });
    }
}

/// Connection counts, for health output and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
    pub global: usize,
    pub organizations: usize,
    pub scoped: usize,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to the global set and, if given, to one
    /// organization's set.
    ///
    /// Registering the same connection twice adds it twice.
    pub async fn register(&self, connection: ConnectionHandle, org_id: Option<&str>) {
        let mut state = self.state.lock().await;
        state.global.push(connection.clone());
        if let Some(org_id) = org_id {
            state
                .organizations
                .entry(org_id.to_owned())
                .or_default()
                .push(connection.clone());
        }
        debug!(
            connection_id = %connection.id(),
            org_id = org_id.unwrap_or("-"),
            global = state.global.len(),
            "connection registered"
        );
    }

    /// Remove every entry of a connection. Unknown connections are ignored.
    ///
    /// The named organization set is checked first; if the connection is
    /// not found there, all organization sets are swept so none can keep
    /// a connection the global set no longer has.
    pub async fn unregister(&self, connection_id: ConnectionId, org_id: Option<&str>) {
        let mut state = self.state.lock().await;
        state.global.retain(|c| c.id() != connection_id);

        let mut found = false;
        if let Some(org_id) = org_id {
            if let Some(members) = state.organizations.get_mut(org_id) {
                let before = members.len();
                members.retain(|c| c.id() != connection_id);
                found = members.len() != before;
                if members.is_empty() {
                    state.organizations.remove(org_id);
                }
            }
        }
        if !found {
            state.remove_from_organizations(&HashSet::from([connection_id]));
        }
        debug!(
            connection_id = %connection_id,
            global = state.global.len(),
            "connection unregistered"
        );
    }

    /// Copy of the global set in registration order.
    pub async fn global_snapshot(&self) -> Vec<ConnectionHandle> {
        self.state.lock().await.global.clone()
    }

    /// Copy of one organization's set; empty if it has no subscribers.
    pub async fn organization_snapshot(&self, org_id: &str) -> Vec<ConnectionHandle> {
        self.state
            .lock()
            .await
            .organizations
            .get(org_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Drop dead connections from every set. Returns how many global
    /// entries were removed.
    pub(crate) async fn reap(&self, dead: &HashSet<ConnectionId>) -> usize {
        if dead.is_empty() {
            return 0;
        }
        let mut state = self.state.lock().await;
        let before = state.global.len();
        state.global.retain(|c| !dead.contains(&c.id()));
        state.remove_from_organizations(dead);
        before - state.global.len()
    }

    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.lock().await;
        RegistryStats {
            global: state.global.len(),
            organizations: state.organizations.len(),
            scoped: state.organizations.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(connections: &[ConnectionHandle]) -> Vec<ConnectionId> {
        connections.iter().map(ConnectionHandle::id).collect()
    }

    #[tokio::test]
    async fn test_register_scoped_adds_to_both_sets() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = ConnectionHandle::open(1);
        let (b, _rb) = ConnectionHandle::open(1);
        registry.register(a.clone(), Some("acme")).await;
        registry.register(b.clone(), None).await;

        assert_eq!(ids(&registry.global_snapshot().await), vec![a.id(), b.id()]);
        assert_eq!(ids(&registry.organization_snapshot("acme").await), vec![a.id()]);
        assert!(registry.organization_snapshot("globex").await.is_empty());
        assert_eq!(
            registry.stats().await,
            RegistryStats {
                global: 2,
                organizations: 1,
                scoped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_unregister_removes_from_every_set() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = ConnectionHandle::open(1);
        registry.register(a.clone(), Some("acme")).await;
        registry.unregister(a.id(), Some("acme")).await;

        assert!(registry.global_snapshot().await.is_empty());
        assert!(registry.organization_snapshot("acme").await.is_empty());
        assert_eq!(registry.stats().await, RegistryStats::default());
    }

    #[tokio::test]
    async fn test_unregister_without_org_still_clears_org_set() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = ConnectionHandle::open(1);
        registry.register(a.clone(), Some("acme")).await;
        registry.unregister(a.id(), None).await;

        assert!(registry.organization_snapshot("acme").await.is_empty());
    }

    #[tokio::test]
    async fn test_unregister_unknown_is_noop() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = ConnectionHandle::open(1);
        let (b, _rb) = ConnectionHandle::open(1);
        registry.register(a.clone(), None).await;
        registry.unregister(b.id(), Some("acme")).await;

        assert_eq!(ids(&registry.global_snapshot().await), vec![a.id()]);
    }

    #[tokio::test]
    async fn test_duplicate_register_is_not_deduplicated() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = ConnectionHandle::open(1);
        registry.register(a.clone(), None).await;
        registry.register(a.clone(), None).await;
        assert_eq!(registry.global_snapshot().await.len(), 2);

        registry.unregister(a.id(), None).await;
        assert!(registry.global_snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_reap_drops_from_both_sets() {
        let registry = ConnectionRegistry::new();
        let (a, _ra) = ConnectionHandle::open(1);
        let (b, _rb) = ConnectionHandle::open(1);
        registry.register(a.clone(), Some("acme")).await;
        registry.register(b.clone(), Some("acme")).await;

        let reaped = registry.reap(&HashSet::from([a.id()])).await;
        assert_eq!(reaped, 1);
        assert_eq!(ids(&registry.global_snapshot().await), vec![b.id()]);
        assert_eq!(ids(&registry.organization_snapshot("acme").await), vec![b.id()]);
    }
}
