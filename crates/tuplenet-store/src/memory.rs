//! In-process store backend.
//!
//! Holds the same path/JSON layout as the Redis backend so behaviour is
//! identical; every call takes the lock once, which makes multi-key writes
//! atomic.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use tuplenet_types::{Entity, EntityKey, EntityKind};

use crate::config::DEFAULT_KEY_PREFIX;
use crate::error::{StoreError, StoreResult};
use crate::keys::KeyLayout;
use crate::store::{decode, encode, TopologyStore};

/// A [`TopologyStore`] kept in process memory.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    layout: KeyLayout,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store using the default key prefix.
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_KEY_PREFIX)
    }

    /// Creates an empty store rooted at `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            layout: KeyLayout::new(prefix),
            entries: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of stored entities.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Every stored path, in lexical order.
    pub async fn paths(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// Writes a raw value, bypassing encoding. Lets callers reproduce
    /// states left behind by other writers.
    pub async fn put_raw(&self, path: impl Into<String>, value: impl Into<String>) {
        self.entries.write().await.insert(path.into(), value.into());
    }

    fn encode_all(&self, entities: &[Entity]) -> StoreResult<Vec<(String, String)>> {
        entities
            .iter()
            .map(|entity| {
                let path = self.layout.path(&entity.key())?;
                let value = encode(&path, entity)?;
                Ok((path, value))
            })
            .collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopologyStore for MemoryStore {
    async fn get(&self, key: &EntityKey) -> StoreResult<Entity> {
        let path = self.layout.path(key)?;
        let entries = self.entries.read().await;
        let value = entries
            .get(&path)
            .ok_or_else(|| StoreError::not_found(&path))?;
        decode(&path, key, value)
    }

    async fn get_all(&self, kind: EntityKind, owner: Option<&str>) -> StoreResult<Vec<Entity>> {
        let prefix = self.layout.scan_prefix(kind, owner)?;
        let entries = self.entries.read().await;

        entries
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(path, value)| {
                let key = self.layout.parse(path)?;
                let wanted = key.kind == kind && (owner.is_none() || key.owner.as_deref() == owner);
                wanted.then(|| decode(path, &key, value))
            })
            .collect()
    }

    async fn save(&self, entities: &[Entity]) -> StoreResult<()> {
        let encoded = self.encode_all(entities)?;
        let mut entries = self.entries.write().await;
        for (path, value) in encoded {
            debug!(path = %path, "memory store save");
            entries.insert(path, value);
        }
        Ok(())
    }

    async fn create(&self, entities: &[Entity]) -> StoreResult<()> {
        let encoded = self.encode_all(entities)?;
        let mut entries = self.entries.write().await;

        if let Some((path, _)) = encoded.iter().find(|(path, _)| entries.contains_key(path)) {
            return Err(StoreError::AlreadyExists { key: path.clone() });
        }
        for (path, value) in encoded {
            debug!(path = %path, "memory store create");
            entries.insert(path, value);
        }
        Ok(())
    }

    async fn delete(&self, cascade: bool, entities: &[Entity]) -> StoreResult<()> {
        let mut paths = Vec::with_capacity(entities.len());
        let mut subtrees = Vec::new();
        for entity in entities {
            let key = entity.key();
            paths.push(self.layout.path(&key)?);
            if cascade {
                if let Some(prefix) = self.layout.children_prefix(&key)? {
                    subtrees.push(prefix);
                }
            }
        }

        let mut entries = self.entries.write().await;
        for prefix in subtrees {
            let children: Vec<String> = entries
                .range(prefix.clone()..)
                .take_while(|(path, _)| path.starts_with(&prefix))
                .map(|(path, _)| path.clone())
                .collect();
            debug!(prefix = %prefix, count = children.len(), "memory store cascade delete");
            for child in children {
                entries.remove(&child);
            }
        }
        for path in paths {
            entries.remove(&path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TopologyStoreExt;
    use pretty_assertions::assert_eq;
    use tuplenet_types::{IpAddress, MacAddress, Router, Switch};

    fn port_entities(router: &Router, switch: &Switch, ip: &str) -> (Entity, Entity) {
        let ip: IpAddress = ip.parse().unwrap();
        let mac = MacAddress::from_ip(&ip);
        let mut sp = switch.create_port(format!("{}_to_{}", switch.name, router.name), ip, mac);
        let mut rp = router.create_port(format!("{}_to_{}", router.name, switch.name), ip, 24, mac);
        rp.link(&mut sp);
        (Entity::from(rp), Entity::from(sp))
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_router("r1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = MemoryStore::new();
        store.save(&[Entity::from(Router::new("r1", None))]).await.unwrap();
        store
            .save(&[Entity::from(Router::new("r1", Some("c1".to_string())))])
            .await
            .unwrap();

        let router = store.get_router("r1").await.unwrap();
        assert_eq!(router.chassis.as_deref(), Some("c1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_is_all_or_nothing() {
        let store = MemoryStore::new();
        let router = Router::new("r1", None);
        let switch = Switch::new("s1");
        let (rp, sp) = port_entities(&router, &switch, "10.0.0.1");

        store.create(&[rp.clone()]).await.unwrap();
        let err = store.create(&[sp.clone(), rp]).await.unwrap_err();
        assert!(err.is_already_exists());
        assert!(store.get_switch_port("s1", "s1_to_r1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_all_filters_kind_and_owner() {
        let store = MemoryStore::new();
        let r1 = Router::new("r1", None);
        let r10 = Router::new("r10", None);
        let switch = Switch::new("s1");
        let (rp1, _) = port_entities(&r1, &switch, "10.0.0.1");
        let (rp10, _) = port_entities(&r10, &switch, "10.0.1.1");
        store
            .save(&[Entity::from(r1), r10.into(), switch.into(), rp1, rp10])
            .await
            .unwrap();

        assert_eq!(store.get_routers().await.unwrap().len(), 2);
        assert_eq!(store.get_switches().await.unwrap().len(), 1);
        let ports = store.get_router_ports("r1").await.unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name, "r1_to_s1");
        assert_eq!(store.get_all_router_ports().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cascade_delete_only_touches_subtree() {
        let store = MemoryStore::new();
        let r1 = Router::new("r1", None);
        let r10 = Router::new("r10", None);
        let switch = Switch::new("s1");
        let (rp1, sp1) = port_entities(&r1, &switch, "10.0.0.1");
        let (rp10, _) = port_entities(&r10, &switch, "10.0.1.1");
        store
            .save(&[Entity::from(r1.clone()), r10.into(), switch.into(), rp1, sp1, rp10])
            .await
            .unwrap();

        store.delete(true, &[Entity::from(r1)]).await.unwrap();

        assert!(store.get_router("r1").await.unwrap_err().is_not_found());
        assert!(store.get_router_ports("r1").await.unwrap().is_empty());
        assert_eq!(store.get_router_ports("r10").await.unwrap().len(), 1);
        // the switch side of the wire belongs to the switch
        assert!(store.get_switch_port("s1", "s1_to_r1").await.is_ok());
    }

    #[tokio::test]
    async fn test_non_cascade_delete_leaves_children() {
        let store = MemoryStore::new();
        let router = Router::new("r1", None);
        let (rp, _) = port_entities(&router, &Switch::new("s1"), "10.0.0.1");
        store.save(&[Entity::from(router.clone()), rp]).await.unwrap();

        store.delete(false, &[Entity::from(router)]).await.unwrap();
        assert_eq!(
            store.paths().await,
            vec!["/tuplenet/entity_view/LR/r1/lrp/r1_to_s1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_corrupt_value_is_reported() {
        let store = MemoryStore::new();
        store
            .put_raw("/tuplenet/entity_view/LR/r1", r#"{"kind":"switch","name":"s1"}"#)
            .await;
        let err = store.get_router("r1").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));

        store.put_raw("/tuplenet/entity_view/LR/r2", "not json").await;
        let err = store.get_router("r2").await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }
}
