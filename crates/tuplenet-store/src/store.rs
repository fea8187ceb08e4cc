//! The persistence gateway trait.

use async_trait::async_trait;
use std::sync::Arc;
use tuplenet_types::{
    Entity, EntityError, EntityKey, EntityKind, NatRule, Router, RouterPort, StaticRoute, Switch,
    SwitchPort,
};

use crate::error::{StoreError, StoreResult};

/// Key-value persistence for topology entities.
///
/// Every multi-entity write is all-or-nothing. Implementations are shared
/// handles: cloning one must keep talking to the same store.
#[async_trait]
pub trait TopologyStore: Send + Sync {
    /// Loads one entity. Absent keys return [`StoreError::NotFound`].
    async fn get(&self, key: &EntityKey) -> StoreResult<Entity>;

    /// Loads every entity of `kind`, restricted to one owner if given.
    ///
    /// No order is guaranteed.
    async fn get_all(&self, kind: EntityKind, owner: Option<&str>) -> StoreResult<Vec<Entity>>;

    /// Writes the entities, overwriting existing values.
    async fn save(&self, entities: &[Entity]) -> StoreResult<()>;

    /// Writes the entities only if none of their keys exist yet.
    ///
    /// On conflict nothing is written and [`StoreError::AlreadyExists`] names
    /// a conflicting key.
    async fn create(&self, entities: &[Entity]) -> StoreResult<()>;

    /// Removes the entities. With `cascade` every entity owned by them goes
    /// too. Removing absent keys is not an error.
    async fn delete(&self, cascade: bool, entities: &[Entity]) -> StoreResult<()>;
}

#[async_trait]
impl<T: TopologyStore + ?Sized> TopologyStore for Arc<T> {
    async fn get(&self, key: &EntityKey) -> StoreResult<Entity> {
        (**self).get(key).await
    }

    async fn get_all(&self, kind: EntityKind, owner: Option<&str>) -> StoreResult<Vec<Entity>> {
        (**self).get_all(kind, owner).await
    }

    async fn save(&self, entities: &[Entity]) -> StoreResult<()> {
        (**self).save(entities).await
    }

    async fn create(&self, entities: &[Entity]) -> StoreResult<()> {
        (**self).create(entities).await
    }

    async fn delete(&self, cascade: bool, entities: &[Entity]) -> StoreResult<()> {
        (**self).delete(cascade, entities).await
    }
}

/// Typed lookups on top of [`TopologyStore`].
#[async_trait]
pub trait TopologyStoreExt: TopologyStore {
    async fn get_router(&self, name: &str) -> StoreResult<Router> {
        let key = EntityKey::router(name);
        let entity = self.get(&key).await?;
        downcast(&key, entity)
    }

    async fn get_switch(&self, name: &str) -> StoreResult<Switch> {
        let key = EntityKey::switch(name);
        let entity = self.get(&key).await?;
        downcast(&key, entity)
    }

    async fn get_router_port(&self, router: &str, name: &str) -> StoreResult<RouterPort> {
        let key = EntityKey::child(EntityKind::RouterPort, router, name);
        let entity = self.get(&key).await?;
        downcast(&key, entity)
    }

    async fn get_switch_port(&self, switch: &str, name: &str) -> StoreResult<SwitchPort> {
        let key = EntityKey::child(EntityKind::SwitchPort, switch, name);
        let entity = self.get(&key).await?;
        downcast(&key, entity)
    }

    async fn get_static_route(&self, router: &str, name: &str) -> StoreResult<StaticRoute> {
        let key = EntityKey::child(EntityKind::StaticRoute, router, name);
        let entity = self.get(&key).await?;
        downcast(&key, entity)
    }

    async fn get_nat_rule(&self, router: &str, name: &str) -> StoreResult<NatRule> {
        let key = EntityKey::child(EntityKind::Nat, router, name);
        let entity = self.get(&key).await?;
        downcast(&key, entity)
    }

    async fn get_routers(&self) -> StoreResult<Vec<Router>> {
        downcast_all(self.get_all(EntityKind::Router, None).await?)
    }

    async fn get_switches(&self) -> StoreResult<Vec<Switch>> {
        downcast_all(self.get_all(EntityKind::Switch, None).await?)
    }

    async fn get_router_ports(&self, router: &str) -> StoreResult<Vec<RouterPort>> {
        downcast_all(self.get_all(EntityKind::RouterPort, Some(router)).await?)
    }

    /// Router ports of every router.
    async fn get_all_router_ports(&self) -> StoreResult<Vec<RouterPort>> {
        downcast_all(self.get_all(EntityKind::RouterPort, None).await?)
    }

    async fn get_switch_ports(&self, switch: &str) -> StoreResult<Vec<SwitchPort>> {
        downcast_all(self.get_all(EntityKind::SwitchPort, Some(switch)).await?)
    }

    /// Switch ports of every switch.
    async fn get_all_switch_ports(&self) -> StoreResult<Vec<SwitchPort>> {
        downcast_all(self.get_all(EntityKind::SwitchPort, None).await?)
    }

    async fn get_static_routes(&self, router: &str) -> StoreResult<Vec<StaticRoute>> {
        downcast_all(self.get_all(EntityKind::StaticRoute, Some(router)).await?)
    }

    async fn get_nat_rules(&self, router: &str) -> StoreResult<Vec<NatRule>> {
        downcast_all(self.get_all(EntityKind::Nat, Some(router)).await?)
    }

    async fn get_all_static_routes(&self) -> StoreResult<Vec<StaticRoute>> {
        downcast_all(self.get_all(EntityKind::StaticRoute, None).await?)
    }

    async fn get_all_nat_rules(&self) -> StoreResult<Vec<NatRule>> {
        downcast_all(self.get_all(EntityKind::Nat, None).await?)
    }
}

impl<T: TopologyStore + ?Sized> TopologyStoreExt for T {}

fn downcast<T>(key: &EntityKey, entity: Entity) -> StoreResult<T>
where
    T: TryFrom<Entity, Error = EntityError>,
{
    T::try_from(entity).map_err(|e| StoreError::corrupt(key.to_string(), e.to_string()))
}

fn downcast_all<T>(entities: Vec<Entity>) -> StoreResult<Vec<T>>
where
    T: TryFrom<Entity, Error = EntityError>,
{
    entities
        .into_iter()
        .map(|entity| {
            let key = entity.key();
            downcast(&key, entity)
        })
        .collect()
}

/// Encodes an entity as the JSON value stored under `path`.
pub(crate) fn encode(path: &str, entity: &Entity) -> StoreResult<String> {
    serde_json::to_string(entity).map_err(|source| StoreError::Serialization {
        key: path.to_string(),
        source,
    })
}

/// Decodes the value stored under `path`, checking it is the entity the
/// path names.
pub(crate) fn decode(path: &str, expected: &EntityKey, value: &str) -> StoreResult<Entity> {
    let entity: Entity =
        serde_json::from_str(value).map_err(|source| StoreError::Serialization {
            key: path.to_string(),
            source,
        })?;

    let actual = entity.key();
    if &actual != expected {
        return Err(StoreError::corrupt(
            path,
            format!("value describes {} instead of {}", actual, expected),
        ));
    }
    Ok(entity)
}
