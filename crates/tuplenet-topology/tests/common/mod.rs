//! Shared fixtures for topology integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tuplenet_store::{MemoryStore, StoreError, StoreResult, TopologyStore};
use tuplenet_topology::{AddRouter, AddSwitch, LinkSwitch, TopologyManager};
use tuplenet_types::{Entity, EntityKey, EntityKind};

/// A [`MemoryStore`] that counts calls and can be told to fail them.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn read(&self, operation: &str) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::backend(operation, "injected fault"));
        }
        Ok(())
    }

    fn write(&self, operation: &str) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::backend(operation, "injected fault"));
        }
        Ok(())
    }
}

#[async_trait]
impl TopologyStore for FaultyStore {
    async fn get(&self, key: &EntityKey) -> StoreResult<Entity> {
        self.read("GET")?;
        self.inner.get(key).await
    }

    async fn get_all(&self, kind: EntityKind, owner: Option<&str>) -> StoreResult<Vec<Entity>> {
        self.read("SCAN")?;
        self.inner.get_all(kind, owner).await
    }

    async fn save(&self, entities: &[Entity]) -> StoreResult<()> {
        self.write("MSET")?;
        self.inner.save(entities).await
    }

    async fn create(&self, entities: &[Entity]) -> StoreResult<()> {
        self.write("MSETNX")?;
        self.inner.create(entities).await
    }

    async fn delete(&self, cascade: bool, entities: &[Entity]) -> StoreResult<()> {
        self.write("DEL")?;
        self.inner.delete(cascade, entities).await
    }
}

pub fn add_router(name: &str) -> AddRouter {
    AddRouter {
        name: name.to_string(),
        chassis: None,
    }
}

pub fn add_switch(name: &str) -> AddSwitch {
    AddSwitch {
        name: name.to_string(),
    }
}

pub fn link(router: &str, switch: &str, cidr: &str) -> LinkSwitch {
    LinkSwitch {
        router: router.to_string(),
        switch: switch.to_string(),
        cidr: cidr.to_string(),
    }
}

/// A manager holding router `r1` and switch `s1`, not yet linked.
pub async fn r1_s1<S: TopologyStore>(store: S) -> TopologyManager<S> {
    let manager = TopologyManager::new(store);
    manager.add_router(add_router("r1")).await.unwrap();
    manager.add_switch(add_switch("s1")).await.unwrap();
    manager
}
