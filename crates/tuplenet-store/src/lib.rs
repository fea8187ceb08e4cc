//! Persistence gateway for the TupleNet logical topology.
//!
//! Topology operations never touch a store handle directly; they are given
//! a [`TopologyStore`] and go through it for every read and write:
//!
//! - [`TopologyStore`]: get / get_all / save / create / delete over
//!   [`Entity`](tuplenet_types::Entity) values
//! - [`TopologyStoreExt`]: typed lookups (`get_router`, `get_router_ports`, ...)
//! - [`MemoryStore`]: in-process backend for tests and dry runs
//! - [`RedisStore`]: Redis backend (feature `redis`)
//! - [`KeyLayout`]: the `LR/{router}/lrp/{port}` path scheme
//!
//! # Example
//!
//! ```
//! use tuplenet_store::{MemoryStore, TopologyStore, TopologyStoreExt};
//! use tuplenet_types::{Entity, Router};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.save(&[Entity::from(Router::new("r1", None))]).await.unwrap();
//! assert_eq!(store.get_router("r1").await.unwrap().name, "r1");
//! assert!(store.get_router("r2").await.unwrap_err().is_not_found());
//! # });
//! ```

pub mod config;
pub mod error;
pub mod keys;
mod memory;
#[cfg(feature = "redis")]
mod redis_backend;
mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use keys::KeyLayout;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_backend::RedisStore;
pub use store::{TopologyStore, TopologyStoreExt};
