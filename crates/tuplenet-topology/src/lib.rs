//! TupleNet logical topology management
//!
//! [`TopologyManager`] creates, inspects and deletes logical routers,
//! switches, router ports, static routes and NAT rules on top of any
//! [`TopologyStore`](tuplenet_store::TopologyStore). It enforces:
//!
//! - link atomicity: a router/switch link is written as one port pair or not
//!   at all
//! - delete dependencies: a router with ports, routes or NAT rules (or a
//!   switch with ports) is only removed recursively
//! - validation before persistence: malformed names, addresses and MACs are
//!   rejected without touching the store
//!
//! ```
//! use tuplenet_store::MemoryStore;
//! use tuplenet_topology::{AddRouter, AddSwitch, LinkSwitch, TopologyManager};
//!
//! # tokio_test::block_on(async {
//! let manager = TopologyManager::new(MemoryStore::new());
//! manager.add_router(AddRouter { name: "r1".into(), chassis: None }).await?;
//! manager.add_switch(AddSwitch { name: "s1".into() }).await?;
//!
//! let link = manager
//!     .link_switch(LinkSwitch {
//!         router: "r1".into(),
//!         switch: "s1".into(),
//!         cidr: "10.0.0.1/24".into(),
//!     })
//!     .await?;
//! assert_eq!(link.router_port.name, "r1_to_s1");
//! assert_eq!(link.switch_port.peer, "r1_to_s1");
//! # Ok::<(), tuplenet_topology::TopologyError>(())
//! # }).unwrap();
//! ```

pub mod error;
pub mod links;
mod manager;
pub mod params;

pub use error::{ErrorKind, TopologyError, TopologyResult};
pub use links::{
    find_link_issues, find_orphans, router_port_name, switch_port_name, LinkIssue, LinkedPair,
};
pub use manager::TopologyManager;
pub use params::*;
