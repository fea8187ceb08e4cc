//! Request parameters for topology operations.
//!
//! Required fields are plain strings and are rejected when empty; optional
//! filters are `Option`s, where an empty string counts as absent. All
//! structs deserialize from the same field names an HTTP front end would
//! use.

use serde::{Deserialize, Serialize};

/// Parameters for [`add_router`](crate::TopologyManager::add_router).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRouter {
    pub name: String,
    #[serde(default)]
    pub chassis: Option<String>,
}

/// Parameters for [`link_switch`](crate::TopologyManager::link_switch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSwitch {
    pub router: String,
    pub switch: String,
    /// Router port address in CIDR notation, e.g. `10.0.0.1/24`.
    pub cidr: String,
}

/// Parameters for [`show_router`](crate::TopologyManager::show_router).
///
/// Exactly one of `name` and `all` selects the routers returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRouter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRouter {
    pub name: String,
    /// Also remove every port, static route and NAT rule of the router.
    #[serde(default)]
    pub recursive: bool,
}

/// Selects ports of one router, optionally a single one by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowRouterPort {
    pub router: String,
    #[serde(default)]
    pub port: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRouterPort {
    pub router: String,
    pub port: String,
    pub cidr: String,
    /// Derived from the port address when absent.
    #[serde(default)]
    pub mac: Option<String>,
    /// Name of the switch port this port will be wired to.
    pub peer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRouterPort {
    pub router: String,
    pub port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddStaticRoute {
    pub router: String,
    pub name: String,
    /// Destination prefix, e.g. `192.168.0.0/16`.
    pub cidr: String,
    pub next_hop: String,
    /// Router port the route leaves through.
    pub out_port: String,
}

/// Selects static routes of one router, optionally a single one by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowStaticRoute {
    pub router: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteStaticRoute {
    pub router: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddNat {
    pub router: String,
    pub name: String,
    /// Internal range, e.g. `10.0.0.0/24`.
    pub cidr: String,
    /// `snat` or `dnat`, case-insensitive.
    pub nat_type: String,
    pub external_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowNat {
    pub router: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNat {
    pub router: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSwitch {
    pub name: String,
}

/// Parameters for [`show_switch`](crate::TopologyManager::show_switch).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSwitch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSwitch {
    pub name: String,
    /// Also remove every port of the switch.
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSwitchPort {
    pub switch: String,
    #[serde(default)]
    pub port: Option<String>,
}

/// Parameters for [`add_switch_port`](crate::TopologyManager::add_switch_port).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSwitchPort {
    pub switch: String,
    pub port: String,
    pub ip: String,
    /// Derived from the port address when absent.
    #[serde(default)]
    pub mac: Option<String>,
    /// Name of the router port this port is wired to, if any.
    #[serde(default)]
    pub peer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSwitchPort {
    pub switch: String,
    pub port: String,
}

/// Returns the filter value, treating an empty string as absent.
pub(crate) fn filter(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
