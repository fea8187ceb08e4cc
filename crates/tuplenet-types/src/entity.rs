//! Logical topology entities.
//!
//! Entities refer to each other by name only. A router port records the name
//! of its peer switch port, never a pointer to it; the store resolves names.

use crate::{IpAddress, IpPrefix, MacAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors converting between [`Entity`] and the concrete entity types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    #[error("expected {expected} entity, found {found}")]
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("invalid NAT type: {0} (expected snat or dnat)")]
    InvalidNatType(String),
}

/// The kinds of entity held in the topology store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Router,
    RouterPort,
    Switch,
    SwitchPort,
    StaticRoute,
    Nat,
}

impl EntityKind {
    /// Returns the kind owning entities of this kind, if any.
    pub const fn owner_kind(&self) -> Option<EntityKind> {
        match self {
            EntityKind::Router | EntityKind::Switch => None,
            EntityKind::RouterPort | EntityKind::StaticRoute | EntityKind::Nat => {
                Some(EntityKind::Router)
            }
            EntityKind::SwitchPort => Some(EntityKind::Switch),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Router => "router",
            EntityKind::RouterPort => "router port",
            EntityKind::Switch => "switch",
            EntityKind::SwitchPort => "switch port",
            EntityKind::StaticRoute => "static route",
            EntityKind::Nat => "NAT rule",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one stored entity.
///
/// `owner` names the router or switch for child kinds and is `None` for
/// routers and switches themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub owner: Option<String>,
    pub name: String,
}

impl EntityKey {
    pub fn router(name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Router,
            owner: None,
            name: name.into(),
        }
    }

    pub fn switch(name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Switch,
            owner: None,
            name: name.into(),
        }
    }

    /// Key of an entity owned by a router or switch.
    pub fn child(kind: EntityKind, owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            owner: Some(owner.into()),
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{} {}/{}", self.kind, owner, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// A logical router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub name: String,
    /// Chassis the router should be instantiated on, if pinned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chassis: Option<String>,
}

impl Router {
    pub fn new(name: impl Into<String>, chassis: Option<String>) -> Self {
        Self {
            name: name.into(),
            chassis,
        }
    }

    /// Builds an unlinked port owned by this router.
    pub fn create_port(
        &self,
        name: impl Into<String>,
        ip: IpAddress,
        prefix: u8,
        mac: MacAddress,
    ) -> RouterPort {
        RouterPort {
            router: self.name.clone(),
            name: name.into(),
            ip,
            prefix,
            mac,
            peer: String::new(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::router(&self.name)
    }
}

/// Link state of a router port.
///
/// A port is `Linked` only once its peer switch port exists and names it
/// back; a peer reference alone is not enough.
///
/// Peers are matched by switch port name without the switch, since a router
/// port does not record which switch its peer lives on. Canonical link
/// names embed both ends and cannot collide, but two pre-declared router
/// ports with the same name and peer on different routers both resolve
/// `Linked` against one switch port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    Unlinked,
    Linked,
}

/// A port on a logical router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterPort {
    pub router: String,
    pub name: String,
    pub ip: IpAddress,
    pub prefix: u8,
    pub mac: MacAddress,
    /// Name of the peer switch port; empty while the port is a stub.
    #[serde(default)]
    pub peer: String,
}

impl RouterPort {
    /// Connects this port and `switch_port` as one logical wire.
    pub fn link(&mut self, switch_port: &mut SwitchPort) {
        self.peer = switch_port.name.clone();
        switch_port.peer = self.name.clone();
    }

    /// Returns true if the port records a peer switch port name.
    pub fn has_peer(&self) -> bool {
        !self.peer.is_empty()
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::child(EntityKind::RouterPort, &self.router, &self.name)
    }
}

/// A logical switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub name: String,
}

impl Switch {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Builds an unlinked port owned by this switch.
    pub fn create_port(&self, name: impl Into<String>, ip: IpAddress, mac: MacAddress) -> SwitchPort {
        SwitchPort {
            switch: self.name.clone(),
            name: name.into(),
            ip,
            mac,
            peer: String::new(),
        }
    }

    pub fn key(&self) -> EntityKey {
        EntityKey::switch(&self.name)
    }
}

/// A port on a logical switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchPort {
    pub switch: String,
    pub name: String,
    pub ip: IpAddress,
    pub mac: MacAddress,
    /// Name of the peer router port, if this port is one end of a link.
    #[serde(default)]
    pub peer: String,
}

impl SwitchPort {
    pub fn key(&self) -> EntityKey {
        EntityKey::child(EntityKind::SwitchPort, &self.switch, &self.name)
    }
}

/// A routing table entry of a logical router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub router: String,
    pub name: String,
    pub destination: IpPrefix,
    pub next_hop: IpAddress,
    /// Router port the traffic leaves through.
    pub out_port: String,
}

impl StaticRoute {
    pub fn key(&self) -> EntityKey {
        EntityKey::child(EntityKind::StaticRoute, &self.router, &self.name)
    }
}

/// Direction of an address translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NatType {
    Snat,
    Dnat,
}

impl NatType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            NatType::Snat => "snat",
            NatType::Dnat => "dnat",
        }
    }
}

impl fmt::Display for NatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NatType {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snat" => Ok(NatType::Snat),
            "dnat" => Ok(NatType::Dnat),
            _ => Err(EntityError::InvalidNatType(s.to_string())),
        }
    }
}

/// A NAT rule of a logical router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatRule {
    pub router: String,
    pub name: String,
    pub nat_type: NatType,
    /// Internal address range being translated.
    pub internal: IpPrefix,
    /// Address the range is translated to.
    pub external: IpAddress,
}

impl NatRule {
    pub fn key(&self) -> EntityKey {
        EntityKey::child(EntityKind::Nat, &self.router, &self.name)
    }
}

/// Any stored topology entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Router(Router),
    RouterPort(RouterPort),
    Switch(Switch),
    SwitchPort(SwitchPort),
    StaticRoute(StaticRoute),
    Nat(NatRule),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Router(_) => EntityKind::Router,
            Entity::RouterPort(_) => EntityKind::RouterPort,
            Entity::Switch(_) => EntityKind::Switch,
            Entity::SwitchPort(_) => EntityKind::SwitchPort,
            Entity::StaticRoute(_) => EntityKind::StaticRoute,
            Entity::Nat(_) => EntityKind::Nat,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Entity::Router(e) => e.key(),
            Entity::RouterPort(e) => e.key(),
            Entity::Switch(e) => e.key(),
            Entity::SwitchPort(e) => e.key(),
            Entity::StaticRoute(e) => e.key(),
            Entity::Nat(e) => e.key(),
        }
    }
}

macro_rules! entity_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Entity {
                fn from(value: $ty) -> Self {
                    Entity::$variant(value)
                }
            }

            impl TryFrom<Entity> for $ty {
                type Error = EntityError;

                fn try_from(entity: Entity) -> Result<Self, Self::Error> {
                    match entity {
                        Entity::$variant(value) => Ok(value),
                        other => Err(EntityError::KindMismatch {
                            expected: EntityKind::$variant,
                            found: other.kind(),
                        }),
                    }
                }
            }
        )*
    };
}

entity_conversions! {
    Router => Router,
    RouterPort => RouterPort,
    Switch => Switch,
    SwitchPort => SwitchPort,
    StaticRoute => StaticRoute,
    Nat => NatRule,
}
