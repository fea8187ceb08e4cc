//! Common TupleNet types for the logical topology control plane.
//!
//! This crate provides type-safe representations of the addressing
//! primitives and logical devices shared by the store and the topology
//! operations:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses, including the
//!   deterministic IP-derived form used for logical ports
//! - [`IpAddress`]: IPv4 and IPv6 addresses
//! - [`IpPrefix`]: IP prefixes in CIDR notation
//! - [`Router`], [`RouterPort`], [`Switch`], [`SwitchPort`],
//!   [`StaticRoute`], [`NatRule`]: logical topology entities

mod entity;
mod ip;
mod mac;

pub use entity::{
    Entity, EntityError, EntityKey, EntityKind, NatRule, NatType, PortState, Router, RouterPort,
    StaticRoute, Switch, SwitchPort,
};
pub use ip::{parse_cidr, IpAddress, IpPrefix, Ipv4Address, Ipv6Address};
pub use mac::{validate_mac, MacAddress};

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IP prefix format: {0}")]
    InvalidIpPrefix(String),
}
