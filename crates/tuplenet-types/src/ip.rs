//! IP address and prefix types with safe parsing.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// An IPv4 address wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ipv4Address(Ipv4Addr);

impl Ipv4Address {
    pub const fn octets(&self) -> [u8; 4] {
        self.0.octets()
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Ipv4Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv4Addr>()
            .map(Ipv4Address)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

/// An IPv6 address wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ipv6Address(Ipv6Addr);

impl Ipv6Address {
    pub const fn octets(&self) -> [u8; 16] {
        self.0.octets()
    }
}

impl fmt::Display for Ipv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Ipv6Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Ipv6Addr>()
            .map(Ipv6Address)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

/// An IP address that can be either IPv4 or IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpAddress {
    V4(Ipv4Address),
    V6(Ipv6Address),
}

impl IpAddress {
    /// Returns true if this is an IPv4 address.
    pub const fn is_ipv4(&self) -> bool {
        matches!(self, IpAddress::V4(_))
    }

    /// Returns true if this is an IPv6 address.
    pub const fn is_ipv6(&self) -> bool {
        matches!(self, IpAddress::V6(_))
    }

    /// Longest prefix length valid for this address family.
    pub const fn max_prefix_len(&self) -> u8 {
        match self {
            IpAddress::V4(_) => 32,
            IpAddress::V6(_) => 128,
        }
    }

    /// The last four bytes of the address in network order.
    pub const fn low_order_bytes(&self) -> [u8; 4] {
        match self {
            IpAddress::V4(addr) => addr.octets(),
            IpAddress::V6(addr) => {
                let o = addr.octets();
                [o[12], o[13], o[14], o[15]]
            }
        }
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpAddress::V4(addr) => addr.fmt(f),
            IpAddress::V6(addr) => addr.fmt(f),
        }
    }
}

impl FromStr for IpAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            s.parse::<Ipv6Address>().map(IpAddress::V6)
        } else {
            s.parse::<Ipv4Address>().map(IpAddress::V4)
        }
    }
}

/// Parses `ip/prefix` into its address and prefix length.
///
/// Host bits are kept: `10.0.0.1/24` yields `10.0.0.1` and `24`, which is
/// what a port address needs.
pub fn parse_cidr(s: &str) -> Result<(IpAddress, u8), ParseError> {
    let prefix: IpPrefix = s.parse()?;
    Ok((prefix.address, prefix.prefix_len))
}

/// An address with a prefix length in CIDR notation (e.g. 10.0.0.1/24).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IpPrefix {
    address: IpAddress,
    prefix_len: u8,
}

impl IpPrefix {
    /// Creates a new IP prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix length is invalid for the address type
    /// (>32 for IPv4, >128 for IPv6).
    pub fn new(address: IpAddress, prefix_len: u8) -> Result<Self, ParseError> {
        let max_len = address.max_prefix_len();
        if prefix_len > max_len {
            return Err(ParseError::InvalidIpPrefix(format!(
                "prefix length {} exceeds maximum {} for address type",
                prefix_len, max_len
            )));
        }

        Ok(IpPrefix {
            address,
            prefix_len,
        })
    }

    pub const fn address(&self) -> &IpAddress {
        &self.address
    }

    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns true if this is a host route (/32 for IPv4, /128 for IPv6).
    pub const fn is_host_route(&self) -> bool {
        self.prefix_len == self.address.max_prefix_len()
    }

    /// Returns true if this is the default route (0.0.0.0/0 or ::/0).
    pub const fn is_default(&self) -> bool {
        self.prefix_len == 0
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: IpAddress = addr_str.parse()?;
        if len_str.is_empty() || !len_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidIpPrefix(s.to_string()));
        }
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        IpPrefix::new(address, prefix_len)
    }
}

impl TryFrom<String> for IpPrefix {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<IpPrefix> for String {
    fn from(prefix: IpPrefix) -> String {
        prefix.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ip_address_discrimination() {
        let v4: IpAddress = "10.0.0.1".parse().unwrap();
        assert!(v4.is_ipv4());
        assert_eq!(v4.max_prefix_len(), 32);

        let v6: IpAddress = "::1".parse().unwrap();
        assert!(v6.is_ipv6());
        assert_eq!(v6.max_prefix_len(), 128);
    }

    #[test]
    fn test_parse_cidr_keeps_host_bits() {
        let (ip, prefix) = parse_cidr("10.0.0.1/24").unwrap();
        assert_eq!(ip.to_string(), "10.0.0.1");
        assert_eq!(prefix, 24);

        let (ip, prefix) = parse_cidr("2001:db8::1/64").unwrap();
        assert_eq!(ip.to_string(), "2001:db8::1");
        assert_eq!(prefix, 64);
    }

    #[test]
    fn test_parse_cidr_round_trip() {
        for cidr in ["10.0.0.1/24", "0.0.0.0/0", "192.168.1.1/32", "2001:db8::/32", "::/0"] {
            let (ip, prefix) = parse_cidr(cidr).unwrap();
            assert_eq!(format!("{}/{}", ip, prefix), cidr);
        }
    }

    #[test]
    fn test_parse_cidr_rejects_malformed() {
        assert!(matches!(
            parse_cidr("10.0.0.1"),
            Err(ParseError::InvalidIpPrefix(_))
        ));
        assert!(matches!(
            parse_cidr("10.0.0.300/24"),
            Err(ParseError::InvalidIpAddress(_))
        ));
        assert!(parse_cidr("10.0.0.1/33").is_err());
        assert!(parse_cidr("2001:db8::/129").is_err());
        assert!(parse_cidr("10.0.0.1/").is_err());
        assert!(parse_cidr("10.0.0.1/+8").is_err());
        assert!(parse_cidr("10.0.0.1/abc").is_err());
        assert!(parse_cidr("").is_err());
    }

    #[test]
    fn test_ip_prefix_host_and_default() {
        let host_v4: IpPrefix = "10.0.0.1/32".parse().unwrap();
        assert!(host_v4.is_host_route());

        let network: IpPrefix = "10.0.0.0/24".parse().unwrap();
        assert!(!network.is_host_route());

        let default_v6: IpPrefix = "::/0".parse().unwrap();
        assert!(default_v6.is_default());
    }

    #[test]
    fn test_low_order_bytes() {
        let v4: IpAddress = "1.2.3.4".parse().unwrap();
        assert_eq!(v4.low_order_bytes(), [1, 2, 3, 4]);

        let v6: IpAddress = "fe80::1:2:304".parse().unwrap();
        assert_eq!(v6.low_order_bytes(), [0, 2, 3, 4]);
    }
}
