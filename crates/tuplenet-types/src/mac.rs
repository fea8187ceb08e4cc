//! MAC address type with strict parsing and IP-derived allocation.

use crate::{IpAddress, ParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Leading octets of every MAC derived from a port IP.
///
/// `0xf2` is a locally administered unicast octet, so derived addresses never
/// collide with vendor-assigned hardware.
const DERIVED_MAC_PREFIX: [u8; 2] = [0xf2, 0x01];

/// A 48-bit Ethernet MAC address.
///
/// # Examples
///
/// ```
/// use tuplenet_types::MacAddress;
///
/// let mac: MacAddress = "02:42:ac:11:00:02".parse().unwrap();
/// assert_eq!(mac.to_string(), "02:42:ac:11:00:02");
///
/// // Also supports hyphen-separated format
/// let mac2: MacAddress = "02-42-ac-11-00-02".parse().unwrap();
/// assert_eq!(mac, mac2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Creates a new MAC address from raw bytes.
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    /// Derives the MAC address of a logical port from its IP address.
    ///
    /// The layout is `f2:01` followed by the four low-order bytes of the
    /// address in network order. Downstream flow compilation relies on every
    /// deployment producing the same MAC for the same IP, so this packing
    /// must never change.
    ///
    /// ```
    /// use tuplenet_types::{IpAddress, MacAddress};
    ///
    /// let ip: IpAddress = "10.0.0.1".parse().unwrap();
    /// assert_eq!(MacAddress::from_ip(&ip).to_string(), "f2:01:0a:00:00:01");
    /// ```
    pub fn from_ip(ip: &IpAddress) -> Self {
        let [b0, b1, b2, b3] = ip.low_order_bytes();
        MacAddress([
            DERIVED_MAC_PREFIX[0],
            DERIVED_MAC_PREFIX[1],
            b0,
            b1,
            b2,
            b3,
        ])
    }

    /// Returns the raw bytes of the MAC address.
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns true if this is a multicast address.
    pub const fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Returns true if this is a locally administered address.
    pub const fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }
}

/// Checks that `s` is a syntactically valid MAC address string.
pub fn validate_mac(s: &str) -> Result<(), ParseError> {
    s.parse::<MacAddress>().map(|_| ())
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let separator = if s.contains(':') { ':' } else { '-' };

        let parts: Vec<&str> = s.split(separator).collect();
        if parts.len() != 6 {
            return Err(ParseError::InvalidMacAddress(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            // u8::from_str_radix alone would take "+f" or "0ff"
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(ParseError::InvalidMacAddress(s.to_string()));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| ParseError::InvalidMacAddress(s.to_string()))?;
        }

        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}
