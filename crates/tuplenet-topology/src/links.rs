//! Router/switch link naming and consistency analysis.
//!
//! A link is two ports that name each other: `{router}_to_{switch}` on the
//! router and `{switch}_to_{router}` on the switch. Ports record peers by
//! name only, so a link can be left half-written by a failed store write or
//! cut by a recursive delete of one side. [`find_link_issues`] reports those
//! states, and [`find_orphans`] reports children left behind by a racing
//! non-recursive delete of their owner.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tuplenet_types::{EntityKey, EntityKind, PortState, Router, RouterPort, Switch, SwitchPort};

/// Joins the two ends of a canonical link port name.
pub const LINK_SEPARATOR: &str = "_to_";

/// Name of the router-side port linking `router` to `switch`.
pub fn router_port_name(router: &str, switch: &str) -> String {
    format!("{}{}{}", router, LINK_SEPARATOR, switch)
}

/// Name of the switch-side port linking `switch` to `router`.
pub fn switch_port_name(switch: &str, router: &str) -> String {
    format!("{}{}{}", switch, LINK_SEPARATOR, router)
}

/// Both ends of a router/switch link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedPair {
    pub router_port: RouterPort,
    pub switch_port: SwitchPort,
}

/// A broken link or stray entity found by the consistency check.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum LinkIssue {
    /// A router port names a switch port that does not exist.
    MissingPeer {
        router: String,
        port: String,
        peer: String,
    },

    /// The named switch port exists but does not name the router port back.
    PeerMismatch {
        router: String,
        port: String,
        switch: String,
        peer: String,
        peer_of_peer: String,
    },

    /// A switch port names a router port that does not name it back.
    DanglingSwitchPort {
        switch: String,
        port: String,
        peer: String,
    },

    /// A port, static route or NAT rule whose router or switch is gone.
    OrphanedChild {
        kind: EntityKind,
        owner: String,
        name: String,
    },
}

/// Switch ports indexed by name, for resolving router port peers.
///
/// A router port names its peer without the switch, so a name shared by
/// ports on several switches matches if any of them names the router port
/// back.
pub(crate) struct PeerIndex<'a> {
    by_name: HashMap<&'a str, Vec<&'a SwitchPort>>,
}

impl<'a> PeerIndex<'a> {
    pub(crate) fn new(switch_ports: &'a [SwitchPort]) -> Self {
        let mut by_name: HashMap<&'a str, Vec<&'a SwitchPort>> = HashMap::new();
        for port in switch_ports {
            by_name.entry(port.name.as_str()).or_default().push(port);
        }
        Self { by_name }
    }

    /// Checks the link of one router port. Ports without a peer have no
    /// link to check.
    pub(crate) fn check(&self, port: &RouterPort) -> Option<LinkIssue> {
        if !port.has_peer() {
            return None;
        }

        let Some(candidates) = self.by_name.get(port.peer.as_str()) else {
            return Some(LinkIssue::MissingPeer {
                router: port.router.clone(),
                port: port.name.clone(),
                peer: port.peer.clone(),
            });
        };

        if candidates.iter().any(|sp| sp.peer == port.name) {
            return None;
        }

        let first = candidates.first()?;
        Some(LinkIssue::PeerMismatch {
            router: port.router.clone(),
            port: port.name.clone(),
            switch: first.switch.clone(),
            peer: port.peer.clone(),
            peer_of_peer: first.peer.clone(),
        })
    }

    /// Resolves the link state of one router port.
    pub(crate) fn state(&self, port: &RouterPort) -> PortState {
        if port.has_peer() && self.check(port).is_none() {
            PortState::Linked
        } else {
            PortState::Unlinked
        }
    }
}

/// Returns every link issue among the given ports, sorted.
pub fn find_link_issues(router_ports: &[RouterPort], switch_ports: &[SwitchPort]) -> Vec<LinkIssue> {
    let index = PeerIndex::new(switch_ports);
    let mut issues: Vec<LinkIssue> = router_ports
        .iter()
        .filter_map(|port| index.check(port))
        .collect();

    let backed: HashSet<(&str, &str)> = router_ports
        .iter()
        .map(|port| (port.name.as_str(), port.peer.as_str()))
        .collect();

    for port in switch_ports {
        if port.peer.is_empty() || backed.contains(&(port.peer.as_str(), port.name.as_str())) {
            continue;
        }
        issues.push(LinkIssue::DanglingSwitchPort {
            switch: port.switch.clone(),
            port: port.name.clone(),
            peer: port.peer.clone(),
        });
    }

    issues.sort();
    issues
}

/// Returns the children among `children` whose owner is not in `routers`
/// or `switches`, sorted.
pub fn find_orphans(
    routers: &[Router],
    switches: &[Switch],
    children: &[EntityKey],
) -> Vec<LinkIssue> {
    let routers: HashSet<&str> = routers.iter().map(|r| r.name.as_str()).collect();
    let switches: HashSet<&str> = switches.iter().map(|s| s.name.as_str()).collect();

    let mut issues: Vec<LinkIssue> = children
        .iter()
        .filter_map(|key| {
            let owner = key.owner.as_deref()?;
            let present = match key.kind.owner_kind()? {
                EntityKind::Switch => switches.contains(owner),
                _ => routers.contains(owner),
            };
            (!present).then(|| LinkIssue::OrphanedChild {
                kind: key.kind,
                owner: owner.to_string(),
                name: key.name.clone(),
            })
        })
        .collect();

    issues.sort();
    issues
}
