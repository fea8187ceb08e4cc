//! Store key layout for topology entities.
//!
//! ```text
//! {prefix}/LR/{router}
//! {prefix}/LR/{router}/lrp/{port}
//! {prefix}/LR/{router}/lsr/{static route}
//! {prefix}/LR/{router}/lnat/{nat rule}
//! {prefix}/LS/{switch}
//! {prefix}/LS/{switch}/lsp/{port}
//! ```

use crate::error::{StoreError, StoreResult};
use tuplenet_types::{EntityKey, EntityKind};

/// Logical router table
pub const ROUTER_TABLE: &str = "LR";

/// Logical switch table
pub const SWITCH_TABLE: &str = "LS";

/// Router port sub-table
pub const ROUTER_PORT_TABLE: &str = "lrp";

/// Static route sub-table
pub const STATIC_ROUTE_TABLE: &str = "lsr";

/// NAT rule sub-table
pub const NAT_TABLE: &str = "lnat";

/// Switch port sub-table
pub const SWITCH_PORT_TABLE: &str = "lsp";

/// Maps entity keys to store paths and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    prefix: String,
}

impl KeyLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the store path of `key`.
    pub fn path(&self, key: &EntityKey) -> StoreResult<String> {
        check_segment("name", &key.name)?;

        match (key.kind.owner_kind(), &key.owner) {
            (None, _) => Ok(format!(
                "{}/{}/{}",
                self.prefix,
                top_table(key.kind),
                key.name
            )),
            (Some(owner_kind), Some(owner)) => {
                check_segment("owner", owner)?;
                Ok(format!(
                    "{}/{}/{}/{}/{}",
                    self.prefix,
                    top_table(owner_kind),
                    owner,
                    child_table(key.kind),
                    key.name
                ))
            }
            (Some(_), None) => Err(StoreError::InvalidKey {
                message: format!("{} {} has no owner", key.kind, key.name),
            }),
        }
    }

    /// Returns the path prefix under which every entity matched by
    /// `(kind, owner)` lives. Matches must still be filtered with
    /// [`KeyLayout::parse`] since sibling kinds share the prefix.
    pub fn scan_prefix(&self, kind: EntityKind, owner: Option<&str>) -> StoreResult<String> {
        match (kind.owner_kind(), owner) {
            (None, _) => Ok(format!("{}/{}/", self.prefix, top_table(kind))),
            (Some(owner_kind), Some(owner)) => {
                check_segment("owner", owner)?;
                Ok(format!(
                    "{}/{}/{}/{}/",
                    self.prefix,
                    top_table(owner_kind),
                    owner,
                    child_table(kind)
                ))
            }
            (Some(owner_kind), None) => Ok(format!("{}/{}/", self.prefix, top_table(owner_kind))),
        }
    }

    /// Returns the path prefix of every entity owned by `key`, if `key` can
    /// own entities at all.
    pub fn children_prefix(&self, key: &EntityKey) -> StoreResult<Option<String>> {
        if key.kind.owner_kind().is_some() {
            return Ok(None);
        }
        Ok(Some(format!("{}/", self.path(key)?)))
    }

    /// Recovers the entity key from a store path.
    pub fn parse(&self, path: &str) -> Option<EntityKey> {
        let rest = path.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();

        match segments.as_slice() {
            [ROUTER_TABLE, name] => Some(EntityKey::router(*name)),
            [SWITCH_TABLE, name] => Some(EntityKey::switch(*name)),
            [ROUTER_TABLE, owner, table, name] => {
                let kind = match *table {
                    ROUTER_PORT_TABLE => EntityKind::RouterPort,
                    STATIC_ROUTE_TABLE => EntityKind::StaticRoute,
                    NAT_TABLE => EntityKind::Nat,
                    _ => return None,
                };
                Some(EntityKey::child(kind, *owner, *name))
            }
            [SWITCH_TABLE, owner, SWITCH_PORT_TABLE, name] => {
                Some(EntityKey::child(EntityKind::SwitchPort, *owner, *name))
            }
            _ => None,
        }
    }

    /// Returns true if `path` holds an entity matched by `(kind, owner)`.
    pub fn matches(&self, path: &str, kind: EntityKind, owner: Option<&str>) -> bool {
        match self.parse(path) {
            Some(key) => key.kind == kind && (owner.is_none() || key.owner.as_deref() == owner),
            None => false,
        }
    }
}

fn top_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Switch | EntityKind::SwitchPort => SWITCH_TABLE,
        _ => ROUTER_TABLE,
    }
}

fn child_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::RouterPort => ROUTER_PORT_TABLE,
        EntityKind::StaticRoute => STATIC_ROUTE_TABLE,
        EntityKind::Nat => NAT_TABLE,
        EntityKind::SwitchPort => SWITCH_PORT_TABLE,
        EntityKind::Router | EntityKind::Switch => "",
    }
}

fn check_segment(what: &str, segment: &str) -> StoreResult<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(StoreError::InvalidKey {
            message: format!("{} '{}' must be non-empty and contain no '/'", what, segment),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout() -> KeyLayout {
        KeyLayout::new("/tuplenet/entity_view/")
    }

    #[test]
    fn test_paths() {
        let layout = layout();
        assert_eq!(
            layout.path(&EntityKey::router("r1")).unwrap(),
            "/tuplenet/entity_view/LR/r1"
        );
        assert_eq!(
            layout
                .path(&EntityKey::child(EntityKind::RouterPort, "r1", "r1_to_s1"))
                .unwrap(),
            "/tuplenet/entity_view/LR/r1/lrp/r1_to_s1"
        );
        assert_eq!(
            layout
                .path(&EntityKey::child(EntityKind::SwitchPort, "s1", "s1_to_r1"))
                .unwrap(),
            "/tuplenet/entity_view/LS/s1/lsp/s1_to_r1"
        );
        assert_eq!(
            layout
                .path(&EntityKey::child(EntityKind::Nat, "r1", "n1"))
                .unwrap(),
            "/tuplenet/entity_view/LR/r1/lnat/n1"
        );
    }

    #[test]
    fn test_parse_inverts_path() {
        let layout = layout();
        let keys = [
            EntityKey::router("r1"),
            EntityKey::switch("s1"),
            EntityKey::child(EntityKind::RouterPort, "r1", "p"),
            EntityKey::child(EntityKind::StaticRoute, "r1", "sr"),
            EntityKey::child(EntityKind::Nat, "r1", "n"),
            EntityKey::child(EntityKind::SwitchPort, "s1", "p"),
        ];
        for key in keys {
            let path = layout.path(&key).unwrap();
            assert_eq!(layout.parse(&path), Some(key));
        }
        assert_eq!(layout.parse("/tuplenet/entity_view/LR/r1/bogus/x"), None);
        assert_eq!(layout.parse("/other/LR/r1"), None);
    }

    #[test]
    fn test_rejects_slash_in_names() {
        let layout = layout();
        assert!(layout.path(&EntityKey::router("a/b")).is_err());
        assert!(layout.path(&EntityKey::router("")).is_err());
        let orphan = EntityKey {
            kind: EntityKind::RouterPort,
            owner: None,
            name: "p".to_string(),
        };
        assert!(layout.path(&orphan).is_err());
    }

    #[test]
    fn test_matches_filters_siblings() {
        let layout = layout();
        let port = "/tuplenet/entity_view/LR/r1/lrp/p1";
        assert!(layout.matches(port, EntityKind::RouterPort, Some("r1")));
        assert!(layout.matches(port, EntityKind::RouterPort, None));
        assert!(!layout.matches(port, EntityKind::RouterPort, Some("r2")));
        assert!(!layout.matches(port, EntityKind::Router, None));
        assert_eq!(
            layout.scan_prefix(EntityKind::Router, None).unwrap(),
            "/tuplenet/entity_view/LR/"
        );
        assert_eq!(
            layout
                .children_prefix(&EntityKey::switch("s1"))
                .unwrap()
                .as_deref(),
            Some("/tuplenet/entity_view/LS/s1/")
        );
    }
}
