//! Store failures and validation ordering.

mod common;

use common::{add_router, link, r1_s1, FaultyStore};
use pretty_assertions::assert_eq;
use tuplenet_store::{MemoryStore, TopologyStoreExt};
use tuplenet_topology::*;
use tuplenet_types::{Entity, Router, Switch};

#[tokio::test]
async fn test_invalid_mac_never_reaches_store() {
    let manager = TopologyManager::new(FaultyStore::new());

    let err = manager
        .add_router_port(AddRouterPort {
            router: "r1".to_string(),
            port: "p1".to_string(),
            cidr: "10.0.0.1/24".to_string(),
            mac: Some("not-a-mac".to_string()),
            peer: "s1_p1".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, TopologyError::InvalidFormat { field: "mac", .. }));
    assert_eq!(manager.store().reads(), 0);
    assert_eq!(manager.store().writes(), 0);
}

#[tokio::test]
async fn test_validation_precedes_store_access() {
    let manager = TopologyManager::new(FaultyStore::new());

    let errors = vec![
        manager.add_router(add_router("")).await.unwrap_err(),
        manager.link_switch(link("r1", "", "10.0.0.1/24")).await.unwrap_err(),
        manager.link_switch(link("r1", "s1", "10.0.0.1/40")).await.unwrap_err(),
        manager
            .delete_router(DeleteRouter::default())
            .await
            .unwrap_err(),
        manager
            .add_nat(AddNat {
                router: "r1".to_string(),
                name: "n1".to_string(),
                cidr: "10.0.0.0/24".to_string(),
                nat_type: "masquerade".to_string(),
                external_ip: "172.16.0.1".to_string(),
            })
            .await
            .unwrap_err(),
        manager
            .router_port_state(ShowRouterPort {
                router: "r1".to_string(),
                port: None,
            })
            .await
            .unwrap_err(),
    ];

    let kinds: Vec<ErrorKind> = errors.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::InvalidInput,
            ErrorKind::InvalidInput,
            ErrorKind::InvalidFormat,
            ErrorKind::InvalidInput,
            ErrorKind::InvalidInput,
            ErrorKind::InvalidInput,
        ]
    );
    assert_eq!(manager.store().reads(), 0);
    assert_eq!(manager.store().writes(), 0);
}

#[tokio::test]
async fn test_read_failure_is_not_not_found() {
    let manager = r1_s1(FaultyStore::new()).await;
    manager.store().fail_reads(true);

    let err = manager.link_switch(link("r1", "s1", "10.0.0.1/24")).await.unwrap_err();
    assert!(matches!(
        err,
        TopologyError::Persistence {
            operation: "get router",
            ..
        }
    ));

    let err = manager
        .show_router(ShowRouter {
            name: None,
            all: true,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);

    let err = manager.check_links().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
}

#[tokio::test]
async fn test_failed_link_write_leaves_no_ports() {
    let manager = r1_s1(FaultyStore::new()).await;
    manager.store().fail_writes(true);

    let err = manager.link_switch(link("r1", "s1", "10.0.0.1/24")).await.unwrap_err();
    assert!(matches!(
        err,
        TopologyError::Persistence {
            operation: "create link ports",
            ..
        }
    ));

    let inner = &manager.store().inner;
    assert!(inner.get_all_router_ports().await.unwrap().is_empty());
    assert!(inner.get_all_switch_ports().await.unwrap().is_empty());

    manager.store().fail_writes(false);
    manager.link_switch(link("r1", "s1", "10.0.0.1/24")).await.unwrap();
}

#[tokio::test]
async fn test_failed_delete_keeps_router() {
    let manager = r1_s1(FaultyStore::new()).await;
    manager.store().fail_writes(true);

    let err = manager
        .delete_router(DeleteRouter {
            name: "r1".to_string(),
            recursive: true,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    assert!(manager.store().inner.get_router("r1").await.is_ok());
}

#[tokio::test]
async fn test_half_written_link_is_detected() {
    // a writer that crashed after the switch side of a link
    let store = MemoryStore::new();
    let router = Router::new("r1", None);
    let switch = Switch::new("s1");
    let ip = "10.0.0.1".parse().unwrap();
    let mac = tuplenet_types::MacAddress::from_ip(&ip);
    let mut sp = switch.create_port(switch_port_name("s1", "r1"), ip, mac);
    let mut rp = router.create_port(router_port_name("r1", "s1"), ip, 24, mac);
    rp.link(&mut sp);
    tuplenet_store::TopologyStore::save(
        &store,
        &[Entity::from(router), Entity::from(switch), Entity::from(sp)],
    )
    .await
    .unwrap();

    let manager = TopologyManager::new(store);
    assert_eq!(
        manager.check_links().await.unwrap(),
        vec![LinkIssue::DanglingSwitchPort {
            switch: "s1".to_string(),
            port: "s1_to_r1".to_string(),
            peer: "r1_to_s1".to_string(),
        }]
    );

    // relinking replaces the leftover switch port
    manager.link_switch(link("r1", "s1", "10.0.0.1/24")).await.unwrap();
    assert!(manager.check_links().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_repair_leaves_no_link() {
    let manager = r1_s1(FaultyStore::new()).await;
    manager.link_switch(link("r1", "s1", "10.0.0.1/24")).await.unwrap();
    manager
        .delete_router_port(DeleteRouterPort {
            router: "r1".to_string(),
            port: "r1_to_s1".to_string(),
        })
        .await
        .unwrap();

    manager.store().fail_writes(true);
    let err = manager.link_switch(link("r1", "s1", "10.0.0.1/24")).await.unwrap_err();
    assert!(matches!(
        err,
        TopologyError::Persistence {
            operation: "delete dangling switch port",
            ..
        }
    ));
    assert!(manager.store().inner.get_switch_port("s1", "s1_to_r1").await.is_ok());

    manager.store().fail_writes(false);
    manager.link_switch(link("r1", "s1", "10.0.0.1/24")).await.unwrap();
    assert!(manager.check_links().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_entry_surfaces_as_persistence() {
    let store = MemoryStore::new();
    store
        .put_raw("/tuplenet/entity_view/LR/r1", r#"{"kind":"router","name":"r2"}"#)
        .await;
    let manager = TopologyManager::new(store);

    let err = manager
        .show_router(ShowRouter {
            name: Some("r1".to_string()),
            all: false,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
}
