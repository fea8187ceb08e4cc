//! Topology Manager - logical router, switch, route and NAT lifecycle

use std::fmt::Display;

use tracing::{debug, info, instrument, warn};
use tuplenet_store::{StoreResult, TopologyStore, TopologyStoreExt};
use tuplenet_types::{
    parse_cidr, Entity, EntityKey, EntityKind, IpAddress, IpPrefix, MacAddress, NatRule, NatType,
    PortState, Router, RouterPort, StaticRoute, Switch, SwitchPort,
};

use crate::error::{TopologyError, TopologyResult};
use crate::links::{
    find_link_issues, find_orphans, router_port_name, switch_port_name, LinkIssue, LinkedPair,
    PeerIndex,
};
use crate::params::*;

/// Topology Manager
///
/// Validates requests, enforces the dependency rules between routers,
/// switches and their children, and persists through the injected store.
/// Holds no topology state of its own; every call reads the store.
pub struct TopologyManager<S> {
    store: S,
}

impl<S> TopologyManager<S> {
    /// Create a manager over `store`
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: TopologyStore> TopologyManager<S> {
    /// Create or update a logical router
    #[instrument(skip(self))]
    pub async fn add_router(&self, params: AddRouter) -> TopologyResult<Router> {
        require_name("name", &params.name)?;

        let chassis = params.chassis.filter(|c| !c.is_empty());
        let router = Router::new(params.name, chassis);

        self.store
            .save(&[Entity::from(router.clone())])
            .await
            .map_err(|e| TopologyError::persistence("save router", e))?;

        info!(router = %router.name, "Router saved");
        Ok(router)
    }

    /// Wire a router to a switch with a freshly created port pair
    ///
    /// The router port takes the address from `cidr`; both ports share the
    /// MAC derived from it. A switch port left over from an earlier link to
    /// the same router, whose router port is gone, is replaced.
    #[instrument(skip(self))]
    pub async fn link_switch(&self, params: LinkSwitch) -> TopologyResult<LinkedPair> {
        require_name("router", &params.router)?;
        require_name("switch", &params.switch)?;
        require("cidr", &params.cidr)?;
        let (ip, prefix) =
            parse_cidr(&params.cidr).map_err(|e| TopologyError::invalid_format("cidr", e))?;
        let mac = MacAddress::from_ip(&ip);

        let router = found(
            self.store.get_router(&params.router).await,
            EntityKind::Router,
            &params.router,
            "get router",
        )?;
        let switch = found(
            self.store.get_switch(&params.switch).await,
            EntityKind::Switch,
            &params.switch,
            "get switch",
        )?;

        let sp_name = switch_port_name(&switch.name, &router.name);
        let rp_name = router_port_name(&router.name, &switch.name);

        let leftover = lookup(
            self.store.get_switch_port(&switch.name, &sp_name).await,
            "get switch port",
        )?;
        let router_side = exists(
            self.store.get_router_port(&router.name, &rp_name).await,
            "get router port",
        )?;
        if let Some(port) = &leftover {
            if router_side || port.peer != rp_name {
                return Err(TopologyError::conflict(
                    format!("switch port {}/{}", switch.name, sp_name),
                    format!("{} is already linked to {}", switch.name, router.name),
                ));
            }
        }
        if router_side {
            return Err(TopologyError::conflict(
                format!("router port {}/{}", router.name, rp_name),
                format!("{} is already linked to {}", router.name, switch.name),
            ));
        }

        // a failure between this delete and the create leaves no link at all
        if let Some(port) = leftover {
            warn!(switch_port = %port.name, "Replacing dangling switch port");
            self.store
                .delete(false, &[Entity::from(port)])
                .await
                .map_err(|e| TopologyError::persistence("delete dangling switch port", e))?;
        }

        let mut switch_port = switch.create_port(sp_name, ip, mac);
        let mut router_port = router.create_port(rp_name, ip, prefix, mac);
        router_port.link(&mut switch_port);
        debug!(ip = %ip, prefix, mac = %mac, "Creating link ports");

        created(
            self.store
                .create(&[
                    Entity::from(switch_port.clone()),
                    Entity::from(router_port.clone()),
                ])
                .await,
            format!("link {} <-> {}", router.name, switch.name),
            "create link ports",
        )?;

        info!(
            router_port = %router_port.name,
            switch_port = %switch_port.name,
            "Router linked to switch"
        );
        Ok(LinkedPair {
            router_port,
            switch_port,
        })
    }

    /// Return one router by name, or every router, sorted by name
    #[instrument(skip(self))]
    pub async fn show_router(&self, params: ShowRouter) -> TopologyResult<Vec<Router>> {
        if let Some(name) = name_filter("name", &params.name)? {
            let router = found(
                self.store.get_router(name).await,
                EntityKind::Router,
                name,
                "get router",
            )?;
            return Ok(vec![router]);
        }
        if !params.all {
            return Err(TopologyError::invalid_input(
                "name",
                "name a router or ask for all",
            ));
        }

        let mut routers = self
            .store
            .get_routers()
            .await
            .map_err(|e| TopologyError::persistence("list routers", e))?;
        routers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(routers)
    }

    /// Delete a router
    ///
    /// A router with ports, static routes or NAT rules is only deleted when
    /// `recursive` is set, and then takes them all with it. Switch ports
    /// linked to it are left for [`check_links`](Self::check_links) to
    /// report.
    #[instrument(skip(self))]
    pub async fn delete_router(&self, params: DeleteRouter) -> TopologyResult<()> {
        require_name("name", &params.name)?;

        let router = found(
            self.store.get_router(&params.name).await,
            EntityKind::Router,
            &params.name,
            "get router",
        )?;

        let ports = self
            .store
            .get_router_ports(&router.name)
            .await
            .map_err(|e| TopologyError::persistence("list router ports", e))?;
        let routes = self
            .store
            .get_static_routes(&router.name)
            .await
            .map_err(|e| TopologyError::persistence("list static routes", e))?;
        let nats = self
            .store
            .get_nat_rules(&router.name)
            .await
            .map_err(|e| TopologyError::persistence("list NAT rules", e))?;

        let dependents = ports.len() + routes.len() + nats.len();
        if dependents > 0 && !params.recursive {
            warn!(
                ports = ports.len(),
                routes = routes.len(),
                nats = nats.len(),
                "Router still has dependents"
            );
            return Err(TopologyError::conflict(
                format!("router {}", router.name),
                format!(
                    "{} ports, {} static routes and {} NAT rules remain; delete them or delete recursively",
                    ports.len(),
                    routes.len(),
                    nats.len()
                ),
            ));
        }

        self.store
            .delete(params.recursive, &[Entity::from(router.clone())])
            .await
            .map_err(|e| TopologyError::persistence("delete router", e))?;

        info!(router = %router.name, dependents, "Router deleted");
        Ok(())
    }

    /// Return one port of a router, or all of them sorted by name
    #[instrument(skip(self))]
    pub async fn show_router_port(&self, params: ShowRouterPort) -> TopologyResult<Vec<RouterPort>> {
        require_name("router", &params.router)?;
        let router = self.router(&params.router).await?;

        if let Some(port) = name_filter("port", &params.port)? {
            let port = found(
                self.store.get_router_port(&router.name, port).await,
                EntityKind::RouterPort,
                format!("{}/{}", router.name, port),
                "get router port",
            )?;
            return Ok(vec![port]);
        }

        let mut ports = self
            .store
            .get_router_ports(&router.name)
            .await
            .map_err(|e| TopologyError::persistence("list router ports", e))?;
        ports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ports)
    }

    /// Pre-declare a router port that names its future peer switch port
    ///
    /// The port stays unlinked until that switch port exists and names it
    /// back. Without `mac` the address is derived from the port IP.
    #[instrument(skip(self))]
    pub async fn add_router_port(&self, params: AddRouterPort) -> TopologyResult<RouterPort> {
        require_name("router", &params.router)?;
        require_name("port", &params.port)?;
        require("cidr", &params.cidr)?;
        require("peer", &params.peer)?;

        let (ip, prefix) =
            parse_cidr(&params.cidr).map_err(|e| TopologyError::invalid_format("cidr", e))?;
        let mac = match filter(&params.mac) {
            Some(mac) => mac
                .parse::<MacAddress>()
                .map_err(|e| TopologyError::invalid_format("mac", e))?,
            None => MacAddress::from_ip(&ip),
        };

        let router = self.router(&params.router).await?;

        if exists(
            self.store.get_router_port(&router.name, &params.port).await,
            "get router port",
        )? {
            return Err(TopologyError::conflict(
                format!("router port {}/{}", router.name, params.port),
                "port already exists",
            ));
        }

        let mut port = router.create_port(params.port, ip, prefix, mac);
        port.peer = params.peer;

        created(
            self.store.create(&[Entity::from(port.clone())]).await,
            format!("router port {}/{}", port.router, port.name),
            "create router port",
        )?;

        info!(router = %port.router, port = %port.name, peer = %port.peer, "Router port added");
        Ok(port)
    }

    /// Delete one port of a router
    #[instrument(skip(self))]
    pub async fn delete_router_port(&self, params: DeleteRouterPort) -> TopologyResult<()> {
        require_name("router", &params.router)?;
        require_name("port", &params.port)?;
        let router = self.router(&params.router).await?;

        let port = found(
            self.store.get_router_port(&router.name, &params.port).await,
            EntityKind::RouterPort,
            format!("{}/{}", router.name, params.port),
            "get router port",
        )?;

        self.store
            .delete(false, &[Entity::from(port)])
            .await
            .map_err(|e| TopologyError::persistence("delete router port", e))?;

        info!(router = %router.name, port = %params.port, "Router port deleted");
        Ok(())
    }

    /// Resolve the link state of a router port against the store
    #[instrument(skip(self))]
    pub async fn router_port_state(&self, params: ShowRouterPort) -> TopologyResult<PortState> {
        require_name("router", &params.router)?;
        let Some(port_name) = name_filter("port", &params.port)? else {
            return Err(TopologyError::invalid_input("port", "must not be empty"));
        };

        let port = found(
            self.store.get_router_port(&params.router, port_name).await,
            EntityKind::RouterPort,
            format!("{}/{}", params.router, port_name),
            "get router port",
        )?;
        if !port.has_peer() {
            return Ok(PortState::Unlinked);
        }

        let switch_ports = self.all_switch_ports().await?;
        Ok(PeerIndex::new(&switch_ports).state(&port))
    }

    /// Add a static route to a router
    #[instrument(skip(self))]
    pub async fn add_static_route(&self, params: AddStaticRoute) -> TopologyResult<StaticRoute> {
        require_name("router", &params.router)?;
        require_name("name", &params.name)?;
        require("cidr", &params.cidr)?;
        require("next_hop", &params.next_hop)?;
        require("out_port", &params.out_port)?;

        let destination: IpPrefix = params
            .cidr
            .parse()
            .map_err(|e| TopologyError::invalid_format("cidr", e))?;
        let next_hop: IpAddress = params
            .next_hop
            .parse()
            .map_err(|e| TopologyError::invalid_format("next_hop", e))?;
        if destination.address().is_ipv4() != next_hop.is_ipv4() {
            return Err(TopologyError::invalid_input(
                "next_hop",
                format!("{} is not in the address family of {}", next_hop, destination),
            ));
        }

        let router = self.router(&params.router).await?;

        if exists(
            self.store.get_static_route(&router.name, &params.name).await,
            "get static route",
        )? {
            return Err(TopologyError::conflict(
                format!("static route {}/{}", router.name, params.name),
                "route already exists",
            ));
        }

        let route = StaticRoute {
            router: router.name,
            name: params.name,
            destination,
            next_hop,
            out_port: params.out_port,
        };

        created(
            self.store.create(&[Entity::from(route.clone())]).await,
            format!("static route {}/{}", route.router, route.name),
            "create static route",
        )?;

        info!(
            router = %route.router,
            route = %route.name,
            destination = %route.destination,
            next_hop = %route.next_hop,
            "Static route added"
        );
        Ok(route)
    }

    /// Return one static route of a router, or all of them sorted by name
    #[instrument(skip(self))]
    pub async fn show_static_route(
        &self,
        params: ShowStaticRoute,
    ) -> TopologyResult<Vec<StaticRoute>> {
        require_name("router", &params.router)?;
        let router = self.router(&params.router).await?;

        if let Some(name) = name_filter("name", &params.name)? {
            let route = found(
                self.store.get_static_route(&router.name, name).await,
                EntityKind::StaticRoute,
                format!("{}/{}", router.name, name),
                "get static route",
            )?;
            return Ok(vec![route]);
        }

        let mut routes = self
            .store
            .get_static_routes(&router.name)
            .await
            .map_err(|e| TopologyError::persistence("list static routes", e))?;
        routes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(routes)
    }

    #[instrument(skip(self))]
    pub async fn delete_static_route(&self, params: DeleteStaticRoute) -> TopologyResult<()> {
        require_name("router", &params.router)?;
        require_name("name", &params.name)?;
        let router = self.router(&params.router).await?;

        let route = found(
            self.store.get_static_route(&router.name, &params.name).await,
            EntityKind::StaticRoute,
            format!("{}/{}", router.name, params.name),
            "get static route",
        )?;

        self.store
            .delete(false, &[Entity::from(route)])
            .await
            .map_err(|e| TopologyError::persistence("delete static route", e))?;

        info!(router = %router.name, route = %params.name, "Static route deleted");
        Ok(())
    }

    /// Add a NAT rule to a router
    #[instrument(skip(self))]
    pub async fn add_nat(&self, params: AddNat) -> TopologyResult<NatRule> {
        require_name("router", &params.router)?;
        require_name("name", &params.name)?;
        require("cidr", &params.cidr)?;
        require("nat_type", &params.nat_type)?;
        require("external_ip", &params.external_ip)?;

        let nat_type: NatType = params.nat_type.parse()?;
        let internal: IpPrefix = params
            .cidr
            .parse()
            .map_err(|e| TopologyError::invalid_format("cidr", e))?;
        let external: IpAddress = params
            .external_ip
            .parse()
            .map_err(|e| TopologyError::invalid_format("external_ip", e))?;

        let router = self.router(&params.router).await?;

        if exists(
            self.store.get_nat_rule(&router.name, &params.name).await,
            "get NAT rule",
        )? {
            return Err(TopologyError::conflict(
                format!("NAT rule {}/{}", router.name, params.name),
                "rule already exists",
            ));
        }

        let rule = NatRule {
            router: router.name,
            name: params.name,
            nat_type,
            internal,
            external,
        };

        created(
            self.store.create(&[Entity::from(rule.clone())]).await,
            format!("NAT rule {}/{}", rule.router, rule.name),
            "create NAT rule",
        )?;

        info!(
            router = %rule.router,
            rule = %rule.name,
            nat_type = %rule.nat_type,
            "NAT rule added"
        );
        Ok(rule)
    }

    /// Return one NAT rule of a router, or all of them sorted by name
    #[instrument(skip(self))]
    pub async fn show_nat(&self, params: ShowNat) -> TopologyResult<Vec<NatRule>> {
        require_name("router", &params.router)?;
        let router = self.router(&params.router).await?;

        if let Some(name) = name_filter("name", &params.name)? {
            let rule = found(
                self.store.get_nat_rule(&router.name, name).await,
                EntityKind::Nat,
                format!("{}/{}", router.name, name),
                "get NAT rule",
            )?;
            return Ok(vec![rule]);
        }

        let mut rules = self
            .store
            .get_nat_rules(&router.name)
            .await
            .map_err(|e| TopologyError::persistence("list NAT rules", e))?;
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rules)
    }

    #[instrument(skip(self))]
    pub async fn delete_nat(&self, params: DeleteNat) -> TopologyResult<()> {
        require_name("router", &params.router)?;
        require_name("name", &params.name)?;
        let router = self.router(&params.router).await?;

        let rule = found(
            self.store.get_nat_rule(&router.name, &params.name).await,
            EntityKind::Nat,
            format!("{}/{}", router.name, params.name),
            "get NAT rule",
        )?;

        self.store
            .delete(false, &[Entity::from(rule)])
            .await
            .map_err(|e| TopologyError::persistence("delete NAT rule", e))?;

        info!(router = %router.name, rule = %params.name, "NAT rule deleted");
        Ok(())
    }

    /// Create or update a logical switch
    #[instrument(skip(self))]
    pub async fn add_switch(&self, params: AddSwitch) -> TopologyResult<Switch> {
        require_name("name", &params.name)?;

        let switch = Switch::new(params.name);
        self.store
            .save(&[Entity::from(switch.clone())])
            .await
            .map_err(|e| TopologyError::persistence("save switch", e))?;

        info!(switch = %switch.name, "Switch saved");
        Ok(switch)
    }

    /// Return one switch by name, or every switch, sorted by name
    #[instrument(skip(self))]
    pub async fn show_switch(&self, params: ShowSwitch) -> TopologyResult<Vec<Switch>> {
        if let Some(name) = name_filter("name", &params.name)? {
            let switch = found(
                self.store.get_switch(name).await,
                EntityKind::Switch,
                name,
                "get switch",
            )?;
            return Ok(vec![switch]);
        }
        if !params.all {
            return Err(TopologyError::invalid_input(
                "name",
                "name a switch or ask for all",
            ));
        }

        let mut switches = self
            .store
            .get_switches()
            .await
            .map_err(|e| TopologyError::persistence("list switches", e))?;
        switches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(switches)
    }

    /// Delete a switch; ports block the delete unless `recursive` is set
    #[instrument(skip(self))]
    pub async fn delete_switch(&self, params: DeleteSwitch) -> TopologyResult<()> {
        require_name("name", &params.name)?;

        let switch = found(
            self.store.get_switch(&params.name).await,
            EntityKind::Switch,
            &params.name,
            "get switch",
        )?;

        let ports = self
            .store
            .get_switch_ports(&switch.name)
            .await
            .map_err(|e| TopologyError::persistence("list switch ports", e))?;

        if !ports.is_empty() && !params.recursive {
            warn!(ports = ports.len(), "Switch still has ports");
            return Err(TopologyError::conflict(
                format!("switch {}", switch.name),
                format!(
                    "{} ports remain; delete them or delete recursively",
                    ports.len()
                ),
            ));
        }

        self.store
            .delete(params.recursive, &[Entity::from(switch.clone())])
            .await
            .map_err(|e| TopologyError::persistence("delete switch", e))?;

        info!(switch = %switch.name, ports = ports.len(), "Switch deleted");
        Ok(())
    }

    /// Return one port of a switch, or all of them sorted by name
    #[instrument(skip(self))]
    pub async fn show_switch_port(&self, params: ShowSwitchPort) -> TopologyResult<Vec<SwitchPort>> {
        require_name("switch", &params.switch)?;
        let switch = self.switch(&params.switch).await?;

        if let Some(port) = name_filter("port", &params.port)? {
            let port = found(
                self.store.get_switch_port(&switch.name, port).await,
                EntityKind::SwitchPort,
                format!("{}/{}", switch.name, port),
                "get switch port",
            )?;
            return Ok(vec![port]);
        }

        let mut ports = self
            .store
            .get_switch_ports(&switch.name)
            .await
            .map_err(|e| TopologyError::persistence("list switch ports", e))?;
        ports.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(ports)
    }

    /// Add a port to a switch, optionally naming its peer router port
    ///
    /// Without `mac` the address is derived from the port IP.
    #[instrument(skip(self))]
    pub async fn add_switch_port(&self, params: AddSwitchPort) -> TopologyResult<SwitchPort> {
        require_name("switch", &params.switch)?;
        require_name("port", &params.port)?;
        require("ip", &params.ip)?;

        let ip: IpAddress = params
            .ip
            .parse()
            .map_err(|e| TopologyError::invalid_format("ip", e))?;
        let mac = match filter(&params.mac) {
            Some(mac) => mac
                .parse::<MacAddress>()
                .map_err(|e| TopologyError::invalid_format("mac", e))?,
            None => MacAddress::from_ip(&ip),
        };

        let switch = self.switch(&params.switch).await?;

        if exists(
            self.store.get_switch_port(&switch.name, &params.port).await,
            "get switch port",
        )? {
            return Err(TopologyError::conflict(
                format!("switch port {}/{}", switch.name, params.port),
                "port already exists",
            ));
        }

        let mut port = switch.create_port(params.port, ip, mac);
        if let Some(peer) = filter(&params.peer) {
            port.peer = peer.to_string();
        }

        created(
            self.store.create(&[Entity::from(port.clone())]).await,
            format!("switch port {}/{}", port.switch, port.name),
            "create switch port",
        )?;

        info!(switch = %port.switch, port = %port.name, peer = %port.peer, "Switch port added");
        Ok(port)
    }

    /// Delete one port of a switch
    #[instrument(skip(self))]
    pub async fn delete_switch_port(&self, params: DeleteSwitchPort) -> TopologyResult<()> {
        require_name("switch", &params.switch)?;
        require_name("port", &params.port)?;
        let switch = self.switch(&params.switch).await?;

        let port = found(
            self.store.get_switch_port(&switch.name, &params.port).await,
            EntityKind::SwitchPort,
            format!("{}/{}", switch.name, params.port),
            "get switch port",
        )?;

        self.store
            .delete(false, &[Entity::from(port)])
            .await
            .map_err(|e| TopologyError::persistence("delete switch port", e))?;

        info!(switch = %switch.name, port = %params.port, "Switch port deleted");
        Ok(())
    }

    /// Report broken links and orphaned children across the whole topology
    #[instrument(skip(self))]
    pub async fn check_links(&self) -> TopologyResult<Vec<LinkIssue>> {
        let router_ports = self
            .store
            .get_all_router_ports()
            .await
            .map_err(|e| TopologyError::persistence("list router ports", e))?;
        let switch_ports = self.all_switch_ports().await?;
        let routers = self
            .store
            .get_routers()
            .await
            .map_err(|e| TopologyError::persistence("list routers", e))?;
        let switches = self
            .store
            .get_switches()
            .await
            .map_err(|e| TopologyError::persistence("list switches", e))?;
        let routes = self
            .store
            .get_all_static_routes()
            .await
            .map_err(|e| TopologyError::persistence("list static routes", e))?;
        let nats = self
            .store
            .get_all_nat_rules()
            .await
            .map_err(|e| TopologyError::persistence("list NAT rules", e))?;

        let children: Vec<EntityKey> = router_ports
            .iter()
            .map(RouterPort::key)
            .chain(switch_ports.iter().map(SwitchPort::key))
            .chain(routes.iter().map(StaticRoute::key))
            .chain(nats.iter().map(NatRule::key))
            .collect();

        let mut issues = find_link_issues(&router_ports, &switch_ports);
        issues.extend(find_orphans(&routers, &switches, &children));
        issues.sort();

        if issues.is_empty() {
            debug!(
                router_ports = router_ports.len(),
                switch_ports = switch_ports.len(),
                children = children.len(),
                "Topology consistent"
            );
        } else {
            warn!(count = issues.len(), "Inconsistent links found");
        }
        Ok(issues)
    }

    async fn router(&self, name: &str) -> TopologyResult<Router> {
        found(
            self.store.get_router(name).await,
            EntityKind::Router,
            name,
            "get router",
        )
    }

    async fn switch(&self, name: &str) -> TopologyResult<Switch> {
        found(
            self.store.get_switch(name).await,
            EntityKind::Switch,
            name,
            "get switch",
        )
    }

    async fn all_switch_ports(&self) -> TopologyResult<Vec<SwitchPort>> {
        self.store
            .get_all_switch_ports()
            .await
            .map_err(|e| TopologyError::persistence("list switch ports", e))
    }
}

/// Rejects empty required fields
fn require(field: &'static str, value: &str) -> TopologyResult<()> {
    if value.trim().is_empty() {
        return Err(TopologyError::invalid_input(field, "must not be empty"));
    }
    Ok(())
}

/// Rejects values that cannot be used as an entity name
fn require_name(field: &'static str, value: &str) -> TopologyResult<()> {
    require(field, value)?;
    if value.contains('/') {
        return Err(TopologyError::invalid_input(
            field,
            format!("{} must not contain '/'", value),
        ));
    }
    Ok(())
}

/// Returns an optional filter as a name, rejecting malformed ones
fn name_filter<'a>(
    field: &'static str,
    value: &'a Option<String>,
) -> TopologyResult<Option<&'a str>> {
    let name = filter(value);
    if let Some(name) = name {
        require_name(field, name)?;
    }
    Ok(name)
}

/// Maps a lookup result, turning a missing key into `NotFound`
fn found<T>(
    result: StoreResult<T>,
    kind: EntityKind,
    name: impl Display,
    operation: &'static str,
) -> TopologyResult<T> {
    result.map_err(|e| {
        if e.is_not_found() {
            TopologyError::not_found(kind, name.to_string())
        } else {
            TopologyError::persistence(operation, e)
        }
    })
}

/// Maps an optional lookup; only a missing key means "absent"
fn lookup<T>(result: StoreResult<T>, operation: &'static str) -> TopologyResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(TopologyError::persistence(operation, e)),
    }
}

fn exists<T>(result: StoreResult<T>, operation: &'static str) -> TopologyResult<bool> {
    Ok(lookup(result, operation)?.is_some())
}

/// Maps an insert-if-absent write; losing a race is a conflict
fn created(
    result: StoreResult<()>,
    target: impl Into<String>,
    operation: &'static str,
) -> TopologyResult<()> {
    result.map_err(|e| {
        if e.is_already_exists() {
            TopologyError::conflict(target, e.to_string())
        } else {
            TopologyError::persistence(operation, e)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuplenet_store::StoreError;

    #[test]
    fn test_require_name() {
        assert!(require_name("name", "r1").is_ok());
        assert!(matches!(
            require_name("name", ""),
            Err(TopologyError::InvalidInput { field: "name", .. })
        ));
        assert!(require_name("name", "  ").is_err());
        assert!(require_name("name", "a/b").is_err());
    }

    #[test]
    fn test_found_distinguishes_not_found() {
        let err = found::<()>(
            Err(StoreError::not_found("/t/LR/r1")),
            EntityKind::Router,
            "r1",
            "get router",
        )
        .unwrap_err();
        assert!(err.is_not_found());

        let err = found::<()>(
            Err(StoreError::backend("GET", "connection reset")),
            EntityKind::Router,
            "r1",
            "get router",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TopologyError::Persistence {
                operation: "get router",
                ..
            }
        ));
    }

    #[test]
    fn test_name_filter() {
        assert_eq!(name_filter("name", &None).unwrap(), None);
        assert_eq!(name_filter("name", &Some(String::new())).unwrap(), None);
        assert_eq!(name_filter("name", &Some("r1".to_string())).unwrap(), Some("r1"));
        assert!(matches!(
            name_filter("port", &Some("a/b".to_string())),
            Err(TopologyError::InvalidInput { field: "port", .. })
        ));
    }

    #[test]
    fn test_exists() {
        assert!(exists(Ok(()), "get router").unwrap());
        assert!(!exists::<()>(Err(StoreError::not_found("k")), "get router").unwrap());
        assert!(exists::<()>(Err(StoreError::backend("GET", "down")), "get router").is_err());
        assert_eq!(lookup(Ok(7), "get router").unwrap(), Some(7));
    }

    #[test]
    fn test_created_maps_already_exists_to_conflict() {
        let err = created(
            Err(StoreError::AlreadyExists {
                key: "/t/LS/s1/lsp/s1_to_r1".to_string(),
            }),
            "link r1 <-> s1",
            "create link ports",
        )
        .unwrap_err();
        assert!(err.is_conflict());
    }
}
