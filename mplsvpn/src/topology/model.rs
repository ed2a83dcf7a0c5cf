// MplsVpn: Compiling MPLS L3VPN Network Intent
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Topology entities
//!
//! All entities are stored in index-stable tables inside the [`Topology`]. Cross references in the
//! input (subnet endpoints, VRF interfaces, CE AS numbers) are kept by name here, and resolved into
//! plain identifiers by the [validator](crate::validator).

use crate::topology::{AsId, InterfaceId, RouterId, RouterRole, SubnetId, VrfId};

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the address pool used for loopback addresses
pub const LOOPBACK_POOL: &str = "loopback";
/// Name of the address pool used for point-to-point links
pub const PHYSICAL_POOL: &str = "physical";
/// Name of the loopback interface, if the router does not declare one.
pub const DEFAULT_LOOPBACK_NAME: &str = "Loopback0";

/// # Autonomous System
/// An AS with its named IPv4 address pools (`role -> CIDR`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutonomousSystem {
    /// AS number
    pub as_id: AsId,
    /// Whether this AS is the provider backbone
    pub backbone: bool,
    /// Address pools, indexed by their role (at least `loopback` and `physical`).
    pub ipv4_ranges: BTreeMap<String, Ipv4Net>,
}

impl AutonomousSystem {
    /// Create a new AS without any address pool
    pub fn new(as_id: AsId, backbone: bool) -> Self {
        Self { as_id, backbone, ipv4_ranges: BTreeMap::new() }
    }

    /// Add an address pool for the given role, replacing the old pool of the same role.
    pub fn with_pool(mut self, role: impl Into<String>, pool: Ipv4Net) -> Self {
        self.ipv4_ranges.insert(role.into(), pool);
        self
    }

    /// Returns the address pool of the given role
    pub fn pool(&self, role: &str) -> Option<Ipv4Net> {
        self.ipv4_ranges.get(role).copied()
    }
}

/// Single router interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Name, unique on the router
    pub name: String,
    /// OSPF cost override. If not set, the configured default is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ospf_cost: Option<u32>,
}

impl Interface {
    /// Create an interface without cost override
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ospf_cost: None }
    }

    /// Returns true if the interface is a loopback interface (name starts with `Loopback`,
    /// ignoring the case).
    pub fn is_loopback(&self) -> bool {
        self.name.to_ascii_lowercase().starts_with("loopback")
    }
}

/// # Virtual Routing and Forwarding instance
/// A VRF is owned by exactly one PE router. The route distinguisher and the route targets are kept
/// as written in the input; they are checked by the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vrf {
    /// Name of the VRF, unique on the router
    pub name: String,
    /// Route distinguisher (`ASN:index`)
    pub rd: String,
    /// Route targets attached to exported routes
    pub export: Vec<String>,
    /// Route targets of routes which are imported
    pub import: Vec<String>,
    /// Names of the interfaces of the owning router that are bound to this VRF
    pub associated_interfaces: Vec<String>,
}

impl Vrf {
    /// Create a VRF without route targets and interfaces
    pub fn new(name: impl Into<String>, rd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rd: rd.into(),
            export: Vec::new(),
            import: Vec::new(),
            associated_interfaces: Vec::new(),
        }
    }

    /// Add an exported route target
    pub fn export(mut self, rt: impl Into<String>) -> Self {
        self.export.push(rt.into());
        self
    }

    /// Add an imported route target
    pub fn import(mut self, rt: impl Into<String>) -> Self {
        self.import.push(rt.into());
        self
    }

    /// Bind an interface of the owning router
    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.associated_interfaces.push(name.into());
        self
    }
}

/// # Router
/// A PE, P or CE router. Only PE routers have VRFs, and only CE routers have an AS number and a
/// private network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    /// Hostname, unique in the topology
    pub hostname: String,
    /// Role of the router
    pub role: RouterRole,
    /// Ordered list of interfaces
    pub interfaces: Vec<Interface>,
    /// VRFs (only on PE routers)
    pub vrfs: Vec<Vrf>,
    /// AS of the customer (only on CE routers)
    pub as_number: Option<AsId>,
    /// Customer prefix advertised into the VPN (only on CE routers)
    pub private_network: Option<Ipv4Net>,
}

impl Router {
    /// Create a new router of the given role without any interface.
    pub fn new(hostname: impl Into<String>, role: RouterRole) -> Self {
        Self {
            hostname: hostname.into(),
            role,
            interfaces: Vec::new(),
            vrfs: Vec::new(),
            as_number: None,
            private_network: None,
        }
    }

    /// Create a CE router of the given customer AS, advertising `private_network`.
    pub fn customer_edge(hostname: impl Into<String>, as_id: AsId, private_network: Ipv4Net) -> Self {
        let mut router = Self::new(hostname, RouterRole::CustomerEdge);
        router.as_number = Some(as_id);
        router.private_network = Some(private_network);
        router
    }

    /// Add an interface
    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(Interface::new(name));
        self
    }

    /// Add an interface with an OSPF cost override
    pub fn with_cost_interface(mut self, name: impl Into<String>, ospf_cost: u32) -> Self {
        self.interfaces.push(Interface { name: name.into(), ospf_cost: Some(ospf_cost) });
        self
    }

    /// Add a VRF
    pub fn with_vrf(mut self, vrf: Vrf) -> Self {
        self.vrfs.push(vrf);
        self
    }

    /// Returns the position of the interface with the given name.
    pub fn interface_index(&self, name: &str) -> Option<usize> {
        self.interfaces.iter().position(|i| i.name == name)
    }

    /// Returns the position of the loopback interface, if one is declared.
    pub fn loopback_index(&self) -> Option<usize> {
        self.interfaces.iter().position(|i| i.is_loopback())
    }

    /// Returns the name of the loopback interface. If the router does not declare any, then
    /// [`DEFAULT_LOOPBACK_NAME`] is used.
    pub fn loopback_name(&self) -> &str {
        self.loopback_index()
            .map(|idx| self.interfaces[idx].name.as_str())
            .unwrap_or(DEFAULT_LOOPBACK_NAME)
    }
}

/// One end of a subnet, given by the router hostname and the interface name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    /// Hostname of the router
    pub router: String,
    /// Name of the interface on that router
    pub interface: String,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(router: impl Into<String>, interface: impl Into<String>) -> Self {
        Self { router: router.into(), interface: interface.into() }
    }
}

/// Point-to-point link between exactly two router interfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    /// Both ends of the link, in the order of the input.
    pub endpoints: [Endpoint; 2],
}

/// # Topology
/// The parsed network intent. The topology is never modified by the compiler; every stage only
/// produces new derived values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Topology {
    pub(crate) ases: Vec<AutonomousSystem>,
    pub(crate) routers: Vec<Router>,
    pub(crate) subnets: Vec<Subnet>,
}

impl Topology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an autonomous system
    pub fn add_as(&mut self, autonomous_system: AutonomousSystem) {
        self.ases.push(autonomous_system);
    }

    /// Add a router, and return the ID which can be used to reference it.
    pub fn add_router(&mut self, router: Router) -> RouterId {
        self.routers.push(router);
        RouterId(self.routers.len() - 1)
    }

    /// Add a subnet between two endpoints, and return its ID.
    pub fn add_subnet(&mut self, a: Endpoint, b: Endpoint) -> SubnetId {
        self.subnets.push(Subnet { endpoints: [a, b] });
        SubnetId(self.subnets.len() - 1)
    }

    /// Returns all autonomous systems in declaration order
    pub fn ases(&self) -> &[AutonomousSystem] {
        &self.ases
    }

    /// Returns all routers (PEs, then Ps, then CEs when parsed from a document)
    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    /// Returns all subnets in declaration order
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    /// Returns an iterator over all router IDs
    pub fn router_ids(&self) -> impl Iterator<Item = RouterId> {
        (0..self.routers.len()).map(RouterId)
    }

    /// Returns an iterator over all VRF IDs, ordered by router and by position on the router.
    pub fn vrf_ids(&self) -> impl Iterator<Item = VrfId> + '_ {
        self.routers.iter().enumerate().flat_map(|(r, router)| {
            (0..router.vrfs.len()).map(move |index| VrfId { router: RouterId(r), index })
        })
    }

    /// Returns the router with the given ID. IDs are only created by the topology itself, so an
    /// unknown ID is a programming error and **panics**.
    pub fn router(&self, id: RouterId) -> &Router {
        &self.routers[id.index()]
    }

    /// Returns the interface with the given ID (**panics** on an unknown ID).
    pub fn interface(&self, id: InterfaceId) -> &Interface {
        &self.routers[id.router.index()].interfaces[id.index]
    }

    /// Returns the VRF with the given ID (**panics** on an unknown ID).
    pub fn vrf(&self, id: VrfId) -> &Vrf {
        &self.routers[id.router.index()].vrfs[id.index]
    }

    /// Returns the hostname of the router
    pub fn router_name(&self, id: RouterId) -> &str {
        self.router(id).hostname.as_str()
    }

    /// Returns the ID of the first router with the given hostname
    pub fn get_router_id(&self, hostname: &str) -> Option<RouterId> {
        self.routers.iter().position(|r| r.hostname == hostname).map(RouterId)
    }

    /// Resolves an endpoint to an interface ID, if both the router and the interface exist.
    pub fn get_interface_id(&self, endpoint: &Endpoint) -> Option<InterfaceId> {
        let router = self.get_router_id(&endpoint.router)?;
        let index = self.router(router).interface_index(&endpoint.interface)?;
        Some(InterfaceId { router, index })
    }

    /// Returns the first AS with the given number
    pub fn get_as(&self, as_id: AsId) -> Option<&AutonomousSystem> {
        self.ases.iter().find(|a| a.as_id == as_id)
    }

    /// Returns the first AS marked as backbone
    pub fn backbone(&self) -> Option<&AutonomousSystem> {
        self.ases.iter().find(|a| a.backbone)
    }
}
