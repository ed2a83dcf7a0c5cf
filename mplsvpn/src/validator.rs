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

//! # Structural Validator
//!
//! Checks the referential and graph integrity of a parsed [`Topology`]. All checks are executed,
//! and every violation is collected (in a deterministic order) instead of stopping at the first
//! one. On success, the validator returns a [`ValidTopology`], in which all cross references are
//! resolved to plain identifiers. All later stages of the compiler only accept a `ValidTopology`,
//! such that no stage can ever run on an invalid model.
//!
//! ```rust
//! use mplsvpn::example_networks::demo_topology;
//! use mplsvpn::validator::validate;
//!
//! let topo = demo_topology();
//! let valid = validate(&topo).unwrap();
//! assert_eq!(valid.links().len(), 12);
//! ```

use crate::config::is_valid_ospf_cost;
use crate::topology::{
    AsId, InterfaceId, PolicyId, PolicyIdError, RouterId, SubnetId, Topology, VrfId,
    LOOPBACK_POOL, PHYSICAL_POOL,
};

use itertools::Itertools;
use log::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use thiserror::Error;

/// Validate the topology. Returns either the validated view on the topology, or all violations
/// that were found.
pub fn validate(topo: &Topology) -> Result<ValidTopology<'_>, ValidationErrors> {
    let mut checker = Checker { topo, errors: Vec::new() };

    let backbone = checker.check_ases();
    checker.check_routers();
    let (vrf_interfaces, interface_vrf) = checker.check_vrfs();
    let (links, interface_link) = checker.check_subnets();
    checker.check_vrf_links(&links, &interface_vrf);
    checker.check_ce_pools(&links);

    let router_as: Option<Vec<AsId>> = backbone.and_then(|backbone| {
        topo.routers()
            .iter()
            .map(|r| if r.role.is_ce() { r.as_number } else { Some(backbone) })
            .collect()
    });

    match (backbone, router_as) {
        (Some(backbone), Some(router_as)) if checker.errors.is_empty() => {
            debug!("Topology is valid");
            Ok(ValidTopology {
                topo,
                backbone,
                router_as,
                links,
                vrf_interfaces,
                interface_vrf,
                interface_link,
            })
        }
        _ => {
            info!("Topology is invalid: {} violations found", checker.errors.len());
            Err(ValidationErrors(checker.errors))
        }
    }
}

/// # Validated Topology
/// A view on a [`Topology`], which has passed all structural checks. All references are resolved:
/// every subnet is a [`Link`] between two existing interfaces, every VRF knows its interfaces, and
/// every router knows the AS it belongs to (the backbone AS for PE and P routers, and the declared
/// AS for CE routers).
#[derive(Debug, Clone)]
pub struct ValidTopology<'a> {
    topo: &'a Topology,
    backbone: AsId,
    router_as: Vec<AsId>,
    links: Vec<Link>,
    vrf_interfaces: BTreeMap<VrfId, Vec<InterfaceId>>,
    interface_vrf: HashMap<InterfaceId, VrfId>,
    interface_link: HashMap<InterfaceId, SubnetId>,
}

impl<'a> ValidTopology<'a> {
    /// Returns the underlying topology
    pub fn topology(&self) -> &'a Topology {
        self.topo
    }

    /// Returns the backbone AS number
    pub fn backbone(&self) -> AsId {
        self.backbone
    }

    /// Returns the AS to which the router belongs.
    pub fn router_as(&self, router: RouterId) -> AsId {
        self.router_as[router.index()]
    }

    /// Returns all links, in the order of the subnets in the topology.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns the link of the given subnet
    pub fn link(&self, subnet: SubnetId) -> &Link {
        &self.links[subnet.0]
    }

    /// Returns the link on which the interface is an endpoint
    pub fn link_of(&self, iface: InterfaceId) -> Option<&Link> {
        self.interface_link.get(&iface).map(|s| self.link(*s))
    }

    /// Returns the interfaces bound to the VRF
    pub fn vrf_interfaces(&self, vrf: VrfId) -> &[InterfaceId] {
        self.vrf_interfaces.get(&vrf).map(|x| x.as_slice()).unwrap_or(&[])
    }

    /// Returns the VRF to which the interface is bound
    pub fn vrf_of(&self, iface: InterfaceId) -> Option<VrfId> {
        self.interface_vrf.get(&iface).copied()
    }

    /// Returns true if both ends of the link are PE or P routers.
    pub fn is_core_link(&self, link: &Link) -> bool {
        link.endpoints.iter().all(|i| self.topo.router(i.router).role.is_core())
    }
}

/// Resolved subnet between two router interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Subnet from which this link was created
    pub subnet: SubnetId,
    /// Both interfaces, in the order of the input
    pub endpoints: [InterfaceId; 2],
}

impl Link {
    /// Returns the interface on the other side of the link, or `None` if `iface` is not an
    /// endpoint of this link.
    pub fn peer(&self, iface: InterfaceId) -> Option<InterfaceId> {
        if self.endpoints[0] == iface {
            Some(self.endpoints[1])
        } else if self.endpoints[1] == iface {
            Some(self.endpoints[0])
        } else {
            None
        }
    }
}

/// Single violation found by the validator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Something references an entity that does not exist.
    #[error("{from} references an unknown {target}")]
    DanglingReference {
        /// Entity holding the reference
        from: String,
        /// The missing entity
        target: String,
    },
    /// An identifier that must be unique is used multiple times.
    #[error("Duplicate {kind}: {id}")]
    DuplicateIdentifier {
        /// Which kind of identifier
        kind: IdentifierKind,
        /// The duplicated identifier
        id: String,
    },
    /// An interface is used in incompatible roles.
    #[error("Interface {interface} on {router} {reason}")]
    InterfaceConflict {
        /// Hostname of the router
        router: String,
        /// Name of the interface
        interface: String,
        /// Why the interface is in conflict
        reason: ConflictReason,
    },
    /// A route distinguisher or route target is malformed.
    #[error("VRF {vrf} on {router}: invalid {field} `{value}`: {error}")]
    MalformedPolicyIdentifier {
        /// Hostname of the PE router
        router: String,
        /// Name of the VRF
        vrf: String,
        /// Which field (`rd`, `export` or `import`)
        field: &'static str,
        /// The value as written in the input
        value: String,
        /// What is wrong with the value
        error: PolicyIdentifierError,
    },
    /// The OSPF cost of an interface is outside of `1..=65535`.
    #[error("Interface {interface} on {router} has the invalid OSPF cost {cost}")]
    InvalidOspfCost {
        /// Hostname of the router
        router: String,
        /// Name of the interface
        interface: String,
        /// The declared cost
        cost: u32,
    },
}

/// Kinds of identifiers that must be unique
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// AS number (globally)
    AsNumber,
    /// Backbone flag (at most one AS)
    Backbone,
    /// Router hostname (globally)
    Hostname,
    /// Interface name (per router)
    Interface,
    /// VRF name (per router)
    VrfName,
    /// Route distinguisher (globally)
    RouteDistinguisher,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AsNumber => "AS number",
            Self::Backbone => "backbone AS",
            Self::Hostname => "hostname",
            Self::Interface => "interface name",
            Self::VrfName => "VRF name",
            Self::RouteDistinguisher => "route distinguisher",
        })
    }
}

/// Reason for an [`ValidationError::InterfaceConflict`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// The interface is an endpoint of two subnets
    MultipleSubnets(SubnetId, SubnetId),
    /// The interface is bound to two VRFs
    MultipleVrfs(String, String),
    /// The interface is bound to a VRF, but it connects to a core (PE or P) router.
    VrfOnCoreLink {
        /// VRF to which the interface is bound
        vrf: String,
        /// Hostname of the core router on the other side
        peer: String,
    },
    /// Both endpoints of the subnet are the same interface
    SelfLoop(SubnetId),
    /// A loopback interface is used as a subnet endpoint
    LoopbackInSubnet(SubnetId),
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleSubnets(a, b) => write!(f, "is used by subnet #{} and #{}", a.0, b.0),
            Self::MultipleVrfs(a, b) => write!(f, "is bound to VRF {} and VRF {}", a, b),
            Self::VrfOnCoreLink { vrf, peer } => {
                write!(f, "is bound to VRF {}, but links to the core router {}", vrf, peer)
            }
            Self::SelfLoop(s) => write!(f, "is both endpoints of subnet #{}", s.0),
            Self::LoopbackInSubnet(s) => write!(f, "is a loopback, but used by subnet #{}", s.0),
        }
    }
}

/// Reason for a [`ValidationError::MalformedPolicyIdentifier`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyIdentifierError {
    /// The value does not have the shape `ASN:index`
    #[error("{0}")]
    Syntax(#[from] PolicyIdError),
    /// The ASN part does not match any declared AS
    #[error("{0} is not declared")]
    UnknownAs(AsId),
}

/// Non-empty list of violations, in the order in which they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Returns an iterator over all violations
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Number of violations
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no violations. A `ValidationErrors` returned by [`validate`] is
    /// never empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} violation(s): {}", self.0.len(), self.0.iter().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

struct Checker<'a> {
    topo: &'a Topology,
    errors: Vec<ValidationError>,
}

impl<'a> Checker<'a> {
    fn push(&mut self, error: ValidationError) {
        trace!("Violation: {}", error);
        self.errors.push(error);
    }

    fn dangling(&mut self, from: String, target: String) {
        self.push(ValidationError::DanglingReference { from, target });
    }

    fn duplicate(&mut self, kind: IdentifierKind, id: impl Into<String>) {
        self.push(ValidationError::DuplicateIdentifier { kind, id: id.into() });
    }

    fn conflict(&mut self, iface: InterfaceId, reason: ConflictReason) {
        let topo = self.topo;
        let router = topo.router(iface.router);
        self.push(ValidationError::InterfaceConflict {
            router: router.hostname.clone(),
            interface: router.interfaces[iface.index].name.clone(),
            reason,
        });
    }

    /// Checks AS uniqueness and the backbone. Returns the backbone AS, if exactly one exists.
    fn check_ases(&mut self) -> Option<AsId> {
        let topo = self.topo;
        let mut seen: HashSet<AsId> = HashSet::new();
        for a in topo.ases() {
            if !seen.insert(a.as_id) {
                self.duplicate(IdentifierKind::AsNumber, a.as_id.to_string());
            }
        }

        let backbones = topo.ases().iter().filter(|a| a.backbone).collect::<Vec<_>>();
        match backbones.as_slice() {
            [] => {
                self.dangling("The topology".to_string(), "backbone AS (none declared)".into());
                None
            }
            [backbone] => {
                for role in &[LOOPBACK_POOL, PHYSICAL_POOL] {
                    if backbone.pool(role).is_none() {
                        self.dangling(
                            format!("Backbone {}", backbone.as_id),
                            format!("ipv4 range `{}`", role),
                        );
                    }
                }
                Some(backbone.as_id)
            }
            many => {
                let id = many.iter().map(|a| a.as_id).join(", ");
                self.duplicate(IdentifierKind::Backbone, id);
                None
            }
        }
    }

    /// Checks hostname and interface uniqueness, and the AS reference of CE routers.
    fn check_routers(&mut self) {
        let topo = self.topo;
        let mut hostnames: HashSet<&str> = HashSet::new();
        for router in topo.routers() {
            if !hostnames.insert(router.hostname.as_str()) {
                self.duplicate(IdentifierKind::Hostname, router.hostname.clone());
            }

            let mut names: HashSet<&str> = HashSet::new();
            for iface in router.interfaces.iter() {
                if !names.insert(iface.name.as_str()) {
                    self.duplicate(
                        IdentifierKind::Interface,
                        format!("{} on {}", iface.name, router.hostname),
                    );
                }
                if let Some(cost) = iface.ospf_cost {
                    if !is_valid_ospf_cost(cost) {
                        self.push(ValidationError::InvalidOspfCost {
                            router: router.hostname.clone(),
                            interface: iface.name.clone(),
                            cost,
                        });
                    }
                }
            }

            match router.as_number {
                Some(as_id) if topo.get_as(as_id).is_none() => {
                    self.dangling(format!("CE router {}", router.hostname), as_id.to_string());
                }
                None if router.role.is_ce() => {
                    let from = format!("CE router {}", router.hostname);
                    self.dangling(from, "AS (none declared)".to_string());
                }
                _ => {}
            }
        }
    }

    /// Checks VRF names, RD/RT identifiers and the VRF interfaces. Returns the resolved VRF
    /// interfaces, and the reverse lookup from interface to VRF.
    #[allow(clippy::type_complexity)]
    fn check_vrfs(
        &mut self,
    ) -> (BTreeMap<VrfId, Vec<InterfaceId>>, HashMap<InterfaceId, VrfId>) {
        let topo = self.topo;
        let mut vrf_interfaces: BTreeMap<VrfId, Vec<InterfaceId>> = BTreeMap::new();
        let mut interface_vrf: HashMap<InterfaceId, VrfId> = HashMap::new();
        let mut rds: HashSet<String> = HashSet::new();
        let mut names: HashSet<(RouterId, &str)> = HashSet::new();

        for vrf_id in topo.vrf_ids() {
            let router = topo.router(vrf_id.router);
            let vrf = topo.vrf(vrf_id);

            if !names.insert((vrf_id.router, vrf.name.as_str())) {
                self.duplicate(
                    IdentifierKind::VrfName,
                    format!("{} on {}", vrf.name, router.hostname),
                );
            }

            // route distinguisher must be parseable and globally unique
            if let Some(rd) = self.check_policy_id(vrf_id, "rd", &vrf.rd) {
                if !rds.insert(rd.to_string()) {
                    self.duplicate(IdentifierKind::RouteDistinguisher, rd.to_string());
                }
            }
            for rt in vrf.export.iter() {
                self.check_policy_id(vrf_id, "export", rt);
            }
            for rt in vrf.import.iter() {
                self.check_policy_id(vrf_id, "import", rt);
            }

            let mut ifaces: Vec<InterfaceId> = Vec::new();
            for name in vrf.associated_interfaces.iter() {
                let iface = match router.interface_index(name) {
                    Some(index) => InterfaceId { router: vrf_id.router, index },
                    None => {
                        self.dangling(
                            format!("VRF {} on {}", vrf.name, router.hostname),
                            format!("interface {}", name),
                        );
                        continue;
                    }
                };
                if ifaces.contains(&iface) {
                    continue;
                }
                if let Some(other) = interface_vrf.get(&iface) {
                    let other = topo.vrf(*other).name.clone();
                    self.conflict(iface, ConflictReason::MultipleVrfs(other, vrf.name.clone()));
                    continue;
                }
                interface_vrf.insert(iface, vrf_id);
                ifaces.push(iface);
            }
            vrf_interfaces.insert(vrf_id, ifaces);
        }

        (vrf_interfaces, interface_vrf)
    }

    /// Parses a single RD or RT and checks that the ASN is declared.
    fn check_policy_id(&mut self, vrf_id: VrfId, field: &'static str, value: &str) -> Option<PolicyId> {
        let topo = self.topo;
        let error = match value.parse::<PolicyId>() {
            Ok(id) if topo.get_as(id.asn).is_some() => return Some(id),
            Ok(id) => PolicyIdentifierError::UnknownAs(id.asn),
            Err(e) => PolicyIdentifierError::Syntax(e),
        };
        self.push(ValidationError::MalformedPolicyIdentifier {
            router: topo.router_name(vrf_id.router).to_string(),
            vrf: topo.vrf(vrf_id).name.clone(),
            field,
            value: value.to_string(),
            error,
        });
        None
    }

    /// Resolves all subnets to links, and checks that every interface is used at most once.
    fn check_subnets(&mut self) -> (Vec<Link>, HashMap<InterfaceId, SubnetId>) {
        let topo = self.topo;
        let mut links: Vec<Link> = Vec::with_capacity(topo.subnets().len());
        let mut interface_link: HashMap<InterfaceId, SubnetId> = HashMap::new();

        for (i, subnet) in topo.subnets().iter().enumerate() {
            let subnet_id = SubnetId(i);
            let mut resolved: Vec<InterfaceId> = Vec::with_capacity(2);
            for ep in subnet.endpoints.iter() {
                match topo.get_router_id(&ep.router) {
                    None => self.dangling(format!("Subnet #{}", i), format!("router {}", ep.router)),
                    Some(r) => match topo.router(r).interface_index(&ep.interface) {
                        None => self.dangling(
                            format!("Subnet #{}", i),
                            format!("interface {} on {}", ep.interface, ep.router),
                        ),
                        Some(index) => resolved.push(InterfaceId { router: r, index }),
                    },
                }
            }

            let (a, b) = match resolved.as_slice() {
                [a, b] => (*a, *b),
                _ => continue,
            };

            if a == b {
                self.conflict(a, ConflictReason::SelfLoop(subnet_id));
                continue;
            }

            let mut ok = true;
            for iface in [a, b].iter() {
                if topo.interface(*iface).is_loopback() {
                    self.conflict(*iface, ConflictReason::LoopbackInSubnet(subnet_id));
                    ok = false;
                } else if let Some(other) = interface_link.get(iface) {
                    let other = *other;
                    self.conflict(*iface, ConflictReason::MultipleSubnets(other, subnet_id));
                    ok = false;
                }
            }

            if ok {
                interface_link.insert(a, subnet_id);
                interface_link.insert(b, subnet_id);
                links.push(Link { subnet: subnet_id, endpoints: [a, b] });
            }
        }

        (links, interface_link)
    }

    /// An interface bound to a VRF may only link to a CE router.
    fn check_vrf_links(&mut self, links: &[Link], interface_vrf: &HashMap<InterfaceId, VrfId>) {
        let topo = self.topo;
        for link in links {
            for iface in link.endpoints.iter() {
                let vrf = match interface_vrf.get(iface) {
                    Some(vrf) => *vrf,
                    None => continue,
                };
                let peer = link.peer(*iface).unwrap_or(*iface);
                let peer_router = topo.router(peer.router);
                if peer_router.role.is_core() {
                    let reason = ConflictReason::VrfOnCoreLink {
                        vrf: topo.vrf(vrf).name.clone(),
                        peer: peer_router.hostname.clone(),
                    };
                    self.conflict(*iface, reason);
                }
            }
        }
    }

    /// Every AS owning a CE-facing link must declare a physical pool.
    fn check_ce_pools(&mut self, links: &[Link]) {
        let topo = self.topo;
        let owners: BTreeSet<AsId> = links
            .iter()
            .filter_map(|l| {
                l.endpoints
                    .iter()
                    .map(|i| topo.router(i.router))
                    .find(|r| r.role.is_ce())
                    .and_then(|r| r.as_number)
            })
            .collect();
        for as_id in owners {
            if let Some(a) = topo.get_as(as_id) {
                if a.pool(PHYSICAL_POOL).is_none() {
                    self.dangling(as_id.to_string(), format!("ipv4 range `{}`", PHYSICAL_POOL));
                }
            }
        }
    }
}
