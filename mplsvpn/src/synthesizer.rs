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

//! # Routing-Plane Synthesizer
//!
//! Projects the validated topology and its address allocation onto per-router plans:
//!
//! - Every PE and P router runs OSPF on its loopback (passive) and on all core interfaces, and
//!   enables LDP on them (`mpls ldp autoconfig`).
//! - Every PE runs MP-BGP: a VPNv4 iBGP session to the loopback of every other PE, and one
//!   `address-family ipv4 vrf` block per VRF, holding the eBGP sessions to the attached CEs.
//! - Every CE runs eBGP towards its PEs, and advertises its private network.
//!
//! The synthesizer only reads data which the validator and the allocator have already checked.
//! Any inconsistency is a bug in the compiler, and **panics**.

use crate::allocator::Allocation;
use crate::config::CompilerConfig;
use crate::topology::{AsId, Endpoint, InterfaceId, PolicyId, RouterId, RouterRole, VrfId};
use crate::validator::ValidTopology;
use crate::vpn::{PolicyWarning, VpnGraph, VrfRole};

use ipnet::Ipv4Net;
use log::*;
use petgraph::algo::dijkstra;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::net::Ipv4Addr;

/// Derive the plans of all routers, the MPLS link set, and the IGP reachability warnings.
pub fn synthesize(
    valid: &ValidTopology<'_>,
    alloc: &Allocation,
    vpn: &VpnGraph,
    config: &CompilerConfig,
) -> Synthesis {
    let topo = valid.topology();
    let (igp_costs, mut warnings) = igp_reachability(valid, config);
    warnings.extend(unbound_ce_links(valid));

    let routers = topo
        .router_ids()
        .map(|r| {
            let router = topo.router(r);
            trace!("Synthesize {} ({})", router.hostname, router.role);
            RouterPlan {
                hostname: router.hostname.clone(),
                role: router.role,
                as_id: valid.router_as(r),
                interfaces: interface_plans(valid, alloc, config, r),
                ospf: if router.role.is_core() {
                    Some(ospf_plan(valid, alloc, config, r, igp_costs.get(&r).cloned()))
                } else {
                    None
                },
                bgp: if router.role.is_pe() { Some(vpnv4_plan(valid, alloc, vpn, r)) } else { None },
                ce_bgp: if router.role.is_ce() { Some(ce_plan(valid, alloc, r)) } else { None },
            }
        })
        .collect::<Vec<_>>();

    let mpls_links = valid
        .links()
        .iter()
        .filter(|l| valid.is_core_link(l))
        .map(|l| MplsLink {
            subnet: l.subnet.0,
            endpoints: [endpoint(valid, l.endpoints[0]), endpoint(valid, l.endpoints[1])],
            network: alloc
                .link(l.subnet)
                .map(|a| a.network)
                .expect("every link is allocated"),
        })
        .collect::<Vec<_>>();

    debug!("Synthesized {} routers and {} MPLS links", routers.len(), mpls_links.len());
    Synthesis { routers, mpls_links, warnings }
}

/// Result of the synthesizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    /// Plans of all routers, in declaration order
    pub routers: Vec<RouterPlan>,
    /// All links between two core routers
    pub mpls_links: Vec<MplsLink>,
    /// IGP reachability warnings
    pub warnings: Vec<PolicyWarning>,
}

/// Complete plan of a single router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterPlan {
    /// Hostname
    pub hostname: String,
    /// Role of the router
    pub role: RouterRole,
    /// AS to which the router belongs
    pub as_id: AsId,
    /// All interfaces (a `Loopback0` is added in front if the router has a loopback address but
    /// does not declare a loopback interface)
    pub interfaces: Vec<InterfacePlan>,
    /// OSPF and LDP (PE and P routers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ospf: Option<OspfPlan>,
    /// MP-BGP VPNv4 (PE routers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bgp: Option<BgpPlan>,
    /// eBGP towards the provider (CE routers only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ce_bgp: Option<CeBgpPlan>,
}

impl RouterPlan {
    /// Returns the plan of the interface with the given name
    pub fn interface(&self, name: &str) -> Option<&InterfacePlan> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Returns the loopback address of the router
    pub fn loopback(&self) -> Option<Ipv4Addr> {
        self.interfaces.iter().find(|i| i.loopback).and_then(|i| i.address).map(|a| a.addr())
    }
}

/// Plan of a single interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfacePlan {
    /// Interface name
    pub name: String,
    /// Whether this is the loopback interface
    pub loopback: bool,
    /// Assigned address with prefix length (`/32` for loopbacks)
    pub address: Option<Ipv4Net>,
    /// VRF forwarding on this interface
    pub vrf: Option<String>,
    /// OSPF cost, if the interface participates in OSPF
    pub ospf_cost: Option<u32>,
    /// Whether LDP runs on this interface
    pub mpls: bool,
    /// Interface on the other side of the link
    pub peer: Option<Endpoint>,
}

/// OSPF and LDP configuration of a core router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OspfPlan {
    /// OSPF process id
    pub process_id: u32,
    /// Router id (the loopback address)
    pub router_id: Ipv4Addr,
    /// OSPF area of all interfaces
    pub area: u32,
    /// Interfaces in OSPF
    pub interfaces: Vec<OspfInterface>,
    /// Whether LDP is enabled on all OSPF interfaces
    pub ldp_autoconfig: bool,
    /// Shortest path cost towards the loopback of every reachable PE (only on PE routers)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub igp_costs: BTreeMap<String, u64>,
}

/// Interface participating in OSPF
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OspfInterface {
    /// Interface name
    pub name: String,
    /// OSPF cost
    pub cost: u32,
    /// Passive interfaces are advertised, but form no adjacency.
    pub passive: bool,
}

/// MP-BGP configuration of a PE router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BgpPlan {
    /// Local AS (the backbone)
    pub local_as: AsId,
    /// Router id (the loopback address)
    pub router_id: Ipv4Addr,
    /// iBGP VPNv4 sessions to all other PEs
    pub vpnv4_neighbors: Vec<Vpnv4Neighbor>,
    /// One policy block per VRF
    pub vrfs: Vec<VrfPolicy>,
}

/// iBGP VPNv4 session to another PE
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vpnv4Neighbor {
    /// Hostname of the peer
    pub peer: String,
    /// Loopback address of the peer
    pub address: Ipv4Addr,
    /// AS of the peer (the backbone)
    pub remote_as: AsId,
    /// Local interface used as source of the session
    pub update_source: String,
    /// Whether extended communities (the route targets) are sent
    pub send_community_extended: bool,
}

/// Per-VRF block of a PE
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VrfPolicy {
    /// VRF name
    pub name: String,
    /// Route distinguisher
    pub rd: PolicyId,
    /// Exported route targets
    pub export: BTreeSet<PolicyId>,
    /// Imported route targets
    pub import: BTreeSet<PolicyId>,
    /// Role of the VRF in the VPN graph
    pub role: VrfRole,
    /// Interfaces bound to the VRF
    pub interfaces: Vec<String>,
    /// eBGP sessions to the CEs attached to the VRF
    pub neighbors: Vec<CeNeighbor>,
}

/// eBGP session from a VRF to a CE
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CeNeighbor {
    /// Hostname of the CE
    pub router: String,
    /// Link address of the CE
    pub address: Ipv4Addr,
    /// AS of the CE
    pub remote_as: AsId,
    /// Prefixes reachable through the CE
    pub prefixes: Vec<Ipv4Net>,
}

/// eBGP configuration of a CE router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CeBgpPlan {
    /// Local AS (the customer AS)
    pub local_as: AsId,
    /// Router id (the loopback address, if there is one)
    pub router_id: Option<Ipv4Addr>,
    /// Sessions to the attached routers
    pub neighbors: Vec<PeNeighbor>,
    /// Advertised networks
    pub networks: Vec<Ipv4Net>,
}

/// eBGP session from a CE to its provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeNeighbor {
    /// Hostname of the PE
    pub router: String,
    /// Link address of the PE
    pub address: Ipv4Addr,
    /// AS of the PE (the backbone)
    pub remote_as: AsId,
}

/// Link on which MPLS (LDP) is enabled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MplsLink {
    /// Position of the subnet in the topology
    pub subnet: usize,
    /// Both endpoints
    pub endpoints: [Endpoint; 2],
    /// Network of the link
    pub network: Ipv4Net,
}

fn endpoint(valid: &ValidTopology<'_>, iface: InterfaceId) -> Endpoint {
    let topo = valid.topology();
    Endpoint::new(topo.router_name(iface.router), topo.interface(iface).name.as_str())
}

fn link_address(alloc: &Allocation, iface: InterfaceId) -> Ipv4Net {
    alloc.interface_address(iface).expect("every link endpoint has an address")
}

fn loopback(alloc: &Allocation, router: RouterId) -> Ipv4Addr {
    alloc.loopback(router).expect("every PE and P router has a loopback address")
}

fn interface_cost(valid: &ValidTopology<'_>, config: &CompilerConfig, iface: InterfaceId) -> u32 {
    valid.topology().interface(iface).ospf_cost.unwrap_or(config.default_ospf_cost)
}

fn interface_plans(
    valid: &ValidTopology<'_>,
    alloc: &Allocation,
    config: &CompilerConfig,
    r: RouterId,
) -> Vec<InterfacePlan> {
    let topo = valid.topology();
    let router = topo.router(r);
    let core = router.role.is_core();
    let loopback_addr = alloc.loopback(r).map(Ipv4Net::from);
    let mut plans = Vec::with_capacity(router.interfaces.len() + 1);

    if router.loopback_index().is_none() && loopback_addr.is_some() {
        plans.push(InterfacePlan {
            name: router.loopback_name().to_string(),
            loopback: true,
            address: loopback_addr,
            vrf: None,
            ospf_cost: if core { Some(config.default_ospf_cost) } else { None },
            mpls: false,
            peer: None,
        });
    }

    for (index, iface) in router.interfaces.iter().enumerate() {
        let id = InterfaceId { router: r, index };
        let vrf = valid.vrf_of(id).map(|v| topo.vrf(v).name.clone());
        let plan = if iface.is_loopback() && Some(index) == router.loopback_index() {
            InterfacePlan {
                name: iface.name.clone(),
                loopback: true,
                address: loopback_addr,
                vrf,
                ospf_cost: if core { Some(interface_cost(valid, config, id)) } else { None },
                mpls: false,
                peer: None,
            }
        } else if let Some(link) = valid.link_of(id) {
            let peer = link.peer(id).expect("interface is an endpoint of its own link");
            let core_link = valid.is_core_link(link);
            InterfacePlan {
                name: iface.name.clone(),
                loopback: false,
                address: Some(link_address(alloc, id)),
                vrf,
                ospf_cost: if core_link { Some(interface_cost(valid, config, id)) } else { None },
                mpls: core_link,
                peer: Some(endpoint(valid, peer)),
            }
        } else {
            InterfacePlan {
                name: iface.name.clone(),
                loopback: iface.is_loopback(),
                address: None,
                vrf,
                ospf_cost: None,
                mpls: false,
                peer: None,
            }
        };
        plans.push(plan);
    }
    plans
}

fn ospf_plan(
    valid: &ValidTopology<'_>,
    alloc: &Allocation,
    config: &CompilerConfig,
    r: RouterId,
    igp_costs: Option<BTreeMap<String, u64>>,
) -> OspfPlan {
    let plans = interface_plans(valid, alloc, config, r);
    let interfaces = plans
        .into_iter()
        .filter_map(|i| {
            i.ospf_cost.map(|cost| OspfInterface { name: i.name, cost, passive: i.loopback })
        })
        .collect();
    OspfPlan {
        process_id: config.ospf_process_id,
        router_id: loopback(alloc, r),
        area: config.ospf_area,
        interfaces,
        ldp_autoconfig: true,
        igp_costs: igp_costs.unwrap_or_default(),
    }
}

fn vpnv4_plan(valid: &ValidTopology<'_>, alloc: &Allocation, vpn: &VpnGraph, r: RouterId) -> BgpPlan {
    let topo = valid.topology();
    let router = topo.router(r);

    let vpnv4_neighbors = topo
        .router_ids()
        .filter(|p| *p != r && topo.router(*p).role.is_pe())
        .map(|p| Vpnv4Neighbor {
            peer: topo.router_name(p).to_string(),
            address: loopback(alloc, p),
            remote_as: valid.backbone(),
            update_source: router.loopback_name().to_string(),
            send_community_extended: true,
        })
        .collect();

    let vrfs = (0..router.vrfs.len())
        .map(|index| {
            let id = VrfId { router: r, index };
            let vrf = topo.vrf(id);
            let rd: PolicyId = vrf.rd.parse().expect("route distinguishers are validated");
            let node = vpn.node(rd).expect("every VRF is part of the VPN graph");
            let ifaces = valid.vrf_interfaces(id);
            let neighbors = ifaces
                .iter()
                .filter_map(|i| valid.link_of(*i).and_then(|l| l.peer(*i)))
                .map(|peer| CeNeighbor {
                    router: topo.router_name(peer.router).to_string(),
                    address: link_address(alloc, peer).addr(),
                    remote_as: valid.router_as(peer.router),
                    prefixes: topo.router(peer.router).private_network.into_iter().collect(),
                })
                .collect();
            VrfPolicy {
                name: vrf.name.clone(),
                rd,
                export: node.export.clone(),
                import: node.import.clone(),
                role: vpn.role(rd).expect("every VRF is classified"),
                interfaces: ifaces.iter().map(|i| topo.interface(*i).name.clone()).collect(),
                neighbors,
            }
        })
        .collect();

    BgpPlan { local_as: valid.backbone(), router_id: loopback(alloc, r), vpnv4_neighbors, vrfs }
}

fn ce_plan(valid: &ValidTopology<'_>, alloc: &Allocation, r: RouterId) -> CeBgpPlan {
    let topo = valid.topology();
    let router = topo.router(r);
    let neighbors = (0..router.interfaces.len())
        .map(|index| InterfaceId { router: r, index })
        .filter_map(|i| valid.link_of(i).and_then(|l| l.peer(i)))
        .filter(|peer| topo.router(peer.router).role.is_pe() && valid.vrf_of(*peer).is_some())
        .map(|peer| PeNeighbor {
            router: topo.router_name(peer.router).to_string(),
            address: link_address(alloc, peer).addr(),
            remote_as: valid.router_as(peer.router),
        })
        .collect();
    CeBgpPlan {
        local_as: valid.router_as(r),
        router_id: alloc.loopback(r),
        neighbors,
        networks: router.private_network.into_iter().collect(),
    }
}

/// Finds all links between a CE and a core router interface that is bound to no VRF. The CE would
/// open an eBGP session that the core router never configures.
fn unbound_ce_links(valid: &ValidTopology<'_>) -> Vec<PolicyWarning> {
    let topo = valid.topology();
    valid
        .links()
        .iter()
        .flat_map(|l| vec![(l.endpoints[0], l.endpoints[1]), (l.endpoints[1], l.endpoints[0])])
        .filter(|(core, ce)| {
            topo.router(core.router).role.is_core()
                && topo.router(ce.router).role.is_ce()
                && valid.vrf_of(*core).is_none()
        })
        .map(|(core, ce)| PolicyWarning::UnboundCeLink {
            router: topo.router_name(core.router).to_string(),
            interface: topo.interface(core).name.clone(),
            ce: topo.router_name(ce.router).to_string(),
        })
        .collect()
}

/// Computes the OSPF shortest path cost from every PE to the loopback of every other PE. The IGP
/// graph contains all core routers, and one directed edge per core link and direction, weighted
/// by the cost of the outgoing interface.
fn igp_reachability(
    valid: &ValidTopology<'_>,
    config: &CompilerConfig,
) -> (HashMap<RouterId, BTreeMap<String, u64>>, Vec<PolicyWarning>) {
    let topo = valid.topology();
    let mut g: DiGraph<RouterId, u64> = DiGraph::new();
    let nodes: BTreeMap<RouterId, NodeIndex> = topo
        .router_ids()
        .filter(|r| topo.router(*r).role.is_core())
        .map(|r| (r, g.add_node(r)))
        .collect();

    for link in valid.links().iter().filter(|l| valid.is_core_link(l)) {
        let [a, b] = link.endpoints;
        g.add_edge(nodes[&a.router], nodes[&b.router], interface_cost(valid, config, a).into());
        g.add_edge(nodes[&b.router], nodes[&a.router], interface_cost(valid, config, b).into());
    }

    let pes: Vec<RouterId> =
        topo.router_ids().filter(|r| topo.router(*r).role.is_pe()).collect();
    let mut costs = HashMap::new();
    let mut warnings = Vec::new();
    for pe in pes.iter() {
        let distances = dijkstra(&g, nodes[pe], None, |e| *e.weight());
        let mut pe_costs = BTreeMap::new();
        for other in pes.iter().filter(|o| *o != pe) {
            match distances.get(&nodes[other]) {
                Some(cost) => {
                    pe_costs.insert(topo.router_name(*other).to_string(), *cost);
                }
                None => {
                    warn!("{} cannot reach {}", topo.router_name(*pe), topo.router_name(*other));
                    warnings.push(PolicyWarning::UnreachablePeer {
                        from: topo.router_name(*pe).to_string(),
                        to: topo.router_name(*other).to_string(),
                    });
                }
            }
        }
        costs.insert(*pe, pe_costs);
    }
    (costs, warnings)
}
