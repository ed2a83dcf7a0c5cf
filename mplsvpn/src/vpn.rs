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

//! # Route-Target Graph Resolver
//!
//! Builds the directed VPN connectivity graph from the route targets of all VRFs. There is an edge
//! from VRF `A` to VRF `B` if and only if `A` exports a route target that `B` imports, meaning
//! that routes of `A` are installed in `B`. Each edge carries the shared route targets. VRFs are
//! identified by their route distinguisher, not by their name, since different PEs can reuse the
//! same VRF name.
//!
//! Based on the graph, every VRF is classified into a [`VrfRole`], and route targets which are not
//! matched by any other VRF are reported as [`PolicyWarning`]s.

use crate::topology::PolicyId;
use crate::validator::ValidTopology;

use itertools::Itertools;
use log::*;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Build the VPN graph of all VRFs in the topology.
pub fn resolve(valid: &ValidTopology<'_>) -> VpnGraph {
    let topo = valid.topology();
    let nodes = topo.vrf_ids().filter_map(|id| {
        let vrf = topo.vrf(id);
        let mut node = VpnNode::new(vrf.rd.parse().ok()?, topo.router_name(id.router), &vrf.name);
        node.export = vrf.export.iter().filter_map(|rt| rt.parse().ok()).collect();
        node.import = vrf.import.iter().filter_map(|rt| rt.parse().ok()).collect();
        Some(node)
    });
    VpnGraph::build(nodes)
}

/// A VRF as seen by the resolver
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VpnNode {
    /// Route distinguisher (identity of the node)
    pub rd: PolicyId,
    /// Hostname of the PE owning the VRF
    pub router: String,
    /// Name of the VRF
    pub vrf: String,
    /// Exported route targets
    pub export: BTreeSet<PolicyId>,
    /// Imported route targets
    pub import: BTreeSet<PolicyId>,
}

impl VpnNode {
    /// Create a node without any route target
    pub fn new(rd: PolicyId, router: impl Into<String>, vrf: impl Into<String>) -> Self {
        Self {
            rd,
            router: router.into(),
            vrf: vrf.into(),
            export: BTreeSet::new(),
            import: BTreeSet::new(),
        }
    }

    /// Add an exported route target
    pub fn with_export(mut self, rt: PolicyId) -> Self {
        self.export.insert(rt);
        self
    }

    /// Add an imported route target
    pub fn with_import(mut self, rt: PolicyId) -> Self {
        self.import.insert(rt);
        self
    }
}

/// Role of a VRF in the VPN connectivity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum VrfRole {
    /// Member of a full mesh: all edges are reciprocal, and every VRF of the mesh exchanges routes
    /// with every other one (and with nobody else).
    MeshMember,
    /// Center of a hub-and-spoke VPN
    Hub,
    /// Leaf of a hub-and-spoke VPN: exports to the hub and imports from at most one VRF.
    Spoke,
    /// No route is exchanged with any other VRF.
    Isolated,
    /// Any other pattern, most likely a misconfiguration.
    Irregular,
}

impl fmt::Display for VrfRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MeshMember => "mesh member",
            Self::Hub => "hub",
            Self::Spoke => "spoke",
            Self::Isolated => "isolated",
            Self::Irregular => "irregular",
        })
    }
}

/// Non-fatal findings of the compiler.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(tag = "kind")]
pub enum PolicyWarning {
    /// A route target is exported, but no other VRF imports it.
    DanglingExport {
        /// Route distinguisher of the exporting VRF
        rd: PolicyId,
        /// Hostname of the PE
        router: String,
        /// Name of the VRF
        vrf: String,
        /// The route target
        rt: PolicyId,
    },
    /// A route target is imported, but no other VRF exports it.
    DanglingImport {
        /// Route distinguisher of the importing VRF
        rd: PolicyId,
        /// Hostname of the PE
        router: String,
        /// Name of the VRF
        vrf: String,
        /// The route target
        rt: PolicyId,
    },
    /// Two PEs have no IGP path between their loopbacks, so the VPNv4 session cannot be
    /// established.
    UnreachablePeer {
        /// Hostname of the PE
        from: String,
        /// Hostname of the unreachable PE
        to: String,
    },
    /// A core router interface links to a CE, but is bound to no VRF. The CE has no eBGP session
    /// towards this interface.
    UnboundCeLink {
        /// Hostname of the core router
        router: String,
        /// Name of the interface on the core router
        interface: String,
        /// Hostname of the CE
        ce: String,
    },
}

impl fmt::Display for PolicyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingExport { router, vrf, rt, .. } => {
                write!(f, "VRF {} on {} exports {}, but no other VRF imports it", vrf, router, rt)
            }
            Self::DanglingImport { router, vrf, rt, .. } => {
                write!(f, "VRF {} on {} imports {}, but no other VRF exports it", vrf, router, rt)
            }
            Self::UnreachablePeer { from, to } => {
                write!(f, "{} cannot reach the loopback of {} in the IGP", from, to)
            }
            Self::UnboundCeLink { router, interface, ce } => {
                write!(
                    f,
                    "Interface {} on {} links to the CE {}, but is bound to no VRF",
                    interface, router, ce
                )
            }
        }
    }
}

/// # VPN Graph
/// Directed graph of all VRFs (nodes keyed by route distinguisher). Edge weights are the route
/// targets shared between the export set of the source and the import set of the target.
#[derive(Debug, Clone)]
pub struct VpnGraph {
    graph: DiGraph<VpnNode, BTreeSet<PolicyId>>,
    index: BTreeMap<PolicyId, NodeIndex>,
    roles: BTreeMap<PolicyId, VrfRole>,
    warnings: Vec<PolicyWarning>,
}

impl VpnGraph {
    /// Build the graph from a set of VRFs. The result does not depend on the order of the nodes.
    /// If two nodes share the same route distinguisher, the last one is kept.
    pub fn build(nodes: impl IntoIterator<Item = VpnNode>) -> Self {
        let nodes: BTreeMap<PolicyId, VpnNode> = nodes.into_iter().map(|n| (n.rd, n)).collect();

        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        for (rd, node) in nodes {
            index.insert(rd, graph.add_node(node));
        }

        let ids: Vec<NodeIndex> = index.values().copied().collect();
        for (a, b) in ids.iter().cartesian_product(ids.iter()).filter(|(a, b)| a != b) {
            let shared: BTreeSet<PolicyId> =
                graph[*a].export.intersection(&graph[*b].import).copied().collect();
            if !shared.is_empty() {
                trace!("VPN edge {} -> {} via {:?}", graph[*a].rd, graph[*b].rd, shared);
                graph.add_edge(*a, *b, shared);
            }
        }

        let mut result = Self { graph, index, roles: BTreeMap::new(), warnings: Vec::new() };
        result.roles = result.index.iter().map(|(rd, n)| (*rd, result.classify(*n))).collect();
        result.warnings = result.dangling_warnings();
        debug!(
            "VPN graph with {} VRFs, {} edges and {} warnings",
            result.graph.node_count(),
            result.graph.edge_count(),
            result.warnings.len()
        );
        result
    }

    /// Returns the underlying petgraph
    pub fn graph(&self) -> &DiGraph<VpnNode, BTreeSet<PolicyId>> {
        &self.graph
    }

    /// Returns all VRFs, ordered by route distinguisher
    pub fn nodes(&self) -> impl Iterator<Item = &VpnNode> + '_ {
        self.index.values().map(move |n| &self.graph[*n])
    }

    /// Returns the VRF with the given route distinguisher
    pub fn node(&self, rd: PolicyId) -> Option<&VpnNode> {
        self.index.get(&rd).map(|n| &self.graph[*n])
    }

    /// Number of directed edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if routes of `from` are installed in `to`.
    pub fn has_edge(&self, from: PolicyId, to: PolicyId) -> bool {
        self.shared_route_targets(from, to).is_some()
    }

    /// Returns the route targets exported by `from` and imported by `to`.
    pub fn shared_route_targets(&self, from: PolicyId, to: PolicyId) -> Option<&BTreeSet<PolicyId>> {
        let a = self.index.get(&from)?;
        let b = self.index.get(&to)?;
        self.graph.find_edge(*a, *b).map(|e| &self.graph[e])
    }

    /// Returns the route distinguishers of all VRFs receiving routes from `rd`, sorted.
    pub fn successors(&self, rd: PolicyId) -> Vec<PolicyId> {
        self.neighbors(rd, Outgoing)
    }

    /// Returns the route distinguishers of all VRFs sending routes to `rd`, sorted.
    pub fn predecessors(&self, rd: PolicyId) -> Vec<PolicyId> {
        self.neighbors(rd, Incoming)
    }

    /// Returns the role of the VRF
    pub fn role(&self, rd: PolicyId) -> Option<VrfRole> {
        self.roles.get(&rd).copied()
    }

    /// Returns the role of every VRF, ordered by route distinguisher
    pub fn roles(&self) -> &BTreeMap<PolicyId, VrfRole> {
        &self.roles
    }

    /// Returns all dangling route target warnings.
    pub fn warnings(&self) -> &[PolicyWarning] {
        &self.warnings
    }

    /// Returns the connected VPNs: the weakly connected components of the graph. Each component
    /// is sorted, and the components are ordered by their smallest route distinguisher.
    pub fn components(&self) -> Vec<Vec<PolicyId>> {
        let mut uf = UnionFind::new(self.graph.node_count());
        for e in self.graph.edge_references() {
            uf.union(e.source().index(), e.target().index());
        }
        let mut groups: BTreeMap<usize, Vec<PolicyId>> = BTreeMap::new();
        for (rd, n) in self.index.iter() {
            groups.entry(uf.find(n.index())).or_default().push(*rd);
        }
        let mut components: Vec<Vec<PolicyId>> = groups.into_iter().map(|(_, c)| c).collect();
        components.sort();
        components
    }

    fn neighbors(&self, rd: PolicyId, dir: petgraph::Direction) -> Vec<PolicyId> {
        match self.index.get(&rd) {
            Some(n) => self
                .graph
                .neighbors_directed(*n, dir)
                .map(|m| self.graph[m].rd)
                .sorted()
                .dedup()
                .collect(),
            None => Vec::new(),
        }
    }

    fn classify(&self, n: NodeIndex) -> VrfRole {
        let rd = self.graph[n].rd;
        let out = self.successors(rd);
        let inc = self.predecessors(rd);

        if out.is_empty() && inc.is_empty() {
            return VrfRole::Isolated;
        }
        let reciprocal = out == inc;
        if reciprocal && self.is_closed_mesh(rd, &out) {
            return VrfRole::MeshMember;
        }
        if (inc.len() > out.len() && inc.len() > 1) || (reciprocal && out.len() >= 2) {
            return VrfRole::Hub;
        }
        if !out.is_empty() && inc.len() <= 1 {
            return VrfRole::Spoke;
        }
        VrfRole::Irregular
    }

    /// Every member of `{rd} ∪ peers` sends to and receives from exactly all other members.
    fn is_closed_mesh(&self, rd: PolicyId, peers: &[PolicyId]) -> bool {
        let mut members: Vec<PolicyId> = peers.to_vec();
        members.push(rd);
        members.sort();
        members.iter().all(|m| {
            let others: Vec<PolicyId> = members.iter().copied().filter(|x| x != m).collect();
            self.successors(*m) == others && self.predecessors(*m) == others
        })
    }

    fn dangling_warnings(&self) -> Vec<PolicyWarning> {
        let mut warnings = Vec::new();
        for node in self.nodes() {
            for rt in node.export.iter() {
                if !self.nodes().any(|o| o.rd != node.rd && o.import.contains(rt)) {
                    warnings.push(PolicyWarning::DanglingExport {
                        rd: node.rd,
                        router: node.router.clone(),
                        vrf: node.vrf.clone(),
                        rt: *rt,
                    });
                }
            }
            for rt in node.import.iter() {
                if !self.nodes().any(|o| o.rd != node.rd && o.export.contains(rt)) {
                    warnings.push(PolicyWarning::DanglingImport {
                        rd: node.rd,
                        router: node.router.clone(),
                        vrf: node.vrf.clone(),
                        rt: *rt,
                    });
                }
            }
        }
        warnings
    }
}

impl PartialEq for VpnGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes())
            && self.index.keys().all(|a| self.successors(*a) == other.successors(*a))
            && self.roles == other.roles
            && self.warnings == other.warnings
    }
}

#[derive(serde::Serialize)]
struct VrfView<'a> {
    #[serde(flatten)]
    node: &'a VpnNode,
    role: VrfRole,
}

#[derive(serde::Serialize)]
struct EdgeView<'a> {
    from: PolicyId,
    to: PolicyId,
    route_targets: &'a BTreeSet<PolicyId>,
}

impl Serialize for VpnGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let vrfs: Vec<VrfView<'_>> = self
            .nodes()
            .map(|node| VrfView {
                node,
                role: self.roles.get(&node.rd).copied().unwrap_or(VrfRole::Irregular),
            })
            .collect();
        let edges: Vec<EdgeView<'_>> = self
            .graph
            .edge_references()
            .map(|e| EdgeView {
                from: self.graph[e.source()].rd,
                to: self.graph[e.target()].rd,
                route_targets: e.weight(),
            })
            .collect();
        let mut s = serializer.serialize_struct("VpnGraph", 4)?;
        s.serialize_field("vrfs", &vrfs)?;
        s.serialize_field("edges", &edges)?;
        s.serialize_field("components", &self.components())?;
        s.serialize_field("warnings", &self.warnings)?;
        s.end()
    }
}
