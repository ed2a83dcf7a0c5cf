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

//! # Compiler Pipeline
//!
//! Runs all stages in order: validation, address allocation, route target resolution and routing
//! plane synthesis. The first failing stage aborts the compilation. The result is a
//! [`CompiledNetwork`], a read-only model which can be serialized (as JSON) and handed to an
//! external configuration renderer.

use crate::allocator::{allocate, Allocation};
use crate::config::CompilerConfig;
use crate::synthesizer::{synthesize, MplsLink, RouterPlan};
use crate::topology::{AsId, InterfaceId, Topology};
use crate::validator::validate;
use crate::vpn::{resolve, PolicyWarning, VpnGraph};
use crate::Error;

use ipnet::Ipv4Net;
use log::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Compile the topology.
///
/// ```rust
/// use mplsvpn::{compile, CompilerConfig};
/// use mplsvpn::example_networks::demo_topology;
///
/// let net = compile(&demo_topology(), &CompilerConfig::default()).unwrap();
/// assert_eq!(net.mpls_links.len(), 6);
/// assert!(net.warnings.is_empty());
/// ```
pub fn compile(topo: &Topology, config: &CompilerConfig) -> Result<CompiledNetwork, Error> {
    config.check()?;

    info!("Validate the topology");
    let valid = validate(topo)?;

    info!("Allocate addresses");
    let allocation = allocate(&valid, config)?;

    info!("Resolve the route target graph");
    let vpn = resolve(&valid);

    info!("Synthesize the routing plane");
    let synthesis = synthesize(&valid, &allocation, &vpn, config);

    let loopbacks = allocation
        .loopbacks()
        .map(|(r, addr)| (topo.router_name(r).to_string(), addr))
        .collect();

    let links = allocation
        .links()
        .iter()
        .map(|l| LinkAddressing {
            subnet: l.subnet.0,
            owner: l.owner,
            network: l.network,
            endpoints: [
                LinkEndpoint::new(topo, l.endpoints[0].0, l.endpoints[0].1),
                LinkEndpoint::new(topo, l.endpoints[1].0, l.endpoints[1].1),
            ],
        })
        .collect();

    let mut warnings = vpn.warnings().to_vec();
    warnings.extend(synthesis.warnings.iter().cloned());
    for w in warnings.iter() {
        warn!("{}", w);
    }

    Ok(CompiledNetwork {
        config: config.clone(),
        backbone: valid.backbone(),
        loopbacks,
        links,
        vpn,
        routers: synthesis.routers,
        mpls_links: synthesis.mpls_links,
        warnings,
        allocation,
    })
}

/// Fully resolved network, ready to be rendered into device configuration.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledNetwork {
    /// Configuration used to compile the network
    pub config: CompilerConfig,
    /// Backbone AS
    pub backbone: AsId,
    /// Loopback address of every router (by hostname)
    pub loopbacks: BTreeMap<String, Ipv4Addr>,
    /// Addressing of all links, in the order of the subnets
    pub links: Vec<LinkAddressing>,
    /// VPN connectivity graph
    pub vpn: VpnGraph,
    /// Plans of all routers, in declaration order
    pub routers: Vec<RouterPlan>,
    /// All links between two core routers
    pub mpls_links: Vec<MplsLink>,
    /// All non-fatal warnings
    pub warnings: Vec<PolicyWarning>,
    /// The raw allocation, indexed by router and interface ids
    #[serde(skip)]
    pub allocation: Allocation,
}

impl CompiledNetwork {
    /// Returns the plan of the router with the given hostname
    pub fn router(&self, hostname: &str) -> Option<&RouterPlan> {
        self.routers.iter().find(|r| r.hostname == hostname)
    }

    /// Serialize the network as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Addressing of a single link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkAddressing {
    /// Position of the subnet in the topology
    pub subnet: usize,
    /// AS whose physical pool the network is taken from
    pub owner: AsId,
    /// Network of the link
    pub network: Ipv4Net,
    /// Both endpoints with their address
    pub endpoints: [LinkEndpoint; 2],
}

/// Endpoint of a link with its address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEndpoint {
    /// Hostname of the router
    pub router: String,
    /// Interface name
    pub interface: String,
    /// Assigned address
    pub address: Ipv4Addr,
}

impl LinkEndpoint {
    fn new(topo: &Topology, iface: InterfaceId, address: Ipv4Addr) -> Self {
        Self {
            router: topo.router_name(iface.router).to_string(),
            interface: topo.interface(iface).name.clone(),
            address,
        }
    }
}
