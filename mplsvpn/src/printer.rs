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

//! # Helper (printer) functions
//! Module containing helper functions to get formatted strings and print information about the
//! compiled network: the network recap (every subnet with its endpoints and addresses), the
//! loopback table and the VPN summary.

use crate::compiler::{CompiledNetwork, LinkAddressing};
use crate::validator::ValidationErrors;
use crate::vpn::VpnGraph;

use itertools::Itertools;

/// Returns the formatted string of a single link, in the form
/// `10.0.0.0/31: PE1 GigabitEthernet1/0 (10.0.0.0) <-> P1 GigabitEthernet1/0 (10.0.0.1)`.
pub fn link(link: &LinkAddressing) -> String {
    let [a, b] = &link.endpoints;
    format!(
        "{}: {} {} ({}) <-> {} {} ({})",
        link.network, a.router, a.interface, a.address, b.router, b.interface, b.address
    )
}

/// Get a vector of strings, one line per subnet, in the order of the topology.
pub fn network_recap(net: &CompiledNetwork) -> Vec<String> {
    net.links.iter().map(link).collect()
}

/// Get a vector of strings, one line per router with a loopback address, in the order of the
/// router plans.
pub fn loopback_table(net: &CompiledNetwork) -> Vec<String> {
    net.routers
        .iter()
        .filter_map(|r| r.loopback().map(|addr| format!("{} ({}): {}", r.hostname, r.role, addr)))
        .collect()
}

/// Get a vector of strings describing every VRF, followed by the connected VPNs.
pub fn vpn_summary(vpn: &VpnGraph) -> Vec<String> {
    let mut result: Vec<String> = vpn
        .nodes()
        .map(|n| {
            format!(
                "{} {} on {}: {}, export [{}], import [{}], sends to [{}]",
                n.rd,
                n.vrf,
                n.router,
                vpn.role(n.rd).map(|r| r.to_string()).unwrap_or_default(),
                n.export.iter().join(", "),
                n.import.iter().join(", "),
                vpn.successors(n.rd).iter().join(", "),
            )
        })
        .collect();
    for (i, component) in vpn.components().iter().enumerate() {
        let names = component
            .iter()
            .filter_map(|rd| vpn.node(*rd))
            .map(|n| format!("{}@{}", n.vrf, n.router))
            .join(", ");
        result.push(format!("VPN {}: {}", i + 1, names));
    }
    result
}

/// Get a vector of strings, one line per violation.
pub fn validation_errors(errors: &ValidationErrors) -> Vec<String> {
    errors.iter().map(|e| e.to_string()).collect()
}

/// Print the recap of the network: all loopbacks, all subnets, the VPN summary and all warnings.
pub fn print_recap(net: &CompiledNetwork) {
    println!("Loopbacks:");
    for line in loopback_table(net) {
        println!("  {}", line);
    }
    println!("Subnets:");
    for line in network_recap(net) {
        println!("  {}", line);
    }
    println!("VPNs:");
    for line in vpn_summary(&net.vpn) {
        println!("  {}", line);
    }
    if !net.warnings.is_empty() {
        println!("Warnings:");
        for w in net.warnings.iter() {
            println!("  {}", w);
        }
    }
}
