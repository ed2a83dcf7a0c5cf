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

//! # Demo Network

use super::ExampleTopology;
use crate::topology::{parse_topology, Topology};

/// Raw JSON document of the demo network
pub static DEMO_DOCUMENT: &str = include_str!("../../test_files/mpls_vpn.json");

/// # Demo Network
///
/// Backbone AS 65000 with two points of presence. Four PE routers are attached to two P routers,
/// and each PE serves one or two customers:
///
/// ```text
///   CE1   CE3              CE4
///     \   /                 |
///      PE1 ------ P1 ------ PE2
///        \        |
///         +------ P2 ------ PE3 --- CE2, CE5
///                  \
///                   PE4 --- CE6
/// ```
///
/// The six VRFs form three two-node VPNs: (CLIENT1, CLIENT2) and (CLIENT4, CLIENT5) share a
/// single route target, while (CLIENT3, CLIENT6) use one route target per direction.
pub struct DemoNet {}

impl ExampleTopology for DemoNet {
    fn topology() -> Topology {
        parse_topology(DEMO_DOCUMENT).expect("The demo document is valid")
    }
}
