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

//! Topologies for testing

use crate::topology::Topology;

mod demo;
pub use demo::{DemoNet, DEMO_DOCUMENT};

mod hub_and_spoke;
pub use hub_and_spoke::HubAndSpoke;

/// Trait for easier access to example topologies.
pub trait ExampleTopology {
    /// Get the topology
    fn topology() -> Topology;
}

/// Shorthand for [`DemoNet::topology`]
pub fn demo_topology() -> Topology {
    DemoNet::topology()
}
