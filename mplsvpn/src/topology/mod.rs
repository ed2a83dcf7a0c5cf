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

//! # Topology Model
//!
//! Typed representation of the network intent: autonomous systems, PE/P/CE routers with their
//! interfaces, VRFs on the PE routers, and point-to-point subnets.
//!
//! Entities are stored in index-stable tables (see [`Topology`]), and are referenced by plain
//! identifiers ([`RouterId`], [`InterfaceId`], [`VrfId`], [`SubnetId`]).

mod model;
mod parser;
mod policy;
mod types;

pub use model::{
    AutonomousSystem, Endpoint, Interface, Router, Subnet, Topology, Vrf, DEFAULT_LOOPBACK_NAME,
    LOOPBACK_POOL, PHYSICAL_POOL,
};
pub use parser::{parse_topology, read_topology, topology_from_value, ParseError};
pub use policy::{PolicyId, PolicyIdError};
pub use types::{AsId, InterfaceId, RouterId, RouterRole, SubnetId, VrfId};
