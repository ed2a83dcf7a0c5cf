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

#[cfg(test)]
mod test_allocator;
#[cfg(test)]
mod test_compiler;
#[cfg(test)]
mod test_synthesizer;

use crate::example_networks::DEMO_DOCUMENT;
use crate::topology::{topology_from_value, Endpoint, InterfaceId, RouterId, Topology};
use serde_json::Value;

/// The demo document as a JSON value, such that tests can modify it before parsing.
fn demo_value() -> Value {
    serde_json::from_str(DEMO_DOCUMENT).unwrap()
}

fn topology(v: Value) -> Topology {
    topology_from_value(v).unwrap()
}

fn router(t: &Topology, hostname: &str) -> RouterId {
    t.get_router_id(hostname).unwrap()
}

fn iface(t: &Topology, hostname: &str, name: &str) -> InterfaceId {
    t.get_interface_id(&Endpoint::new(hostname, name)).unwrap()
}
