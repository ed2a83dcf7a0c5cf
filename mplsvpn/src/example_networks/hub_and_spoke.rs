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

//! # Hub and Spoke Network

use super::ExampleTopology;
use crate::topology::*;

/// # Hub and Spoke
///
/// Three PEs around a single P router. The VRF `HUB` on PE1 imports the routes of both spokes
/// (`SPOKE_A` on PE2, `SPOKE_B` on PE3), and the spokes only import the routes of the hub. The
/// customer ASes have no loopback pool.
///
/// ```text
///  CE1 -- PE1 -- P1 -- PE2 -- CE2
///                |
///               PE3 -- CE3
/// ```
pub struct HubAndSpoke {}

impl ExampleTopology for HubAndSpoke {
    fn topology() -> Topology {
        let mut t = Topology::new();
        t.add_as(
            AutonomousSystem::new(AsId(65000), true)
                .with_pool(LOOPBACK_POOL, "10.255.0.0/24".parse().unwrap())
                .with_pool(PHYSICAL_POOL, "10.0.0.0/16".parse().unwrap()),
        );
        for i in 1..=3 {
            t.add_as(
                AutonomousSystem::new(AsId(65100 + i), false)
                    .with_pool(PHYSICAL_POOL, format!("172.16.{}.0/24", 100 + i).parse().unwrap()),
            );
        }

        let hub = Vrf::new("HUB", "65000:100").export("65000:1").import("65000:2");
        let spoke_a = Vrf::new("SPOKE_A", "65000:101").export("65000:2").import("65000:1");
        let spoke_b = Vrf::new("SPOKE_B", "65000:102").export("65000:2").import("65000:1");

        for (i, vrf) in vec![hub, spoke_a, spoke_b].into_iter().enumerate() {
            t.add_router(
                Router::new(format!("PE{}", i + 1), RouterRole::ProviderEdge)
                    .with_interface("Loopback0")
                    .with_interface("GigabitEthernet1/0")
                    .with_interface("GigabitEthernet2/0")
                    .with_vrf(vrf.interface("GigabitEthernet2/0")),
            );
        }
        t.add_router(
            Router::new("P1", RouterRole::Provider)
                .with_interface("Loopback0")
                .with_interface("GigabitEthernet1/0")
                .with_interface("GigabitEthernet2/0")
                .with_interface("GigabitEthernet3/0"),
        );
        for i in 1..=3 {
            t.add_router(
                Router::customer_edge(
                    format!("CE{}", i),
                    AsId(65100 + i),
                    format!("192.168.{}.0/24", 100 + i).parse().unwrap(),
                )
                .with_interface("GigabitEthernet1/0"),
            );
        }

        for i in 1..=3 {
            t.add_subnet(
                Endpoint::new(format!("PE{}", i), "GigabitEthernet1/0"),
                Endpoint::new("P1", format!("GigabitEthernet{}/0", i)),
            );
        }
        for i in 1..=3 {
            t.add_subnet(
                Endpoint::new(format!("PE{}", i), "GigabitEthernet2/0"),
                Endpoint::new(format!("CE{}", i), "GigabitEthernet1/0"),
            );
        }
        t
    }
}
