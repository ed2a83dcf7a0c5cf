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

use super::{demo_value, iface, router, topology};
use crate::allocator::*;
use crate::config::CompilerConfig;
use crate::example_networks::{demo_topology, ExampleTopology, HubAndSpoke};
use crate::topology::*;
use crate::validator::validate;

use ipnet::Ipv4Net;
use lazy_static::lazy_static;
use serde_json::json;
use std::collections::HashSet;
use std::net::Ipv4Addr;

lazy_static! {
    static ref DEMO: Topology = demo_topology();
}

fn addr(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn net(s: &str) -> Ipv4Net {
    s.parse().unwrap()
}

fn allocate_demo(config: &CompilerConfig) -> Allocation {
    allocate(&validate(&DEMO).unwrap(), config).unwrap()
}

fn allocate_err(t: &Topology, config: &CompilerConfig) -> AllocationError {
    allocate(&validate(t).unwrap(), config).unwrap_err()
}

#[test]
fn demo_loopbacks() {
    let a = allocate_demo(&CompilerConfig::default());
    let t = &*DEMO;
    assert_eq!(a.loopback(router(t, "PE1")), Some(addr("10.255.0.1")));
    assert_eq!(a.loopback(router(t, "PE2")), Some(addr("10.255.0.2")));
    assert_eq!(a.loopback(router(t, "PE3")), Some(addr("10.255.0.3")));
    assert_eq!(a.loopback(router(t, "PE4")), Some(addr("10.255.0.4")));
    assert_eq!(a.loopback(router(t, "P1")), Some(addr("10.255.0.5")));
    assert_eq!(a.loopback(router(t, "P2")), Some(addr("10.255.0.6")));
    for i in 1..=6 {
        let ce = router(t, &format!("CE{}", i));
        assert_eq!(a.loopback(ce), Some(addr(&format!("172.30.{}.1", i))));
    }
    assert_eq!(a.loopbacks().count(), 12);
}

#[test]
fn demo_links() {
    let a = allocate_demo(&CompilerConfig::default());
    let t = &*DEMO;
    assert_eq!(a.links().len(), 12);

    let l0 = a.link(SubnetId(0)).unwrap();
    assert_eq!(l0.owner, AsId(65000));
    assert_eq!(l0.network, net("10.0.0.0/31"));
    assert_eq!(
        l0.endpoints,
        [
            (iface(t, "PE1", "GigabitEthernet1/0"), addr("10.0.0.0")),
            (iface(t, "P1", "GigabitEthernet1/0"), addr("10.0.0.1"))
        ]
    );
    let core: Vec<Ipv4Net> = a.links()[0..6].iter().map(|l| l.network).collect();
    assert_eq!(
        core,
        vec![
            net("10.0.0.0/31"),
            net("10.0.0.2/31"),
            net("10.0.0.4/31"),
            net("10.0.0.6/31"),
            net("10.0.0.8/31"),
            net("10.0.0.10/31")
        ]
    );
    assert_eq!(
        a.interface_address(iface(t, "P2", "GigabitEthernet4/0")),
        Some(net("10.0.0.11/31"))
    );

    // PE1 -- CE1 is taken from the pool of AS65001
    let l6 = a.link(SubnetId(6)).unwrap();
    assert_eq!(l6.owner, AsId(65001));
    assert_eq!(l6.network, net("172.16.1.0/31"));
    assert_eq!(
        a.interface_address(iface(t, "PE1", "GigabitEthernet3/0")),
        Some(net("172.16.1.0/31"))
    );
    assert_eq!(
        a.interface_address(iface(t, "CE1", "GigabitEthernet1/0")),
        Some(net("172.16.1.1/31"))
    );
    // PE3 -- CE5
    assert_eq!(a.link(SubnetId(10)).unwrap().network, net("172.16.5.0/31"));

    // loopbacks and unused interfaces have no link address
    assert_eq!(a.interface_address(iface(t, "PE1", "Loopback0")), None);
}

#[test]
fn addresses_inside_pools_and_unique() {
    let t = &*DEMO;
    let valid = validate(t).unwrap();
    let a = allocate(&valid, &CompilerConfig::default()).unwrap();

    for (r, addr) in a.loopbacks() {
        let pool = t.get_as(valid.router_as(r)).unwrap().pool(LOOPBACK_POOL).unwrap();
        assert!(pool.contains(&addr), "{} not in {}", addr, pool);
    }
    for l in a.links() {
        let pool = t.get_as(l.owner).unwrap().pool(PHYSICAL_POOL).unwrap();
        assert!(pool.contains(&l.network));
        assert!(l.network.contains(&l.endpoints[0].1));
        assert!(l.network.contains(&l.endpoints[1].1));
        assert_ne!(l.endpoints[0].1, l.endpoints[1].1);
    }

    let all: Vec<Ipv4Addr> = a.addresses().collect();
    let unique: HashSet<Ipv4Addr> = all.iter().copied().collect();
    assert_eq!(all.len(), 12 + 24);
    assert_eq!(unique.len(), all.len());
}

#[test]
fn allocation_is_deterministic() {
    let config = CompilerConfig::default();
    assert_eq!(allocate_demo(&config), allocate_demo(&config));
    let other = demo_topology();
    assert_eq!(allocate(&validate(&other).unwrap(), &config).unwrap(), allocate_demo(&config));
}

#[test]
fn link_prefix_len() {
    let t = &*DEMO;
    let config = CompilerConfig { link_prefix_len: 30, ..Default::default() };
    let a = allocate_demo(&config);
    let l0 = a.link(SubnetId(0)).unwrap();
    assert_eq!(l0.network, net("10.0.0.0/30"));
    assert_eq!(l0.endpoints[0].1, addr("10.0.0.1"));
    assert_eq!(l0.endpoints[1].1, addr("10.0.0.2"));
    assert_eq!(a.link(SubnetId(1)).unwrap().network, net("10.0.0.4/30"));
    assert_eq!(
        a.interface_address(iface(t, "CE1", "GigabitEthernet1/0")),
        Some(net("172.16.1.2/30"))
    );

    let config = CompilerConfig { link_prefix_len: 24, ..Default::default() };
    let a = allocate_demo(&config);
    assert_eq!(a.link(SubnetId(5)).unwrap().network, net("10.0.5.0/24"));
    assert_eq!(a.link(SubnetId(5)).unwrap().endpoints[1].1, addr("10.0.5.2"));

    let config = CompilerConfig { link_prefix_len: 32, ..Default::default() };
    assert_eq!(allocate_err(t, &config), AllocationError::InvalidLinkPrefix(32));
}

#[test]
fn loopback_offset() {
    let config = CompilerConfig { loopback_offset: 10, ..Default::default() };
    let a = allocate_demo(&config);
    assert_eq!(a.loopback(router(&DEMO, "PE1")), Some(addr("10.255.0.11")));
    assert_eq!(a.loopback(router(&DEMO, "P2")), Some(addr("10.255.0.16")));
    assert_eq!(a.loopback(router(&DEMO, "CE2")), Some(addr("172.30.2.11")));
}

#[test]
fn pool_exhaustion() {
    let config = CompilerConfig::default();

    // 6 core links do not fit into a /30
    let mut v = demo_value();
    v["as"][0]["ipv4_ranges"]["physical"] = json!("10.0.0.0/30");
    assert_eq!(
        allocate_err(&topology(v), &config),
        AllocationError::AllocationExhausted { as_id: AsId(65000), role: "physical".to_string() }
    );

    // 6 core routers, but only two usable hosts
    let mut v = demo_value();
    v["as"][0]["ipv4_ranges"]["loopback"] = json!("10.255.0.0/30");
    assert_eq!(
        allocate_err(&topology(v), &config),
        AllocationError::AllocationExhausted { as_id: AsId(65000), role: "loopback".to_string() }
    );

    // the offset skips all hosts of the CE pool
    let mut v = demo_value();
    v["as"][3]["ipv4_ranges"]["loopback"] = json!("172.30.3.0/30");
    let config = CompilerConfig { loopback_offset: 2, ..Default::default() };
    assert_eq!(
        allocate_err(&topology(v), &config),
        AllocationError::AllocationExhausted { as_id: AsId(65003), role: "loopback".to_string() }
    );
}

#[test]
fn pool_overlap() {
    let config = CompilerConfig::default();

    let mut v = demo_value();
    v["as"][1]["ipv4_ranges"]["physical"] = json!("10.0.5.0/24");
    assert_eq!(
        allocate_err(&topology(v), &config),
        AllocationError::PoolOverlap {
            first: PoolRef {
                as_id: AsId(65000),
                role: "physical".to_string(),
                pool: net("10.0.0.0/16")
            },
            second: PoolRef {
                as_id: AsId(65001),
                role: "physical".to_string(),
                pool: net("10.0.5.0/24")
            },
        }
    );

    // overlapping pools inside the same AS
    let mut v = demo_value();
    v["as"][0]["ipv4_ranges"]["loopback"] = json!("10.0.255.0/24");
    match allocate_err(&topology(v), &config) {
        AllocationError::PoolOverlap { first, second } => {
            assert_eq!((first.as_id, first.role.as_str()), (AsId(65000), "loopback"));
            assert_eq!((second.as_id, second.role.as_str()), (AsId(65000), "physical"));
        }
        e => panic!("Unexpected error: {}", e),
    }
}

#[test]
fn ce_without_loopback_pool() {
    let t = HubAndSpoke::topology();
    let a = allocate(&validate(&t).unwrap(), &CompilerConfig::default()).unwrap();
    assert_eq!(a.loopback(router(&t, "PE3")), Some(addr("10.255.0.3")));
    assert_eq!(a.loopback(router(&t, "P1")), Some(addr("10.255.0.4")));
    assert_eq!(a.loopback(router(&t, "CE1")), None);
    assert_eq!(a.loopbacks().count(), 4);
    assert_eq!(
        a.interface_address(iface(&t, "CE2", "GigabitEthernet1/0")),
        Some(net("172.16.102.1/31"))
    );
}
