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

use super::{demo_value, topology};
use crate::allocator::allocate;
use crate::config::CompilerConfig;
use crate::example_networks::{demo_topology, ExampleTopology, HubAndSpoke};
use crate::synthesizer::*;
use crate::topology::{AsId, Endpoint, RouterRole, Topology};
use crate::validator::validate;
use crate::vpn::{resolve, PolicyWarning, VrfRole};

use maplit::btreemap;
use serde_json::json;
use std::net::Ipv4Addr;

fn run(t: &Topology, config: &CompilerConfig) -> Synthesis {
    let valid = validate(t).unwrap();
    let alloc = allocate(&valid, config).unwrap();
    let vpn = resolve(&valid);
    synthesize(&valid, &alloc, &vpn, config)
}

fn plan<'a>(s: &'a Synthesis, hostname: &str) -> &'a RouterPlan {
    s.routers.iter().find(|r| r.hostname == hostname).unwrap()
}

fn addr(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn ospf_interfaces(p: &RouterPlan) -> Vec<(&str, u32, bool)> {
    p.ospf.as_ref().unwrap().interfaces.iter().map(|i| (i.name.as_str(), i.cost, i.passive)).collect()
}

#[test]
fn ospf_plan() {
    let s = run(&demo_topology(), &CompilerConfig::default());

    let pe1 = plan(&s, "PE1");
    let ospf = pe1.ospf.as_ref().unwrap();
    assert_eq!(ospf.process_id, 1);
    assert_eq!(ospf.area, 0);
    assert_eq!(ospf.router_id, addr("10.255.0.1"));
    assert!(ospf.ldp_autoconfig);
    // CE facing interfaces are not part of OSPF
    assert_eq!(
        ospf_interfaces(pe1),
        vec![("Loopback0", 1, true), ("GigabitEthernet1/0", 1, false), ("GigabitEthernet2/0", 20, false)]
    );

    let p2 = plan(&s, "P2");
    assert_eq!(
        ospf_interfaces(p2),
        vec![
            ("Loopback0", 1, true),
            ("GigabitEthernet1/0", 20, false),
            ("GigabitEthernet2/0", 1, false),
            ("GigabitEthernet3/0", 1, false),
            ("GigabitEthernet4/0", 5, false)
        ]
    );
    assert!(p2.ospf.as_ref().unwrap().igp_costs.is_empty());
    assert!(p2.bgp.is_none());
    assert!(p2.ce_bgp.is_none());

    let ce1 = plan(&s, "CE1");
    assert!(ce1.ospf.is_none());
    assert!(ce1.bgp.is_none());
}

#[test]
fn ospf_config() {
    let config =
        CompilerConfig { default_ospf_cost: 10, ospf_area: 5, ospf_process_id: 7, ..Default::default() };
    let s = run(&demo_topology(), &config);
    let pe1 = plan(&s, "PE1");
    let ospf = pe1.ospf.as_ref().unwrap();
    assert_eq!(ospf.area, 5);
    assert_eq!(ospf.process_id, 7);
    assert_eq!(
        ospf_interfaces(pe1),
        vec![("Loopback0", 10, true), ("GigabitEthernet1/0", 10, false), ("GigabitEthernet2/0", 20, false)]
    );
    assert_eq!(ospf.igp_costs["PE2"], 20);
}

#[test]
fn igp_costs() {
    let s = run(&demo_topology(), &CompilerConfig::default());
    assert_eq!(
        plan(&s, "PE1").ospf.as_ref().unwrap().igp_costs,
        btreemap! {"PE2".to_string() => 2, "PE3".to_string() => 7, "PE4".to_string() => 7}
    );
    assert_eq!(
        plan(&s, "PE3").ospf.as_ref().unwrap().igp_costs,
        btreemap! {"PE1".to_string() => 7, "PE2".to_string() => 7, "PE4".to_string() => 2}
    );
    assert!(s.warnings.is_empty());
}

#[test]
fn unreachable_peer() {
    // remove the link PE4 -- P2
    let mut v = demo_value();
    v["subnets"].as_array_mut().unwrap().remove(4);
    let s = run(&topology(v), &CompilerConfig::default());
    let unreachable = |from: &str, to: &str| PolicyWarning::UnreachablePeer {
        from: from.to_string(),
        to: to.to_string(),
    };
    assert_eq!(
        s.warnings,
        vec![
            unreachable("PE1", "PE4"),
            unreachable("PE2", "PE4"),
            unreachable("PE3", "PE4"),
            unreachable("PE4", "PE1"),
            unreachable("PE4", "PE2"),
            unreachable("PE4", "PE3"),
        ]
    );
    assert!(plan(&s, "PE4").ospf.as_ref().unwrap().igp_costs.is_empty());
    assert_eq!(s.mpls_links.len(), 5);
}

#[test]
fn igp_costs_do_not_overflow() {
    let config = CompilerConfig { default_ospf_cost: u32::MAX, ..Default::default() };
    let s = run(&demo_topology(), &config);
    let d = u64::from(u32::MAX);
    assert_eq!(
        plan(&s, "PE1").ospf.as_ref().unwrap().igp_costs,
        btreemap! {"PE2".to_string() => d + 25, "PE3".to_string() => d + 20, "PE4".to_string() => d + 20}
    );
    assert_eq!(plan(&s, "PE3").ospf.as_ref().unwrap().igp_costs["PE4"], 2 * d);
    assert!(s.warnings.is_empty());
}

#[test]
fn ce_link_without_vrf() {
    let mut v = demo_value();
    v["pe_routers"][0]["vrfs"][0]["associated_interfaces"] = json!([]);
    let s = run(&topology(v), &CompilerConfig::default());

    // neither side configures the eBGP session
    assert!(plan(&s, "CE1").ce_bgp.as_ref().unwrap().neighbors.is_empty());
    assert!(plan(&s, "PE1").bgp.as_ref().unwrap().vrfs[0].neighbors.is_empty());
    assert_eq!(plan(&s, "CE3").ce_bgp.as_ref().unwrap().neighbors.len(), 1);
    assert_eq!(
        s.warnings,
        vec![PolicyWarning::UnboundCeLink {
            router: "PE1".to_string(),
            interface: "GigabitEthernet3/0".to_string(),
            ce: "CE1".to_string(),
        }]
    );
    assert_eq!(
        s.warnings[0].to_string(),
        "Interface GigabitEthernet3/0 on PE1 links to the CE CE1, but is bound to no VRF"
    );
}

#[test]
fn mpls_links() {
    let s = run(&demo_topology(), &CompilerConfig::default());
    assert_eq!(s.mpls_links.len(), 6);
    assert_eq!(s.mpls_links.iter().map(|l| l.subnet).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(
        s.mpls_links[5],
        MplsLink {
            subnet: 5,
            endpoints: [
                Endpoint::new("P1", "GigabitEthernet3/0"),
                Endpoint::new("P2", "GigabitEthernet4/0")
            ],
            network: "10.0.0.10/31".parse().unwrap(),
        }
    );
}

#[test]
fn vpnv4_plan() {
    let s = run(&demo_topology(), &CompilerConfig::default());
    let bgp = plan(&s, "PE1").bgp.as_ref().unwrap();
    assert_eq!(bgp.local_as, AsId(65000));
    assert_eq!(bgp.router_id, addr("10.255.0.1"));
    assert_eq!(
        bgp.vpnv4_neighbors.iter().map(|n| (n.peer.as_str(), n.address)).collect::<Vec<_>>(),
        vec![("PE2", addr("10.255.0.2")), ("PE3", addr("10.255.0.3")), ("PE4", addr("10.255.0.4"))]
    );
    for n in bgp.vpnv4_neighbors.iter() {
        assert_eq!(n.remote_as, AsId(65000));
        assert_eq!(n.update_source, "Loopback0");
        assert!(n.send_community_extended);
    }

    assert_eq!(bgp.vrfs.len(), 2);
    let client1 = &bgp.vrfs[0];
    assert_eq!(client1.name, "CLIENT1");
    assert_eq!(client1.rd.to_string(), "65000:1");
    assert_eq!(client1.export.iter().map(|x| x.to_string()).collect::<Vec<_>>(), vec!["65000:12"]);
    assert_eq!(client1.import.iter().map(|x| x.to_string()).collect::<Vec<_>>(), vec!["65000:12"]);
    assert_eq!(client1.role, VrfRole::MeshMember);
    assert_eq!(client1.interfaces, vec!["GigabitEthernet3/0".to_string()]);
    assert_eq!(
        client1.neighbors,
        vec![CeNeighbor {
            router: "CE1".to_string(),
            address: addr("172.16.1.1"),
            remote_as: AsId(65001),
            prefixes: vec!["192.168.1.0/24".parse().unwrap()],
        }]
    );
    assert_eq!(bgp.vrfs[1].neighbors[0].router, "CE3");

    let pe3 = plan(&s, "PE3").bgp.as_ref().unwrap();
    assert_eq!(pe3.vrfs.iter().map(|v| v.name.as_str()).collect::<Vec<_>>(), vec!["CLIENT2", "CLIENT5"]);
    assert_eq!(pe3.vrfs[1].neighbors[0].address, addr("172.16.5.1"));
}

#[test]
fn ce_plan() {
    let s = run(&demo_topology(), &CompilerConfig::default());
    let ce1 = plan(&s, "CE1");
    assert_eq!(ce1.role, RouterRole::CustomerEdge);
    assert_eq!(ce1.as_id, AsId(65001));
    assert_eq!(
        ce1.ce_bgp,
        Some(CeBgpPlan {
            local_as: AsId(65001),
            router_id: Some(addr("172.30.1.1")),
            neighbors: vec![PeNeighbor {
                router: "PE1".to_string(),
                address: addr("172.16.1.0"),
                remote_as: AsId(65000),
            }],
            networks: vec!["192.168.1.0/24".parse().unwrap()],
        })
    );
}

#[test]
fn interface_plans() {
    let s = run(&demo_topology(), &CompilerConfig::default());

    // CE1 does not declare a loopback, but gets one from its pool
    let ce1 = plan(&s, "CE1");
    assert_eq!(ce1.interfaces.len(), 2);
    assert_eq!(ce1.interfaces[0].name, "Loopback0");
    assert!(ce1.interfaces[0].loopback);
    assert_eq!(ce1.interfaces[0].address, Some("172.30.1.1/32".parse().unwrap()));
    assert_eq!(ce1.loopback(), Some(addr("172.30.1.1")));
    assert_eq!(
        ce1.interface("GigabitEthernet1/0"),
        Some(&InterfacePlan {
            name: "GigabitEthernet1/0".to_string(),
            loopback: false,
            address: Some("172.16.1.1/31".parse().unwrap()),
            vrf: None,
            ospf_cost: None,
            mpls: false,
            peer: Some(Endpoint::new("PE1", "GigabitEthernet3/0")),
        })
    );

    let pe1 = plan(&s, "PE1");
    assert_eq!(pe1.interfaces.len(), 5);
    assert_eq!(pe1.loopback(), Some(addr("10.255.0.1")));
    let gi2 = pe1.interface("GigabitEthernet2/0").unwrap();
    assert_eq!(gi2.address, Some("10.0.0.2/31".parse().unwrap()));
    assert_eq!(gi2.ospf_cost, Some(20));
    assert!(gi2.mpls);
    assert_eq!(gi2.peer, Some(Endpoint::new("P2", "GigabitEthernet1/0")));
    let gi4 = pe1.interface("GigabitEthernet4/0").unwrap();
    assert_eq!(gi4.vrf, Some("CLIENT3".to_string()));
    assert_eq!(gi4.address, Some("172.16.3.0/31".parse().unwrap()));
    assert_eq!(gi4.ospf_cost, None);
    assert!(!gi4.mpls);
}

#[test]
fn hub_and_spoke_without_ce_loopbacks() {
    let s = run(&HubAndSpoke::topology(), &CompilerConfig::default());
    let ce1 = plan(&s, "CE1");
    assert_eq!(ce1.interfaces.len(), 1);
    assert_eq!(ce1.loopback(), None);
    assert_eq!(ce1.ce_bgp.as_ref().unwrap().router_id, None);

    let hub = &plan(&s, "PE1").bgp.as_ref().unwrap().vrfs[0];
    assert_eq!(hub.role, VrfRole::Hub);
    let spoke = &plan(&s, "PE2").bgp.as_ref().unwrap().vrfs[0];
    assert_eq!(spoke.role, VrfRole::Spoke);
    assert_eq!(spoke.neighbors[0].remote_as, AsId(65102));
    assert_eq!(
        plan(&s, "PE2").ospf.as_ref().unwrap().igp_costs,
        btreemap! {"PE1".to_string() => 2, "PE3".to_string() => 2}
    );
}
