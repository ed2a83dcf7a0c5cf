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
use crate::allocator::AllocationError;
use crate::config::ConfigError;
use crate::example_networks::{demo_topology, ExampleTopology, HubAndSpoke};
use crate::printer;
use crate::topology::{read_topology, AsId};
use crate::validator::ValidationError;
use crate::{compile, CompilerConfig, Error};

use serde_json::{json, Value};
use std::path::PathBuf;

#[test]
fn compile_demo() {
    let net = compile(&demo_topology(), &CompilerConfig::default()).unwrap();
    assert_eq!(net.backbone, AsId(65000));
    assert_eq!(net.routers.len(), 12);
    assert_eq!(net.links.len(), 12);
    assert_eq!(net.mpls_links.len(), 6);
    assert_eq!(net.loopbacks.len(), 12);
    assert_eq!(net.loopbacks["P1"], "10.255.0.5".parse::<std::net::Ipv4Addr>().unwrap());
    assert!(net.warnings.is_empty());
    assert_eq!(net.vpn.components().len(), 3);
    assert_eq!(net.router("PE4").unwrap().bgp.as_ref().unwrap().vrfs[0].name, "CLIENT6");

    let l7 = &net.links[7];
    assert_eq!(l7.owner, AsId(65003));
    assert_eq!(l7.endpoints[0].router, "PE1");
    assert_eq!(l7.endpoints[1].interface, "GigabitEthernet1/0");
    assert_eq!(l7.endpoints[1].address, "172.16.3.1".parse::<std::net::Ipv4Addr>().unwrap());
}

#[test]
fn compile_from_file() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("test_files/mpls_vpn.json");
    let topo = read_topology(&path).unwrap();
    let a = compile(&topo, &CompilerConfig::default()).unwrap();
    let b = compile(&demo_topology(), &CompilerConfig::default()).unwrap();
    assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
}

#[test]
fn invalid_topology_stops_the_pipeline() {
    let mut v = demo_value();
    v["as"][0]["backbone"] = json!(false);
    match compile(&topology(v), &CompilerConfig::default()) {
        Err(Error::ValidationErrors(e)) => {
            assert_eq!(e.len(), 1);
            assert!(matches!(e.0[0], ValidationError::DanglingReference { .. }));
        }
        r => panic!("Unexpected result: {:?}", r.map(|_| ())),
    }

    let config = CompilerConfig { link_prefix_len: 40, ..Default::default() };
    match compile(&demo_topology(), &config) {
        Err(Error::AllocationError(e)) => assert_eq!(e, AllocationError::InvalidLinkPrefix(40)),
        r => panic!("Unexpected result: {:?}", r.map(|_| ())),
    }
}

#[test]
fn invalid_default_ospf_cost() {
    for cost in &[0, 65536, u32::MAX] {
        let config = CompilerConfig { default_ospf_cost: *cost, ..Default::default() };
        match compile(&demo_topology(), &config) {
            Err(Error::ConfigError(e)) => assert_eq!(e, ConfigError::InvalidOspfCost(*cost)),
            r => panic!("Unexpected result: {:?}", r.map(|_| ())),
        }
    }
    let config = CompilerConfig { default_ospf_cost: 65535, ..Default::default() };
    assert!(compile(&demo_topology(), &config).is_ok());
}

#[test]
fn dangling_route_targets_are_warnings() {
    let mut v = demo_value();
    v["pe_routers"][3]["vrfs"][0]["route_targets"]["import"] = json!(["65000:99"]);
    let net = compile(&topology(v), &CompilerConfig::default()).unwrap();
    let warnings: Vec<String> = net.warnings.iter().map(|w| w.to_string()).collect();
    assert_eq!(
        warnings,
        vec![
            "VRF CLIENT3 on PE1 exports 65000:36, but no other VRF imports it",
            "VRF CLIENT6 on PE4 imports 65000:99, but no other VRF exports it",
        ]
    );
}

#[test]
fn json_output() {
    let net = compile(&demo_topology(), &CompilerConfig::default()).unwrap();
    let v: Value = serde_json::from_str(&net.to_json().unwrap()).unwrap();
    assert!(v.get("allocation").is_none());
    assert_eq!(v["backbone"], 65000);
    assert_eq!(v["config"]["link_prefix_len"], 31);
    assert_eq!(v["loopbacks"]["PE1"], "10.255.0.1");
    assert_eq!(v["links"][0]["network"], "10.0.0.0/31");
    assert_eq!(v["links"][0]["endpoints"][1]["router"], "P1");
    assert_eq!(v["routers"][0]["hostname"], "PE1");
    assert_eq!(v["routers"][0]["role"], "PE");
    assert_eq!(v["routers"][0]["bgp"]["vrfs"][0]["rd"], "65000:1");
    assert_eq!(v["routers"][0]["ospf"]["interfaces"][2]["cost"], 20);
    assert!(v["routers"][0].get("ce_bgp").is_none());
    assert_eq!(v["routers"][6]["ce_bgp"]["neighbors"][0]["address"], "172.16.1.0");
    assert_eq!(v["mpls_links"].as_array().unwrap().len(), 6);
    assert_eq!(v["vpn"]["components"].as_array().unwrap().len(), 3);
}

#[test]
fn recap() {
    let net = compile(&demo_topology(), &CompilerConfig::default()).unwrap();
    let recap = printer::network_recap(&net);
    assert_eq!(recap.len(), 12);
    assert_eq!(
        recap[0],
        "10.0.0.0/31: PE1 GigabitEthernet1/0 (10.0.0.0) <-> P1 GigabitEthernet1/0 (10.0.0.1)"
    );
    assert_eq!(
        recap[11],
        "172.16.6.0/31: PE4 GigabitEthernet2/0 (172.16.6.0) <-> CE6 GigabitEthernet1/0 (172.16.6.1)"
    );

    let loopbacks = printer::loopback_table(&net);
    assert_eq!(loopbacks.len(), 12);
    assert_eq!(loopbacks[0], "PE1 (PE): 10.255.0.1");
    assert_eq!(loopbacks[11], "CE6 (CE): 172.30.6.1");

    let vpns = printer::vpn_summary(&net.vpn);
    assert_eq!(vpns.len(), 6 + 3);
    assert_eq!(
        vpns[0],
        "65000:1 CLIENT1 on PE1: mesh member, export [65000:12], import [65000:12], sends to [65000:2]"
    );
    assert_eq!(vpns[6], "VPN 1: CLIENT1@PE1, CLIENT2@PE3");
    assert_eq!(vpns[8], "VPN 3: CLIENT4@PE2, CLIENT5@PE3");
}

#[test]
fn recap_without_ce_loopbacks() {
    let net = compile(&HubAndSpoke::topology(), &CompilerConfig::default()).unwrap();
    let loopbacks = printer::loopback_table(&net);
    assert_eq!(loopbacks.len(), 4);
    assert_eq!(loopbacks[3], "P1 (P): 10.255.0.4");
    let vpns = printer::vpn_summary(&net.vpn);
    assert_eq!(vpns[3], "VPN 1: HUB@PE1, SPOKE_A@PE2, SPOKE_B@PE3");
}

#[test]
fn validation_error_lines() {
    let mut v = demo_value();
    v["subnets"][0][1]["router"] = json!("P9");
    match compile(&topology(v), &CompilerConfig::default()) {
        Err(Error::ValidationErrors(e)) => {
            assert_eq!(
                printer::validation_errors(&e),
                vec!["Subnet #0 references an unknown router P9".to_string()]
            );
        }
        r => panic!("Unexpected result: {:?}", r.map(|_| ())),
    }
}
