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

//! Parses the JSON topology document
//!
//! The document has the top-level keys `as`, `pe_routers`, `p_routers`, `ce_routers` and
//! `subnets`. Unknown keys are ignored, missing required keys produce a [`ParseError`]. Only the
//! shape of the document is checked here; all referential checks happen in the
//! [validator](crate::validator).

use crate::topology::model::{AutonomousSystem, Endpoint, Interface, Router, Subnet, Topology, Vrf};
use crate::topology::{AsId, RouterRole};

use ipnet::Ipv4Net;
use log::*;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Reads and parses the topology document stored in the given file.
pub fn read_topology(filename: impl AsRef<Path>) -> Result<Topology, ParseError> {
    let json = read_to_string(filename.as_ref())?;
    debug!("Parsing topology from {}", filename.as_ref().display());
    parse_topology(&json)
}

/// Parses the topology from a JSON string.
///
/// ```rust
/// use mplsvpn::topology::parse_topology;
///
/// let topo = parse_topology(r#"{
///     "as": [{ "as_number": 65000, "backbone": true,
///              "ipv4_ranges": { "loopback": "10.255.0.0/24", "physical": "10.0.0.0/16" } }],
///     "p_routers": [{ "hostname": "P1", "interfaces": [{ "name": "Loopback0" }] }],
///     "subnets": []
/// }"#).unwrap();
/// assert_eq!(topo.routers().len(), 1);
/// assert_eq!(topo.routers()[0].hostname, "P1");
/// ```
pub fn parse_topology(json: &str) -> Result<Topology, ParseError> {
    let doc: TopologyDocument = serde_json::from_str(json)?;
    doc.into_topology()
}

/// Builds the topology from an already parsed JSON value.
pub fn topology_from_value(value: serde_json::Value) -> Result<Topology, ParseError> {
    let doc: TopologyDocument = serde_json::from_value(value)?;
    doc.into_topology()
}

impl FromStr for Topology {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_topology(s)
    }
}

#[derive(Debug, Deserialize)]
struct TopologyDocument {
    #[serde(rename = "as")]
    ases: Vec<AsDocument>,
    #[serde(default)]
    pe_routers: Vec<PeDocument>,
    #[serde(default)]
    p_routers: Vec<PDocument>,
    #[serde(default)]
    ce_routers: Vec<CeDocument>,
    subnets: Vec<[Endpoint; 2]>,
}

#[derive(Debug, Deserialize)]
struct AsDocument {
    as_number: u32,
    #[serde(default)]
    backbone: bool,
    ipv4_ranges: BTreeMap<String, Ipv4Net>,
}

#[derive(Debug, Deserialize)]
struct PeDocument {
    hostname: String,
    interfaces: Vec<Interface>,
    #[serde(default)]
    vrfs: Vec<VrfDocument>,
}

#[derive(Debug, Deserialize)]
struct PDocument {
    hostname: String,
    interfaces: Vec<Interface>,
}

#[derive(Debug, Deserialize)]
struct CeDocument {
    hostname: String,
    interfaces: Vec<Interface>,
    as_number: u32,
    private_network: Ipv4Net,
}

#[derive(Debug, Deserialize)]
struct VrfDocument {
    name: String,
    rd: String,
    #[serde(default)]
    route_targets: RouteTargetsDocument,
    #[serde(default)]
    associated_interfaces: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RouteTargetsDocument {
    #[serde(default)]
    export: Vec<String>,
    #[serde(default)]
    import: Vec<String>,
}

impl TopologyDocument {
    fn into_topology(self) -> Result<Topology, ParseError> {
        let mut topo = Topology::new();

        for a in self.ases {
            if a.as_number == 0 {
                return Err(ParseError::InvalidAsNumber(a.as_number));
            }
            topo.add_as(AutonomousSystem {
                as_id: AsId(a.as_number),
                backbone: a.backbone,
                ipv4_ranges: a.ipv4_ranges,
            });
        }

        for pe in self.pe_routers {
            let mut router = Router::new(pe.hostname, RouterRole::ProviderEdge);
            router.interfaces = pe.interfaces;
            router.vrfs = pe
                .vrfs
                .into_iter()
                .map(|v| Vrf {
                    name: v.name,
                    rd: v.rd,
                    export: v.route_targets.export,
                    import: v.route_targets.import,
                    associated_interfaces: v.associated_interfaces,
                })
                .collect();
            topo.add_router(router);
        }

        for p in self.p_routers {
            let mut router = Router::new(p.hostname, RouterRole::Provider);
            router.interfaces = p.interfaces;
            topo.add_router(router);
        }

        for ce in self.ce_routers {
            if ce.as_number == 0 {
                return Err(ParseError::InvalidAsNumber(ce.as_number));
            }
            let mut router = Router::new(ce.hostname, RouterRole::CustomerEdge);
            router.interfaces = ce.interfaces;
            router.as_number = Some(AsId(ce.as_number));
            router.private_network = Some(ce.private_network);
            topo.add_router(router);
        }

        topo.subnets = self.subnets.into_iter().map(|endpoints| Subnet { endpoints }).collect();

        debug!(
            "Parsed topology with {} ASes, {} routers and {} subnets",
            topo.ases.len(),
            topo.routers.len(),
            topo.subnets.len()
        );
        Ok(topo)
    }
}

/// Error while reading the topology document
#[derive(Debug, Error)]
pub enum ParseError {
    /// Io Error
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// The document does not have the expected shape
    #[error("Malformed topology document: {0}")]
    JsonError(#[from] serde_json::Error),
    /// AS numbers must be positive
    #[error("AS number must be positive, got {0}")]
    InvalidAsNumber(u32),
}
