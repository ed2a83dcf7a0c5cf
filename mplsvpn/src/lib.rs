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

#![deny(missing_docs)]

//! # MplsVpn: Compiling MPLS L3VPN Network Intent
//! This is a library for turning a declarative description of an MPLS Layer-3 VPN backbone into a
//! validated, fully resolved configuration model of every router.
//!
//! ## Problem Statement
//! Given
//! - a set of autonomous systems with their address pools,
//! - PE, P and CE routers with their interfaces, and the VRFs of every PE,
//! - the point-to-point subnets between router interfaces,
//!
//! check that the description is consistent, assign an address to every loopback and link, and
//! derive the control plane (OSPF, LDP and MP-BGP) which realizes the intended VPNs.
//!
//! ## Structure
//!
//! The compiler is a pipeline of stages. Each stage only consumes the results of the previous one:
//!
//! - **[`Topology`](topology)**: Typed model of the input document, and the JSON parser.
//!
//! - **[`Validator`](validator)**: Referential integrity, uniqueness, interface exclusivity and
//!   RD/RT format. Produces a [`ValidTopology`](validator::ValidTopology), which is the only input
//!   accepted by the later stages.
//!
//! - **[`Allocator`](allocator)**: Loopback and point-to-point addresses from the AS pools.
//!
//! - **[`Vpn`](vpn)**: The route target graph between all VRFs, the classification of each VRF,
//!   and warnings about route targets without a counterpart.
//!
//! - **[`Synthesizer`](synthesizer)**: OSPF, LDP, VPNv4 and CE eBGP plans of every router.
//!
//! - **[`Compiler`](compiler)**: Runs all stages and assembles the
//!   [`CompiledNetwork`](compiler::CompiledNetwork).
//!
//! - **[`ExampleNetworks`](example_networks)**: Prepared topologies for tests and documentation.
//!
//! ## Usage
//!
//! ```
//! use mplsvpn::{compile, CompilerConfig, Error};
//! use mplsvpn::topology::parse_topology;
//! # use mplsvpn::example_networks::DEMO_DOCUMENT;
//!
//! fn main() -> Result<(), Error> {
//!     // let document = std::fs::read_to_string("network.json")?;
//! # let document = DEMO_DOCUMENT;
//!     let topo = parse_topology(&document)?;
//!     let net = compile(&topo, &CompilerConfig::default())?;
//!
//!     for warning in net.warnings.iter() {
//!         println!("{}", warning);
//!     }
//!     Ok(())
//! }
//! ```

pub mod allocator;
pub mod compiler;
pub mod config;
mod error;
pub mod example_networks;
pub mod printer;
pub mod synthesizer;
pub mod topology;
pub mod validator;
pub mod vpn;

#[cfg(test)]
mod test;

pub use compiler::{compile, CompiledNetwork};
pub use config::CompilerConfig;
pub use error::Error;
