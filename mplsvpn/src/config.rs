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

//! # Compiler Configuration
//!
//! Constants of the compiler, which are not part of the topology document. All of them have a
//! default value, and can be overwritten individually (the command line interface exposes a flag
//! for each of them).

use serde::Serialize;
use thiserror::Error;

/// OSPF cost of an interface that does not declare `ospf_cost`.
pub static DEFAULT_OSPF_COST: u32 = 1;
/// OSPF area in which all core interfaces are placed.
pub static DEFAULT_OSPF_AREA: u32 = 0;
/// OSPF process id on every PE and P router.
pub static DEFAULT_OSPF_PROCESS_ID: u32 = 1;
/// Prefix length of every point-to-point link.
pub static DEFAULT_LINK_PREFIX_LEN: u8 = 31;
/// Number of host addresses skipped at the beginning of every loopback pool.
pub static DEFAULT_LOOPBACK_OFFSET: u32 = 0;

/// Smallest OSPF cost of an interface.
pub static MIN_OSPF_COST: u32 = 1;
/// Largest OSPF cost of an interface (16 bit field of the router LSA).
pub static MAX_OSPF_COST: u32 = 65535;

/// Returns true if `cost` can be configured on an OSPF interface.
pub fn is_valid_ospf_cost(cost: u32) -> bool {
    (MIN_OSPF_COST..=MAX_OSPF_COST).contains(&cost)
}

/// Configuration of a single compiler run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompilerConfig {
    /// OSPF cost of an interface that does not declare `ospf_cost`.
    pub default_ospf_cost: u32,
    /// OSPF area of the core.
    pub ospf_area: u32,
    /// OSPF process id.
    pub ospf_process_id: u32,
    /// Prefix length of point-to-point links (`0..=31`).
    pub link_prefix_len: u8,
    /// Loopback addresses start at the first usable host of the pool plus this offset.
    pub loopback_offset: u32,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_ospf_cost: DEFAULT_OSPF_COST,
            ospf_area: DEFAULT_OSPF_AREA,
            ospf_process_id: DEFAULT_OSPF_PROCESS_ID,
            link_prefix_len: DEFAULT_LINK_PREFIX_LEN,
            loopback_offset: DEFAULT_LOOPBACK_OFFSET,
        }
    }
}

impl CompilerConfig {
    /// Checks that all values can be used to compile a network.
    pub fn check(&self) -> Result<(), ConfigError> {
        if !is_valid_ospf_cost(self.default_ospf_cost) {
            return Err(ConfigError::InvalidOspfCost(self.default_ospf_cost));
        }
        Ok(())
    }
}

/// Invalid compiler configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The default OSPF cost is outside of `1..=65535`.
    #[error("Invalid default OSPF cost: {0}")]
    InvalidOspfCost(u32),
}
