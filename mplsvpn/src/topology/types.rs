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

//! Module containing all identifier type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// AS Number
#[derive(
    PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AsId(pub u32);

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS{}", self.0)
    }
}

/// Router Identification (index into the router table of the [`Topology`](super::Topology))
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct RouterId(pub usize);

impl RouterId {
    /// Returns the index into the router table
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for RouterId {
    fn from(idx: usize) -> Self {
        Self(idx)
    }
}

/// Interface Identification. The interface is addressed by its owning router and the position in
/// the interface list of that router.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct InterfaceId {
    /// Router owning the interface
    pub router: RouterId,
    /// Position in the interface list of the router
    pub index: usize,
}

/// VRF Identification. The VRF is addressed by the PE router which owns it, and by the position in
/// the VRF list of that router.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct VrfId {
    /// PE router owning the VRF
    pub router: RouterId,
    /// Position in the VRF list of the router
    pub index: usize,
}

/// Subnet Identification (position in the subnet list of the topology)
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct SubnetId(pub usize);

/// Role of a router in the MPLS VPN backbone
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum RouterRole {
    /// Provider Edge router, terminates VRFs
    #[serde(rename = "PE")]
    ProviderEdge,
    /// Provider (core) router, label switching only
    #[serde(rename = "P")]
    Provider,
    /// Customer Edge router
    #[serde(rename = "CE")]
    CustomerEdge,
}

impl RouterRole {
    /// Returns true if the router is part of the provider core (PE or P)
    pub fn is_core(&self) -> bool {
        !self.is_ce()
    }

    /// Returns true if the router is a PE router
    pub fn is_pe(&self) -> bool {
        matches!(self, Self::ProviderEdge)
    }

    /// Returns true if the router is a CE router
    pub fn is_ce(&self) -> bool {
        matches!(self, Self::CustomerEdge)
    }
}

impl fmt::Display for RouterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ProviderEdge => "PE",
            Self::Provider => "P",
            Self::CustomerEdge => "CE",
        })
    }
}
