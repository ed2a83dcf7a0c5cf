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

//! # Route Distinguisher and Route Target identifiers
//!
//! Both RDs and RTs are written as `ASN:index`, where `ASN` must be the number of an AS declared
//! in the topology.

use crate::topology::AsId;

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Parsed policy identifier of the shape `ASN:index`, used both for route distinguishers and for
/// route targets.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct PolicyId {
    /// Administrator subfield (the AS number)
    pub asn: AsId,
    /// Assigned number subfield
    pub index: u32,
}

impl FromStr for PolicyId {
    type Err = PolicyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (asn, index) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| PolicyIdError::MissingSeparator(s.to_string()))?;
        let asn: u32 = asn.parse().map_err(|_| PolicyIdError::InvalidAsn(asn.to_string()))?;
        if asn == 0 {
            return Err(PolicyIdError::InvalidAsn(asn.to_string()));
        }
        let index: u32 =
            index.parse().map_err(|_| PolicyIdError::InvalidIndex(index.to_string()))?;
        Ok(Self { asn: AsId(asn), index })
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asn.0, self.index)
    }
}

impl Serialize for PolicyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors while parsing an `ASN:index` identifier
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum PolicyIdError {
    /// The `:` separator is missing
    #[error("expected `ASN:index`, got `{0}`")]
    MissingSeparator(String),
    /// The administrator subfield is not a positive AS number
    #[error("`{0}` is not a valid AS number")]
    InvalidAsn(String),
    /// The assigned number subfield is not a number
    #[error("`{0}` is not a valid index")]
    InvalidIndex(String),
}
