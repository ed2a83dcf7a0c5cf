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

//! Module containing all error types

use crate::allocator::AllocationError;
use crate::config::ConfigError;
use crate::topology::ParseError;
use crate::validator::ValidationErrors;
use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    /// The topology document cannot be read or parsed
    #[error("Parse Error: {0}")]
    ParseError(#[from] ParseError),
    /// The topology is structurally invalid
    #[error("Validation Error: {0}")]
    ValidationErrors(#[from] ValidationErrors),
    /// The compiler configuration is invalid
    #[error("Configuration Error: {0}")]
    ConfigError(#[from] ConfigError),
    /// Addresses cannot be allocated
    #[error("Allocation Error: {0}")]
    AllocationError(#[from] AllocationError),
}
