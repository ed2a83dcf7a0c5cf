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

//! # Address Allocator
//!
//! Assigns a loopback address to every router, and a point-to-point subnet to every link. All
//! addresses are taken from the pools (`ipv4_ranges`) of the AS owning the router or the link:
//!
//! - PE and P routers take their loopback from the `loopback` pool of the backbone AS, and CE
//!   routers from the `loopback` pool of their own AS (if it declares one).
//! - A link that touches a CE router is owned by the AS of that CE, all other links are owned by
//!   the backbone AS. Links are carved from the `physical` pool of the owner.
//!
//! Routers are handled in the order PE, P, CE (declaration order inside each role), and links in
//! declaration order. Hence, the allocation is a pure function of the topology and the
//! configuration.

use crate::config::CompilerConfig;
use crate::topology::{AsId, InterfaceId, RouterId, SubnetId, LOOPBACK_POOL, PHYSICAL_POOL};
use crate::validator::ValidTopology;

use ipnet::Ipv4Net;
use itertools::Itertools;
use log::*;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Allocate all loopback and link addresses.
pub fn allocate(
    valid: &ValidTopology<'_>,
    config: &CompilerConfig,
) -> Result<Allocation, AllocationError> {
    if config.link_prefix_len > 31 {
        return Err(AllocationError::InvalidLinkPrefix(config.link_prefix_len));
    }
    check_pool_overlap(valid)?;

    let topo = valid.topology();
    let mut cursors: HashMap<(AsId, &'static str), Cursor> = HashMap::new();
    let mut result = Allocation::default();

    // loopbacks, in the order PE, P, CE
    let mut routers: Vec<RouterId> = topo.router_ids().collect();
    routers.sort_by_key(|r| topo.router(*r).role);
    for router in routers {
        let as_id = valid.router_as(router);
        let pool = match topo.get_as(as_id).and_then(|a| a.pool(LOOPBACK_POOL)) {
            Some(pool) => pool,
            None if topo.router(router).role.is_ce() => {
                debug!("{} has no loopback pool, skip {}", as_id, topo.router_name(router));
                continue;
            }
            None => return Err(AllocationError::exhausted(as_id, LOOPBACK_POOL)),
        };
        let addr = cursors
            .entry((as_id, LOOPBACK_POOL))
            .or_insert_with(|| Cursor::loopback(pool, config.loopback_offset))
            .next_host()
            .ok_or_else(|| AllocationError::exhausted(as_id, LOOPBACK_POOL))?;
        trace!("Loopback of {}: {}", topo.router_name(router), addr);
        result.loopbacks.insert(router, addr);
    }

    // physical links, in declaration order
    for link in valid.links() {
        let owner = link
            .endpoints
            .iter()
            .map(|i| i.router)
            .find(|r| topo.router(*r).role.is_ce())
            .map(|r| valid.router_as(r))
            .unwrap_or_else(|| valid.backbone());
        let pool = topo
            .get_as(owner)
            .and_then(|a| a.pool(PHYSICAL_POOL))
            .ok_or_else(|| AllocationError::exhausted(owner, PHYSICAL_POOL))?;
        let network = cursors
            .entry((owner, PHYSICAL_POOL))
            .or_insert_with(|| Cursor::physical(pool))
            .next_block(config.link_prefix_len)
            .ok_or_else(|| AllocationError::exhausted(owner, PHYSICAL_POOL))?;
        let hosts = link_hosts(network);
        let [a, b] = link.endpoints;
        result.interfaces.insert(a, Ipv4Net::new(hosts[0], network.prefix_len()).unwrap_or(network));
        result.interfaces.insert(b, Ipv4Net::new(hosts[1], network.prefix_len()).unwrap_or(network));
        trace!("Link #{} owned by {}: {}", link.subnet.0, owner, network);
        result.links.push(LinkAllocation {
            subnet: link.subnet,
            owner,
            network,
            endpoints: [(a, hosts[0]), (b, hosts[1])],
        });
    }

    debug!(
        "Allocated {} loopbacks and {} links",
        result.loopbacks.len(),
        result.links.len()
    );
    Ok(result)
}

/// Result of the address allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    loopbacks: BTreeMap<RouterId, Ipv4Addr>,
    interfaces: BTreeMap<InterfaceId, Ipv4Net>,
    links: Vec<LinkAllocation>,
}

impl Allocation {
    /// Returns the loopback address of the router. CE routers without a loopback pool don't have
    /// a loopback address.
    pub fn loopback(&self, router: RouterId) -> Option<Ipv4Addr> {
        self.loopbacks.get(&router).copied()
    }

    /// Returns the address (with the prefix length of the link) of a link interface.
    pub fn interface_address(&self, iface: InterfaceId) -> Option<Ipv4Net> {
        self.interfaces.get(&iface).copied()
    }

    /// Returns all loopback addresses, ordered by router.
    pub fn loopbacks(&self) -> impl Iterator<Item = (RouterId, Ipv4Addr)> + '_ {
        self.loopbacks.iter().map(|(r, a)| (*r, *a))
    }

    /// Returns all link allocations, in the order of the subnets.
    pub fn links(&self) -> &[LinkAllocation] {
        &self.links
    }

    /// Returns the allocation of the given subnet.
    pub fn link(&self, subnet: SubnetId) -> Option<&LinkAllocation> {
        self.links.iter().find(|l| l.subnet == subnet)
    }

    /// Returns every assigned address (loopbacks first, then link interfaces).
    pub fn addresses(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.loopbacks.values().copied().chain(self.interfaces.values().map(|n| n.addr()))
    }
}

/// Addresses assigned to a single link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkAllocation {
    /// The subnet of the topology
    pub subnet: SubnetId,
    /// AS from whose `physical` pool the link is taken
    pub owner: AsId,
    /// Network of the link
    pub network: Ipv4Net,
    /// Address of both endpoints, in the order of the subnet
    pub endpoints: [(InterfaceId, Ipv4Addr); 2],
}

/// Errors of the address allocation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// A pool has no address left (or is not declared at all).
    #[error("The {role} pool of {as_id} is exhausted")]
    AllocationExhausted {
        /// AS owning the pool
        as_id: AsId,
        /// Role of the pool
        role: String,
    },
    /// Two pools overlap
    #[error("Pool {first} overlaps with pool {second}")]
    PoolOverlap {
        /// Pool declared first
        first: PoolRef,
        /// Pool declared later
        second: PoolRef,
    },
    /// The link prefix length is not between 0 and 31.
    #[error("Invalid link prefix length: /{0}")]
    InvalidLinkPrefix(u8),
}

impl AllocationError {
    fn exhausted(as_id: AsId, role: &str) -> Self {
        Self::AllocationExhausted { as_id, role: role.to_string() }
    }
}

/// Reference to a declared pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRef {
    /// AS declaring the pool
    pub as_id: AsId,
    /// Role (name) of the pool
    pub role: String,
    /// Address range of the pool
    pub pool: Ipv4Net,
}

impl fmt::Display for PoolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} of {})", self.pool, self.role, self.as_id)
    }
}

/// No two declared pools may overlap, neither across ASes nor inside the same AS.
fn check_pool_overlap(valid: &ValidTopology<'_>) -> Result<(), AllocationError> {
    let pools = valid
        .topology()
        .ases()
        .iter()
        .flat_map(|a| {
            a.ipv4_ranges.iter().map(move |(role, pool)| PoolRef {
                as_id: a.as_id,
                role: role.clone(),
                pool: *pool,
            })
        })
        .collect::<Vec<_>>();

    match pools
        .iter()
        .tuple_combinations()
        .find(|(a, b)| a.pool.contains(&b.pool.network()) || b.pool.contains(&a.pool.network()))
    {
        Some((a, b)) => Err(AllocationError::PoolOverlap { first: a.clone(), second: b.clone() }),
        None => Ok(()),
    }
}

/// Position inside a pool. Addresses are handled as `u64` such that no arithmetic overflows.
#[derive(Debug)]
struct Cursor {
    next: u64,
    last: u64,
}

impl Cursor {
    /// Cursor over the usable hosts of the pool, skipping the first `offset` hosts.
    fn loopback(pool: Ipv4Net, offset: u32) -> Self {
        let (first, last) = if pool.prefix_len() >= 31 {
            (to_u64(pool.network()), to_u64(pool.broadcast()))
        } else {
            (to_u64(pool.network()) + 1, to_u64(pool.broadcast()) - 1)
        };
        Self { next: first + offset as u64, last }
    }

    /// Cursor over all addresses of the pool.
    fn physical(pool: Ipv4Net) -> Self {
        Self { next: to_u64(pool.network()), last: to_u64(pool.broadcast()) }
    }

    fn next_host(&mut self) -> Option<Ipv4Addr> {
        if self.next > self.last {
            return None;
        }
        let addr = self.next;
        self.next += 1;
        Some(to_addr(addr))
    }

    /// Next aligned block of the given prefix length.
    fn next_block(&mut self, prefix_len: u8) -> Option<Ipv4Net> {
        let size = 1u64 << (32 - prefix_len as u64);
        let start = (self.next + size - 1) / size * size;
        let end = start + size - 1;
        if end > self.last {
            return None;
        }
        self.next = end + 1;
        Ipv4Net::new(to_addr(start), prefix_len).ok()
    }
}

/// The two addresses assigned to the endpoints of a link network.
fn link_hosts(network: Ipv4Net) -> [Ipv4Addr; 2] {
    let base = to_u64(network.network());
    if network.prefix_len() >= 31 {
        [to_addr(base), to_addr(base + 1)]
    } else {
        [to_addr(base + 1), to_addr(base + 2)]
    }
}

fn to_u64(addr: Ipv4Addr) -> u64 {
    u32::from(addr) as u64
}

fn to_addr(x: u64) -> Ipv4Addr {
    Ipv4Addr::from(x as u32)
}
