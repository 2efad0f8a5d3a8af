//! Static address resolution.
//!
//! Every IPv4 address in the topology is resolved up front into one [`ArpCache`], which is then
//! shared by every interface. No resolution request is ever sent during the run, so loss and delay
//! measured on the channel come from data traffic alone.
//!
//! The two passes are separate functions and must run in order: [`build`] reads the finished
//! topology, [`attach`] installs the result. After [`attach`] the cache is never written again.

use std::{net::Ipv4Addr, rc::Rc};

use rustc_hash::FxHashMap;

use crate::{
    error::{Error, Result},
    topology::{MacAddr, Topology},
    units::{Nanosecs, Secs},
};

/// How long a resolved entry stays alive. Far longer than any run.
pub const ALIVE_TIMEOUT: Secs = Secs::new(3600 * 24 * 365);

/// A resolved entry, alive until a fixed simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct ArpEntry {
    mac: MacAddr,
    alive_until: Nanosecs,
}

impl ArpEntry {
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn alive_until(&self) -> Nanosecs {
        self.alive_until
    }

    pub fn is_expired(&self, now: Nanosecs) -> bool {
        now >= self.alive_until
    }
}

/// An IPv4 to link-layer address table.
#[derive(Debug)]
pub struct ArpCache {
    entries: FxHashMap<Ipv4Addr, ArpEntry>,
    alive_timeout: Nanosecs,
}

impl ArpCache {
    fn new(alive_timeout: Nanosecs) -> Self {
        Self {
            entries: FxHashMap::default(),
            alive_timeout,
        }
    }

    delegate::delegate! {
        to self.entries {
            pub fn len(&self) -> usize;

            pub fn is_empty(&self) -> bool;

            #[call(contains_key)]
            pub fn contains(&self, addr: &Ipv4Addr) -> bool;

            #[call(get)]
            pub fn entry(&self, addr: &Ipv4Addr) -> Option<&ArpEntry>;
        }
    }

    pub fn alive_timeout(&self) -> Nanosecs {
        self.alive_timeout
    }

    pub fn lookup(&self, addr: Ipv4Addr) -> Option<MacAddr> {
        self.entries.get(&addr).map(ArpEntry::mac)
    }

    /// Resolves `addr` as seen at simulation time `now`; expired entries do not resolve.
    pub fn resolve(&self, addr: Ipv4Addr, now: Nanosecs) -> Option<MacAddr> {
        self.entries
            .get(&addr)
            .filter(|e| !e.is_expired(now))
            .map(ArpEntry::mac)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ipv4Addr, &ArpEntry)> {
        self.entries.iter()
    }

    fn mark_alive(&mut self, addr: Ipv4Addr, mac: MacAddr) -> Result<()> {
        if self.entries.contains_key(&addr) {
            return Err(Error::DuplicateAddress { addr });
        }
        tracing::debug!(%addr, %mac, "arp entry alive");
        // Entries are marked alive at time zero
        self.entries.insert(addr, ArpEntry::new(mac, self.alive_timeout));
        Ok(())
    }
}

/// Build pass: resolves every non-loopback address of every interface to that interface's
/// device address.
///
/// Fails on the first node without an IPv4 stack, or on an address bound twice.
pub fn build(topology: &Topology) -> Result<ArpCache> {
    let mut cache = ArpCache::new(ALIVE_TIMEOUT.into_ns());
    for node in topology.nodes() {
        let stack = node.require_ipv4()?;
        for iface in stack.interfaces() {
            for &addr in iface.addrs() {
                if addr.is_loopback() {
                    continue;
                }
                cache.mark_alive(addr, iface.device())?;
            }
        }
    }
    Ok(cache)
}

/// Attach pass: installs `cache` on every interface of every node.
///
/// Stack presence is checked for all nodes before anything is installed, so a failed attach
/// leaves the topology untouched.
pub fn attach(topology: &mut Topology, cache: &Rc<ArpCache>) -> Result<()> {
    for node in topology.nodes() {
        node.require_ipv4()?;
    }
    let mut nr_ifaces = 0;
    for node in topology.nodes_mut() {
        let stack = node.require_ipv4_mut()?;
        for iface in stack.interfaces_mut() {
            iface.set_arp_cache(Rc::clone(cache));
            nr_ifaces += 1;
        }
    }
    tracing::info!(nr_ifaces, "arp cache attached");
    Ok(())
}

/// Runs [`build`] then [`attach`] and hands back the shared cache.
pub fn populate(topology: &mut Topology) -> Result<Rc<ArpCache>> {
    let cache = Rc::new(build(topology)?);
    tracing::info!(
        nr_entries = cache.len(),
        nr_nodes = topology.len(),
        "arp cache built"
    );
    attach(topology, &cache)?;
    Ok(cache)
}
