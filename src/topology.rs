//! The simulator-side view of nodes and their IPv4 interfaces.
//!
//! Nodes and interfaces belong to whoever drives the simulation. The only state this crate ever
//! changes on them is the resolution cache handle installed by [`crate::arp::attach`].

use std::{fmt, net::Ipv4Addr, rc::Rc};

use smallvec::SmallVec;

use crate::{
    arp::ArpCache,
    error::{Error, Result},
};

identifier!(NodeId);
identifier!(IfaceId);

/// A 48-bit link-layer address.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialOrd,
    Ord,
    PartialEq,
    Eq,
    Hash,
    derive_more::From,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const ZERO: MacAddr = Self::new([0; 6]);

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    /// The `n`th address of a sequential allocator, `00:00:00:00:00:01` being the first.
    pub fn nth(n: u64) -> Self {
        let bytes = n.to_be_bytes();
        let mut octets = [0; 6];
        octets.copy_from_slice(&bytes[2..]);
        Self(octets)
    }

    pub const fn octets(self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// An IPv4 interface bound to one network device.
#[derive(Debug, Clone, typed_builder::TypedBuilder)]
pub struct Interface {
    id: IfaceId,
    device: MacAddr,
    #[builder(default, setter(into))]
    addrs: SmallVec<[Ipv4Addr; 2]>,
    #[builder(default, setter(skip))]
    arp: Option<Rc<ArpCache>>,
}

impl Interface {
    pub fn loopback(id: IfaceId) -> Self {
        Self::builder()
            .id(id)
            .device(MacAddr::ZERO)
            .addrs(vec![Ipv4Addr::LOCALHOST])
            .build()
    }

    pub fn id(&self) -> IfaceId {
        self.id
    }

    pub fn device(&self) -> MacAddr {
        self.device
    }

    pub fn addrs(&self) -> &[Ipv4Addr] {
        &self.addrs
    }

    pub fn add_addr(&mut self, addr: Ipv4Addr) {
        self.addrs.push(addr);
    }

    /// The cache this interface resolves through, once one is attached.
    pub fn arp_cache(&self) -> Option<&Rc<ArpCache>> {
        self.arp.as_ref()
    }

    pub(crate) fn set_arp_cache(&mut self, cache: Rc<ArpCache>) {
        self.arp = Some(cache);
    }
}

/// The network-layer protocol instance of a node.
#[derive(Debug, Clone, Default)]
pub struct Ipv4Stack {
    interfaces: Vec<Interface>,
}

impl Ipv4Stack {
    /// A stack holding only the loopback interface, as a fresh internet stack install does.
    pub fn with_loopback() -> Self {
        Self {
            interfaces: vec![Interface::loopback(IfaceId::ZERO)],
        }
    }

    pub fn add_interface(&mut self, iface: Interface) {
        self.interfaces.push(iface);
    }

    pub fn next_iface_id(&self) -> IfaceId {
        IfaceId::new(self.interfaces.len())
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn interfaces_mut(&mut self) -> &mut [Interface] {
        &mut self.interfaces
    }

    /// The first address that is not loopback, across all interfaces.
    pub fn primary_addr(&self) -> Option<Ipv4Addr> {
        self.interfaces
            .iter()
            .flat_map(|iface| iface.addrs().iter().copied())
            .find(|addr| !addr.is_loopback())
    }
}

#[derive(Debug, Clone, derive_new::new)]
pub struct Node {
    id: NodeId,
    #[new(default)]
    ipv4: Option<Ipv4Stack>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn install_ipv4(&mut self, stack: Ipv4Stack) {
        self.ipv4 = Some(stack);
    }

    pub fn ipv4(&self) -> Option<&Ipv4Stack> {
        self.ipv4.as_ref()
    }

    pub fn ipv4_mut(&mut self) -> Option<&mut Ipv4Stack> {
        self.ipv4.as_mut()
    }

    pub(crate) fn require_ipv4(&self) -> Result<&Ipv4Stack> {
        self.ipv4.as_ref().ok_or(Error::MissingIpStack { node: self.id })
    }

    pub(crate) fn require_ipv4_mut(&mut self) -> Result<&mut Ipv4Stack> {
        let node = self.id;
        self.ipv4.as_mut().ok_or(Error::MissingIpStack { node })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Vec<Node>,
}

impl Topology {
    /// A single /24 infrastructure network. Every node gets an IPv4 stack with loopback plus one
    /// wireless interface; node `i` is assigned host `i + 1` of `network` and the `i + 1`th
    /// sequential MAC address. Node 0 is the access point.
    pub fn bss(nr_nodes: usize, network: Ipv4Addr) -> Result<Self> {
        // Host 0 is the network address and 255 is broadcast
        if nr_nodes > 254 {
            return Err(Error::AddressSpaceExhausted {
                network,
                nodes: nr_nodes,
            });
        }
        let [a, b, c, _] = network.octets();
        let mut topology = Self::default();
        for i in 0..nr_nodes {
            let host = (i + 1) as u8;
            let mut stack = Ipv4Stack::with_loopback();
            let iface = Interface::builder()
                .id(stack.next_iface_id())
                .device(MacAddr::nth(i as u64 + 1))
                .addrs(vec![Ipv4Addr::new(a, b, c, host)])
                .build();
            stack.add_interface(iface);
            let mut node = Node::new(NodeId::new(i));
            node.install_ipv4(stack);
            topology.add_node(node);
        }
        Ok(topology)
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
