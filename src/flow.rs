use std::{fmt, net::Ipv4Addr};

use rustc_hash::FxHashMap;

use crate::{
    class::Tid,
    units::{Bytes, Nanosecs},
};

identifier!(FlowId);

/// Transport protocol of a flow, from the IPv4 protocol number.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Protocol {
    Tcp,
    Udp,
    Unsupported(u8),
}

impl Protocol {
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;

    pub const fn number(self) -> u8 {
        match self {
            Protocol::Tcp => Self::TCP,
            Protocol::Udp => Self::UDP,
            Protocol::Unsupported(n) => n,
        }
    }

    pub const fn name(self) -> Option<&'static str> {
        match self {
            Protocol::Tcp => Some("TCP"),
            Protocol::Udp => Some("UDP"),
            Protocol::Unsupported(_) => None,
        }
    }
}

impl From<u8> for Protocol {
    fn from(n: u8) -> Self {
        match n {
            Self::TCP => Protocol::Tcp,
            Self::UDP => Protocol::Udp,
            n => Protocol::Unsupported(n),
        }
    }
}

impl From<Protocol> for u8 {
    fn from(p: Protocol) -> Self {
        p.number()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "protocol {}", self.number()),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, derive_new::new, serde::Serialize, serde::Deserialize,
)]
pub struct FiveTuple {
    pub protocol: Protocol,
    pub src_addr: Ipv4Addr,
    pub src_port: u16,
    pub dst_addr: Ipv4Addr,
    pub dst_port: u16,
}

impl FiveTuple {
    /// The traffic class encoded in the destination port, if any.
    pub fn tid(&self) -> Option<Tid> {
        Tid::from_port(self.dst_port)
    }
}

impl fmt::Display for FiveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} --> {}/{}",
            self.protocol, self.src_addr, self.src_port, self.dst_addr, self.dst_port
        )
    }
}

/// Raw counters of one flow, as measured over the analysis window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FlowRecord {
    pub tx_bytes: Bytes,
    pub rx_bytes: Bytes,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    /// Sum of the one-way delays of all received packets.
    pub delay_sum: Nanosecs,
    /// Sum of the delay differences between consecutive received packets.
    pub jitter_sum: Nanosecs,
    pub first_tx: Nanosecs,
    pub last_rx: Nanosecs,
}

/// The source of flow records once a run has finished.
pub trait FlowRecordCollector {
    /// Every observed flow, in collector order.
    fn flow_records(&self) -> Vec<(FlowId, FlowRecord)>;

    /// The five-tuple a flow was classified under.
    fn classify(&self, id: FlowId) -> Option<FiveTuple>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MonitoredFlow {
    pub id: FlowId,
    pub tuple: FiveTuple,
    pub record: FlowRecord,
}

/// An in-memory collector, e.g. a flow monitor dump replayed from JSON.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<MonitoredFlow>", into = "Vec<MonitoredFlow>")]
pub struct FlowMonitor {
    flows: Vec<MonitoredFlow>,
    index: FxHashMap<FlowId, usize>,
}

impl FlowMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a flow, replacing any earlier record under the same ID in place.
    pub fn record(&mut self, id: FlowId, tuple: FiveTuple, record: FlowRecord) {
        let flow = MonitoredFlow { id, tuple, record };
        match self.index.get(&id) {
            Some(&i) => self.flows[i] = flow,
            None => {
                self.index.insert(id, self.flows.len());
                self.flows.push(flow);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn flows(&self) -> &[MonitoredFlow] {
        &self.flows
    }
}

impl From<Vec<MonitoredFlow>> for FlowMonitor {
    fn from(flows: Vec<MonitoredFlow>) -> Self {
        let mut monitor = Self::new();
        for flow in flows {
            monitor.record(flow.id, flow.tuple, flow.record);
        }
        monitor
    }
}

impl From<FlowMonitor> for Vec<MonitoredFlow> {
    fn from(monitor: FlowMonitor) -> Self {
        monitor.flows
    }
}

impl FlowRecordCollector for FlowMonitor {
    fn flow_records(&self) -> Vec<(FlowId, FlowRecord)> {
        self.flows.iter().map(|f| (f.id, f.record)).collect()
    }

    fn classify(&self, id: FlowId) -> Option<FiveTuple> {
        self.index.get(&id).map(|&i| self.flows[i].tuple)
    }
}
