use std::net::Ipv4Addr;

use crate::{flow::FlowId, topology::NodeId, units::Millisecs};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("node {node} has no IPv4 stack installed")]
    MissingIpStack { node: NodeId },

    #[error("node {node} has no non-loopback IPv4 address")]
    NoAddress { node: NodeId },

    #[error("address {addr} is bound to more than one interface")]
    DuplicateAddress { addr: Ipv4Addr },

    #[error("no addresses left in {network}/24 for {nodes} nodes")]
    AddressSpaceExhausted { network: Ipv4Addr, nodes: usize },

    #[error("unknown propagation loss model `{0}` (valid: Friis, LogDistance, TwoRayGround, Nakagami)")]
    UnknownLossModel(String),

    #[error("unknown placement strategy `{0}` (valid: grid, rectangle, disc)")]
    UnknownPlacement(String),

    #[error("analysis window is empty: simulation time {sim_time} ms, analysis start {calc_start} ms")]
    EmptyWindow {
        sim_time: Millisecs,
        calc_start: Millisecs,
    },

    #[error("offered load {0} Mb/s is not a non-negative rate")]
    InvalidOfferedLoad(f64),

    #[error("flow {flow} uses unsupported protocol {protocol}")]
    UnsupportedProtocol { flow: FlowId, protocol: u8 },

    #[error("flow {0} has no five-tuple in the collector")]
    UnknownFlow(FlowId),

    #[error("serde error")]
    Serde(#[from] serde_json::Error),

    #[error("IO error")]
    Io(#[from] std::io::Error),
}
