use std::net::SocketAddrV4;

use crate::{
    class::{AccessCategory, ClassTable},
    error::{Error, Result},
    scenario::Scenario,
    topology::{Ipv4Stack, NodeId, Topology},
    units::{BitsPerSec, Bytes, Millisecs},
};

/// The fast station sends this fraction of the per-class load.
pub const FAST_STATION_DIVISOR: u64 = 9;

/// A saturating constant-bit-rate source that is always on between `start` and `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, typed_builder::TypedBuilder)]
pub struct OnOffDesc {
    pub node: NodeId,
    pub dst: SocketAddrV4,
    pub category: AccessCategory,
    /// Type-of-service byte set on every outbound packet.
    pub tos: u8,
    #[builder(setter(into))]
    pub rate: BitsPerSec,
    #[builder(setter(into))]
    pub packet_size: Bytes,
    #[builder(default, setter(into))]
    pub start: Millisecs,
    #[builder(setter(into))]
    pub stop: Millisecs,
}

/// A UDP sink on the access point, one per enabled class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
pub struct SinkDesc {
    pub node: NodeId,
    pub local: SocketAddrV4,
    pub category: AccessCategory,
}

#[derive(Debug, Clone, Default)]
pub struct TrafficPlan {
    pub sinks: Vec<SinkDesc>,
    pub sources: Vec<OnOffDesc>,
}

/// Describes the generators of a run: every station sends every enabled class to the access
/// point (node 0). Node 1 is the fast station; the remaining nodes share the slow stations' load
/// evenly.
pub fn plan(scenario: &Scenario, classes: &ClassTable, topology: &Topology) -> Result<TrafficPlan> {
    let Some((ap, stations)) = topology.nodes().split_first() else {
        return Ok(TrafficPlan::default());
    };
    let dst_addr = ap
        .ipv4()
        .ok_or(Error::MissingIpStack { node: ap.id() })?
        .primary_addr()
        .ok_or(Error::NoAddress { node: ap.id() })?;

    let load = scenario.offered_rate();
    let nr_slow = stations.len().saturating_sub(1) as u64;
    let fast_rate = load.share(FAST_STATION_DIVISOR).unwrap_or_default();
    let slow_rate = load.share(nr_slow).unwrap_or_default();

    let mut traffic = TrafficPlan::default();
    for class in classes.enabled() {
        let tid = class.tid();
        let dst = SocketAddrV4::new(dst_addr, tid.port());
        traffic
            .sinks
            .push(SinkDesc::new(ap.id(), dst, class.category));
        for (i, station) in stations.iter().enumerate() {
            // Sources must sit on a node that can send
            station
                .ipv4()
                .and_then(Ipv4Stack::primary_addr)
                .ok_or(Error::NoAddress { node: station.id() })?;
            let rate = if i == 0 { fast_rate } else { slow_rate };
            let source = OnOffDesc::builder()
                .node(station.id())
                .dst(dst)
                .category(class.category)
                .tos(tid.tos())
                .rate(rate)
                .packet_size(scenario.packet_size)
                .stop(scenario.sim_time)
                .build();
            traffic.sources.push(source);
        }
    }
    tracing::info!(
        nr_sinks = traffic.sinks.len(),
        nr_sources = traffic.sources.len(),
        "traffic planned"
    );
    Ok(traffic)
}
