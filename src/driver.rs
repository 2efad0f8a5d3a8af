use std::{io, path::Path, rc::Rc};

use crate::{
    arp::{self, ArpCache},
    error::Result,
    flow::{FlowMonitor, FlowRecordCollector},
    report,
    scenario::Scenario,
    stats::{Aggregator, Summary},
    topology::Topology,
    traffic::{self, TrafficPlan},
};

/// What a run needs from setup time: the shared resolution cache (already attached to every
/// interface) and the generator descriptions.
#[derive(Debug)]
pub struct Setup {
    pub arp: Rc<ArpCache>,
    pub traffic: TrafficPlan,
}

/// Prepares `topology` for a run of `scenario`. Must be called once, after the topology is
/// final and before any traffic starts.
pub fn setup(scenario: &Scenario, topology: &mut Topology) -> Result<Setup> {
    scenario.validate()?;
    tracing::info!(
        nr_nodes = topology.len(),
        loss_model = %scenario.loss_model,
        placement = %scenario.placement,
        "setting up scenario"
    );
    let arp = arp::populate(topology)?;
    let traffic = traffic::plan(scenario, &scenario.classes(), topology)?;
    Ok(Setup { arp, traffic })
}

/// Reduces the records of a finished run.
pub fn analyze(scenario: &Scenario, collector: &impl FlowRecordCollector) -> Result<Summary> {
    let window = scenario.analysis_window()?;
    let mut aggregator = Aggregator::new(window, scenario.classes());
    aggregator.collect(collector)?;
    let summary = aggregator.finish();
    tracing::info!(
        nr_flows = summary.flows.len(),
        nr_unclassified = summary.nr_unclassified(),
        throughput_mbps = summary.total_metrics.throughput_mbps,
        "flow statistics reduced"
    );
    Ok(summary)
}

/// [`analyze`] followed by the text report on `out`. Nothing is written if analysis fails.
pub fn report<W: io::Write>(
    scenario: &Scenario,
    collector: &impl FlowRecordCollector,
    out: &mut W,
) -> Result<Summary> {
    let summary = analyze(scenario, collector)?;
    report::write_report(out, &summary)?;
    Ok(summary)
}

pub fn read_scenario(path: impl AsRef<Path>) -> Result<Scenario> {
    let s = std::fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&s)?;
    scenario.validate()?;
    Ok(scenario)
}

pub fn read_flows(path: impl AsRef<Path>) -> Result<FlowMonitor> {
    let s = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&s)?)
}
