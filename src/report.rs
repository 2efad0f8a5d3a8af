//! Plain-text rendering of a [`Summary`].
//!
//! Layout: one block per flow in collector order, one per reported class in TID order, then the
//! totals. Undefined metrics print as [`UNDEFINED`].

use std::{fmt, io};

use crate::{
    scenario::Scenario,
    stats::{Aggregate, Metrics, Summary},
};

pub const UNDEFINED: &str = "---";

const RULE: &str = "==================";

struct Ms(Option<f64>);

impl fmt::Display for Ms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ms) => write!(f, "{ms:.3} ms"),
            None => f.write_str(UNDEFINED),
        }
    }
}

fn write_block<W: io::Write>(w: &mut W, agg: &Aggregate, metrics: &Metrics) -> io::Result<()> {
    writeln!(w, "  Tx bytes:\t{}", agg.tx_bytes)?;
    writeln!(w, "  Rx bytes:\t{}", agg.rx_bytes)?;
    writeln!(w, "  Tx packets:\t{}", agg.tx_packets)?;
    writeln!(w, "  Rx packets:\t{}", agg.rx_packets)?;
    writeln!(w, "  Lost packets:\t{}", agg.lost_packets)?;
    writeln!(w, "  Throughput:\t{:.3} Mb/s", metrics.throughput_mbps)?;
    writeln!(w, "  Mean delay:\t{}", Ms(metrics.mean_delay_ms))?;
    writeln!(w, "  Mean jitter:\t{}", Ms(metrics.mean_jitter_ms))
}

pub fn write_report<W: io::Write>(w: &mut W, summary: &Summary) -> io::Result<()> {
    for flow in &summary.flows {
        writeln!(w, "Flow {} ({})", flow.id, flow.tuple)?;
        write_block(w, &Aggregate::from(&flow.record), &flow.metrics)?;
    }
    for class in &summary.classes {
        writeln!(
            w,
            "{RULE} TID {} ({}) {RULE}",
            class.category.tid(),
            class.category.abbrev()
        )?;
        write_block(w, &class.aggregate, &class.metrics)?;
    }
    writeln!(w, "{RULE} Total {RULE}")?;
    write_block(w, &summary.total, &summary.total_metrics)
}

/// The banner printed before a run.
pub fn write_settings<W: io::Write>(w: &mut W, scenario: &Scenario) -> io::Result<()> {
    let enabled = scenario
        .classes()
        .enabled()
        .map(|c| c.category.abbrev())
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(w, "Scenario settings:")?;
    writeln!(w, "- stations: 1 fast + {} slow", scenario.nr_stations)?;
    writeln!(w, "- packet size: {} B", scenario.packet_size)?;
    writeln!(w, "- simulation time: {} ms", scenario.sim_time)?;
    writeln!(w, "- analysis start: {} ms", scenario.calc_start)?;
    writeln!(w, "- placement: {} (radius {} m)", scenario.placement, scenario.radius)?;
    writeln!(w, "- RTS/CTS: {}", if scenario.rts_cts { "on" } else { "off" })?;
    writeln!(w, "- traffic classes: {enabled}")?;
    writeln!(w, "- offered load per class: {} Mb/s", scenario.offered_load)?;
    writeln!(w, "- seed: {}", scenario.seed)?;
    writeln!(w, "- MCS: {}", scenario.mcs)?;
    writeln!(w, "- channel width: {} MHz", scenario.channel_width)?;
    writeln!(w, "- guard interval: {} ns", scenario.guard_interval)?;
    writeln!(w, "- loss model: {}", scenario.loss_model)
}
