//! Reduction of flow records into per-class and global statistics.
//!
//! Counters are summed as integers while records are visited and the derived metrics are only
//! computed once a bucket is complete, so the outcome does not depend on visiting order.

use crate::{
    class::{AccessCategory, ClassTable, Tid},
    error::{Error, Result},
    flow::{FiveTuple, FlowId, FlowRecord, FlowRecordCollector, Protocol},
    units::{Bytes, Microsecs, Nanosecs},
};

/// Summed counters of a set of flows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Aggregate {
    pub nr_flows: u64,
    pub tx_bytes: Bytes,
    pub rx_bytes: Bytes,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub delay_sum: Nanosecs,
    pub jitter_sum: Nanosecs,
}

impl Aggregate {
    pub fn add(&mut self, record: &FlowRecord) {
        self.nr_flows += 1;
        self.tx_bytes += record.tx_bytes;
        self.rx_bytes += record.rx_bytes;
        self.tx_packets += record.tx_packets;
        self.rx_packets += record.rx_packets;
        self.lost_packets += record.lost_packets;
        self.delay_sum += record.delay_sum;
        self.jitter_sum += record.jitter_sum;
    }

    pub fn merge(&mut self, other: &Aggregate) {
        self.nr_flows += other.nr_flows;
        self.tx_bytes += other.tx_bytes;
        self.rx_bytes += other.rx_bytes;
        self.tx_packets += other.tx_packets;
        self.rx_packets += other.rx_packets;
        self.lost_packets += other.lost_packets;
        self.delay_sum += other.delay_sum;
        self.jitter_sum += other.jitter_sum;
    }

    /// Derives throughput, mean delay and mean jitter over the analysis `window`.
    pub fn metrics(&self, window: Microsecs) -> Metrics {
        let throughput_mbps = if self.rx_packets > 0 {
            self.rx_bytes.into_bits().mbps_over(window)
        } else {
            0.0
        };
        let mean_delay_ms = self
            .delay_sum
            .checked_div(self.rx_packets)
            .map(|d| d.into_us().as_ms_f64());
        // Jitter is measured between consecutive packets, so it needs at least two
        let mean_jitter_ms = if self.rx_packets > 1 {
            self.jitter_sum
                .checked_div(self.rx_packets - 1)
                .map(|j| j.into_us().as_ms_f64())
        } else {
            None
        };
        Metrics {
            throughput_mbps,
            mean_delay_ms,
            mean_jitter_ms,
        }
    }
}

impl From<&FlowRecord> for Aggregate {
    fn from(record: &FlowRecord) -> Self {
        let mut agg = Self::default();
        agg.add(record);
        agg
    }
}

/// Metrics derived from an [`Aggregate`]. `None` means undefined for lack of received packets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub throughput_mbps: f64,
    pub mean_delay_ms: Option<f64>,
    pub mean_jitter_ms: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct FlowSummary {
    pub id: FlowId,
    pub tuple: FiveTuple,
    pub record: FlowRecord,
    pub metrics: Metrics,
}

impl FlowSummary {
    pub fn tid(&self) -> Option<Tid> {
        self.tuple.tid()
    }
}

#[derive(Debug, Clone)]
pub struct ClassSummary {
    pub category: AccessCategory,
    pub aggregate: Aggregate,
    pub metrics: Metrics,
}

/// The finished statistics of a run.
#[derive(Debug, Clone)]
pub struct Summary {
    pub window: Microsecs,
    /// Per-flow lines, in the order the records were visited.
    pub flows: Vec<FlowSummary>,
    /// One entry per class of the class table, ordered by TID.
    pub classes: Vec<ClassSummary>,
    pub total: Aggregate,
    pub total_metrics: Metrics,
    per_tid: [Aggregate; Tid::COUNT],
    nr_unclassified: u64,
}

impl Summary {
    /// The bucket of any TID, including those not in the report.
    pub fn tid(&self, tid: Tid) -> &Aggregate {
        &self.per_tid[tid.into_usize()]
    }

    pub fn class(&self, category: AccessCategory) -> Option<&ClassSummary> {
        self.classes.iter().find(|c| c.category == category)
    }

    /// Flows whose destination port does not encode a TID; they only count towards the total.
    pub fn nr_unclassified(&self) -> u64 {
        self.nr_unclassified
    }
}

#[derive(Debug)]
pub struct Aggregator {
    window: Microsecs,
    classes: ClassTable,
    per_tid: [Aggregate; Tid::COUNT],
    total: Aggregate,
    flows: Vec<FlowSummary>,
    nr_unclassified: u64,
}

impl Aggregator {
    pub fn new(window: Microsecs, classes: ClassTable) -> Self {
        assert!(window > Microsecs::ZERO, "analysis window must be positive");
        Self {
            window,
            classes,
            per_tid: [Aggregate::default(); Tid::COUNT],
            total: Aggregate::default(),
            flows: Vec::new(),
            nr_unclassified: 0,
        }
    }

    /// Folds one flow into its class bucket and the total.
    ///
    /// A flow with a protocol other than TCP or UDP is rejected before anything is accumulated.
    pub fn insert(&mut self, id: FlowId, tuple: FiveTuple, record: FlowRecord) -> Result<()> {
        if let Protocol::Unsupported(protocol) = tuple.protocol {
            return Err(Error::UnsupportedProtocol { flow: id, protocol });
        }
        match tuple.tid() {
            Some(tid) => {
                self.per_tid[tid.into_usize()].add(&record);
                if !self.classes.contains(tid) {
                    tracing::debug!(flow = %id, %tid, "flow in a class outside the report");
                }
            }
            None => {
                tracing::warn!(
                    flow = %id,
                    port = tuple.dst_port,
                    "destination port encodes no TID, counted in totals only"
                );
                self.nr_unclassified += 1;
            }
        }
        self.total.add(&record);
        let metrics = Aggregate::from(&record).metrics(self.window);
        self.flows.push(FlowSummary {
            id,
            tuple,
            record,
            metrics,
        });
        Ok(())
    }

    /// Visits every record of `collector`, stopping at the first error.
    pub fn collect(&mut self, collector: &impl FlowRecordCollector) -> Result<()> {
        for (id, record) in collector.flow_records() {
            let tuple = collector.classify(id).ok_or(Error::UnknownFlow(id))?;
            tracing::debug!(flow = %id, %tuple, "flow record");
            self.insert(id, tuple, record)?;
        }
        Ok(())
    }

    pub fn finish(self) -> Summary {
        let classes = self
            .classes
            .iter()
            .map(|c| {
                let aggregate = self.per_tid[c.tid().into_usize()];
                ClassSummary {
                    category: c.category,
                    aggregate,
                    metrics: aggregate.metrics(self.window),
                }
            })
            .collect();
        Summary {
            window: self.window,
            flows: self.flows,
            classes,
            total: self.total,
            total_metrics: self.total.metrics(self.window),
            per_tid: self.per_tid,
            nr_unclassified: self.nr_unclassified,
        }
    }
}
