use std::net::Ipv4Addr;

use qosflow::{
    class::{AccessCategory, ClassTable, Tid},
    stats::{Aggregate, Aggregator},
    units::{Bytes, Microsecs, Nanosecs, Secs},
    Error, FiveTuple, FlowId, FlowMonitor, FlowRecord, Protocol, Scenario,
};

fn tuple(protocol: Protocol, src_host: u8, dst_port: u16) -> FiveTuple {
    FiveTuple::new(
        protocol,
        Ipv4Addr::new(192, 168, 1, src_host),
        49153,
        Ipv4Addr::new(192, 168, 1, 1),
        dst_port,
    )
}

fn record(rx_packets: u64, seed: u64) -> FlowRecord {
    FlowRecord {
        tx_bytes: Bytes::new(1470 * (rx_packets + seed)),
        rx_bytes: Bytes::new(1470 * rx_packets),
        tx_packets: rx_packets + seed,
        rx_packets,
        lost_packets: seed,
        delay_sum: Nanosecs::new(123_457 * rx_packets),
        jitter_sum: Nanosecs::new(7_001 * rx_packets.saturating_sub(1)),
        first_tx: Nanosecs::ZERO,
        last_rx: Secs::new(10).into_ns(),
    }
}

fn flows() -> Vec<(FlowId, FiveTuple, FlowRecord)> {
    vec![
        (FlowId::new(1), tuple(Protocol::Udp, 2, 1006), record(1000, 3)),
        (FlowId::new(2), tuple(Protocol::Udp, 2, 1005), record(850, 12)),
        (FlowId::new(3), tuple(Protocol::Udp, 3, 1000), record(0, 40)),
        (FlowId::new(4), tuple(Protocol::Tcp, 3, 1001), record(1, 0)),
        (FlowId::new(5), tuple(Protocol::Udp, 4, 1006), record(77, 1)),
        (FlowId::new(6), tuple(Protocol::Udp, 4, 1500), record(300, 9)),
    ]
}

fn monitor(flows: &[(FlowId, FiveTuple, FlowRecord)]) -> FlowMonitor {
    let mut monitor = FlowMonitor::new();
    for &(id, tuple, record) in flows {
        monitor.record(id, tuple, record);
    }
    monitor
}

#[test]
fn single_udp_flow() -> anyhow::Result<()> {
    let scenario = Scenario::builder().sim_time(Secs::new(10)).build();
    let flows = monitor(&[(
        FlowId::new(1),
        tuple(Protocol::Udp, 2, 1006),
        FlowRecord {
            tx_bytes: Bytes::new(1_470_000),
            rx_bytes: Bytes::new(1_470_000),
            tx_packets: 1000,
            rx_packets: 1000,
            delay_sum: Microsecs::new(50_000).into_ns(),
            jitter_sum: Microsecs::new(999).into_ns(),
            ..Default::default()
        },
    )]);
    let summary = qosflow::analyze(&scenario, &flows)?;

    let flow = &summary.flows[0];
    assert!((flow.metrics.throughput_mbps - 1.176).abs() < 1e-9);
    assert_eq!(flow.metrics.mean_delay_ms, Some(0.05));
    let jitter = flow.metrics.mean_jitter_ms.expect("1000 packets have jitter");
    assert!((jitter - 0.001).abs() < 1e-9);

    let voice = summary
        .class(AccessCategory::Voice)
        .expect("voice is reported");
    assert_eq!(voice.metrics, flow.metrics);
    assert_eq!(summary.total_metrics, flow.metrics);

    let mut out = Vec::new();
    qosflow::driver::report(&scenario, &flows, &mut out)?;
    let text = String::from_utf8(out)?;
    assert!(text.starts_with("Flow 1 (UDP 192.168.1.2/49153 --> 192.168.1.1/1006)\n"));
    assert!(text.contains("  Throughput:\t1.176 Mb/s\n  Mean delay:\t0.050 ms\n  Mean jitter:\t0.001 ms\n"));
    Ok(())
}

#[test]
fn order_does_not_matter() -> anyhow::Result<()> {
    let scenario = Scenario::default();
    let mut flows = flows();
    let reference = qosflow::analyze(&scenario, &monitor(&flows))?;

    for shift in 1..flows.len() {
        flows.rotate_left(1);
        let mut permuted = flows.clone();
        if shift % 2 == 0 {
            permuted.reverse();
        }
        let summary = qosflow::analyze(&scenario, &monitor(&permuted))?;
        assert_eq!(summary.total, reference.total);
        assert_eq!(summary.total_metrics, reference.total_metrics);
        for tid in Tid::all() {
            assert_eq!(summary.tid(tid), reference.tid(tid));
        }
        for (a, b) in summary.classes.iter().zip(reference.classes.iter()) {
            assert_eq!(a.category, b.category);
            assert_eq!(a.aggregate, b.aggregate);
            assert_eq!(a.metrics, b.metrics);
        }
    }
    Ok(())
}

#[test]
fn flows_land_in_their_class() -> anyhow::Result<()> {
    let summary = qosflow::analyze(&Scenario::default(), &monitor(&flows()))?;
    let nr_flows = |cat| {
        summary
            .class(cat)
            .map(|c| c.aggregate.nr_flows)
            .unwrap_or_default()
    };
    assert_eq!(nr_flows(AccessCategory::Voice), 2);
    assert_eq!(nr_flows(AccessCategory::Video), 1);
    assert_eq!(nr_flows(AccessCategory::BestEffort), 1);
    assert_eq!(nr_flows(AccessCategory::Background), 1);

    // Port 1500 only shows up in the total
    assert_eq!(summary.nr_unclassified(), 1);
    assert_eq!(summary.total.nr_flows, 6);
    let classified = Tid::all()
        .map(|tid| summary.tid(tid).rx_packets)
        .sum::<u64>();
    assert_eq!(summary.total.rx_packets, classified + 300);
    Ok(())
}

#[test]
fn total_is_sum_of_classes() -> anyhow::Result<()> {
    let flows = flows()
        .into_iter()
        .filter(|(_, t, _)| t.dst_port != 1500)
        .collect::<Vec<_>>();
    let summary = qosflow::analyze(&Scenario::default(), &monitor(&flows))?;
    let mut sum = Aggregate::default();
    for class in &summary.classes {
        sum.merge(&class.aggregate);
    }
    assert_eq!(sum, summary.total);
    Ok(())
}

#[test]
fn class_guards() -> anyhow::Result<()> {
    let summary = qosflow::analyze(&Scenario::default(), &monitor(&flows()))?;

    let be = summary
        .class(AccessCategory::BestEffort)
        .expect("best effort is reported");
    assert_eq!(be.metrics.throughput_mbps, 0.0);
    assert_eq!(be.metrics.mean_delay_ms, None);
    assert_eq!(be.metrics.mean_jitter_ms, None);

    let bk = summary
        .class(AccessCategory::Background)
        .expect("background is reported");
    assert!(bk.metrics.mean_delay_ms.is_some());
    assert_eq!(bk.metrics.mean_jitter_ms, None);
    Ok(())
}

#[test]
fn disabled_classes_are_still_reported() -> anyhow::Result<()> {
    let scenario = Scenario::builder().vo(false).vi(false).build();
    let summary = qosflow::analyze(&scenario, &monitor(&flows()))?;
    let reported = summary
        .classes
        .iter()
        .map(|c| c.category.tid().into_u8())
        .collect::<Vec<_>>();
    assert_eq!(reported, vec![0, 1, 5, 6]);
    assert_eq!(scenario.classes().enabled().count(), 2);
    Ok(())
}

#[test]
fn icmp_flow_is_fatal() {
    let mut flows = flows();
    flows.push((FlowId::new(9), tuple(Protocol::from(1), 5, 1000), record(5, 0)));
    let res = qosflow::analyze(&Scenario::default(), &monitor(&flows));
    assert!(matches!(
        res,
        Err(Error::UnsupportedProtocol { flow, protocol: 1 }) if flow == FlowId::new(9)
    ));

    let mut out = Vec::new();
    let res = qosflow::driver::report(&Scenario::default(), &monitor(&flows), &mut out);
    assert!(res.is_err());
    assert!(out.is_empty());
}

#[test]
fn aggregator_rejects_unknown_flow() {
    struct Orphans;

    impl qosflow::FlowRecordCollector for Orphans {
        fn flow_records(&self) -> Vec<(FlowId, FlowRecord)> {
            vec![(FlowId::new(42), FlowRecord::default())]
        }

        fn classify(&self, _: FlowId) -> Option<FiveTuple> {
            None
        }
    }

    let mut agg = Aggregator::new(Secs::new(1).into_us(), ClassTable::default());
    let res = agg.collect(&Orphans);
    assert!(matches!(res, Err(Error::UnknownFlow(id)) if id == FlowId::new(42)));
}
