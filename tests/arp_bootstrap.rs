use std::{net::Ipv4Addr, rc::Rc};

use qosflow::{
    arp,
    topology::{IfaceId, Interface, Ipv4Stack, MacAddr, Node, NodeId, Topology},
    Error, Scenario,
};

// Every node exposes one wireless address next to loopback; the cache must hold exactly those and
// every interface must end up pointing at the same cache.
#[test]
fn bootstrap_resolves_every_node() -> anyhow::Result<()> {
    let nr_nodes = 21;
    let mut topology = Topology::bss(nr_nodes, Ipv4Addr::new(192, 168, 1, 0))?;
    let cache = arp::populate(&mut topology)?;

    assert_eq!(cache.len(), nr_nodes);
    assert!(!cache.contains(&Ipv4Addr::LOCALHOST));
    assert!(cache.iter().all(|(addr, _)| !addr.is_loopback()));
    for node in topology.nodes() {
        let stack = node.ipv4().expect("bss nodes have a stack");
        let addr = stack.primary_addr().expect("bss nodes have an address");
        let device = stack.interfaces()[1].device();
        assert_eq!(cache.lookup(addr), Some(device));
        for iface in stack.interfaces() {
            let attached = iface.arp_cache().expect("cache attached");
            assert!(Rc::ptr_eq(attached, &cache));
        }
    }
    Ok(())
}

#[test]
fn missing_stack_aborts_before_attaching() {
    let mut topology = Topology::default();
    let mut stack = Ipv4Stack::with_loopback();
    stack.add_interface(
        Interface::builder()
            .id(IfaceId::new(1))
            .device(MacAddr::nth(1))
            .addrs(vec![Ipv4Addr::new(10, 1, 1, 1)])
            .build(),
    );
    let mut ap = Node::new(NodeId::new(0));
    ap.install_ipv4(stack);
    topology.add_node(ap);
    topology.add_node(Node::new(NodeId::new(1)));

    let res = arp::populate(&mut topology);
    assert!(matches!(res, Err(Error::MissingIpStack { node }) if node == NodeId::new(1)));
    let ap = &topology.nodes()[0];
    let ifaces = ap.ipv4().expect("stack installed").interfaces();
    assert!(ifaces.iter().all(|i| i.arp_cache().is_none()));
}

#[test]
fn setup_attaches_and_plans() -> anyhow::Result<()> {
    let scenario = Scenario::builder().nr_stations(2).build();
    let mut topology = Topology::bss(scenario.nr_nodes(), scenario.network)?;
    let setup = qosflow::setup(&scenario, &mut topology)?;

    assert_eq!(setup.arp.len(), 4);
    // Four classes from three stations
    assert_eq!(setup.traffic.sources.len(), 12);
    assert_eq!(setup.traffic.sinks.len(), 4);
    // One handle per interface plus the one held by `setup`
    assert_eq!(Rc::strong_count(&setup.arp), 4 * 2 + 1);
    Ok(())
}
