//! Reaction to links going down and nodes stopping.

mod common;

use common::{assert_converged, secs};
use pathvec_core::types::NodeId;
use pathvec_node::NodeConfig;
use pathvec_node::logging;
use pathvec_node::sim::{LinkId, SimNetwork};

fn network(ids: &[u32], links: &[(u32, u32)], scope: &str) -> (SimNetwork, Vec<LinkId>) {
    let mut net = SimNetwork::new();
    for &id in ids {
        let mut config = NodeConfig::for_node(id);
        config.node.seed = Some(u64::from(id) * 7 + 1);
        config.node.expiry_scope = scope.to_string();
        net.add_node(&config).unwrap();
    }
    let links = links
        .iter()
        .map(|&(a, b)| net.connect(NodeId(a), NodeId(b)).unwrap())
        .collect();
    (net, links)
}

#[test]
fn route_scope_forgets_unreachable_destination() {
    logging::init_for_tests();
    let (mut net, links) = network(&[1, 2, 3], &[(1, 2), (2, 3)], "route");
    net.disable_link_at(links[1], secs(200)).unwrap();
    net.start_all();

    net.run_until(secs(199));
    assert_eq!(net.node_mut(NodeId(1)).unwrap().routes().hops_to(NodeId(3)), Some(2));

    net.run_until(secs(450));
    let n1 = net.node_mut(NodeId(1)).unwrap();
    assert!(!n1.routes().contains(NodeId(3)));
    assert_eq!(n1.next_hop(NodeId(2)), Some(NodeId(2)));
    let n3 = net.node_mut(NodeId(3)).unwrap();
    assert!(n3.routes().is_empty());
    assert_converged(&mut net);
}

#[test]
fn neighbor_scope_holds_routes_of_live_neighbors() {
    logging::init_for_tests();
    let (mut net, links) = network(&[1, 2, 3], &[(1, 2), (2, 3)], "neighbor");
    net.disable_link_at(links[1], secs(200)).unwrap();
    net.start_all();
    net.run_until(secs(450));

    // node 2 stopped hearing node 3 and evicted it whole
    let n2 = net.node_mut(NodeId(2)).unwrap();
    assert!(!n2.routes().contains(NodeId(3)));
    assert!(n2.store().neighbor(NodeId(3)).is_none());

    // node 1 still hears node 2, which keeps its old advertisement for 3 alive
    let n1 = net.node_mut(NodeId(1)).unwrap();
    assert_eq!(n1.routes().hops_to(NodeId(3)), Some(2));
}

#[test]
fn ring_reroutes_around_cut_link() {
    logging::init_for_tests();
    let (mut net, links) = network(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (4, 1)], "route");
    net.disable_link_at(links[0], secs(200)).unwrap();
    net.start_all();

    net.run_until(secs(199));
    assert_converged(&mut net);
    assert_eq!(net.node_mut(NodeId(1)).unwrap().routes().hops_to(NodeId(2)), Some(1));

    net.run_until(secs(900));
    assert_converged(&mut net);
    let n1 = net.node_mut(NodeId(1)).unwrap();
    assert_eq!(
        n1.routes().get(NodeId(2)).map(|p| p.as_slice().to_vec()),
        Some(vec![NodeId(4), NodeId(3), NodeId(2)])
    );
}

#[test]
fn stopped_node_disappears_from_tables() {
    logging::init_for_tests();
    let (mut net, _) = network(&[1, 2, 3], &[(1, 2), (2, 3)], "neighbor");
    net.stop_node_at(NodeId(3), secs(200)).unwrap();
    net.start_all();
    net.run_until(secs(450));

    assert!(!net.node(NodeId(3)).unwrap().is_running());
    let n2 = net.node_mut(NodeId(2)).unwrap();
    assert!(!n2.routes().contains(NodeId(3)));
    assert_eq!(n2.routes().hops_to(NodeId(1)), Some(1));
}

#[test]
fn random_topology_survives_extra_links_going_down() {
    logging::init_for_tests();
    let base = {
        let mut c = NodeConfig::default();
        c.node.expiry_scope = "route".to_string();
        c
    };
    let (mut net, extra) = SimNetwork::random(1, 10, 15, &base).unwrap();
    for link in extra {
        net.disable_link_at(link, secs(300)).unwrap();
    }
    net.start_all();

    net.run_until(secs(299));
    assert_converged(&mut net);

    net.run_until(secs(1500));
    assert_converged(&mut net);

    net.stop_all_at(secs(1500));
    net.run_until(secs(1500));
    assert!(net.node_ids().collect::<Vec<_>>().iter().all(|&id| !net.node(id).unwrap().is_running()));
}
