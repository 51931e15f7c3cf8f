#![allow(dead_code)]

use pathvec_core::types::{NodeId, Timestamp};
use pathvec_node::sim::SimNetwork;

pub fn secs(s: u64) -> Timestamp {
    Timestamp::from_secs(s)
}

/// Assert that every node's table matches the hop distances of the live
/// topology and that every route is a loop-free walk along live links.
pub fn assert_converged(net: &mut SimNetwork) {
    let ids: Vec<NodeId> = net.node_ids().collect();
    for &me in &ids {
        let expected = net.hop_distances(me);
        let node = net.node_mut(me).expect("node exists");
        let routes = node.routes().clone();

        let got: Vec<(NodeId, usize)> = routes.iter().map(|(d, p)| (d, p.hops())).collect();
        let want: Vec<(NodeId, usize)> = expected.into_iter().collect();
        assert_eq!(got, want, "node {me} routes {routes:?}");

        for (dest, path) in routes.iter() {
            assert!(!path.contains(me), "node {me} route to {dest} loops: {path}");
            assert_eq!(path.as_slice().last(), Some(&dest));
            let mut at = me;
            for &hop in path.iter() {
                let link = net
                    .link_between_nodes(at, hop)
                    .unwrap_or_else(|| panic!("node {me} route {path} uses missing link {at}-{hop}"));
                assert!(net.link(link).unwrap().up, "route {path} uses dead link {at}-{hop}");
                at = hop;
            }
        }
    }
}

/// Follow next hops from `from` and return the nodes visited on the way to
/// `to`, or `None` if the chain breaks or cycles.
pub fn forward(net: &mut SimNetwork, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    let limit = net.node_ids().count();
    let mut visited = vec![from];
    let mut at = from;
    while at != to {
        if visited.len() > limit {
            return None;
        }
        at = net.node_mut(at)?.next_hop(to)?;
        visited.push(at);
    }
    Some(visited)
}
