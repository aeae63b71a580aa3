use crate::{
    dyngraph::DynGraph,
    error::{GraphError, Result},
    handle::{Direction, Edge},
    handlegraph::*,
    pathhandlegraph::*,
};

use fnv::FnvHashSet;

#[allow(unused_imports)]
use log::{debug, error, info, trace};

/// Check that a graph's indices agree with each other, logging every
/// inconsistency found. Returns an `Invariant` error describing the
/// first one.
pub fn validate(graph: &DynGraph) -> Result<()> {
    info!("validating graph");

    let mut failures: Vec<String> = Vec::new();
    let mut fail = |msg: String| {
        info!("{}", msg);
        failures.push(msg);
    };

    // stored references resolve, hidden nodes and their steps included
    if let Err(msg) = graph
        .check_structure()
        .and_then(|()| graph.check_references())
    {
        fail(msg);
    }

    // nodes are visited once each
    let handles_all = graph.handles().collect::<Vec<_>>();
    let handles_set = handles_all.iter().copied().collect::<FnvHashSet<_>>();
    if handles_all.len() != handles_set.len() {
        fail(format!(
            "{} handles visited, {} distinct",
            handles_all.len(),
            handles_set.len()
        ));
    }
    if handles_set.len() != graph.node_size() {
        fail(format!(
            "{} handles visited, but the node count is {}",
            handles_set.len(),
            graph.node_size()
        ));
    }

    // all neighbors exist, and every edge is stored on both ends
    for &middle in handles_all.iter() {
        let id = graph.get_id(middle);
        for &dir in [Direction::Left, Direction::Right].iter() {
            for other in graph.neighbors(middle, dir) {
                if !graph.has_node(graph.get_id(other)) {
                    fail(format!(
                        "node {}'s {:?} neighbor {} does not exist",
                        id,
                        dir,
                        graph.get_id(other)
                    ));
                    continue;
                }
                let (left, right) = match dir {
                    Direction::Right => (middle, other),
                    Direction::Left => (other, middle),
                };
                if !graph.edge_is_symmetric(left, right) {
                    fail(format!(
                        "edge {:?} -> {:?} is only stored on one side",
                        left, right
                    ));
                }
            }
        }
    }

    let mut edges_seen = FnvHashSet::default();
    let mut edges_count = 0;
    graph.for_each_edge(|Edge(left, right)| {
        edges_count += 1;
        edges_seen.insert((left, right));
        Visit::Continue
    });
    if edges_count != edges_seen.len() {
        fail(format!(
            "edge iteration visited {} edges, {} distinct",
            edges_count,
            edges_seen.len()
        ));
    }
    if edges_count != graph.edge_count() {
        fail(format!(
            "edge iteration visited {} edges, but the edge count is {}",
            edges_count,
            graph.edge_count()
        ));
    }

    // path walks agree with the stored lengths and ends
    for path in graph.path_ids() {
        let length = match graph.get_occurrence_count(path) {
            Ok(length) => length,
            Err(err) => {
                fail(format!("path {}: {}", path, err));
                continue;
            }
        };

        let mut walked = 0;
        let mut prev: Option<OccurrenceHandle> = None;
        let mut current = graph.get_first_occurrence(path).ok();
        while let Some(occ) = current {
            walked += 1;
            if walked > length {
                fail(format!("path {} is longer than {}", path, length));
                break;
            }
            if graph.get_path_handle_of_occurrence(occ) != path {
                fail(format!("path {} walks into another path", path));
                break;
            }
            if graph.get_previous_occurrence(occ) != prev {
                fail(format!(
                    "path {} step {} does not link back to its predecessor",
                    path, walked
                ));
            }
            prev = Some(occ);
            current = graph.get_next_occurrence(occ);
        }

        if walked != length {
            fail(format!(
                "path {} has length {} but {} steps were walked",
                path, length, walked
            ));
        }
        if prev != graph.get_last_occurrence(path).ok() {
            fail(format!("path {} does not end at its last step", path));
        }
    }

    if failures.is_empty() {
        info!("graph is valid");
        Ok(())
    } else {
        error!("graph failed validation with {} errors", failures.len());
        Err(GraphError::Invariant(failures.swap_remove(0)))
    }
}
