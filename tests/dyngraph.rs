use seqgraph::{
    dyngraph::DynGraph,
    error::{ErrorKind, GraphError},
    handle::{Direction, Edge, Handle, NodeId},
    handlegraph::*,
    mutablehandlegraph::*,
    pathhandlegraph::*,
    util::{dna, validate::validate},
};

use bstr::B;

fn collect_right(graph: &DynGraph, h: Handle) -> Vec<Handle> {
    let mut res = Vec::new();
    graph.follow_edges(h, Direction::Right, visit_all(|n: Handle| res.push(n)));
    res
}

fn collect_left(graph: &DynGraph, h: Handle) -> Vec<Handle> {
    let mut res = Vec::new();
    graph.follow_edges(h, Direction::Left, visit_all(|n: Handle| res.push(n)));
    res
}

fn path_handles(graph: &DynGraph, path: PathId) -> Vec<Handle> {
    let mut res = Vec::new();
    graph
        .for_each_occurrence_in_path(
            path,
            visit_all(|occ: OccurrenceHandle| res.push(graph.get_occurrence(occ))),
        )
        .unwrap();
    res
}

fn path_sequence(graph: &DynGraph, path: PathId) -> Vec<u8> {
    path_handles(graph, path)
        .into_iter()
        .flat_map(|h| graph.get_sequence(h))
        .collect()
}

#[test]
fn two_node_path() {
    let mut graph = DynGraph::new();
    let h1 = graph.create_handle_with_id(B("ACGT"), NodeId(1)).unwrap();
    let h2 = graph.create_handle_with_id(B("TTT"), NodeId(2)).unwrap();
    graph.create_edge(h1, h2).unwrap();

    let path = graph.create_path_handle(b"x").unwrap();
    graph.append_occurrence(path, h1).unwrap();
    graph.append_occurrence(path, h2).unwrap();

    assert_eq!(graph.get_degree(h1, Direction::Right), 1);
    assert_eq!(collect_left(&graph, h2), vec![h1]);
    assert_eq!(graph.get_occurrence_count(path).unwrap(), 2);
    assert_eq!(path_handles(&graph, path), vec![h1, h2]);

    assert_eq!(graph.get_sequence(h1.flip()), dna::rev_comp(b"ACGT"));
    assert_eq!(graph.get_sequence(h2.flip()), b"AAA");
    validate(&graph).unwrap();
}

#[test]
fn ids_and_handles_agree() {
    let mut graph = DynGraph::new();
    let ids = [3u64, 17, 4, 1000, 5];
    for &id in ids.iter() {
        graph.create_handle_with_id(B("GATTACA"), NodeId(id)).unwrap();
    }

    for &id in ids.iter() {
        let h = graph.get_handle(NodeId(id), false).unwrap();
        assert_eq!(graph.get_id(h), NodeId(id));
        assert_eq!(graph.get_id(h.flip()), NodeId(id));
        assert!(graph.has_node(NodeId(id)));
    }
    assert!(!graph.has_node(NodeId(6)));
    assert_eq!(graph.min_node_id(), NodeId(3));
    assert_eq!(graph.max_node_id(), NodeId(1000));

    let err = graph.get_handle(NodeId(6), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = graph
        .create_handle_with_id(B("A"), NodeId(17))
        .unwrap_err();
    assert!(matches!(err, GraphError::NodeExists(NodeId(17))));

    let h17 = graph.get_handle(NodeId(17), false).unwrap();
    graph.destroy_handle(h17).unwrap();
    assert!(!graph.has_node(NodeId(17)));
    assert_eq!(graph.node_size(), 4);
    for &id in [3u64, 4, 1000, 5].iter() {
        let h = graph.get_handle(NodeId(id), false).unwrap();
        assert_eq!(graph.get_id(h), NodeId(id));
        assert_eq!(graph.get_sequence(h), b"GATTACA");
    }

    let h1000 = graph.get_handle(NodeId(1000), false).unwrap();
    graph.destroy_handle(h1000).unwrap();
    assert_eq!(graph.max_node_id(), NodeId(5));
    validate(&graph).unwrap();
}

#[test]
fn sequences_flip_to_reverse_complements() {
    let mut graph = DynGraph::new();
    let seqs = [B("A"), B("GATTACA"), B("ccgtN"), B("TTTTGGGGCCCCAAAA")];
    for seq in seqs.iter() {
        let h = graph.create_handle(seq).unwrap();
        let fwd = graph.get_sequence(h);
        let rev = graph.get_sequence(h.flip());
        assert_eq!(fwd, seq.to_vec());
        assert_eq!(rev, dna::rev_comp(&fwd));
        assert_eq!(graph.get_length(h), graph.get_length(h.flip()));
    }
}

#[test]
fn edges_are_seen_from_both_ends() {
    let mut graph = DynGraph::new();
    let a = graph.create_handle(B("AAA")).unwrap();
    let b = graph.create_handle(B("CCC")).unwrap();
    let c = graph.create_handle(B("GGG")).unwrap();

    graph.create_edge(a, b.flip()).unwrap();
    graph.create_edge(b, c).unwrap();

    assert!(graph.has_edge(a, b.flip()));
    assert!(graph.has_edge(b, a.flip()));
    assert_eq!(collect_right(&graph, a), vec![b.flip()]);
    assert_eq!(collect_right(&graph, b), vec![a.flip(), c]);
    assert_eq!(collect_left(&graph, b.flip()), vec![a]);
    assert_eq!(collect_left(&graph, c), vec![b]);

    graph.destroy_edge(b, a.flip()).unwrap();
    assert!(!graph.has_edge(a, b.flip()));
    assert!(collect_right(&graph, a).is_empty());
    assert!(graph.has_edge(b, c));
    assert_eq!(graph.edge_count(), 1);

    let mut edges = Vec::new();
    graph.for_each_edge(visit_all(|e: Edge| edges.push(e)));
    assert_eq!(edges, vec![Edge::edge_handle(b, c)]);
    validate(&graph).unwrap();
}

#[test]
fn stopping_iteration() {
    let mut graph = DynGraph::new();
    for _ in 0..10 {
        graph.create_handle(B("ACGT")).unwrap();
    }

    let mut seen = 0;
    let finished = graph.for_each_handle_mut(|_, _| {
        seen += 1;
        if seen == 4 {
            Visit::Stop
        } else {
            Visit::Continue
        }
    });
    assert!(!finished);
    assert_eq!(seen, 4);

    // the visited node may be destroyed mid-iteration
    graph.for_each_handle_mut(|g, h| {
        if g.get_id(h).0 % 3 == 0 {
            g.destroy_handle(h).unwrap();
        }
        Visit::Continue
    });
    assert_eq!(graph.node_size(), 7);
    assert!(graph.for_each_handle(
        true,
        visit_all_sync(|h: Handle| assert!(!h.is_reverse()))
    ));
    validate(&graph).unwrap();
}

#[test]
fn path_walks_match_counts() {
    let mut graph = DynGraph::new();
    let handles = (0..6)
        .map(|_| graph.create_handle(B("ACG")).unwrap())
        .collect::<Vec<_>>();
    for pair in handles.windows(2) {
        graph.create_edge(pair[0], pair[1]).unwrap();
    }

    let path = graph.create_path_handle(b"walk").unwrap();
    for &h in handles.iter().chain(handles[2..4].iter()) {
        graph.append_occurrence(path, h).unwrap();
    }

    let count = graph.get_occurrence_count(path).unwrap();
    assert_eq!(count, 8);

    let mut occ = graph.get_first_occurrence(path).unwrap();
    for ordinal in 0..count - 1 {
        assert_eq!(graph.get_ordinal_rank_of_occurrence(occ), ordinal);
        assert_eq!(graph.get_path_handle_of_occurrence(occ), path);
        occ = graph.get_next_occurrence(occ).unwrap();
    }
    assert_eq!(occ, graph.get_last_occurrence(path).unwrap());
    assert!(!graph.has_next_occurrence(occ));
    assert_eq!(graph.get_ordinal_rank_of_occurrence(occ), count - 1);

    assert_eq!(graph.occurrences_of_handle(handles[2], false).len(), 2);
    assert_eq!(graph.occurrences_of_handle(handles[2].flip(), true).len(), 0);
    validate(&graph).unwrap();
}

#[test]
fn dividing_keeps_path_sequences() {
    let mut graph = DynGraph::new();
    let h1 = graph.create_handle(B("GATTACA")).unwrap();
    let h2 = graph.create_handle(B("CCGGTTAA")).unwrap();
    let h3 = graph.create_handle(B("T")).unwrap();
    graph.create_edge(h1, h2.flip()).unwrap();
    graph.create_edge(h2.flip(), h3).unwrap();

    let fwd = graph.create_path_handle(b"fwd").unwrap();
    let rev = graph.create_path_handle(b"rev").unwrap();
    for &h in [h1, h2.flip(), h3].iter() {
        graph.append_occurrence(fwd, h).unwrap();
    }
    for &h in [h3.flip(), h2, h1.flip()].iter() {
        graph.append_occurrence(rev, h).unwrap();
    }
    let fwd_seq = path_sequence(&graph, fwd);
    let rev_seq = path_sequence(&graph, rev);

    let before = graph.get_sequence(h2.flip());
    let pieces = graph.divide_handle(h2.flip(), &[1, 4, 6]).unwrap();
    let joined = pieces
        .iter()
        .flat_map(|&h| graph.get_sequence(h))
        .collect::<Vec<_>>();
    assert_eq!(joined, before);
    assert_eq!(graph.get_sequence(pieces[0]), b"T");

    assert_eq!(path_sequence(&graph, fwd), fwd_seq);
    assert_eq!(path_sequence(&graph, rev), rev_seq);
    assert_eq!(graph.get_occurrence_count(fwd).unwrap(), 6);
    assert_eq!(collect_right(&graph, h1), vec![pieces[0]]);
    assert_eq!(collect_left(&graph, h3), vec![pieces[3]]);

    let (left, right) = graph.split_handle(h1, 3).unwrap();
    assert_eq!(graph.get_sequence(left), b"GAT");
    assert_eq!(graph.get_sequence(right), b"TACA");
    assert_eq!(path_sequence(&graph, fwd), fwd_seq);
    assert_eq!(path_sequence(&graph, rev), rev_seq);

    let err = graph.divide_handle(h3, &[1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    validate(&graph).unwrap();
}

#[test]
fn serialized_graph_answers_the_same() {
    let mut graph = DynGraph::new();
    let handles = [B("ACGT"), B("GG"), B("TTAC"), B("C")]
        .iter()
        .map(|seq| graph.create_handle(seq).unwrap())
        .collect::<Vec<_>>();
    graph.create_edge(handles[0], handles[1]).unwrap();
    graph.create_edge(handles[1], handles[2].flip()).unwrap();
    graph.create_edge(handles[2].flip(), handles[3]).unwrap();
    graph.create_edge(handles[3], handles[3].flip()).unwrap();

    let path = graph.create_path_handle(b"p").unwrap();
    for &h in [handles[0], handles[1], handles[2].flip()].iter() {
        graph.append_occurrence(path, h).unwrap();
    }
    let gone = graph.create_path_handle(b"gone").unwrap();
    graph.destroy_path(gone).unwrap();
    graph.destroy_handle(handles[1]).unwrap();

    let mut bytes = Vec::new();
    graph.serialize(&mut bytes).unwrap();
    let mut loaded = DynGraph::from_reader(bytes.as_slice()).unwrap();

    assert_eq!(loaded.node_size(), graph.node_size());
    assert_eq!(loaded.edge_count(), graph.edge_count());
    assert_eq!(loaded.total_length(), graph.total_length());
    assert_eq!(loaded.min_node_id(), graph.min_node_id());
    assert_eq!(loaded.max_node_id(), graph.max_node_id());
    assert_eq!(loaded.hidden_count(), 1);

    for h in graph.handles() {
        let id = graph.get_id(h);
        let lh = loaded.get_handle(id, false).unwrap();
        assert_eq!(loaded.get_sequence(lh), graph.get_sequence(h));
        assert_eq!(
            collect_right(&loaded, lh)
                .into_iter()
                .map(|n| (loaded.get_id(n), n.is_reverse()))
                .collect::<Vec<_>>(),
            collect_right(&graph, h)
                .into_iter()
                .map(|n| (graph.get_id(n), n.is_reverse()))
                .collect::<Vec<_>>()
        );
    }
    assert_eq!(path_sequence(&loaded, path), path_sequence(&graph, path));
    assert_eq!(loaded.get_path_name(path).unwrap(), b"p");

    // path IDs continue where they left off
    let next = loaded.create_path_handle(b"next").unwrap();
    assert_eq!(next.as_integer(), 2);
    validate(&loaded).unwrap();
}
