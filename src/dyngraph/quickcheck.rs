use quickcheck::{quickcheck, Arbitrary, Gen};

use crate::{
    handle::{Direction, Handle},
    handlegraph::*,
    mutablehandlegraph::MutableHandleGraph,
    pathhandlegraph::*,
    util::validate::validate,
};

use super::DynGraph;

fn arbitrary_seq<G: Gen>(g: &mut G) -> Vec<u8> {
    let len = 1 + usize::arbitrary(g) % 8;
    (0..len)
        .map(|_| b"ACGT"[usize::arbitrary(g) % 4])
        .collect()
}

/// A graph operation with its operands given as indices into whatever
/// nodes, paths, and occurrences exist when it is applied.
#[derive(Debug, Clone)]
enum GraphOp {
    CreateNode(Vec<u8>),
    CreateHidden(Vec<u8>),
    DestroyNode(usize),
    CreateEdge(usize, bool, usize, bool),
    DestroyEdge(usize, bool, usize, bool),
    CreatePath,
    DestroyPath(usize),
    Append(usize, usize, bool),
    Prepend(usize, usize, bool),
    Insert(usize, usize, usize, bool),
    Set(usize, usize, usize, bool),
    RemoveStep(usize, usize),
    Divide(usize, bool, usize),
    Orient(usize),
    Swap(usize, usize),
}

impl Arbitrary for GraphOp {
    fn arbitrary<G: Gen>(g: &mut G) -> GraphOp {
        use GraphOp::*;
        let ix = |g: &mut G| usize::arbitrary(g);
        match usize::arbitrary(g) % 15 {
            0 => CreateNode(arbitrary_seq(g)),
            1 => CreateHidden(arbitrary_seq(g)),
            2 => DestroyNode(ix(g)),
            3 => CreateEdge(ix(g), bool::arbitrary(g), ix(g), bool::arbitrary(g)),
            4 => DestroyEdge(ix(g), bool::arbitrary(g), ix(g), bool::arbitrary(g)),
            5 => CreatePath,
            6 => DestroyPath(ix(g)),
            7 => Append(ix(g), ix(g), bool::arbitrary(g)),
            8 => Prepend(ix(g), ix(g), bool::arbitrary(g)),
            9 => Insert(ix(g), ix(g), ix(g), bool::arbitrary(g)),
            10 => Set(ix(g), ix(g), ix(g), bool::arbitrary(g)),
            11 => RemoveStep(ix(g), ix(g)),
            12 => Divide(ix(g), bool::arbitrary(g), ix(g)),
            13 => Orient(ix(g)),
            _ => Swap(ix(g), ix(g)),
        }
    }
}

fn pick<T: Copy>(items: &[T], ix: usize) -> Option<T> {
    if items.is_empty() {
        None
    } else {
        Some(items[ix % items.len()])
    }
}

fn oriented(h: Handle, rev: bool) -> Handle {
    if rev {
        h.flip()
    } else {
        h
    }
}

fn occurrences_in(graph: &DynGraph, path: PathId) -> Vec<OccurrenceHandle> {
    let mut occs = Vec::new();
    graph
        .for_each_occurrence_in_path(path, |occ| {
            occs.push(occ);
            Visit::Continue
        })
        .unwrap();
    occs
}

impl GraphOp {
    fn apply(&self, graph: &mut DynGraph, names: &mut usize) {
        use GraphOp::*;
        let handles = graph.handles().collect::<Vec<_>>();
        let paths = graph.path_ids().collect::<Vec<_>>();

        match *self {
            CreateNode(ref seq) => {
                graph.create_handle(seq).unwrap();
            }
            CreateHidden(ref seq) => {
                graph.create_hidden_handle(seq).unwrap();
            }
            DestroyNode(a) => {
                if let Some(h) = pick(&handles, a) {
                    graph.destroy_handle(h).unwrap();
                }
            }
            CreateEdge(a, ra, b, rb) => {
                if let (Some(l), Some(r)) = (pick(&handles, a), pick(&handles, b)) {
                    graph.create_edge(oriented(l, ra), oriented(r, rb)).unwrap();
                }
            }
            DestroyEdge(a, ra, b, rb) => {
                if let (Some(l), Some(r)) = (pick(&handles, a), pick(&handles, b)) {
                    graph.destroy_edge(oriented(l, ra), oriented(r, rb)).unwrap();
                }
            }
            CreatePath => {
                *names += 1;
                let name = format!("path{}", names);
                graph.create_path_handle(name.as_bytes()).unwrap();
            }
            DestroyPath(p) => {
                if let Some(path) = pick(&paths, p) {
                    graph.destroy_path(path).unwrap();
                }
            }
            Append(p, a, rev) => {
                if let (Some(path), Some(h)) = (pick(&paths, p), pick(&handles, a)) {
                    graph.append_occurrence(path, oriented(h, rev)).unwrap();
                }
            }
            Prepend(p, a, rev) => {
                if let (Some(path), Some(h)) = (pick(&paths, p), pick(&handles, a)) {
                    graph.prepend_occurrence(path, oriented(h, rev)).unwrap();
                }
            }
            Insert(p, s, a, rev) => {
                if let (Some(path), Some(h)) = (pick(&paths, p), pick(&handles, a)) {
                    let occs = occurrences_in(graph, path);
                    let gap = s % (occs.len() + 1);
                    let before = match gap {
                        0 => PathStep::Before,
                        _ => PathStep::Step(occs[gap - 1]),
                    };
                    let after = match occs.get(gap) {
                        Some(&occ) => PathStep::Step(occ),
                        None => PathStep::After,
                    };
                    graph
                        .insert_occurrence(path, before, after, oriented(h, rev))
                        .unwrap();
                }
            }
            Set(p, s, a, rev) => {
                if let (Some(path), Some(h)) = (pick(&paths, p), pick(&handles, a)) {
                    let occs = occurrences_in(graph, path);
                    if let Some(occ) = pick(&occs, s) {
                        graph.set_occurrence(occ, oriented(h, rev)).unwrap();
                    }
                }
            }
            RemoveStep(p, s) => {
                if let Some(path) = pick(&paths, p) {
                    let occs = occurrences_in(graph, path);
                    if let Some(occ) = pick(&occs, s) {
                        graph.replace_occurrence(occ, &[]).unwrap();
                    }
                }
            }
            Divide(a, rev, offset) => {
                if let Some(h) = pick(&handles, a) {
                    let h = oriented(h, rev);
                    let len = graph.get_length(h);
                    if len > 1 {
                        let offset = 1 + offset % (len - 1);
                        graph.divide_handle(h, &[offset]).unwrap();
                    }
                }
            }
            Orient(a) => {
                if let Some(h) = pick(&handles, a) {
                    graph.apply_orientation(h.flip()).unwrap();
                }
            }
            Swap(a, b) => {
                if let (Some(x), Some(y)) = (pick(&handles, a), pick(&handles, b)) {
                    graph.swap_handles(x, y).unwrap();
                }
            }
        }
    }
}

fn path_sequences(graph: &DynGraph) -> Vec<Vec<u8>> {
    graph
        .path_ids()
        .map(|path| {
            let mut seq = Vec::new();
            graph
                .for_each_occurrence_in_path(path, |occ| {
                    seq.extend(graph.get_sequence(graph.get_occurrence(occ)));
                    Visit::Continue
                })
                .unwrap();
            seq
        })
        .collect()
}

type Oriented = (u64, bool);

/// Everything the graph answers about its nodes, edges, and paths, by
/// node ID so that two graphs can be compared.
#[derive(Debug, PartialEq)]
struct GraphSummary {
    counts: [usize; 5],
    nodes: Vec<(u64, Vec<u8>, Vec<Oriented>, Vec<Oriented>)>,
    paths: Vec<(PathId, Vec<u8>, Vec<Oriented>)>,
}

fn summarize(graph: &DynGraph) -> GraphSummary {
    let oriented_id = |h: Handle| (graph.get_id(h).0, h.is_reverse());

    let nodes = graph
        .handles()
        .map(|h| {
            let side = |dir| {
                graph
                    .neighbors(h, dir)
                    .into_iter()
                    .map(oriented_id)
                    .collect::<Vec<_>>()
            };
            (
                graph.get_id(h).0,
                graph.get_sequence(h),
                side(Direction::Left),
                side(Direction::Right),
            )
        })
        .collect();

    let paths = graph
        .path_ids()
        .map(|path| {
            let walk = occurrences_in(graph, path)
                .into_iter()
                .map(|occ| oriented_id(graph.get_occurrence(occ)))
                .collect();
            (path, graph.get_path_name(path).unwrap().to_vec(), walk)
        })
        .collect();

    GraphSummary {
        counts: [
            graph.node_size(),
            graph.edge_count(),
            graph.total_length(),
            graph.hidden_count(),
            graph.get_path_count(),
        ],
        nodes,
        paths,
    }
}

fn build(ops: &[GraphOp]) -> (DynGraph, usize) {
    let mut graph = DynGraph::new();
    let mut names = 0;
    for op in ops {
        op.apply(&mut graph, &mut names);
    }
    (graph, names)
}

quickcheck! {
    fn prop_ops_keep_graph_valid(ops: Vec<GraphOp>) -> bool {
        let (graph, _) = build(&ops);
        validate(&graph).is_ok()
    }

    fn prop_reshaping_keeps_path_sequences(ops: Vec<GraphOp>, shape: Vec<GraphOp>) -> bool {
        let (mut graph, mut names) = build(&ops);
        let before = path_sequences(&graph);
        let length = graph.total_length();

        for op in shape.iter() {
            match op {
                GraphOp::Divide(..) | GraphOp::Orient(_) | GraphOp::Swap(..) => {
                    op.apply(&mut graph, &mut names)
                }
                _ => (),
            }
        }

        path_sequences(&graph) == before
            && graph.total_length() == length
            && validate(&graph).is_ok()
    }

    fn prop_serialize_round_trip(ops: Vec<GraphOp>, more: Vec<GraphOp>) -> bool {
        let (mut graph, names) = build(&ops);

        let mut buffer = Vec::new();
        graph.serialize(&mut buffer).unwrap();
        let mut loaded = DynGraph::from_reader(buffer.as_slice()).unwrap();
        if summarize(&loaded) != summarize(&graph) {
            return false;
        }

        // the copy keeps behaving like the original
        let (mut names_graph, mut names_loaded) = (names, names);
        for op in more.iter() {
            op.apply(&mut graph, &mut names_graph);
            op.apply(&mut loaded, &mut names_loaded);
        }
        summarize(&loaded) == summarize(&graph) && validate(&loaded).is_ok()
    }
}
