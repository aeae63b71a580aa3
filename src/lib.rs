/*!
A compact, mutable sequence graph in the style of the
[`libhandlegraph`](https://github.com/vgteam/libhandlegraph)
interface.

# Overview

[`DynGraph`](dyngraph::DynGraph) stores a bidirected sequence graph,
with paths embedded in it, in a handful of succinct dynamic indices.
Every index keeps one record per node in the same order, so a node's
sequence, its adjacency on both sides, and the path steps that
traverse it can all be found from its position.

The graph supports creating and removing nodes, edges, and paths,
as well as splitting nodes, flipping their orientation, and
reordering them, all while keeping the indices consistent.

# The interface

The graph is accessed through three groups of traits:

* [`handlegraph`] is for immutable access to the nodes and edges of a graph
* [`mutablehandlegraph`] is for mutable access to nodes and edges
* [`pathhandlegraph`] is for both immutable and mutable access to the paths embedded in a graph

# `Handle`s and `NodeId`s

The core types, used all over the various traits, are defined in [`handle`]:

* [`NodeId`](handle::NodeId) is a newtype used as a node identifier
* [`Handle`](handle::Handle) represents a specific orientation of a node
* [`Edge`](handle::Edge) is a newtype for edges in a specific order

# Misc.

* [`packed`] is where the packed vector, bit vector, and symbol
  sequence types used by the indices are implemented
* [`util::validate`] checks that a graph's indices agree
* [`error`] defines the error type shared by every fallible operation

*/

pub mod error;
pub mod handle;

pub mod handlegraph;
pub mod mutablehandlegraph;
pub mod pathhandlegraph;

pub mod dyngraph;

pub mod packed;
pub mod util;

pub use self::{
    dyngraph::DynGraph,
    error::{ErrorKind, GraphError, Result},
};
