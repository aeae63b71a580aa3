use std::io::{Read, Write};

#[allow(unused_imports)]
use log::{debug, info};

use crate::error::{GraphError, Result};

use super::graph::DynGraph;

/// Leading bytes of every serialized graph.
pub const MAGIC: [u8; 4] = *b"DYNG";

/// Version of the serialized layout. Graphs written with any other
/// version are rejected by `load`.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: u64 = 8;

impl DynGraph {
    /// Write the graph to `writer`, returning the number of bytes
    /// written.
    ///
    /// The header (magic and format version) is followed by the
    /// indices in a fixed order: identifier index, sequence store,
    /// edge index with its edge count, occurrence index, and path
    /// table with its path count and next path ID.
    pub fn serialize<W: Write>(&self, mut writer: W) -> Result<u64> {
        writer.write_all(&MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        let size = HEADER_LEN + bincode::serialized_size(self)?;
        info!(
            "serialized graph with {} nodes, {} edges, {} paths ({} bytes)",
            self.nodes.node_count(),
            self.edges.edge_count,
            self.paths.path_count(),
            size
        );
        Ok(size)
    }

    /// Read a graph written by `serialize`.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(GraphError::BadMagic);
        }

        let mut version = [0u8; 4];
        reader.read_exact(&mut version)?;
        let found = u32::from_le_bytes(version);
        if found != FORMAT_VERSION {
            return Err(GraphError::VersionMismatch {
                found,
                expected: FORMAT_VERSION,
            });
        }

        let graph: DynGraph = bincode::deserialize_from(&mut reader)?;
        graph
            .check_structure()
            .and_then(|()| graph.check_references())
            .map_err(GraphError::Corrupt)?;

        info!(
            "loaded graph with {} nodes, {} edges, {} paths",
            graph.nodes.node_count(),
            graph.edges.edge_count,
            graph.paths.path_count()
        );
        Ok(graph)
    }

    /// Replace the contents of this graph with a graph read from
    /// `reader`. On failure the graph is left unchanged.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<()> {
        *self = Self::from_reader(reader)?;
        Ok(())
    }
}
