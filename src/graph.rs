//! The rank-local slice of a generated graph.

use crate::{
    comm::Communicator,
    error::Result,
    types::{Edge, SInt, SSInt},
};
use derive_more::Display;
use itertools::Either;

/// How a [`Graph`] stores its local adjacency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphRepresentation {
    /// `Graph::edges` holds the edges.
    EdgeList,
    /// `Graph::xadj` and `Graph::adjncy` hold the edges.
    Csr,
}

/// Per-vertex coordinates; at most one of the two vectors is populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub two: Vec<(f64, f64)>,
    pub three: Vec<(f64, f64, f64)>,
}

/// The vertices `[vertex_range.0, vertex_range.1)` owned by one rank together
/// with their outgoing edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub vertex_range: (SInt, SInt),
    pub representation: GraphRepresentation,
    pub edges: Vec<Edge>,
    pub xadj: Vec<SInt>,
    pub adjncy: Vec<SInt>,
    pub coordinates: Coordinates,
    pub vertex_weights: Vec<SSInt>,
    pub edge_weights: Vec<SSInt>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new((0, 0), vec![])
    }
}

impl Graph {
    /// An edge list graph without coordinates or weights.
    pub fn new(vertex_range: (SInt, SInt), edges: Vec<Edge>) -> Self {
        Graph {
            vertex_range,
            representation: GraphRepresentation::EdgeList,
            edges,
            xadj: vec![],
            adjncy: vec![],
            coordinates: Coordinates::default(),
            vertex_weights: vec![],
            edge_weights: vec![],
        }
    }

    pub fn from_csr(vertex_range: (SInt, SInt), xadj: Vec<SInt>, adjncy: Vec<SInt>) -> Self {
        Graph {
            representation: GraphRepresentation::Csr,
            xadj,
            adjncy,
            ..Self::new(vertex_range, vec![])
        }
    }

    pub fn num_local_vertices(&self) -> SInt {
        self.vertex_range.1 - self.vertex_range.0
    }

    pub fn num_local_edges(&self) -> SInt {
        match self.representation {
            GraphRepresentation::EdgeList => self.edges.len() as SInt,
            GraphRepresentation::Csr => self.adjncy.len() as SInt,
        }
    }

    pub fn contains_vertex(&self, vertex: SInt) -> bool {
        self.vertex_range.0 <= vertex && vertex < self.vertex_range.1
    }

    /// All local edges regardless of the representation.
    pub fn edge_iter(&self) -> impl Iterator<Item = Edge> + '_ {
        match self.representation {
            GraphRepresentation::EdgeList => Either::Left(self.edges.iter().copied()),
            GraphRepresentation::Csr => {
                let first = self.vertex_range.0;
                Either::Right(self.xadj.windows(2).enumerate().flat_map(move |(u, w)| {
                    self.adjncy[w[0] as usize..w[1] as usize]
                        .iter()
                        .map(move |&v| (first + u as SInt, v))
                }))
            }
        }
    }
}

/// Global properties of a distributed graph.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq)]
#[display(fmt = "{} {}", n, m)]
pub struct GraphInfo {
    pub n: SInt,
    pub m: SInt,
    pub has_vertex_weights: bool,
    pub has_edge_weights: bool,
}

impl GraphInfo {
    /// Sums the local counts of all ranks. Collective.
    pub fn reduce(graph: &Graph, comm: &dyn Communicator) -> Result<Self> {
        let n = comm.all_reduce_sum(graph.num_local_vertices())?;
        let m = comm.all_reduce_sum(graph.num_local_edges())?;
        let vertex_weights = comm.all_reduce_sum(!graph.vertex_weights.is_empty() as SInt)?;
        let edge_weights = comm.all_reduce_sum(!graph.edge_weights.is_empty() as SInt)?;
        Ok(GraphInfo {
            n,
            m,
            has_vertex_weights: vertex_weights > 0,
            has_edge_weights: edge_weights > 0,
        })
    }
}
