//! Degree lists: line `i` holds the space separated neighbors of vertex `i`.

use super::{
    format::{assemble, Deficits, GraphReader, GraphSize},
    toker::MappedFileToker,
};
use crate::{
    assembly::build_csr,
    error::Result,
    graph::{Graph, GraphRepresentation},
    types::{Edge, SInt},
};
use itertools::Itertools;
use log::debug;
use std::{io::Write, path::Path};

pub(crate) fn write_body(out: &mut dyn Write, graph: &Graph) -> Result<bool> {
    let csr = build_csr(graph)?;
    for w in csr.xadj.windows(2) {
        writeln!(
            out,
            "{}",
            csr.adjncy[w[0] as usize..w[1] as usize].iter().join(" ")
        )?;
    }
    Ok(graph.num_local_vertices() > 0)
}

/// Start of the line of `vertex`, preceded by `edges_before` edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanPoint {
    vertex: SInt,
    edges_before: SInt,
    position: usize,
}

pub struct PlainEdgelistReader {
    toker: MappedFileToker,
    size: Option<GraphSize>,
    /// Where the previous scan stopped; later scans continue from here when
    /// they target a vertex or edge at or after it.
    resume: ScanPoint,
}

impl PlainEdgelistReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(MappedFileToker::open(path)?))
    }

    pub fn new(toker: MappedFileToker) -> Self {
        PlainEdgelistReader {
            toker,
            size: None,
            resume: ScanPoint::default(),
        }
    }

    /// Consumes one line, appending `(vertex, neighbor)` pairs to `edges` if
    /// given, and returns the degree.
    fn consume_line(&mut self, vertex: SInt, mut edges: Option<&mut Vec<Edge>>) -> Result<SInt> {
        let mut degree = 0;
        while !self.toker.at_line_end() {
            let neighbor = self.toker.consume_int()?;
            if let Some(edges) = edges.as_mut() {
                edges.push((vertex, neighbor));
            }
            degree += 1;
        }
        self.toker.consume_line_end()?;
        Ok(degree)
    }

    fn start_from(&mut self, usable: bool) -> ScanPoint {
        let point = if usable { self.resume } else { ScanPoint::default() };
        self.toker.seek(point.position);
        point
    }

    /// Positions the cursor at the line of `vertex`, or at the end of the
    /// file if there are fewer lines.
    fn advance_to(&mut self, vertex: SInt) -> Result<ScanPoint> {
        let mut point = self.start_from(self.resume.vertex <= vertex);
        while point.vertex < vertex && self.toker.valid_position() {
            point.edges_before += self.consume_line(point.vertex, None)?;
            point.vertex += 1;
            point.position = self.toker.position();
        }
        Ok(point)
    }
}

impl GraphReader for PlainEdgelistReader {
    fn read_size(&mut self) -> Result<GraphSize> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let end = self.advance_to(SInt::MAX)?;
        let size = GraphSize {
            n: end.vertex,
            m: end.edges_before,
        };
        debug!("scanned degree list: {}", size);
        self.resume = end;
        self.size = Some(size);
        Ok(size)
    }

    fn read(
        &mut self,
        from_vertex: SInt,
        to_vertex: SInt,
        to_edge: SInt,
        representation: GraphRepresentation,
    ) -> Result<Graph> {
        let start = self.advance_to(from_vertex)?;
        let mut point = start;
        let mut edges = vec![];
        while point.vertex < to_vertex && self.toker.valid_position() {
            let degree = self.consume_line(point.vertex, Some(&mut edges))?;
            point.edges_before += degree;
            point.vertex += 1;
            point.position = self.toker.position();
        }
        if point.edges_before > to_edge {
            let keep = to_edge.saturating_sub(start.edges_before) as usize;
            edges.truncate(keep);
        }
        self.resume = point;
        assemble((start.vertex, point.vertex), edges, representation)
    }

    fn find_node_by_edge(&mut self, edge: SInt) -> Result<SInt> {
        let mut point = self.start_from(self.resume.edges_before <= edge);
        while self.toker.valid_position() {
            let degree = self.consume_line(point.vertex, None)?;
            if point.edges_before + degree > edge {
                self.resume = point;
                return Ok(point.vertex);
            }
            point.edges_before += degree;
            point.vertex += 1;
            point.position = self.toker.position();
        }
        self.resume = point;
        Ok(point.vertex)
    }

    fn deficits(&self) -> Deficits {
        Deficits::UNKNOWN_SIZE
    }
}
