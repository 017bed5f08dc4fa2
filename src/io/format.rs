//! Writer pipeline and reader capabilities shared by all file formats.

use super::{config::OutputGraphConfig, coordinates, dot, edgelist, plain_edgelist};
use crate::{
    assembly::build_csr_from_edges,
    comm::Communicator,
    error::{domain_error, Error, Result},
    graph::{Graph, GraphInfo, GraphRepresentation},
    memory_manager::MmapRegion,
    types::{Edge, SInt, PEID},
};
use derive_more::Display;
use log::{debug, info};
use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    ops::{BitOr, Range},
    path::{Path, PathBuf},
};

/// Global vertex and edge count of a graph file.
#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq)]
#[display(fmt = "{} {}", n, m)]
pub struct GraphSize {
    pub n: SInt,
    pub m: SInt,
}

/// Limitations of a reader that callers may have to work around.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deficits(u8);

impl Deficits {
    pub const NONE: Deficits = Deficits(0);
    /// `read_size` scans the whole file.
    pub const UNKNOWN_SIZE: Deficits = Deficits(1);
    /// Records are not guaranteed to be grouped by ascending source, so
    /// `find_node_by_edge` only yields approximately balanced partitions.
    pub const UNORDERED_EDGES: Deficits = Deficits(2);
    /// `read` only accepts the full vertex range, so every rank has to read
    /// the whole file and keep its own window.
    pub const NOT_PARTITIONABLE: Deficits = Deficits(4);

    pub fn contains(self, other: Deficits) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Deficits {
    type Output = Deficits;

    fn bitor(self, rhs: Deficits) -> Deficits {
        Deficits(self.0 | rhs.0)
    }
}

/// A rank-local view of a graph file.
pub trait GraphReader {
    /// Global size without materializing edges.
    fn read_size(&mut self) -> Result<GraphSize>;

    /// The edges with a source in `[from_vertex, to_vertex)` among the first
    /// `to_edge` records of the file.
    fn read(
        &mut self,
        from_vertex: SInt,
        to_vertex: SInt,
        to_edge: SInt,
        representation: GraphRepresentation,
    ) -> Result<Graph>;

    /// The vertex whose adjacency contains global edge `edge`.
    fn find_node_by_edge(&mut self, edge: SInt) -> Result<SInt>;

    fn deficits(&self) -> Deficits;
}

/// Packs edges read for the vertex window into the requested representation.
pub(crate) fn assemble(
    vertex_range: (SInt, SInt),
    edges: Vec<Edge>,
    representation: GraphRepresentation,
) -> Result<Graph> {
    Ok(match representation {
        GraphRepresentation::EdgeList => Graph::new(vertex_range, edges),
        GraphRepresentation::Csr => {
            let csr = build_csr_from_edges(vertex_range, &edges)?;
            Graph::from_csr(vertex_range, csr.xadj, csr.adjncy)
        }
    })
}

/// The byte range of `count` records of `record_size` bytes preceded by
/// `prefix` records and a header of `header_size` bytes.
pub fn record_range(header_size: SInt, prefix: SInt, count: SInt, record_size: SInt) -> Range<SInt> {
    let start = header_size + prefix * record_size;
    start..start + count * record_size
}

/// The encodings a [`GraphWriter`] can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFormat {
    Coordinates,
    Dot { directed: bool },
    Edgelist { header: bool, directed: bool },
    BinaryEdgelist { header: bool, directed: bool, width: usize },
    PlainEdgelist,
}

impl WriteFormat {
    /// Size of a body record for formats with fixed-size records.
    pub fn record_size(&self) -> Option<usize> {
        match *self {
            WriteFormat::BinaryEdgelist { width, .. } => Some(2 * width),
            _ => None,
        }
    }
}

/// Writes the local slice of a graph.
///
/// Every output is produced as header, body and footer in this order. The
/// header carries the global size, so `info` must already be reduced.
pub struct GraphWriter<'a> {
    format: WriteFormat,
    config: OutputGraphConfig,
    graph: &'a Graph,
    info: GraphInfo,
}

impl<'a> GraphWriter<'a> {
    pub fn new(
        format: WriteFormat,
        config: &OutputGraphConfig,
        graph: &'a Graph,
        info: GraphInfo,
    ) -> Self {
        GraphWriter {
            format,
            config: config.clone(),
            graph,
            info,
        }
    }

    pub fn format(&self) -> WriteFormat {
        self.format
    }

    pub fn filename(&self, rank: PEID) -> PathBuf {
        if self.config.distributed {
            let mut name = self.config.filename.clone().into_os_string();
            name.push(format!(".{}", rank));
            PathBuf::from(name)
        } else {
            self.config.filename.clone()
        }
    }

    /// Writes the graph. Collective unless the output is distributed.
    pub fn write(&self, comm: &dyn Communicator) -> Result<()> {
        if let WriteFormat::BinaryEdgelist { width, .. } = self.format {
            if width != 4 && width != 8 {
                return domain_error(format!("unsupported integer width {}", width));
            }
        }
        if self.config.distributed {
            self.write_own_file(comm.rank())
        } else if let Some(record_size) = self.format.record_size() {
            self.write_shared_records(record_size as SInt, comm)
        } else {
            self.write_shared_text(comm)
        }
    }

    fn write_header(&self, out: &mut dyn Write) -> Result<()> {
        match self.format {
            WriteFormat::Coordinates => coordinates::write_header(out, &self.info),
            WriteFormat::Dot { directed } => dot::write_header(out, directed),
            WriteFormat::Edgelist { header: true, .. } => edgelist::write_header(out, &self.info),
            WriteFormat::BinaryEdgelist {
                header: true,
                width,
                ..
            } => edgelist::write_binary_header(out, &self.info, width),
            _ => Ok(()),
        }
    }

    /// Returns whether anything was written.
    fn write_body(&self, out: &mut dyn Write) -> Result<bool> {
        match self.format {
            WriteFormat::Coordinates => coordinates::write_body(out, self.graph),
            WriteFormat::Dot { directed } => dot::write_body(out, self.graph, directed),
            WriteFormat::Edgelist { directed, .. } => {
                edgelist::write_body(out, self.graph, directed)
            }
            WriteFormat::BinaryEdgelist {
                directed, width, ..
            } => edgelist::write_binary_body(out, self.graph, directed, width),
            WriteFormat::PlainEdgelist => plain_edgelist::write_body(out, self.graph),
        }
    }

    fn write_footer(&self, out: &mut dyn Write) -> Result<()> {
        match self.format {
            WriteFormat::Dot { .. } => dot::write_footer(out),
            _ => Ok(()),
        }
    }

    fn write_own_file(&self, rank: PEID) -> Result<()> {
        let path = self.filename(rank);
        info!("rank {}: writing {}", rank, path.display());
        let mut out = BufWriter::new(File::create(&path)?);
        self.write_header(&mut out)?;
        let wrote = self.write_body(&mut out)?;
        self.write_footer(&mut out)?;
        out.flush()?;
        debug!("rank {}: wrote body: {}", rank, wrote);
        Ok(())
    }

    fn write_shared_records(&self, record_size: SInt, comm: &dyn Communicator) -> Result<()> {
        let rank = comm.rank();
        let path = self.filename(0);
        let directed = match self.format {
            WriteFormat::BinaryEdgelist { directed, .. } => directed,
            _ => true,
        };
        let records = edgelist::count_records(self.graph, directed);
        let prefix = comm.exclusive_scan_sum(records)?;
        let total = comm.all_reduce_sum(records)?;
        let mut header: Vec<u8> = vec![];
        self.write_header(&mut header)?;
        let header_size = header.len() as SInt;
        let presized = if rank == 0 {
            info!(
                "writing header of {} and pre-sizing to {} records",
                path.display(),
                total
            );
            presize(&path, &header, header_size + total * record_size)
        } else {
            Ok(())
        };
        agree(comm, presized)?;
        let range = record_range(header_size, prefix, records, record_size);
        debug!("rank {}: writing bytes [{}, {})", rank, range.start, range.end);
        let written = if records > 0 {
            self.write_region(&path, range)
        } else {
            Ok(false)
        };
        agree(comm, written).map(|_| ())
    }

    fn write_region(&self, path: &Path, range: Range<SInt>) -> Result<bool> {
        let mut region = MmapRegion::open(path, range.start, (range.end - range.start) as usize)?;
        let mut slice = region.as_mut_slice();
        let wrote = self.write_body(&mut slice)?;
        if !slice.is_empty() {
            return domain_error(format!(
                "body is {} bytes shorter than its record range",
                slice.len()
            ));
        }
        region.flush()?;
        Ok(wrote)
    }

    fn write_shared_text(&self, comm: &dyn Communicator) -> Result<()> {
        let mut body: Vec<u8> = vec![];
        let rendered = self.write_body(&mut body);
        agree(comm, rendered)?;
        let path = self.filename(0);
        let written = match comm.gather_bytes(0, body)? {
            Some(bodies) => {
                info!("writing {} bodies to {}", bodies.len(), path.display());
                self.write_gathered(&path, &bodies)
            }
            None => Ok(()),
        };
        agree(comm, written)
    }

    fn write_gathered(&self, path: &Path, bodies: &[Vec<u8>]) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_header(&mut out)?;
        for body in bodies {
            out.write_all(body)?;
        }
        self.write_footer(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

fn presize(path: &Path, header: &[u8], len: SInt) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.set_len(len)?;
    file.write_all(header)?;
    Ok(())
}

/// Collective: succeeds only if `result` succeeded on every rank, so that no
/// rank runs into the next collective while another one has bailed out.
fn agree<T>(comm: &dyn Communicator, result: Result<T>) -> Result<T> {
    let status = comm.all_gather_bytes("agree", vec![result.is_ok() as u8])?;
    let result = result?;
    match status.iter().position(|s| s.first() != Some(&1)) {
        Some(rank) => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("rank {} failed to write its part", rank),
        ))),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ranges_cover() {
        let counts = [5, 0, 3, 6, 1];
        let (header, size) = (16, 16);
        let mut prefix = 0;
        let mut expected_start = header;
        for &count in &counts {
            let range = record_range(header, prefix, count, size);
            assert_eq!(range.start, expected_start);
            expected_start = range.end;
            prefix += count;
        }
        assert_eq!(expected_start, header + 15 * size);
    }

    #[test]
    fn test_deficits() {
        let deficits = Deficits::UNKNOWN_SIZE | Deficits::UNORDERED_EDGES;
        assert!(deficits.contains(Deficits::UNKNOWN_SIZE));
        assert!(deficits.contains(Deficits::NONE));
        assert!(!Deficits::UNKNOWN_SIZE.contains(Deficits::UNORDERED_EDGES));
    }

    #[test]
    fn test_distributed_filename() {
        let graph = Graph::default();
        let config = OutputGraphConfig::new("graph.edgelist").distributed(true);
        let writer = GraphWriter::new(WriteFormat::PlainEdgelist, &config, &graph, GraphInfo::default());
        assert_eq!(writer.filename(3), PathBuf::from("graph.edgelist.3"));
    }

    #[test]
    fn test_assemble_csr() {
        let graph = assemble((2, 4), vec![(3, 0), (2, 1), (3, 2)], GraphRepresentation::Csr).unwrap();
        assert_eq!(graph.xadj, vec![0, 1, 3]);
        assert_eq!(graph.adjncy, vec![1, 0, 2]);
    }
}
