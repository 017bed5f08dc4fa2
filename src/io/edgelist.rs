//! Edge lists, one record per edge, as text lines or fixed-width binary.
//!
//! Undirected graphs keep both orientations of every edge in memory. The
//! writers emit each edge once (`u <= v`) and the readers restore the reverse
//! orientation of every non-loop record.

use super::{
    format::{assemble, Deficits, GraphReader, GraphSize},
    toker::MappedFileToker,
};
use crate::{
    error::{domain_error, format_error, Result},
    graph::{Graph, GraphInfo, GraphRepresentation},
    memory_manager::MemoryManager,
    types::{Edge, SInt},
};
use log::debug;
use std::{io::Write, path::Path};

fn is_record(directed: bool, (u, v): Edge) -> bool {
    directed || u <= v
}

/// Number of records the local edges occupy in the file.
pub(crate) fn count_records(graph: &Graph, directed: bool) -> SInt {
    if directed {
        graph.num_local_edges()
    } else {
        graph.edge_iter().filter(|&e| is_record(false, e)).count() as SInt
    }
}

/// Number of in-memory edges a record stands for.
fn edges_per_record(directed: bool, (u, v): Edge) -> SInt {
    if directed || u == v {
        1
    } else {
        2
    }
}

/// Adds the edges of record `(u, v)` that start in `[from, to)`.
fn push_record(edges: &mut Vec<Edge>, (u, v): Edge, (from, to): (SInt, SInt), directed: bool) {
    if from <= u && u < to {
        edges.push((u, v));
    }
    if !directed && u != v && from <= v && v < to {
        edges.push((v, u));
    }
}

pub(crate) fn write_header(out: &mut dyn Write, info: &GraphInfo) -> Result<()> {
    writeln!(out, "{} {}", info.n, info.m)?;
    Ok(())
}

pub(crate) fn write_body(out: &mut dyn Write, graph: &Graph, directed: bool) -> Result<bool> {
    let mut wrote = false;
    for (u, v) in graph.edge_iter().filter(|&e| is_record(directed, e)) {
        writeln!(out, "{} {}", u, v)?;
        wrote = true;
    }
    Ok(wrote)
}

fn write_int(out: &mut dyn Write, value: SInt, width: usize) -> Result<()> {
    match width {
        4 => match u32::try_from(value) {
            Ok(value) => out.write_all(&value.to_ne_bytes())?,
            Err(_) => return domain_error(format!("{} does not fit into 4 bytes", value)),
        },
        8 => out.write_all(&value.to_ne_bytes())?,
        _ => return domain_error(format!("unsupported integer width {}", width)),
    }
    Ok(())
}

fn read_int(bytes: &[u8], width: usize) -> SInt {
    if width == 4 {
        let mut buf = [0; 4];
        buf.copy_from_slice(&bytes[..4]);
        u32::from_ne_bytes(buf) as SInt
    } else {
        let mut buf = [0; 8];
        buf.copy_from_slice(&bytes[..8]);
        SInt::from_ne_bytes(buf)
    }
}

pub(crate) fn write_binary_header(out: &mut dyn Write, info: &GraphInfo, width: usize) -> Result<()> {
    write_int(out, info.n, width)?;
    write_int(out, info.m, width)
}

pub(crate) fn write_binary_body(
    out: &mut dyn Write,
    graph: &Graph,
    directed: bool,
    width: usize,
) -> Result<bool> {
    let mut wrote = false;
    for (u, v) in graph.edge_iter().filter(|&e| is_record(directed, e)) {
        write_int(out, u, width)?;
        write_int(out, v, width)?;
        wrote = true;
    }
    Ok(wrote)
}

/// Reads `u v` lines, optionally preceded by an `n m` line. Lines starting
/// with `#` or `%` are comments.
pub struct EdgelistReader {
    toker: MappedFileToker,
    header: bool,
    directed: bool,
    size: Option<GraphSize>,
    body_start: usize,
    /// Index and byte position of the record `find_node_by_edge` stopped at.
    resume: (SInt, usize),
}

impl EdgelistReader {
    pub fn open<P: AsRef<Path>>(path: P, header: bool, directed: bool) -> Result<Self> {
        Self::new(MappedFileToker::open(path)?, header, directed)
    }

    pub fn new(mut toker: MappedFileToker, header: bool, directed: bool) -> Result<Self> {
        skip_comments(&mut toker);
        let size = if header {
            let n = toker.consume_int()?;
            let m = toker.consume_int()?;
            toker.consume_line_end()?;
            Some(GraphSize { n, m })
        } else {
            None
        };
        let body_start = toker.position();
        Ok(EdgelistReader {
            toker,
            header,
            directed,
            size,
            body_start,
            resume: (0, body_start),
        })
    }

    fn next_record(&mut self) -> Result<Option<Edge>> {
        skip_comments(&mut self.toker);
        if !self.toker.valid_position() {
            return Ok(None);
        }
        let position = self.toker.position();
        let u = self.toker.consume_int()?;
        let v = self.toker.consume_int()?;
        self.toker.consume_line_end()?;
        if let Some(GraphSize { n, .. }) = self.size.filter(|_| self.header) {
            if u >= n || v >= n {
                return format_error(position, format!("edge ({}, {}) exceeds n = {}", u, v, n));
            }
        }
        Ok(Some((u, v)))
    }

    /// A header promises the number of records; a file that ends early or
    /// runs long is malformed.
    fn check_record_count(&self, records: SInt) -> Result<()> {
        match self.size.filter(|_| self.header) {
            Some(GraphSize { m, .. }) if (self.directed && records != m) || records > m => {
                format_error(
                    self.toker.position(),
                    format!("{} records do not match m = {} of the header", records, m),
                )
            }
            _ => Ok(()),
        }
    }
}

fn skip_comments(toker: &mut MappedFileToker) {
    while toker.valid_position() {
        if toker.test_char(b'#') || toker.test_char(b'%') {
            toker.skip_line();
        } else if toker.at_line_end() && toker.valid_position() {
            toker.skip_line();
        } else {
            break;
        }
    }
}

impl GraphReader for EdgelistReader {
    fn read_size(&mut self) -> Result<GraphSize> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        self.toker.seek(self.body_start);
        let mut size = GraphSize::default();
        while let Some((u, v)) = self.next_record()? {
            size.n = size.n.max(u.max(v) + 1);
            size.m += edges_per_record(self.directed, (u, v));
        }
        debug!("scanned edge list: {}", size);
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
        self.toker.seek(self.body_start);
        let mut edges = vec![];
        let mut index = 0;
        while index < to_edge {
            match self.next_record()? {
                Some(record) => push_record(&mut edges, record, (from_vertex, to_vertex), self.directed),
                None => {
                    self.check_record_count(index)?;
                    break;
                }
            }
            index += 1;
        }
        assemble((from_vertex, to_vertex), edges, representation)
    }

    fn find_node_by_edge(&mut self, edge: SInt) -> Result<SInt> {
        let target = if self.directed { edge } else { edge / 2 };
        let (mut index, position) = if self.resume.0 <= target {
            self.resume
        } else {
            (0, self.body_start)
        };
        self.toker.seek(position);
        loop {
            let position = self.toker.position();
            match self.next_record()? {
                Some((u, _)) if index == target => {
                    self.resume = (index, position);
                    return Ok(u);
                }
                Some(_) => index += 1,
                None => return Ok(self.read_size()?.n),
            }
        }
    }

    fn deficits(&self) -> Deficits {
        if self.header {
            Deficits::UNORDERED_EDGES
        } else {
            Deficits::UNORDERED_EDGES | Deficits::UNKNOWN_SIZE
        }
    }
}

/// Reads records of two `width`-byte integers in host byte order, optionally
/// preceded by `n` and `m` of the same width.
///
/// The width is not recorded in the file. With a header, a wrong width is
/// detected through the body length, the record count and the id bounds.
pub struct BinaryEdgelistReader {
    mm: MemoryManager,
    header: bool,
    directed: bool,
    width: usize,
    size: Option<GraphSize>,
    records: SInt,
}

impl BinaryEdgelistReader {
    pub fn open<P: AsRef<Path>>(path: P, header: bool, directed: bool, width: usize) -> Result<Self> {
        Self::new(MemoryManager::new_mmap(path)?, header, directed, width)
    }

    pub fn new(mm: MemoryManager, header: bool, directed: bool, width: usize) -> Result<Self> {
        if width != 4 && width != 8 {
            return domain_error(format!("unsupported integer width {}", width));
        }
        let header_size = if header { 2 * width } else { 0 };
        if mm.len() < header_size {
            return format_error(mm.len(), "file is shorter than its header");
        }
        let size = if header {
            let bytes = mm.as_bytes();
            Some(GraphSize {
                n: read_int(bytes, width),
                m: read_int(&bytes[width..], width),
            })
        } else {
            None
        };
        let body = mm.len() - header_size;
        if body % (2 * width) != 0 {
            return format_error(
                mm.len(),
                format!(
                    "body of {} bytes is no multiple of the record size {}",
                    body,
                    2 * width
                ),
            );
        }
        let records = (body / (2 * width)) as SInt;
        if let Some(GraphSize { m, .. }) = size {
            if (directed && records != m) || records > m {
                return format_error(
                    header_size,
                    format!("{} records do not match m = {} of the header", records, m),
                );
            }
        }
        Ok(BinaryEdgelistReader {
            mm,
            header,
            directed,
            width,
            size,
            records,
        })
    }

    fn offset(&self, index: SInt) -> usize {
        let header_size = if self.header { 2 * self.width } else { 0 };
        header_size + index as usize * 2 * self.width
    }

    fn record(&self, index: SInt) -> Result<Edge> {
        let offset = self.offset(index);
        let bytes = &self.mm.as_bytes()[offset..];
        let (u, v) = (read_int(bytes, self.width), read_int(&bytes[self.width..], self.width));
        if let Some(GraphSize { n, .. }) = self.size.filter(|_| self.header) {
            if u >= n || v >= n {
                return format_error(offset, format!("edge ({}, {}) exceeds n = {}", u, v, n));
            }
        }
        Ok((u, v))
    }
}

impl GraphReader for BinaryEdgelistReader {
    fn read_size(&mut self) -> Result<GraphSize> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let mut size = GraphSize::default();
        for index in 0..self.records {
            let (u, v) = self.record(index)?;
            size.n = size.n.max(u.max(v) + 1);
            size.m += edges_per_record(self.directed, (u, v));
        }
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
        let mut edges = vec![];
        for index in 0..self.records.min(to_edge) {
            push_record(&mut edges, self.record(index)?, (from_vertex, to_vertex), self.directed);
        }
        assemble((from_vertex, to_vertex), edges, representation)
    }

    fn find_node_by_edge(&mut self, edge: SInt) -> Result<SInt> {
        let index = if self.directed { edge } else { edge / 2 };
        if index < self.records {
            Ok(self.record(index)?.0)
        } else {
            Ok(self.read_size()?.n)
        }
    }

    fn deficits(&self) -> Deficits {
        if self.header {
            Deficits::UNORDERED_EDGES
        } else {
            Deficits::UNORDERED_EDGES | Deficits::UNKNOWN_SIZE
        }
    }
}
