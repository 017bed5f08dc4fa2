//! Graphviz output.

use crate::{error::Result, graph::Graph, types::SInt};
use std::io::Write;

pub(crate) fn write_header(out: &mut dyn Write, directed: bool) -> Result<()> {
    writeln!(out, "{} {{", if directed { "digraph" } else { "graph" })?;
    Ok(())
}

/// Undirected graphs store both orientations of an edge; only `u <= v` is
/// written.
pub(crate) fn write_body(out: &mut dyn Write, graph: &Graph, directed: bool) -> Result<bool> {
    let mut wrote = false;
    if graph.coordinates.two.len() as SInt == graph.num_local_vertices() {
        for (u, &(x, y)) in (graph.vertex_range.0..).zip(graph.coordinates.two.iter()) {
            writeln!(out, "{} [pos=\"{},{}!\"];", u, x, y)?;
            wrote = true;
        }
    }
    let arrow = if directed { "->" } else { "--" };
    for (u, v) in graph.edge_iter().filter(|&(u, v)| directed || u <= v) {
        writeln!(out, "{} {} {};", u, arrow, v)?;
        wrote = true;
    }
    Ok(wrote)
}

pub(crate) fn write_footer(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "}}")?;
    Ok(())
}
