//! Reading and writing distributed graphs.

pub mod config;
mod coordinates;
mod dot;
pub mod edgelist;
pub mod format;
pub mod plain_edgelist;
pub mod registry;
pub mod toker;

pub use config::{GraphDistribution, InputGraphConfig, OutputGraphConfig};
pub use format::{Deficits, GraphReader, GraphSize, GraphWriter, WriteFormat};
pub use registry::{find, find_by_extension, FileFormatFactory, FORMATS};

use format::assemble;

use crate::{
    comm::Communicator,
    error::Result,
    graph::{Graph, GraphInfo, GraphRepresentation},
    types::{SInt, PEID},
};
use log::{debug, info};
use std::borrow::Cow;

/// Writes `graph` with the format named in `config`. Collective unless the
/// output is distributed.
pub fn write_graph(
    config: &OutputGraphConfig,
    graph: &Graph,
    info: GraphInfo,
    comm: &dyn Communicator,
) -> Result<()> {
    let factory = find(&config.format)?;
    let config = if config.extension {
        let mut name = config.filename.clone().into_os_string();
        name.push(".");
        name.push(factory.default_extension);
        let mut config = config.clone().extension(false);
        config.filename = name.into();
        Cow::Owned(config)
    } else {
        Cow::Borrowed(config)
    };
    if comm.rank() == 0 {
        info!(
            "writing {} graph ({}) to {}",
            factory.name,
            info,
            config.filename.display()
        );
    }
    factory.create_writer(&config, graph, info).write(comm)
}

/// Vertex window `[from, to)` of `rank` when `n` vertices are split evenly.
pub fn balanced_vertex_window(n: SInt, rank: PEID, size: PEID) -> (SInt, SInt) {
    let split = |r: PEID| (n as u128 * r as u128 / size as u128) as SInt;
    (split(rank), split(rank + 1))
}

fn balanced_edge_window(
    reader: &mut dyn GraphReader,
    size: GraphSize,
    rank: PEID,
    ranks: PEID,
) -> Result<(SInt, SInt)> {
    let split = |r: PEID| (size.m as u128 * r as u128 / ranks as u128) as SInt;
    let from = if rank == 0 {
        0
    } else {
        reader.find_node_by_edge(split(rank))?
    };
    let to = if rank + 1 == ranks {
        size.n
    } else {
        reader.find_node_by_edge(split(rank + 1))?
    };
    let from = from.min(size.n);
    Ok((from, to.min(size.n).max(from)))
}

/// Reads this rank's share of the graph file named in `config`. Collective.
pub fn read_graph(
    config: &InputGraphConfig,
    representation: GraphRepresentation,
    comm: &dyn Communicator,
) -> Result<(Graph, GraphInfo)> {
    let factory = find(&config.format)?;
    let mut reader = factory.create_reader(config)?;
    if comm.rank() == 0 {
        info!(
            "reading {} graph from {}",
            factory.name,
            config.filename.display()
        );
    }
    read_share(reader.as_mut(), config.distribution, representation, comm)
}

fn read_share(
    reader: &mut dyn GraphReader,
    distribution: GraphDistribution,
    representation: GraphRepresentation,
    comm: &dyn Communicator,
) -> Result<(Graph, GraphInfo)> {
    let size = reader.read_size()?;
    let deficits = reader.deficits();
    if comm.rank() == 0 {
        info!("graph size: {}", size);
        if deficits.contains(Deficits::NOT_PARTITIONABLE) {
            info!("every rank reads the whole graph and keeps a vertex balanced window");
        } else if deficits.contains(Deficits::UNORDERED_EDGES)
            && distribution == GraphDistribution::BalanceEdges
        {
            info!("edges may be unordered, windows are approximate");
        }
    }
    let graph = if deficits.contains(Deficits::NOT_PARTITIONABLE) {
        let (from, to) = balanced_vertex_window(size.n, comm.rank(), comm.size());
        debug!("rank {}: keeping vertices [{}, {})", comm.rank(), from, to);
        let whole = reader.read(0, size.n, SInt::MAX, GraphRepresentation::EdgeList)?;
        let edges = whole
            .edges
            .into_iter()
            .filter(|&(u, _)| from <= u && u < to)
            .collect();
        assemble((from, to), edges, representation)?
    } else {
        let (from, to) = match distribution {
            GraphDistribution::BalanceVertices => {
                balanced_vertex_window(size.n, comm.rank(), comm.size())
            }
            GraphDistribution::BalanceEdges => {
                balanced_edge_window(reader, size, comm.rank(), comm.size())?
            }
        };
        debug!("rank {}: reading vertices [{}, {})", comm.rank(), from, to);
        reader.read(from, to, SInt::MAX, representation)?
    };
    let info = GraphInfo::reduce(&graph, comm)?;
    Ok((graph, info))
}
