//! Handle-style library surface.
//!
//! A [`KaGen`] context collects generator settings, drives a
//! [`GraphProducer`] on every rank and hands back a [`KaGenResult`] that owns
//! the local slice. The result is released by dropping it.

use crate::{
    assembly::{build_csr_from_edges, build_vertex_distribution, Csr},
    comm::Communicator,
    error::{domain_error, Result},
    graph::{Graph, GraphInfo, GraphRepresentation},
    io::{write_graph, OutputGraphConfig},
    types::{Edge, SInt, PEID},
};
use itertools::{Itertools, MinMaxResult};
use log::info;

/// Settings forwarded to the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub validate_undirected_graph: bool,
    pub print_basic_statistics: bool,
    pub print_advanced_statistics: bool,
    pub use_hp_floats: bool,
    /// Hint for how many chunks the producer splits its work into; 0 leaves
    /// the choice to the producer.
    pub k: SInt,
    pub write_output: bool,
    pub output: OutputGraphConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            validate_undirected_graph: false,
            print_basic_statistics: false,
            print_advanced_statistics: false,
            use_hp_floats: false,
            k: 0,
            write_output: false,
            output: OutputGraphConfig::default(),
        }
    }
}

/// Produces the local slice of a graph on one rank.
pub trait GraphProducer {
    fn produce(&self, config: &GeneratorConfig, rank: PEID, size: PEID) -> Result<Graph>;
}

impl<F> GraphProducer for F
where
    F: Fn(&GeneratorConfig, PEID, PEID) -> Result<Graph>,
{
    fn produce(&self, config: &GeneratorConfig, rank: PEID, size: PEID) -> Result<Graph> {
        self(config, rank, size)
    }
}

/// Generator context of one rank.
pub struct KaGen<'c> {
    comm: &'c dyn Communicator,
    config: GeneratorConfig,
}

impl<'c> KaGen<'c> {
    pub fn new(comm: &'c dyn Communicator) -> Self {
        KaGen {
            comm,
            config: GeneratorConfig::default(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = seed;
    }

    pub fn enable_undirected_graph_verification(&mut self) {
        self.config.validate_undirected_graph = true;
    }

    pub fn enable_basic_statistics(&mut self) {
        self.config.print_basic_statistics = true;
    }

    /// Advanced statistics include the basic ones.
    pub fn enable_advanced_statistics(&mut self) {
        self.config.print_basic_statistics = true;
        self.config.print_advanced_statistics = true;
    }

    pub fn enable_output(&mut self, header: bool) {
        self.config.write_output = true;
        self.config.output.with_header = header;
    }

    pub fn set_output(&mut self, output: OutputGraphConfig) {
        self.config.output = output;
    }

    pub fn use_hp_floats(&mut self, state: bool) {
        self.config.use_hp_floats = state;
    }

    pub fn set_number_of_chunks(&mut self, k: SInt) {
        self.config.k = k;
    }

    /// Runs `producer` on this rank and post-processes its slice. Collective.
    pub fn generate<P: GraphProducer + ?Sized>(&self, producer: &P) -> Result<KaGenResult> {
        let (rank, size) = (self.comm.rank(), self.comm.size());
        let graph = producer
            .produce(&self.config, rank, size)
            .and_then(|graph| validate_sources(&graph).map(|_| graph));
        let failures = self.comm.all_reduce_sum(graph.is_err() as SInt)?;
        let mut graph = graph?;
        if failures > 0 {
            return domain_error(format!("{} rank(s) failed to generate", failures));
        }
        let info = GraphInfo::reduce(&graph, self.comm)?;
        if self.config.print_basic_statistics {
            self.print_statistics(&graph, &info)?;
        }
        if self.config.write_output {
            write_graph(&self.config.output, &graph, info, self.comm)?;
        }
        if graph.representation == GraphRepresentation::Csr {
            graph.edges = graph.edge_iter().collect();
            graph.representation = GraphRepresentation::EdgeList;
        }
        Ok(KaGenResult { graph, info })
    }

    fn print_statistics(&self, graph: &Graph, info: &GraphInfo) -> Result<()> {
        let local_n = self.comm.all_gather(graph.num_local_vertices())?;
        let local_m = self.comm.all_gather(graph.num_local_edges())?;
        let max_degree = if self.config.print_advanced_statistics {
            let degrees = build_csr_from_edges(graph.vertex_range, &graph.edge_iter().collect_vec())?;
            let local = degrees.xadj.windows(2).map(|w| w[1] - w[0]).max();
            Some(self.comm.all_gather(local.unwrap_or(0))?)
        } else {
            None
        };
        if self.comm.rank() != 0 {
            return Ok(());
        }
        info!("vertices: {}, edges: {}", info.n, info.m);
        info!("local vertices: {}", describe(&local_n));
        info!("local edges: {}", describe(&local_m));
        if let Some(max_degree) = max_degree {
            let avg = if info.n > 0 {
                info.m as f64 / info.n as f64
            } else {
                0.0
            };
            let max = max_degree.iter().max().copied().unwrap_or(0);
            info!("average degree: {:.3}, maximum degree: {}", avg, max);
        }
        Ok(())
    }
}

fn describe(values: &[SInt]) -> String {
    match values.iter().minmax() {
        MinMaxResult::NoElements => "none".to_string(),
        MinMaxResult::OneElement(v) => format!("{}", v),
        MinMaxResult::MinMax(min, max) => format!("min {}, max {}", min, max),
    }
}

fn validate_sources(graph: &Graph) -> Result<()> {
    let (first, last) = graph.vertex_range;
    if last < first {
        return domain_error(format!("invalid vertex range [{}, {})", first, last));
    }
    match graph.edge_iter().find(|&(u, _)| !graph.contains_vertex(u)) {
        Some((u, v)) => domain_error(format!(
            "edge ({}, {}) starts outside of the local vertex range [{}, {})",
            u, v, first, last
        )),
        None => Ok(()),
    }
}

/// The local slice of a generated graph.
#[derive(Debug, Clone)]
pub struct KaGenResult {
    graph: Graph,
    info: GraphInfo,
}

impl KaGenResult {
    pub fn vertex_range(&self) -> (SInt, SInt) {
        self.graph.vertex_range
    }

    pub fn edge_list(&self) -> &[Edge] {
        &self.graph.edges
    }

    pub fn info(&self) -> GraphInfo {
        self.info
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Collective; see [`crate::assembly::build_vertex_distribution`].
    pub fn vertex_distribution(&self, comm: &dyn Communicator) -> Result<Vec<SInt>> {
        build_vertex_distribution(self.graph.num_local_vertices(), comm)
    }

    /// Writes the `size + 1` boundaries of the vertex distribution into the
    /// front of `dist`. Collective.
    pub fn build_vertex_distribution(&self, comm: &dyn Communicator, dist: &mut [SInt]) -> Result<()> {
        let boundaries = self.vertex_distribution(comm)?;
        if dist.len() < boundaries.len() {
            return domain_error(format!(
                "distribution buffer holds {} entries, {} needed",
                dist.len(),
                boundaries.len()
            ));
        }
        dist[..boundaries.len()].copy_from_slice(&boundaries);
        Ok(())
    }

    pub fn csr(&self) -> Result<Csr> {
        build_csr_from_edges(self.graph.vertex_range, &self.graph.edges)
    }

    /// Writes the local CSR structure into the front of `xadj` and `adjncy`,
    /// which must hold `local_n + 1` and `local_m` entries.
    pub fn build_csr(&self, xadj: &mut [SInt], adjncy: &mut [SInt]) -> Result<()> {
        let local_n = self.graph.num_local_vertices() as usize;
        let local_m = self.graph.edges.len();
        if xadj.len() < local_n + 1 || adjncy.len() < local_m {
            return domain_error(format!(
                "CSR buffers hold {} and {} entries, {} and {} needed",
                xadj.len(),
                adjncy.len(),
                local_n + 1,
                local_m
            ));
        }
        let csr = self.csr()?;
        xadj[..csr.xadj.len()].copy_from_slice(&csr.xadj);
        adjncy[..csr.adjncy.len()].copy_from_slice(&csr.adjncy);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comm::{launch, SingleComm},
        error::Error,
    };
    use tempfile::tempdir;

    fn path_producer(config: &GeneratorConfig, rank: PEID, size: PEID) -> Result<Graph> {
        let (first, n) = (rank as SInt * 3, size as SInt * 3);
        let edges = (first..first + 3).map(|u| (u, (u + config.seed) % n)).collect();
        Ok(Graph::new((first, first + 3), edges))
    }

    #[test]
    fn test_setters() {
        let mut kagen = KaGen::new(&SingleComm);
        kagen.set_seed(7);
        kagen.set_seed(7);
        kagen.enable_advanced_statistics();
        kagen.enable_output(false);
        kagen.use_hp_floats(true);
        kagen.set_number_of_chunks(16);
        let config = kagen.config();
        assert_eq!(config.seed, 7);
        assert!(config.print_basic_statistics && config.print_advanced_statistics);
        assert!(config.write_output && !config.output.with_header);
        assert!(config.use_hp_floats);
        assert_eq!(config.k, 16);
    }

    #[test]
    fn test_generate_and_assemble() {
        let results = launch(3, |comm| {
            let mut kagen = KaGen::new(comm);
            kagen.set_seed(1);
            kagen.enable_advanced_statistics();
            let result = kagen.generate(&path_producer).unwrap();
            let mut dist = vec![0; 5];
            result.build_vertex_distribution(comm, &mut dist).unwrap();
            let mut xadj = vec![0; 4];
            let mut adjncy = vec![0; 3];
            result.build_csr(&mut xadj, &mut adjncy).unwrap();
            (result.info(), dist, xadj, adjncy)
        })
        .unwrap();
        for (rank, (info, dist, xadj, adjncy)) in results.into_iter().enumerate() {
            assert_eq!((info.n, info.m), (9, 9));
            assert_eq!(dist, vec![0, 3, 6, 9, 0]);
            assert_eq!(xadj, vec![0, 1, 2, 3]);
            let first = rank as SInt * 3;
            assert_eq!(adjncy, vec![first + 1, first + 2, (first + 3) % 9]);
        }
    }

    #[test]
    fn test_small_buffers() {
        let kagen = KaGen::new(&SingleComm);
        let result = kagen.generate(&path_producer).unwrap();
        let mut dist = vec![0; 1];
        assert!(matches!(
            result.build_vertex_distribution(&SingleComm, &mut dist),
            Err(Error::Domain(_))
        ));
        let (mut xadj, mut adjncy) = (vec![0; 4], vec![0; 2]);
        assert!(matches!(
            result.build_csr(&mut xadj, &mut adjncy),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn test_rejects_foreign_sources() {
        let producer = |_: &GeneratorConfig, rank: PEID, _: PEID| -> Result<Graph> {
            let edges = if rank == 1 { vec![(0, 1)] } else { vec![] };
            Ok(Graph::new((rank as SInt, rank as SInt + 1), edges))
        };
        let results = launch(2, |comm| KaGen::new(comm).generate(&producer).is_err()).unwrap();
        assert_eq!(results, vec![true, true]);
    }

    #[test]
    fn test_csr_result_is_normalized() {
        let producer = |_: &GeneratorConfig, _: PEID, _: PEID| -> Result<Graph> {
            Ok(Graph::from_csr((0, 2), vec![0, 1, 2], vec![1, 0]))
        };
        let result = KaGen::new(&SingleComm).generate(&producer).unwrap();
        assert_eq!(result.edge_list(), &[(0, 1), (1, 0)]);
    }

    #[test]
    fn test_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("path.edgelist");
        let mut kagen = KaGen::new(&SingleComm);
        kagen.set_output(OutputGraphConfig::new(&path));
        kagen.enable_output(true);
        kagen.generate(&path_producer).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "3 3\n0 1\n1 2\n2 0\n"
        );
    }
}
