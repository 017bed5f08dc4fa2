//! Assembly of rank-local edge lists into distributed representations.

use crate::{
    comm::Communicator,
    error::{domain_error, Result},
    graph::{Graph, GraphRepresentation},
    types::{Edge, SInt, PEID},
};
use log::debug;

/// Compressed sparse rows of the local vertices.
///
/// `adjncy[xadj[i]..xadj[i + 1]]` are the neighbors of local vertex `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Csr {
    pub xadj: Vec<SInt>,
    pub adjncy: Vec<SInt>,
}

/// Turns the local vertex counts of all ranks into the `size + 1` boundaries
/// of their vertex ranges.
pub fn vertex_distribution(counts: &[SInt]) -> Vec<SInt> {
    let mut dist = Vec::with_capacity(counts.len() + 1);
    dist.push(0);
    for &count in counts {
        dist.push(dist[dist.len() - 1] + count);
    }
    dist
}

/// Builds the global vertex distribution. Collective; every rank obtains the
/// same array.
pub fn build_vertex_distribution(local_n: SInt, comm: &dyn Communicator) -> Result<Vec<SInt>> {
    let dist = vertex_distribution(&comm.all_gather(local_n)?);
    debug!("rank {}: vertex distribution {:?}", comm.rank(), dist);
    Ok(dist)
}

/// The rank owning `vertex`, or `None` if it lies beyond the last boundary.
pub fn find_owner(dist: &[SInt], vertex: SInt) -> Option<PEID> {
    if dist.is_empty() || vertex >= dist[dist.len() - 1] {
        return None;
    }
    Some(dist.partition_point(|&boundary| boundary <= vertex) - 1)
}

/// Counting sort of `edges` by source into CSR form. Edges with the same
/// source keep their relative order.
pub fn build_csr_from_edges(vertex_range: (SInt, SInt), edges: &[Edge]) -> Result<Csr> {
    let (first, last) = vertex_range;
    if last < first {
        return domain_error(format!("invalid vertex range [{}, {})", first, last));
    }
    let local_n = (last - first) as usize;
    let mut xadj = vec![0; local_n + 1];
    for &(u, _) in edges {
        if u < first || u >= last {
            return domain_error(format!(
                "source {} lies outside of the local vertex range [{}, {})",
                u, first, last
            ));
        }
        xadj[(u - first) as usize + 1] += 1;
    }
    for i in 1..xadj.len() {
        xadj[i] += xadj[i - 1];
    }
    let mut cursor = xadj[..local_n].to_vec();
    let mut adjncy = vec![0; edges.len()];
    for &(u, v) in edges {
        let slot = &mut cursor[(u - first) as usize];
        adjncy[*slot as usize] = v;
        *slot += 1;
    }
    Ok(Csr { xadj, adjncy })
}

/// Builds the CSR structure of the local vertices of `graph`. Purely local.
pub fn build_csr(graph: &Graph) -> Result<Csr> {
    match graph.representation {
        GraphRepresentation::EdgeList => build_csr_from_edges(graph.vertex_range, &graph.edges),
        GraphRepresentation::Csr => Ok(Csr {
            xadj: graph.xadj.clone(),
            adjncy: graph.adjncy.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{comm::launch, error::Error};

    #[test]
    fn test_vertex_distribution() {
        assert_eq!(vertex_distribution(&[4, 0, 3]), vec![0, 4, 4, 7]);
        assert_eq!(vertex_distribution(&[]), vec![0]);
    }

    #[test]
    fn test_build_vertex_distribution() {
        let dists = launch(3, |comm| {
            build_vertex_distribution([2, 5, 1][comm.rank()], comm).unwrap()
        })
        .unwrap();
        assert!(dists.iter().all(|dist| dist == &vec![0, 2, 7, 8]));
    }

    #[test]
    fn test_find_owner() {
        let dist = vec![0, 4, 4, 7];
        assert_eq!(find_owner(&dist, 0), Some(0));
        assert_eq!(find_owner(&dist, 3), Some(0));
        assert_eq!(find_owner(&dist, 4), Some(2));
        assert_eq!(find_owner(&dist, 6), Some(2));
        assert_eq!(find_owner(&dist, 7), None);
    }

    #[test]
    fn test_build_csr() {
        let edges = vec![(5, 1), (4, 9), (5, 0), (4, 3), (6, 2), (5, 8)];
        let csr = build_csr_from_edges((4, 8), &edges).unwrap();
        assert_eq!(csr.xadj, vec![0, 2, 5, 6, 6]);
        assert_eq!(csr.adjncy, vec![9, 3, 1, 0, 8, 2]);
    }

    #[test]
    fn test_build_csr_empty() {
        let csr = build_csr_from_edges((3, 3), &[]).unwrap();
        assert_eq!(csr.xadj, vec![0]);
        assert!(csr.adjncy.is_empty());
    }

    #[test]
    fn test_build_csr_foreign_source() {
        assert!(matches!(
            build_csr_from_edges((0, 2), &[(0, 1), (2, 0)]),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn test_build_csr_passthrough() {
        let graph = Graph::from_csr((0, 2), vec![0, 1, 2], vec![1, 0]);
        let csr = build_csr(&graph).unwrap();
        assert_eq!(csr.xadj, vec![0, 1, 2]);
        assert_eq!(csr.adjncy, vec![1, 0]);
    }
}
