//! Vertex coordinates as `id x y [z]` lines.

use crate::{
    error::{domain_error, Result},
    graph::{Graph, GraphInfo},
    types::SInt,
};
use std::io::Write;

pub(crate) fn write_header(out: &mut dyn Write, info: &GraphInfo) -> Result<()> {
    writeln!(out, "{}", info.n)?;
    Ok(())
}

pub(crate) fn write_body(out: &mut dyn Write, graph: &Graph) -> Result<bool> {
    let local_n = graph.num_local_vertices();
    let ids = graph.vertex_range.0..graph.vertex_range.1;
    if graph.coordinates.three.len() as SInt == local_n && local_n > 0 {
        for (u, &(x, y, z)) in ids.zip(graph.coordinates.three.iter()) {
            writeln!(out, "{} {} {} {}", u, x, y, z)?;
        }
    } else if graph.coordinates.two.len() as SInt == local_n {
        for (u, &(x, y)) in ids.zip(graph.coordinates.two.iter()) {
            writeln!(out, "{} {} {}", u, x, y)?;
        }
    } else {
        return domain_error(format!(
            "graph has {} local vertices but {} 2D and {} 3D coordinates",
            local_n,
            graph.coordinates.two.len(),
            graph.coordinates.three.len()
        ));
    }
    Ok(local_n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_2d() {
        let mut graph = Graph::new((2, 4), vec![]);
        graph.coordinates.two = vec![(0.5, 0.75), (1.0, 0.0)];
        let mut out: Vec<u8> = vec![];
        write_header(&mut out, &GraphInfo { n: 4, ..GraphInfo::default() }).unwrap();
        assert!(write_body(&mut out, &graph).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "4\n2 0.5 0.75\n3 1 0\n");
    }

    #[test]
    fn test_3d() {
        let mut graph = Graph::new((0, 1), vec![]);
        graph.coordinates.three = vec![(0.5, 0.25, 0.125)];
        let mut out: Vec<u8> = vec![];
        assert!(write_body(&mut out, &graph).unwrap());
        assert_eq!(String::from_utf8(out).unwrap(), "0 0.5 0.25 0.125\n");
    }

    #[test]
    fn test_missing_coordinates() {
        let graph = Graph::new((0, 2), vec![(0, 1)]);
        assert!(matches!(
            write_body(&mut Vec::<u8>::new(), &graph),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn test_empty_range() {
        let mut out: Vec<u8> = vec![];
        assert!(!write_body(&mut out, &Graph::default()).unwrap());
        assert!(out.is_empty());
    }
}
