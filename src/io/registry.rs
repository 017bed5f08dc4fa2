//! The table of known file formats.
//!
//! Everything outside of this module refers to formats by name only; a new
//! format is added by adding one [`FileFormatFactory`] to [`FORMATS`].

use super::{
    config::{InputGraphConfig, OutputGraphConfig},
    edgelist::{BinaryEdgelistReader, EdgelistReader},
    format::{GraphReader, GraphWriter, WriteFormat},
    plain_edgelist::PlainEdgelistReader,
};
use crate::{
    error::{domain_error, Result},
    graph::{Graph, GraphInfo},
};
use std::path::Path;

pub type ReaderFactory = fn(&InputGraphConfig) -> Result<Box<dyn GraphReader>>;

pub type WriterFactory = fn(&OutputGraphConfig) -> WriteFormat;

/// What a format can do and how to instantiate it.
pub struct FileFormatFactory {
    pub name: &'static str,
    pub default_extension: &'static str,
    /// `None` for write-only formats.
    pub reader: Option<ReaderFactory>,
    pub writer: WriterFactory,
}

impl FileFormatFactory {
    pub fn create_reader(&self, config: &InputGraphConfig) -> Result<Box<dyn GraphReader>> {
        match self.reader {
            Some(reader) => reader(config),
            None => domain_error(format!("format {} cannot be read", self.name)),
        }
    }

    pub fn create_writer<'a>(
        &self,
        config: &OutputGraphConfig,
        graph: &'a Graph,
        info: GraphInfo,
    ) -> GraphWriter<'a> {
        GraphWriter::new((self.writer)(config), config, graph, info)
    }
}

pub static FORMATS: [FileFormatFactory; 9] = [
    FileFormatFactory {
        name: "coordinates",
        default_extension: "xyz",
        reader: None,
        writer: |_| WriteFormat::Coordinates,
    },
    FileFormatFactory {
        name: "dot",
        default_extension: "dot",
        reader: None,
        writer: |_| WriteFormat::Dot { directed: false },
    },
    FileFormatFactory {
        name: "directed-dot",
        default_extension: "dot",
        reader: None,
        writer: |_| WriteFormat::Dot { directed: true },
    },
    FileFormatFactory {
        name: "edgelist",
        default_extension: "edgelist",
        reader: Some(edgelist_reader),
        writer: |config| WriteFormat::Edgelist {
            header: config.with_header,
            directed: config.directed,
        },
    },
    FileFormatFactory {
        name: "undirected-edgelist",
        default_extension: "edgelist",
        reader: Some(undirected_edgelist_reader),
        writer: |config| WriteFormat::Edgelist {
            header: config.with_header,
            directed: false,
        },
    },
    FileFormatFactory {
        name: "binary-edgelist",
        default_extension: "binary-edgelist",
        reader: Some(binary_edgelist_reader),
        writer: |config| WriteFormat::BinaryEdgelist {
            header: config.with_header,
            directed: config.directed,
            width: config.width,
        },
    },
    FileFormatFactory {
        name: "undirected-binary-edgelist",
        default_extension: "undirected-binary-edgelist",
        reader: Some(undirected_binary_edgelist_reader),
        writer: |config| WriteFormat::BinaryEdgelist {
            header: config.with_header,
            directed: false,
            width: config.width,
        },
    },
    FileFormatFactory {
        name: "xtrapulp",
        default_extension: "xtrapulp",
        reader: Some(xtrapulp_reader),
        writer: |_| WriteFormat::BinaryEdgelist {
            header: false,
            directed: false,
            width: 4,
        },
    },
    FileFormatFactory {
        name: "plain-edgelist",
        default_extension: "plain-edgelist",
        reader: Some(plain_edgelist_reader),
        writer: |_| WriteFormat::PlainEdgelist,
    },
];

fn edgelist_reader(config: &InputGraphConfig) -> Result<Box<dyn GraphReader>> {
    Ok(Box::new(EdgelistReader::open(
        &config.filename,
        config.with_header,
        config.directed,
    )?))
}

fn undirected_edgelist_reader(config: &InputGraphConfig) -> Result<Box<dyn GraphReader>> {
    Ok(Box::new(EdgelistReader::open(
        &config.filename,
        config.with_header,
        false,
    )?))
}

fn binary_edgelist_reader(config: &InputGraphConfig) -> Result<Box<dyn GraphReader>> {
    Ok(Box::new(BinaryEdgelistReader::open(
        &config.filename,
        config.with_header,
        config.directed,
        config.width,
    )?))
}

fn undirected_binary_edgelist_reader(config: &InputGraphConfig) -> Result<Box<dyn GraphReader>> {
    Ok(Box::new(BinaryEdgelistReader::open(
        &config.filename,
        config.with_header,
        false,
        config.width,
    )?))
}

fn xtrapulp_reader(config: &InputGraphConfig) -> Result<Box<dyn GraphReader>> {
    Ok(Box::new(BinaryEdgelistReader::open(
        &config.filename,
        false,
        false,
        4,
    )?))
}

fn plain_edgelist_reader(config: &InputGraphConfig) -> Result<Box<dyn GraphReader>> {
    Ok(Box::new(PlainEdgelistReader::open(&config.filename)?))
}

/// Looks a format up by name.
pub fn find(name: &str) -> Result<&'static FileFormatFactory> {
    match FORMATS.iter().find(|factory| factory.name == name) {
        Some(factory) => Ok(factory),
        None => domain_error(format!("unknown format {}", name)),
    }
}

/// Looks a format up by the extension of `path`; the first registered
/// format with that extension wins.
pub fn find_by_extension<P: AsRef<Path>>(path: P) -> Option<&'static FileFormatFactory> {
    let extension = path.as_ref().extension()?.to_str()?;
    FORMATS
        .iter()
        .find(|factory| factory.default_extension == extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{comm::SingleComm, error::Error};
    use tempfile::tempdir;

    #[test]
    fn test_find() {
        assert_eq!(find("xtrapulp").unwrap().default_extension, "xtrapulp");
        assert!(matches!(find("metis"), Err(Error::Domain(_))));
    }

    #[test]
    fn test_find_by_extension() {
        assert_eq!(find_by_extension("a/b.dot").unwrap().name, "dot");
        assert_eq!(find_by_extension("g.edgelist").unwrap().name, "edgelist");
        assert_eq!(find_by_extension("g.xyz").unwrap().name, "coordinates");
        assert!(find_by_extension("g").is_none());
    }

    #[test]
    fn test_write_only() {
        let config = InputGraphConfig::new("unused.dot");
        assert!(matches!(
            find("dot").unwrap().create_reader(&config),
            Err(Error::Domain(_))
        ));
    }

    #[test]
    fn test_variants() {
        let config = OutputGraphConfig::default().width(8).with_header(true);
        assert_eq!(
            (find("xtrapulp").unwrap().writer)(&config),
            WriteFormat::BinaryEdgelist {
                header: false,
                directed: false,
                width: 4
            }
        );
        assert_eq!(
            (find("undirected-edgelist").unwrap().writer)(&config),
            WriteFormat::Edgelist {
                header: true,
                directed: false
            }
        );
    }

    #[test]
    fn test_dot_directedness_follows_the_name() {
        let config = OutputGraphConfig::default();
        assert!(config.directed);
        assert_eq!(
            (find("dot").unwrap().writer)(&config),
            WriteFormat::Dot { directed: false }
        );
        assert_eq!(
            (find("directed-dot").unwrap().writer)(&config.clone().directed(false)),
            WriteFormat::Dot { directed: true }
        );
    }

    #[test]
    fn test_dot_writes_undirected_graph() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("g.dot");
        let graph = Graph::new((0, 2), vec![(0, 1), (1, 0)]);
        let info = GraphInfo::reduce(&graph, &SingleComm).unwrap();
        let config = OutputGraphConfig::new(&path).format("dot");
        find("dot")
            .unwrap()
            .create_writer(&config, &graph, info)
            .write(&SingleComm)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "graph {\n0 -- 1;\n}\n");
    }

    #[test]
    fn test_unique_names() {
        for (i, a) in FORMATS.iter().enumerate() {
            assert!(FORMATS[i + 1..].iter().all(|b| a.name != b.name));
        }
    }
}
