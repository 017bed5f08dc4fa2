use std::path::PathBuf;

/// How the vertices of a file are split among the reading ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphDistribution {
    /// Every rank reads about `n / size` vertices.
    BalanceVertices,
    /// Every rank reads about `m / size` edges.
    BalanceEdges,
}

/// Where and how a graph is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGraphConfig {
    pub filename: PathBuf,
    /// Name of a registered format.
    pub format: String,
    /// One file per rank (`<filename>.<rank>`) instead of one shared file.
    pub distributed: bool,
    /// Byte width of binary integers, 4 or 8.
    pub width: usize,
    pub directed: bool,
    pub with_header: bool,
    /// Append the default extension of the format to `filename`.
    pub extension: bool,
}

impl Default for OutputGraphConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::from("out"),
            format: "edgelist".to_string(),
            distributed: false,
            width: 8,
            directed: true,
            with_header: true,
            extension: false,
        }
    }
}

impl OutputGraphConfig {
    pub fn new<P: Into<PathBuf>>(filename: P) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }

    pub fn distributed(mut self, distributed: bool) -> Self {
        self.distributed = distributed;
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn with_header(mut self, with_header: bool) -> Self {
        self.with_header = with_header;
        self
    }

    pub fn extension(mut self, extension: bool) -> Self {
        self.extension = extension;
        self
    }
}

/// Where and how a graph is read.
#[derive(Debug, Clone, PartialEq)]
pub struct InputGraphConfig {
    pub filename: PathBuf,
    pub format: String,
    pub width: usize,
    pub directed: bool,
    pub with_header: bool,
    pub distribution: GraphDistribution,
}

impl Default for InputGraphConfig {
    fn default() -> Self {
        Self {
            filename: PathBuf::new(),
            format: "edgelist".to_string(),
            width: 8,
            directed: true,
            with_header: true,
            distribution: GraphDistribution::BalanceVertices,
        }
    }
}

impl InputGraphConfig {
    pub fn new<P: Into<PathBuf>>(filename: P) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = format.into();
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn with_header(mut self, with_header: bool) -> Self {
        self.with_header = with_header;
        self
    }

    pub fn distribution(mut self, distribution: GraphDistribution) -> Self {
        self.distribution = distribution;
        self
    }
}
