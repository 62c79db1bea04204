use std::path::PathBuf;

/// Failure while reading the flood datasets.
///
/// Any of these aborts the whole load; there is no row-level recovery.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("line {line}: `{value}` is not a MM/DD/YYYY date")]
    InvalidDate { line: u64, value: String },
}

impl LoadError {
    /// Attach the file path to a CSV error raised while parsing a reader.
    pub(crate) fn csv(path: &std::path::Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}
