use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, transforming or writing annotations.
#[derive(Debug, Error)]
pub enum Error {
    /// A box line did not split into four integers and a category name.
    #[error("malformed box record {line:?}: {reason}")]
    MalformedRecord { line: String, reason: String },

    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("category index {index} out of range (catalog has {count} categories)")]
    IndexOutOfRange { index: i64, count: usize },

    #[error("catalog must contain at least one category")]
    EmptyCatalog,

    #[error("category {0:?} appears more than once in the catalog")]
    DuplicateCategory(String),

    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode or encode {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid mask stack: {0}")]
    MaskShape(String),

    #[error("image has zero width or height ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("could not create directory {}", .0.display())]
    DirectoryCreateFailure(PathBuf),
}

impl Error {
    /// Map an I/O error on `path`, turning `NotFound` into [`Error::MissingFile`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::MissingFile(path)
        } else {
            Error::Io { path, source }
        }
    }

    pub(crate) fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
