//! # Error Types
//!
//! Every public store operation returns [`StoreError`], which wraps the
//! underlying cause ([`ErrorKind`]) together with the operation, the target path
//! and the caller's source location.

use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

// --- Operation ---

/// The public store operation an error or event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadConfig,
    WriteConfig,
    SaveArtifact,
    LoadArtifact,
    SaveArray,
    LoadArray,
    DropColumns,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ReadConfig => "read_config",
            Operation::WriteConfig => "write_config",
            Operation::SaveArtifact => "save_artifact",
            Operation::LoadArtifact => "load_artifact",
            Operation::SaveArray => "save_array",
            Operation::LoadArray => "load_array",
            Operation::DropColumns => "drop_columns",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Error Kind ---

/// The underlying cause of a failed operation.
#[derive(thiserror::Error, Debug)]
pub enum ErrorKind {
    /// File could not be opened, created, removed or flushed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// YAML text is malformed or does not fit the requested type.
    #[error("malformed YAML: {0}")]
    Parse(#[source] serde_yaml::Error),
    /// A value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
    #[error("column '{name}' not found (available: {available:?})")]
    ColumnNotFound { name: String, available: Vec<String> },
    #[error("array holds object-typed elements and object arrays are not allowed")]
    ObjectArrayRejected,
    /// File content is structurally invalid for the expected format.
    #[error("corrupt file: {0}")]
    Corrupt(String),
    #[error("unsupported array format version {0}")]
    UnsupportedVersion(u8),
}

/// Encoder/decoder failures grouped by backend.
#[derive(thiserror::Error, Debug)]
pub enum SerializationError {
    #[error("bincode: {0}")]
    Bincode(bincode::Error),
    #[error("yaml: {0}")]
    Yaml(serde_yaml::Error),
    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("array shape {shape:?} does not fit {len} elements: {reason}")]
    Shape {
        shape: Vec<usize>,
        len: usize,
        reason: String,
    },
}

impl From<bincode::Error> for ErrorKind {
    /// Used on the encode path, where bincode only wraps writer failures; those
    /// surface as plain I/O. Decoders classify read failures themselves.
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => ErrorKind::Io(io),
            other => ErrorKind::Serialization(SerializationError::Bincode(Box::new(other))),
        }
    }
}

impl From<arrow::error::ArrowError> for ErrorKind {
    fn from(err: arrow::error::ArrowError) -> Self {
        ErrorKind::Serialization(SerializationError::Arrow(err))
    }
}

// --- Store Error ---

/// Error returned by every [`ArtifactStore`](crate::ArtifactStore) operation.
///
/// Carries the originating operation, the resolved path (if any), the source
/// location of the call into the store and the underlying [`ErrorKind`].
#[derive(thiserror::Error, Debug)]
#[error("{op} failed{} at {location}: {kind}", describe_path(.path))]
pub struct StoreError {
    op: Operation,
    path: Option<PathBuf>,
    location: &'static Location<'static>,
    #[source]
    kind: ErrorKind,
}

fn describe_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" for '{}'", p.display()),
        None => String::new(),
    }
}

impl StoreError {
    pub(crate) fn new(
        op: Operation,
        path: Option<&Path>,
        location: &'static Location<'static>,
        kind: ErrorKind,
    ) -> Self {
        StoreError {
            op,
            path: path.map(Path::to_path_buf),
            location,
            kind,
        }
    }

    pub fn operation(&self) -> Operation {
        self.op
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Source location of the call into the store that failed.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(&self.kind, ErrorKind::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
