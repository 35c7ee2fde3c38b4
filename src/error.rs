//! Error types for graph building, loading and runtime queries.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Node;

/// Main error type for roadgraph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Graph files must carry a `.json` extension.
    #[error("unsupported graph file {}: expected a .json file", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("invalid JSON: {0}")]
    Json(serde_json::Error),

    /// Well-formed JSON that does not describe a valid graph.
    #[error("malformed graph document: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("invalid round parameters: {0}")]
    Validation(String),

    #[error("no start/end pair found after {attempts} attempts")]
    Exhausted { attempts: u64 },

    #[error("node ({}, {}) is not part of the graph", .0.lat, .0.lon)]
    UnknownNode(Node),
}

/// Coarse classification of an [`Error`], for callers that translate errors into responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    Io,
    EmptyGraph,
    Validation,
    Exhaustion,
    Lookup,
}

impl ErrorKind {
    /// Errors caused by request parameters rather than by the graph or the host.
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            ErrorKind::Validation | ErrorKind::Exhaustion | ErrorKind::Lookup
        )
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedExtension(_)
            | Error::Json(_)
            | Error::Malformed(_) => ErrorKind::Format,
            Error::Io(_) => ErrorKind::Io,
            Error::EmptyGraph => ErrorKind::EmptyGraph,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Exhausted { .. } => ErrorKind::Exhaustion,
            Error::UnknownNode(_) => ErrorKind::Lookup,
        }
    }
}

/// Reader failures surfaced by `serde_json` stay I/O errors; everything else is a format error.
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        if e.is_io() {
            Error::Io(e.into())
        } else {
            Error::Json(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
