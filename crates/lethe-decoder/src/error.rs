//! Error taxonomy for engine operations.
//!
//! Errors are returned, never panicked, and the engine never partially
//! recovers: a failed descent yields no candidates rather than a
//! best-effort subset. Editors typically render every kind as "no
//! completions", but the structured kind lets upstream tooling log.

use std::fmt;

use lethe_syntax::Pos;

/// Error returned by engine operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) fn no_schema() -> Self {
        Self::new(ErrorKind::NoSchema)
    }

    pub(crate) fn unknown_file_format(filename: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownFileFormat {
            filename: filename.into(),
        })
    }

    pub(crate) fn file_not_found(filename: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileNotFound {
            filename: filename.into(),
        })
    }

    pub(crate) fn positional(filename: impl Into<String>, pos: Pos, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Positional {
            filename: filename.into(),
            pos,
            msg: msg.into(),
        })
    }

    pub(crate) fn unknown_block_type(block_type: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownBlockType {
            block_type: block_type.into(),
        })
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }
}

/// The distinguishable failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The path context has no root body schema.
    NoSchema,
    /// The file's body is not in the native dialect, or is the empty
    /// sentinel.
    UnknownFileFormat { filename: String },
    /// No file of that name is registered in the path context.
    FileNotFound { filename: String },
    /// Well-formed input, but the cursor sits somewhere uncompletable
    /// (a brace, header whitespace).
    Positional {
        filename: String,
        pos: Pos,
        msg: String,
    },
    /// Descent landed in a block whose type the schema does not know.
    UnknownBlockType { block_type: String },
    /// The request's cancellation token fired mid-walk.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::NoSchema => write!(f, "no schema available"),
            ErrorKind::UnknownFileFormat { filename } => {
                write!(f, "unsupported file format for {}", filename)
            }
            ErrorKind::FileNotFound { filename } => {
                write!(f, "file {} not found", filename)
            }
            ErrorKind::Positional { filename, pos, msg } => {
                write!(f, "{}:{}: {}", filename, pos, msg)
            }
            ErrorKind::UnknownBlockType { block_type } => {
                write!(f, "unknown block type {:?}", block_type)
            }
            ErrorKind::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for Error {}
