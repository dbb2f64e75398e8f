//! Corpus loading errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum DataError {
    /// The corpus file is missing, unreadable or not UTF-8.
    Read { path: PathBuf, source: io::Error },

    /// No document survived trimming.
    NoDocuments,

    /// A document is blank after trimming.
    BlankDocument,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Read { path, source } => {
                write!(f, "data: cannot read {}: {source}", path.display())
            }
            DataError::NoDocuments => write!(f, "data: corpus has no non-blank lines"),
            DataError::BlankDocument => write!(f, "data: blank document"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Read { source, .. } => Some(source),
            DataError::NoDocuments | DataError::BlankDocument => None,
        }
    }
}
