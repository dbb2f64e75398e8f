//! Loads a corpus file: UTF-8, one document per line.

use std::fs;
use std::path::Path;

use tracing::debug;

use super::super::{Data, DataError, DataItem, DataLoader};

/// Reads a file, trims every line and keeps the non-blank ones as documents.
#[derive(Clone, Debug)]
pub struct PathLoader<P>(pub P);

impl<P> PathLoader<P>
where
    P: AsRef<Path>,
{
    #[must_use]
    pub fn new(path: P) -> Self {
        PathLoader(path)
    }
}

impl<P> DataLoader for PathLoader<P>
where
    P: AsRef<Path>,
{
    fn load(&self) -> Result<Data, DataError> {
        let path = self.0.as_ref();
        let content = fs::read_to_string(path).map_err(|source| DataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let items = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(DataItem::new)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(path = %path.display(), documents = items.len(), "corpus loaded");
        Data::new(items)
    }
}

/// [`PathLoader::load`] in one call.
///
/// # Errors
///
/// - [`DataError::Read`] when the path cannot be read or is not valid UTF-8.
/// - [`DataError::NoDocuments`] when the file has no non-blank line.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Data, DataError> {
    PathLoader::new(path).load()
}
