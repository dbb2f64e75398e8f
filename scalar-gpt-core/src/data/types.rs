//! [`DataItem`] (one document) and [`Data`] (a non-empty corpus).

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use super::DataError;

/// One training document: a trimmed, non-empty line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DataItem(String);

impl DataItem {
    /// Trims `line` and wraps it.
    ///
    /// # Errors
    ///
    /// - [`DataError::BlankDocument`] when `line` is empty or only whitespace.
    pub fn new(line: &str) -> Result<Self, DataError> {
        let s = line.trim();
        if s.is_empty() {
            return Err(DataError::BlankDocument);
        }
        Ok(DataItem(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A corpus of at least one document.
#[derive(Clone, Debug)]
pub struct Data(Vec<DataItem>);

impl Data {
    /// # Errors
    ///
    /// - [`DataError::NoDocuments`] when `items` is empty.
    pub fn new(items: Vec<DataItem>) -> Result<Self, DataError> {
        if items.is_empty() {
            return Err(DataError::NoDocuments);
        }
        Ok(Data(items))
    }

    /// Number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed [`Data`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[DataItem] {
        &self.0
    }

    /// Documents as string slices.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.0.iter().map(DataItem::as_str).collect()
    }

    /// All documents concatenated (the text a character vocabulary is built from).
    #[must_use]
    pub fn corpus(&self) -> String {
        self.0.iter().map(DataItem::as_str).collect()
    }

    /// Shuffles document order in place.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.0.shuffle(rng);
    }
}
