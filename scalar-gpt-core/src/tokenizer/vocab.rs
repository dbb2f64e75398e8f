//! Character vocabulary with a reserved BOS id.

use std::collections::BTreeSet;

/// Id 0 is BOS; ids `1..` are the distinct corpus characters in sorted order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vocab {
    bos: String,
    /// Sorted and distinct, so lookups are a binary search.
    chars: Vec<char>,
}

impl Vocab {
    /// Id reserved for BOS.
    pub const BOS_ID: usize = 0;

    /// Collects the distinct characters of `corpus`. `bos` is only used for decoding.
    #[must_use]
    pub fn from_corpus(corpus: &str, bos: &str) -> Self {
        let chars: BTreeSet<char> = corpus.chars().collect();
        Vocab {
            bos: bos.to_string(),
            chars: chars.into_iter().collect(),
        }
    }

    /// Number of ids, BOS included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len() + 1
    }

    /// `true` when the corpus contributed no characters (only BOS exists).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[must_use]
    pub fn id_of(&self, ch: char) -> Option<usize> {
        self.chars.binary_search(&ch).ok().map(|i| i + 1)
    }

    /// Character for a non-BOS id.
    #[must_use]
    pub fn char_of(&self, id: usize) -> Option<char> {
        id.checked_sub(1).and_then(|i| self.chars.get(i).copied())
    }

    /// What BOS decodes to.
    #[must_use]
    pub fn bos_symbol(&self) -> &str {
        &self.bos
    }

    /// Corpus characters in id order (id = index + 1).
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}
