//! Tokenizer errors.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    /// `encode` met a character the corpus never contained.
    UnknownChar {
        ch: char,
        /// Char index within the encoded text.
        position: usize,
    },

    /// `decode` met an id at or past `vocab_size`.
    InvalidId { id: usize, vocab_size: usize },
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::UnknownChar { ch, position } => {
                write!(f, "tokenizer: character {ch:?} at {position} is not in the vocabulary")
            }
            TokenizerError::InvalidId { id, vocab_size } => {
                write!(f, "tokenizer: id {id} out of range for vocabulary of {vocab_size}")
            }
        }
    }
}

impl std::error::Error for TokenizerError {}
