//! Character-level tokenizer.

use super::super::Vocab;
use super::super::{Tokenizer, TokenizerError};

/// One token per character. Id 0 is BOS; the corpus characters follow in sorted order,
/// so the same corpus always yields the same ids.
#[derive(Clone, Debug)]
pub struct CharTokenizer {
    vocab: Vocab,
}

impl CharTokenizer {
    /// BOS id.
    pub const BOS_ID: usize = Vocab::BOS_ID;

    /// Builds the vocabulary from every distinct character of `corpus`.
    ///
    /// `bos_symbol` is what BOS decodes to; it should not be a corpus character.
    #[must_use]
    pub fn from_corpus(corpus: &str, bos_symbol: &str) -> Self {
        CharTokenizer {
            vocab: Vocab::from_corpus(corpus, bos_symbol),
        }
    }

    /// The underlying table.
    #[must_use]
    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, s: &str) -> Result<Vec<usize>, TokenizerError> {
        s.chars()
            .enumerate()
            .map(|(position, ch)| {
                self.vocab
                    .id_of(ch)
                    .ok_or(TokenizerError::UnknownChar { ch, position })
            })
            .collect()
    }

    fn decode(&self, ids: &[usize]) -> Result<String, TokenizerError> {
        let mut text = String::with_capacity(ids.len());
        for &id in ids {
            if id == Self::BOS_ID {
                text.push_str(self.vocab.bos_symbol());
                continue;
            }
            let ch = self.vocab.char_of(id).ok_or(TokenizerError::InvalidId {
                id,
                vocab_size: self.vocab.len(),
            })?;
            text.push(ch);
        }
        Ok(text)
    }

    fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    fn bos_id(&self) -> usize {
        Self::BOS_ID
    }
}
