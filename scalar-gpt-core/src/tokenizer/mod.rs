//! Text ↔ token ids.

mod error;
mod impls;
mod vocab;

pub use error::TokenizerError;
pub use impls::CharTokenizer;
pub use vocab::Vocab;

/// Encodes text to ids and decodes ids to text.
pub trait Tokenizer {
    /// # Errors
    ///
    /// - [`TokenizerError::UnknownChar`] for a character outside the vocabulary.
    fn encode(&self, s: &str) -> Result<Vec<usize>, TokenizerError>;

    /// # Errors
    ///
    /// - [`TokenizerError::InvalidId`] for an id outside the vocabulary.
    fn decode(&self, ids: &[usize]) -> Result<String, TokenizerError>;

    /// Number of ids, including BOS.
    fn vocab_size(&self) -> usize;

    /// Id that starts (and ends) every training document.
    fn bos_id(&self) -> usize;

    /// `[BOS, encode(doc)..., BOS]`: the training sequence for one document.
    ///
    /// # Errors
    ///
    /// See [`Tokenizer::encode`].
    fn encode_document(&self, doc: &str) -> Result<Vec<usize>, TokenizerError> {
        let mut ids = Vec::with_capacity(doc.len() + 2);
        ids.push(self.bos_id());
        ids.extend(self.encode(doc)?);
        ids.push(self.bos_id());
        Ok(ids)
    }
}
