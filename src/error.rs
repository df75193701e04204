// ============================================================
// Reader Errors
// ============================================================
// Every failure the reader can surface from a forward pass or
// from building a model. None of these are transient: a bad
// shape or a degenerate sequence fails the same way every time,
// so callers should fix the input rather than retry.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReaderError {
    /// The configuration cannot describe a valid network.
    #[error("invalid reader configuration: {0}")]
    InvalidConfig(String),

    /// A tensor dimension disagrees with the configured size.
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what:     &'static str,
        expected: usize,
        actual:   usize,
    },

    /// Two inputs of the same forward call disagree on batch size or length.
    #[error("batch mismatch: {0}")]
    BatchMismatch(String),

    /// A batch item has no real tokens. Attention over it is undefined.
    #[error("{sequence} sequence of batch item {item} is entirely padding")]
    EmptySequence {
        sequence: &'static str,
        item:     usize,
    },

    /// A padding mask has a real token after a padding position.
    #[error("{sequence} mask of batch item {item} is not left-aligned")]
    NonContiguousPadding {
        sequence: &'static str,
        item:     usize,
    },

    /// A token id has no row in the embedding table.
    #[error("{sequence} token {token} of batch item {item} is outside the vocabulary of {vocab_size}")]
    TokenOutOfVocabulary {
        sequence:   &'static str,
        item:       usize,
        token:      i64,
        vocab_size: usize,
    },

    /// NaN or infinity reached the span distributions.
    #[error("non-finite value in {0} scores")]
    NonFinite(&'static str),
}

pub type ReaderResult<T> = Result<T, ReaderError>;
