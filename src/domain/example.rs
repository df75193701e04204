// ============================================================
// Layer 3 — ReaderExample Domain Type
// ============================================================
// One reading-comprehension input: a document and a question,
// both as token ids, plus optional per-token document features
// (exact match, part of speech, term frequency, ...).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderExample {
    /// Caller-chosen identifier, echoed back with predictions.
    pub id: String,

    /// Document token ids. 0 is reserved for padding.
    pub document: Vec<u32>,

    /// One feature row per document token. Missing rows or columns are
    /// treated as zeros; an empty list means "no features".
    #[serde(default)]
    pub features: Vec<Vec<f32>>,

    /// Question token ids.
    pub question: Vec<u32>,
}

impl ReaderExample {
    /// An example without document features.
    pub fn new(id: impl Into<String>, document: Vec<u32>, question: Vec<u32>) -> Self {
        Self {
            id: id.into(),
            document,
            features: Vec::new(),
            question,
        }
    }

    /// Largest token id used anywhere in the example, if any.
    pub fn max_token_id(&self) -> Option<u32> {
        self.document.iter().chain(&self.question).copied().max()
    }
}
