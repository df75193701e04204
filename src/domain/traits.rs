// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to these traits, never to the
// concrete loader or the Burn-backed inferencer.

use anyhow::Result;

use crate::domain::example::ReaderExample;
use crate::domain::span::Prediction;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Anything that can hand over a set of tokenized examples.
///
/// Implementations:
///   - JsonExampleLoader → a JSON array on disk
///   - SyntheticExamples → random token ids for smoke runs
pub trait ExampleSource {
    fn load_all(&self) -> Result<Vec<ReaderExample>>;
}

// ─── SpanPredictor ────────────────────────────────────────────────────────────
/// Anything that can rank answer spans for a batch of examples.
///
/// Implementations:
///   - Inferencer → the FusionNet reader on a Burn backend
pub trait SpanPredictor {
    /// One prediction per example, in input order, each holding at most
    /// `top_n` spans.
    fn predict(&self, examples: &[ReaderExample], top_n: usize) -> Result<Vec<Prediction>>;
}
