// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Steps:
//   1. Load examples from the source (JSON file or synthetic)
//   2. Build an inferencer on the requested device
//   3. Rank spans batch by batch
//
// Out-of-vocabulary ids and empty sequences are rejected by the
// reader itself; errors here only add which examples were involved.

use anyhow::{Context, Result};
use burn::prelude::*;

use crate::domain::span::Prediction;
use crate::domain::traits::{ExampleSource, SpanPredictor};
use crate::ml::inferencer::Inferencer;
use crate::ml::model::ReaderConfig;

pub struct PredictUseCase {
    cfg:        ReaderConfig,
    top_n:      usize,
    batch_size: usize,
}

impl PredictUseCase {
    pub fn new(cfg: ReaderConfig, top_n: usize, batch_size: usize) -> Self {
        Self { cfg, top_n, batch_size: batch_size.max(1) }
    }

    pub fn execute<B: Backend>(
        &self,
        source: &dyn ExampleSource,
        device: B::Device,
    ) -> Result<Vec<Prediction>> {
        // ── Step 1: Load examples ─────────────────────────────────────────────
        let examples = source.load_all()?;
        if examples.is_empty() {
            tracing::warn!("No examples to predict on");
            return Ok(Vec::new());
        }

        // ── Step 2: Build inferencer ──────────────────────────────────────────
        let inferencer = Inferencer::<B>::new(&self.cfg, device)?;

        // ── Step 3: Predict ───────────────────────────────────────────────────
        let mut predictions = Vec::with_capacity(examples.len());
        for (i, chunk) in examples.chunks(self.batch_size).enumerate() {
            tracing::debug!("Batch {} ({} examples)", i + 1, chunk.len());
            let batch = inferencer.predict(chunk, self.top_n).with_context(|| {
                let ids: Vec<&str> = chunk.iter().map(|e| e.id.as_str()).collect();
                format!("Cannot predict batch {} ({})", i + 1, ids.join(", "))
            })?;
            predictions.extend(batch);
        }

        tracing::info!("Predicted spans for {} examples", predictions.len());
        Ok(predictions)
    }
}
