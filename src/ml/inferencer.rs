// ============================================================
// Layer 5 — Inferencer
// ============================================================
use burn::prelude::*;

use crate::data::batcher::ReaderBatcher;
use crate::domain::example::ReaderExample;
use crate::domain::span::{PredictedSpan, Prediction};
use crate::domain::traits::SpanPredictor;
use crate::error::{ReaderError, ReaderResult};
use crate::ml::decoder::ForwardMode;
use crate::ml::model::{FusionNetReader, ReaderConfig};

pub struct Inferencer<B: Backend> {
    model:        FusionNetReader<B>,
    batcher:      ReaderBatcher,
    max_span_len: usize,
    device:       B::Device,
}

impl<B: Backend> Inferencer<B> {
    /// Build a reader with freshly initialised weights.
    pub fn new(config: &ReaderConfig, device: B::Device) -> ReaderResult<Self> {
        let model = config.init::<B>(&device)?;
        Ok(Self::from_model(model, config, device))
    }

    pub fn from_model(model: FusionNetReader<B>, config: &ReaderConfig, device: B::Device) -> Self {
        Self {
            model,
            batcher:      ReaderBatcher::new(config.num_features),
            max_span_len: config.max_span_len,
            device,
        }
    }

    /// Top `top_n` spans per example, best first.
    pub fn predict_spans(&self, examples: &[ReaderExample], top_n: usize) -> ReaderResult<Vec<Prediction>> {
        if examples.is_empty() {
            return Ok(Vec::new());
        }

        let batch  = self.batcher.batch_examples(examples.to_vec(), &self.device);
        let [_, doc_len] = batch.doc_tokens.dims();
        let scores = self.model.forward(&batch, ForwardMode::Inference)?;

        let start = finite_scores(scores.start, "start")?;
        let end   = finite_scores(scores.end, "end")?;

        let predictions = examples
            .iter()
            .enumerate()
            .map(|(i, example)| {
                let row  = i * doc_len..i * doc_len + example.document.len();
                let spans = best_spans(&start[row.clone()], &end[row], top_n, self.max_span_len);
                if let Some(best) = spans.first() {
                    tracing::debug!(
                        "{}: span [{}, {}] score={:.4}", example.id, best.start, best.end, best.score
                    );
                }
                Prediction { id: example.id.clone(), spans }
            })
            .collect();

        Ok(predictions)
    }
}

impl<B: Backend> SpanPredictor for Inferencer<B> {
    fn predict(&self, examples: &[ReaderExample], top_n: usize) -> anyhow::Result<Vec<Prediction>> {
        Ok(self.predict_spans(examples, top_n)?)
    }
}

fn finite_scores<B: Backend>(scores: Tensor<B, 2>, which: &'static str) -> ReaderResult<Vec<f32>> {
    let values: Vec<f32> = scores.into_data().iter::<f32>().collect();
    if values.iter().all(|v| v.is_finite()) {
        Ok(values)
    } else {
        Err(ReaderError::NonFinite(which))
    }
}

/// Exhaustive span search over one document.
///
/// Candidates satisfy `start <= end < start + max_span_len` and score
/// `start[s] * end[e]`. Equal scores prefer the earlier start, then the
/// earlier end.
pub fn best_spans(start: &[f32], end: &[f32], top_n: usize, max_span_len: usize) -> Vec<PredictedSpan> {
    let len = start.len().min(end.len());
    if top_n == 0 || len == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<PredictedSpan> = (0..len)
        .flat_map(|s| {
            (s..s.saturating_add(max_span_len).min(len)).map(move |e| PredictedSpan {
                start: s,
                end:   e,
                score: start[s] * end[e],
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
    });
    candidates.truncate(top_n);
    candidates
}
