// ============================================================
// Layer 5 — Span Decoder
// ============================================================
// Two stages, strictly in order:
//
//   1. start = softmax_d( doc_i · W_s q )
//   2. memory = GRU( Σ_i start_i · doc_i , initial state q )
//      end   = softmax_d( doc_i · W_e memory )
//
// Stage 2 reads stage 1's output, so the two are never run
// side by side. Both softmaxes mask document padding.

use burn::{
    nn::gru::{Gru, GruConfig},
    prelude::*,
};

use crate::ml::attention::{weighted_avg, BilinearSeqAttn};
use crate::ml::mask::PaddingMask;

/// Added before the log in training mode.
pub const LOG_EPS: f64 = 1.0e-8;

/// Whether span scores come back as probabilities or log-probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardMode {
    /// `ln(p + 1e-8)`, ready for a negative log-likelihood loss.
    Training,
    /// Plain probabilities for span extraction.
    Inference,
}

/// Start and end distributions over document positions, [batch, len_d].
#[derive(Debug, Clone)]
pub struct SpanScores<B: Backend> {
    pub start: Tensor<B, 2>,
    pub end:   Tensor<B, 2>,
}

#[derive(Module, Debug)]
pub struct SpanDecoder<B: Backend> {
    start_attn:  BilinearSeqAttn<B>,
    memory_cell: Gru<B>,
    end_attn:    BilinearSeqAttn<B>,
}

impl<B: Backend> SpanDecoder<B> {
    /// `doc_dim` is the width of the document hiddens, `question_dim` the
    /// width of the pooled question vector (and of the memory).
    pub fn new(doc_dim: usize, question_dim: usize, device: &B::Device) -> Self {
        Self {
            start_attn:  BilinearSeqAttn::new(doc_dim, question_dim, device),
            memory_cell: GruConfig::new(doc_dim, question_dim, true).init(device),
            end_attn:    BilinearSeqAttn::new(doc_dim, question_dim, device),
        }
    }

    pub fn forward(
        &self,
        doc:      Tensor<B, 3>,
        question: Tensor<B, 2>,
        doc_mask: &PaddingMask<B>,
        mode:     ForwardMode,
    ) -> SpanScores<B> {
        let [batch, _, _] = doc.dims();
        let [_, question_dim] = question.dims();

        let start = self.start_attn.forward(doc.clone(), question.clone(), doc_mask);

        let summary = weighted_avg(doc.clone(), start.clone()).unsqueeze_dim::<3>(1);
        let memory  = self.memory_cell
            .forward(summary, Some(question))
            .reshape([batch, question_dim]);

        let end = self.end_attn.forward(doc, memory, doc_mask);

        match mode {
            ForwardMode::Inference => SpanScores { start, end },
            ForwardMode::Training  => SpanScores {
                start: start.add_scalar(LOG_EPS).log(),
                end:   end.add_scalar(LOG_EPS).log(),
            },
        }
    }
}
