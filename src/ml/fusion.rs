// ============================================================
// Layer 5 — Fully-Aware Fusion Encoder
// ============================================================
// Takes the reading-stage hiddens and produces the final
// document representation the span decoder reads.
//
//   history (word, contextual, low, high) for doc and question
//       │
//       ├─ low-level attention     → values: question low hiddens
//       ├─ high-level attention    → values: question high hiddens
//       └─ understanding attention → values: question understanding
//       │
//       ▼
//   multi-level BiRNN over [doc low, doc high, 3 attention vectors]
//       │
//       ▼
//   self-boosted attention over the extended doc history
//       │  (values: multi-level hiddens, keys masked by doc padding)
//       ▼
//   understanding BiRNN over [multi-level, self-boosted]
//
// The three level attentions share nothing but their inputs:
// each has its own projection.

use burn::prelude::*;

use crate::ml::attention::{SymmetricBilinearMatch, SymmetricBilinearMatchConfig};
use crate::ml::encoder::{RnnType, StackedBrnn, StackedBrnnConfig};
use crate::ml::history::History;
use crate::ml::mask::PaddingMask;

#[derive(Config, Debug)]
pub struct FusionEncoderConfig {
    /// Width of the word-level history shared by document and question.
    pub history_dim: usize,
    pub attention_size: usize,
    pub hidden_size: usize,
    /// Width of the low-level reading output (document and question agree).
    pub low_level_dim: usize,
    #[config(default = false)]
    pub exclude_self_match: bool,
    #[config(default = false)]
    pub padding: bool,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type: RnnType,
}

impl FusionEncoderConfig {
    /// Width of the extended document history fed to self-boosted attention.
    pub fn self_boosted_history_dim(&self) -> usize {
        self.history_dim + self.low_level_dim + 3 * 2 * self.hidden_size
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> FusionEncoder<B> {
        let level = SymmetricBilinearMatchConfig::new(self.history_dim, self.attention_size);
        let h2 = 2 * self.hidden_size;

        let rnn = |input: usize| {
            StackedBrnnConfig::new(input, self.hidden_size)
                .with_padding(self.padding)
                .with_rnn_type(self.rnn_type)
                .init(device)
        };

        FusionEncoder {
            low_level_attention:    level.init(device),
            high_level_attention:   level.init(device),
            understanding_attention: level.init(device),
            multi_level_rnn: rnn(2 * self.low_level_dim + 3 * h2),
            self_boosted_attention: SymmetricBilinearMatchConfig::new(
                self.self_boosted_history_dim(),
                self.attention_size,
            )
            .with_exclude_diagonal(self.exclude_self_match)
            .init(device),
            understanding_doc_rnn: rnn(2 * h2),
        }
    }
}

/// Reading-stage outputs the fusion encoder consumes.
#[derive(Debug, Clone)]
pub struct ReadingState<B: Backend> {
    pub doc_history:            History<B>,
    pub question_history:       History<B>,
    pub doc_low:                Tensor<B, 3>,
    pub doc_high:               Tensor<B, 3>,
    pub question_low:           Tensor<B, 3>,
    pub question_high:          Tensor<B, 3>,
    pub question_understanding: Tensor<B, 3>,
}

#[derive(Module, Debug)]
pub struct FusionEncoder<B: Backend> {
    low_level_attention:     SymmetricBilinearMatch<B>,
    high_level_attention:    SymmetricBilinearMatch<B>,
    understanding_attention: SymmetricBilinearMatch<B>,
    multi_level_rnn:         StackedBrnn<B>,
    self_boosted_attention:  SymmetricBilinearMatch<B>,
    understanding_doc_rnn:   StackedBrnn<B>,
}

impl<B: Backend> FusionEncoder<B> {
    /// → [batch, len_d, 2·hidden]
    pub fn forward(
        &self,
        state:         ReadingState<B>,
        doc_mask:      &PaddingMask<B>,
        question_mask: &PaddingMask<B>,
    ) -> Tensor<B, 3> {
        let doc_history      = state.doc_history.concat();
        let question_history = state.question_history.concat();

        let low_vectors = self.low_level_attention.forward(
            doc_history.clone(), question_history.clone(), question_mask, state.question_low,
        );
        let high_vectors = self.high_level_attention.forward(
            doc_history.clone(), question_history.clone(), question_mask, state.question_high,
        );
        let understanding_vectors = self.understanding_attention.forward(
            doc_history, question_history, question_mask, state.question_understanding,
        );

        let fused = self.multi_level_rnn.forward(
            Tensor::cat(
                vec![
                    state.doc_low,
                    state.doc_high,
                    low_vectors.clone(),
                    high_vectors.clone(),
                    understanding_vectors.clone(),
                ],
                2,
            ),
            doc_mask,
        );

        let boosted_history = state
            .doc_history
            .extended([low_vectors, high_vectors, understanding_vectors, fused.clone()])
            .concat();
        let self_boosted = self.self_boosted_attention.forward(
            boosted_history.clone(), boosted_history, doc_mask, fused.clone(),
        );

        self.understanding_doc_rnn
            .forward(Tensor::cat(vec![fused, self_boosted], 2), doc_mask)
    }

    /// Low, high and understanding attention weights, [batch, len_d, len_q] each.
    pub fn level_weights(
        &self,
        state:         &ReadingState<B>,
        question_mask: &PaddingMask<B>,
    ) -> [Tensor<B, 3>; 3] {
        let doc      = state.doc_history.concat();
        let question = state.question_history.concat();
        [
            self.low_level_attention.weights(doc.clone(), question.clone(), question_mask),
            self.high_level_attention.weights(doc.clone(), question.clone(), question_mask),
            self.understanding_attention.weights(doc, question, question_mask),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    fn random(shape: [usize; 3]) -> Tensor<TestBackend, 3> {
        Tensor::random(shape, Distribution::Normal(0.0, 1.0), &Default::default())
    }

    /// history = word(3) + low(4) + high(4)
    fn state(batch: usize, len_d: usize, len_q: usize) -> ReadingState<TestBackend> {
        let doc_low  = random([batch, len_d, 4]);
        let doc_high = random([batch, len_d, 4]);
        let q_low    = random([batch, len_q, 4]);
        let q_high   = random([batch, len_q, 4]);
        ReadingState {
            doc_history:            History::new([random([batch, len_d, 3]), doc_low.clone(), doc_high.clone()]),
            question_history:       History::new([random([batch, len_q, 3]), q_low.clone(), q_high.clone()]),
            doc_low,
            doc_high,
            question_low:           q_low,
            question_high:          q_high,
            question_understanding: random([batch, len_q, 4]),
        }
    }

    fn config() -> FusionEncoderConfig {
        FusionEncoderConfig::new(11, 5, 2, 4)
    }

    #[test]
    fn test_fusion_output_shape() {
        let device  = Default::default();
        let encoder = config().init::<TestBackend>(&device);
        let out = encoder.forward(
            state(2, 5, 3),
            &PaddingMask::from_lengths(&[5, 4], 5, &device),
            &PaddingMask::from_lengths(&[3, 2], 3, &device),
        );
        assert_eq!(out.dims(), [2, 5, 4]);
        let out: Vec<f32> = out.into_data().iter::<f32>().collect();
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_self_boosted_history_width() {
        // 11 history + 4 low vectors + 3 × (2·2) for high, understanding, fused
        assert_eq!(config().self_boosted_history_dim(), 27);
    }

    #[test]
    fn test_padded_document_rows_still_attend() {
        // Cross-attention masks only the question side: a padded document
        // position still gets a full distribution over the question.
        let device  = Default::default();
        let encoder = config().init::<TestBackend>(&device);
        let state   = state(1, 5, 3);
        let q_mask  = PaddingMask::from_lengths(&[3], 3, &device);

        for weights in encoder.level_weights(&state, &q_mask) {
            let w: Vec<f32> = weights.into_data().iter::<f32>().collect();
            let padded_row = &w[4 * 3..5 * 3];
            assert!((padded_row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }
}
