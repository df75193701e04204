// ============================================================
// Layer 5 — Contextual Embedding Provider
// ============================================================
// The reader can append pretrained contextual vectors to its
// word embeddings. The provider is opaque to the reader: it only
// needs token ids and lengths in, one vector per token out.
//
// ContextualBiLstm is the bundled provider: its own embedding
// table feeding a two-layer bidirectional LSTM, the shape of a
// machine-translation encoder reused for reading. It is frozen:
// parameters are marked no_grad and the output is detached, so
// no gradient ever reaches it from the reader.

use burn::{module::Module, nn::Embedding, prelude::*};

use crate::ml::encoder::{StackedBrnn, StackedBrnnConfig};
use crate::ml::mask::PaddingMask;
use crate::ml::model::padded_embedding;

/// Anything that maps a padded token batch to per-token vectors.
pub trait ContextualEncoder<B: Backend> {
    /// Width of each produced vector.
    fn output_dim(&self) -> usize;

    /// `token_ids`: [batch, len] → [batch, len, output_dim]
    fn encode(&self, token_ids: Tensor<B, 2, Int>, mask: &PaddingMask<B>) -> Tensor<B, 3>;
}

#[derive(Config, Debug)]
pub struct ContextualBiLstmConfig {
    pub vocab_size:    usize,
    pub embedding_dim: usize,
    /// Must be even: half per direction.
    pub output_dim: usize,
}

impl ContextualBiLstmConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ContextualBiLstm<B> {
        let encoder = StackedBrnnConfig::new(self.embedding_dim, self.output_dim / 2)
            .with_num_layers(2)
            .with_padding(true)
            .init(device);

        ContextualBiLstm {
            embedding: padded_embedding(self.vocab_size, self.embedding_dim, device),
            encoder,
        }
        .no_grad()
    }
}

#[derive(Module, Debug)]
pub struct ContextualBiLstm<B: Backend> {
    embedding: Embedding<B>,
    encoder:   StackedBrnn<B>,
}

impl<B: Backend> ContextualEncoder<B> for ContextualBiLstm<B> {
    fn output_dim(&self) -> usize {
        self.encoder.output_size()
    }

    fn encode(&self, token_ids: Tensor<B, 2, Int>, mask: &PaddingMask<B>) -> Tensor<B, 3> {
        let embedded = self.embedding.forward(token_ids);
        self.encoder.forward(embedded, mask).detach()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_contextual_vectors_per_token() {
        let device  = Default::default();
        let encoder = ContextualBiLstmConfig::new(20, 6, 8).init::<TestBackend>(&device);
        let ids = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![3i64, 4, 5, 7, 0, 0], [2, 3]),
            &device,
        );
        let mask = PaddingMask::from_lengths(&[3, 1], 3, &device);

        assert_eq!(encoder.output_dim(), 8);
        let out = encoder.encode(ids, &mask);
        assert_eq!(out.dims(), [2, 3, 8]);

        let out: Vec<f32> = out.into_data().iter::<f32>().collect();
        // padding positions of item 1 stay zero
        assert!(out[24 + 8..].iter().all(|v| *v == 0.0));
    }
}
