// ============================================================
// Layer 4 — Reader Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<ReaderExample>
// into the tensors the reader consumes.
//
// Documents and questions have their own lengths, so padding
// happens here, per batch:
//
//   Input:  N examples, documents of length d_1..d_N,
//           questions of length q_1..q_N
//   Output: ReaderBatch with
//             doc_tokens      [N, max d]
//             doc_features    [N, max d, num_features]
//             question_tokens [N, max q]
//           and boolean masks where true marks padding.
//
// Real tokens always come first in a row; the padding id is 0.
// Empty sequences are kept (their row is all padding) so the
// model can report which item was empty.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::example::ReaderExample;

/// Token id written into padded positions.
pub const PAD_ID: u32 = 0;

// ─── ReaderBatch ──────────────────────────────────────────────────────────────
/// A padded batch of reader examples. Every tensor has the batch size
/// as its first dimension.
#[derive(Debug, Clone)]
pub struct ReaderBatch<B: Backend> {
    /// Document token ids — shape: [batch_size, doc_len]
    pub doc_tokens: Tensor<B, 2, Int>,

    /// Per-token document features — shape: [batch_size, doc_len, num_features].
    /// `None` when the reader is configured without features.
    pub doc_features: Option<Tensor<B, 3>>,

    /// true = padding — shape: [batch_size, doc_len]
    pub doc_mask: Tensor<B, 2, Bool>,

    /// Question token ids — shape: [batch_size, question_len]
    pub question_tokens: Tensor<B, 2, Int>,

    /// true = padding — shape: [batch_size, question_len]
    pub question_mask: Tensor<B, 2, Bool>,
}

// ─── ReaderBatcher ────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ReaderBatcher {
    /// Feature width every document token is padded or truncated to.
    pub num_features: usize,
}

impl ReaderBatcher {
    pub fn new(num_features: usize) -> Self {
        Self { num_features }
    }

    /// Pad and stack `items` on `device`.
    pub fn batch_examples<B: Backend>(
        &self,
        items:  Vec<ReaderExample>,
        device: &B::Device,
    ) -> ReaderBatch<B> {
        let batch_size = items.len();
        // A zero-width dimension would leave nothing to mask, so rows are
        // at least one position long.
        let doc_len      = items.iter().map(|e| e.document.len()).max().unwrap_or(0).max(1);
        let question_len = items.iter().map(|e| e.question.len()).max().unwrap_or(0).max(1);

        let (doc_tokens, doc_mask) = pad_sequences::<B>(
            items.iter().map(|e| e.document.as_slice()), batch_size, doc_len, device,
        );
        let (question_tokens, question_mask) = pad_sequences::<B>(
            items.iter().map(|e| e.question.as_slice()), batch_size, question_len, device,
        );

        let doc_features = (self.num_features > 0).then(|| {
            let flat: Vec<f32> = items
                .iter()
                .flat_map(|e| {
                    (0..doc_len).flat_map(move |pos| {
                        let row = e.features.get(pos).map(Vec::as_slice).unwrap_or(&[]);
                        (0..self.num_features).map(move |f| row.get(f).copied().unwrap_or(0.0))
                    })
                })
                .collect();
            Tensor::<B, 3>::from_data(
                TensorData::new(flat, [batch_size, doc_len, self.num_features]),
                device,
            )
        });

        ReaderBatch {
            doc_tokens,
            doc_features,
            doc_mask,
            question_tokens,
            question_mask,
        }
    }
}

/// Left-aligned token ids plus their padding mask.
fn pad_sequences<'a, B: Backend>(
    rows:       impl Iterator<Item = &'a [u32]>,
    batch_size: usize,
    len:        usize,
    device:     &B::Device,
) -> (Tensor<B, 2, Int>, Tensor<B, 2, Bool>) {
    let mut ids  = Vec::with_capacity(batch_size * len);
    let mut pads = Vec::with_capacity(batch_size * len);

    for row in rows {
        for pos in 0..len {
            match row.get(pos) {
                Some(&token) => { ids.push(token as i64); pads.push(false); }
                None         => { ids.push(PAD_ID as i64); pads.push(true); }
            }
        }
    }

    let tokens = Tensor::<B, 2, Int>::from_data(TensorData::new(ids, [batch_size, len]), device);
    let mask   = Tensor::<B, 2, Bool>::from_data(TensorData::new(pads, [batch_size, len]), device);
    (tokens, mask)
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
impl<B: Backend> Batcher<B, ReaderExample, ReaderBatch<B>> for ReaderBatcher {
    fn batch(&self, items: Vec<ReaderExample>, device: &B::Device) -> ReaderBatch<B> {
        self.batch_examples(items, device)
    }
}
