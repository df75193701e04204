// ============================================================
// Layer 5 — Attention Primitives
// ============================================================
// Everything the reader normalizes goes through `masked_softmax`:
//
//   SymmetricBilinearMatch — relu(xW)·relu(yW)ᵗ over two sequences,
//                            then a weighted sum of a value sequence.
//                            Used for aligned question embeddings,
//                            the three fusion levels and self-boosting.
//   LinearSeqAttn          — one score per position (question pooling)
//   BilinearSeqAttn        — xᵢ·(W y) per position (span start / end)
//
// Masked positions get exactly zero weight. A row with no valid
// position at all comes out as all zeros instead of NaN, because
// the denominator carries a small epsilon.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::mask::PaddingMask;

/// Fill value for masked scores before the max-shift. Finite so that a
/// fully masked row never computes `-inf - -inf`.
const MASKED_SCORE: f32 = -1.0e30;

/// Keeps the normalizer non-zero for fully masked rows.
const NORMALIZER_EPS: f64 = 1.0e-13;

/// Softmax along `dim` restricted to positions where `valid` is 1.0.
///
/// `valid` must have the same shape as `scores`.
pub fn masked_softmax<B: Backend, const D: usize>(
    scores: Tensor<B, D>,
    valid:  Tensor<B, D>,
    dim:    usize,
) -> Tensor<B, D> {
    let filled  = scores.mask_fill(valid.clone().equal_elem(0.0), MASKED_SCORE);
    let shifted = filled.clone() - filled.max_dim(dim);
    let exp     = shifted.exp() * valid;
    let denom   = exp.clone().sum_dim(dim).add_scalar(NORMALIZER_EPS);
    exp / denom
}

/// `x`: [batch, len, dim], `weights`: [batch, len] → [batch, dim]
pub fn weighted_avg<B: Backend>(x: Tensor<B, 3>, weights: Tensor<B, 2>) -> Tensor<B, 2> {
    let [batch, _, dim] = x.dims();
    weights.unsqueeze_dim::<3>(1).matmul(x).reshape([batch, dim])
}

// ─── SymmetricBilinearMatch ─────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct SymmetricBilinearMatchConfig {
    pub input_dim:     usize,
    pub attention_dim: usize,
    /// Mask `j == i`. Only meaningful when both sides are the same sequence.
    #[config(default = false)]
    pub exclude_diagonal: bool,
}

impl SymmetricBilinearMatchConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SymmetricBilinearMatch<B> {
        SymmetricBilinearMatch {
            projection:       LinearConfig::new(self.input_dim, self.attention_dim).init(device),
            exclude_diagonal: self.exclude_diagonal,
        }
    }
}

/// Fully-aware attention with one projection shared by both sides.
#[derive(Module, Debug)]
pub struct SymmetricBilinearMatch<B: Backend> {
    projection:       Linear<B>,
    exclude_diagonal: bool,
}

impl<B: Backend> SymmetricBilinearMatch<B> {
    /// Normalized attention of every query position over the keys.
    ///
    /// `query`: [batch, len_a, input_dim], `key`: [batch, len_b, input_dim]
    /// → [batch, len_a, len_b], row-stochastic over unmasked keys.
    pub fn weights(
        &self,
        query:    Tensor<B, 3>,
        key:      Tensor<B, 3>,
        key_mask: &PaddingMask<B>,
    ) -> Tensor<B, 3> {
        let device = query.device();
        let projected_query = relu(self.projection.forward(query));
        let projected_key   = relu(self.projection.forward(key));
        let scores = projected_query.matmul(projected_key.swap_dims(1, 2));

        let [batch, len_a, len_b] = scores.dims();
        let mut valid = key_mask.valid().unsqueeze_dim::<3>(1).expand([batch, len_a, len_b]);
        if self.exclude_diagonal {
            valid = valid * off_diagonal::<B>(len_a, len_b, &device)
                .unsqueeze::<3>()
                .expand([batch, len_a, len_b]);
        }

        masked_softmax(scores, valid, 2)
    }

    /// `values`: [batch, len_b, value_dim] aligned with `key`
    /// → [batch, len_a, value_dim]
    pub fn forward(
        &self,
        query:    Tensor<B, 3>,
        key:      Tensor<B, 3>,
        key_mask: &PaddingMask<B>,
        values:   Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        self.weights(query, key, key_mask).matmul(values)
    }
}

fn off_diagonal<B: Backend>(rows: usize, cols: usize, device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f32> = (0..rows)
        .flat_map(|i| (0..cols).map(move |j| if i == j { 0.0 } else { 1.0 }))
        .collect();
    Tensor::from_data(TensorData::new(data, [rows, cols]), device)
}

// ─── LinearSeqAttn ──────────────────────────────────────────────────────────

/// Self-attention pooling weights over one sequence.
#[derive(Module, Debug)]
pub struct LinearSeqAttn<B: Backend> {
    scorer: Linear<B>,
}

impl<B: Backend> LinearSeqAttn<B> {
    pub fn new(input_dim: usize, device: &B::Device) -> Self {
        Self { scorer: LinearConfig::new(input_dim, 1).init(device) }
    }

    /// `x`: [batch, len, dim] → [batch, len]
    pub fn forward(&self, x: Tensor<B, 3>, mask: &PaddingMask<B>) -> Tensor<B, 2> {
        let [batch, len, _] = x.dims();
        let scores = self.scorer.forward(x).reshape([batch, len]);
        masked_softmax(scores, mask.valid(), 1)
    }
}

// ─── BilinearSeqAttn ────────────────────────────────────────────────────────

/// Distribution over sequence positions conditioned on one vector per item.
#[derive(Module, Debug)]
pub struct BilinearSeqAttn<B: Backend> {
    bilinear: Linear<B>,
}

impl<B: Backend> BilinearSeqAttn<B> {
    pub fn new(x_dim: usize, y_dim: usize, device: &B::Device) -> Self {
        Self { bilinear: LinearConfig::new(y_dim, x_dim).init(device) }
    }

    /// `x`: [batch, len, x_dim], `y`: [batch, y_dim] → [batch, len]
    pub fn forward(&self, x: Tensor<B, 3>, y: Tensor<B, 2>, mask: &PaddingMask<B>) -> Tensor<B, 2> {
        let [batch, len, _] = x.dims();
        let wy = self.bilinear.forward(y).unsqueeze_dim::<3>(2);
        let scores = x.matmul(wy).reshape([batch, len]);
        masked_softmax(scores, mask.valid(), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{backend::NdArray, tensor::Distribution};

    type TestBackend = NdArray;

    fn rows(t: Tensor<TestBackend, 3>) -> Vec<Vec<f32>> {
        let [_, _, cols] = t.dims();
        let flat: Vec<f32> = t.into_data().iter::<f32>().collect();
        flat.chunks(cols).map(|c| c.to_vec()).collect()
    }

    #[test]
    fn test_masked_softmax_ignores_padding() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 100.0], [1, 3]),
            &device,
        );
        let valid = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 1.0, 0.0], [1, 3]),
            &device,
        );
        let p: Vec<f32> = masked_softmax(scores, valid, 1).into_data().iter::<f32>().collect();
        assert_eq!(p[2], 0.0);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-5);
        assert!(p[1] > p[0]);
    }

    #[test]
    fn test_fully_masked_row_is_zero_not_nan() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![0.3f32, -4.0], [1, 2]),
            &device,
        );
        let valid = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let p: Vec<f32> = masked_softmax(scores, valid, 1).into_data().iter::<f32>().collect();
        assert!(p.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_cross_attention_rows_sum_to_one() {
        let device = Default::default();
        let attn = SymmetricBilinearMatchConfig::new(6, 5).init::<TestBackend>(&device);
        let doc   = Tensor::<TestBackend, 3>::random([2, 4, 6], Distribution::Normal(0.0, 1.0), &device);
        let quest = Tensor::<TestBackend, 3>::random([2, 3, 6], Distribution::Normal(0.0, 1.0), &device);
        let mask  = PaddingMask::from_lengths(&[3, 2], 3, &device);

        let weights = attn.weights(doc, quest, &mask);
        assert_eq!(weights.dims(), [2, 4, 3]);

        for (r, row) in rows(weights).iter().enumerate() {
            let item = r / 4;
            let real = [3, 2][item];
            let sum: f32 = row[..real].iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "row {r} sums to {sum}");
            assert!(row[real..].iter().all(|w| *w == 0.0));
        }
    }

    #[test]
    fn test_forward_is_weighted_sum_of_values() {
        let device = Default::default();
        let attn   = SymmetricBilinearMatchConfig::new(4, 4).init::<TestBackend>(&device);
        let doc    = Tensor::<TestBackend, 3>::random([1, 2, 4], Distribution::Normal(0.0, 1.0), &device);
        let quest  = Tensor::<TestBackend, 3>::random([1, 3, 4], Distribution::Normal(0.0, 1.0), &device);
        // Only the first key is real, so every row copies the first value.
        let mask   = PaddingMask::from_lengths(&[1], 3, &device);
        let values = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 10.0, 20.0, 30.0, 40.0], [1, 3, 2]),
            &device,
        );
        let out: Vec<f32> = attn.forward(doc, quest, &mask, values).into_data().iter::<f32>().collect();
        for pair in out.chunks(2) {
            assert!((pair[0] - 1.0).abs() < 1e-5);
            assert!((pair[1] - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_self_attention_diagonal_exclusion() {
        let device = Default::default();
        let attn = SymmetricBilinearMatchConfig::new(4, 3)
            .with_exclude_diagonal(true)
            .init::<TestBackend>(&device);
        let doc  = Tensor::<TestBackend, 3>::random([1, 3, 4], Distribution::Normal(0.0, 1.0), &device);
        let mask = PaddingMask::from_lengths(&[3], 3, &device);

        let weights = rows(attn.weights(doc.clone(), doc, &mask));
        for (i, row) in weights.iter().enumerate() {
            assert_eq!(row[i], 0.0);
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_self_attention_keeps_diagonal_by_default() {
        let device = Default::default();
        let attn = SymmetricBilinearMatchConfig::new(4, 3).init::<TestBackend>(&device);
        let doc  = Tensor::<TestBackend, 3>::random([1, 1, 4], Distribution::Normal(0.0, 1.0), &device);
        let mask = PaddingMask::from_lengths(&[1], 1, &device);

        // A single-token document can only attend to itself.
        let weights = rows(attn.weights(doc.clone(), doc, &mask));
        assert!((weights[0][0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_linear_pooling_masks_padding() {
        let device = Default::default();
        let pool = LinearSeqAttn::<TestBackend>::new(4, &device);
        let x    = Tensor::<TestBackend, 3>::random([2, 3, 4], Distribution::Normal(0.0, 1.0), &device);
        let mask = PaddingMask::from_lengths(&[3, 1], 3, &device);

        let w: Vec<f32> = pool.forward(x, &mask).into_data().iter::<f32>().collect();
        assert!((w[0] + w[1] + w[2] - 1.0).abs() < 1e-5);
        assert!((w[3] - 1.0).abs() < 1e-5);
        assert_eq!(w[4], 0.0);
        assert_eq!(w[5], 0.0);
    }

    #[test]
    fn test_bilinear_distribution_shape() {
        let device = Default::default();
        let attn = BilinearSeqAttn::<TestBackend>::new(4, 6, &device);
        let x    = Tensor::<TestBackend, 3>::random([2, 5, 4], Distribution::Normal(0.0, 1.0), &device);
        let y    = Tensor::<TestBackend, 2>::random([2, 6], Distribution::Normal(0.0, 1.0), &device);
        let mask = PaddingMask::from_lengths(&[5, 4], 5, &device);

        let p = attn.forward(x, y, &mask);
        assert_eq!(p.dims(), [2, 5]);
        let p: Vec<f32> = p.into_data().iter::<f32>().collect();
        assert!((p[..5].iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((p[5..9].iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(p[9], 0.0);
    }

    #[test]
    fn test_weighted_avg() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 1.0], [1, 2, 2]),
            &device,
        );
        let w = Tensor::<TestBackend, 2>::from_data(TensorData::new(vec![0.25f32, 0.75], [1, 2]), &device);
        let avg: Vec<f32> = weighted_avg(x, w).into_data().iter::<f32>().collect();
        assert!((avg[0] - 0.25).abs() < 1e-6);
        assert!((avg[1] - 0.75).abs() < 1e-6);
    }
}
