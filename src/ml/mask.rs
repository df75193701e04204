use burn::prelude::*;

use crate::error::{ReaderError, ReaderResult};

/// A boolean padding mask (`true` = padding) together with the real
/// length of every batch item.
///
/// Lengths are read back to the host once, at construction, because the
/// padding-aware encoder needs them to slice and regroup the batch.
#[derive(Debug, Clone)]
pub struct PaddingMask<B: Backend> {
    mask:    Tensor<B, 2, Bool>,
    lengths: Vec<usize>,
}

impl<B: Backend> PaddingMask<B> {
    /// Wrap `mask`, rejecting rows whose padding is not a suffix.
    pub fn new(mask: Tensor<B, 2, Bool>, sequence: &'static str) -> ReaderResult<Self> {
        let [batch, len] = mask.dims();
        let flags: Vec<f32> = mask.clone().float().into_data().iter::<f32>().collect();

        let mut lengths = Vec::with_capacity(batch);
        for item in 0..batch {
            let row = &flags[item * len..(item + 1) * len];
            let real = row.iter().take_while(|&&pad| pad < 0.5).count();
            if row[real..].iter().any(|&pad| pad < 0.5) {
                return Err(ReaderError::NonContiguousPadding { sequence, item });
            }
            lengths.push(real);
        }

        Ok(Self { mask, lengths })
    }

    /// Build a mask from per-item lengths, padding every row to `len`.
    pub fn from_lengths(lengths: &[usize], len: usize, device: &B::Device) -> Self {
        let flags: Vec<bool> = lengths
            .iter()
            .flat_map(|&real| (0..len).map(move |pos| pos >= real))
            .collect();
        let mask = Tensor::<B, 2, Bool>::from_data(
            TensorData::new(flags, [lengths.len(), len]),
            device,
        );
        Self { mask, lengths: lengths.iter().map(|&l| l.min(len)).collect() }
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn dims(&self) -> [usize; 2] {
        self.mask.dims()
    }

    /// 1.0 on real tokens, 0.0 on padding.
    pub fn valid(&self) -> Tensor<B, 2> {
        self.mask.clone().float().neg().add_scalar(1.0)
    }

    /// Fails on the first item with no real tokens.
    pub fn ensure_non_empty(&self, sequence: &'static str) -> ReaderResult<()> {
        match self.lengths.iter().position(|&l| l == 0) {
            Some(item) => Err(ReaderError::EmptySequence { sequence, item }),
            None       => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_lengths_from_mask() {
        let device = Default::default();
        let mask = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(vec![false, false, true, false, true, true], [2, 3]),
            &device,
        );
        let mask = PaddingMask::new(mask, "document").unwrap();
        assert_eq!(mask.lengths(), &[2, 1]);
    }

    #[test]
    fn test_rejects_interior_padding() {
        let device = Default::default();
        let mask = Tensor::<TestBackend, 2, Bool>::from_data(
            TensorData::new(vec![false, true, false], [1, 3]),
            &device,
        );
        let err = PaddingMask::new(mask, "question").unwrap_err();
        assert_eq!(err, ReaderError::NonContiguousPadding { sequence: "question", item: 0 });
    }

    #[test]
    fn test_empty_row_detected() {
        let device = Default::default();
        let mask = PaddingMask::<TestBackend>::from_lengths(&[3, 0], 3, &device);
        assert_eq!(mask.lengths(), &[3, 0]);
        assert_eq!(
            mask.ensure_non_empty("question"),
            Err(ReaderError::EmptySequence { sequence: "question", item: 1 }),
        );
    }

    #[test]
    fn test_valid_is_inverse_of_mask() {
        let device = Default::default();
        let mask = PaddingMask::<TestBackend>::from_lengths(&[2], 3, &device);
        let valid: Vec<f32> = mask.valid().into_data().iter::<f32>().collect();
        assert_eq!(valid, vec![1.0, 1.0, 0.0]);
    }
}
