use burn::prelude::*;

/// History-of-word: every representation computed so far for each token.
///
/// Immutable. `extended` returns a new history so each stage's attention
/// input is a pure function of earlier outputs. Parts are concatenated
/// along the feature axis only when asked for.
#[derive(Debug, Clone)]
pub struct History<B: Backend> {
    parts: Vec<Tensor<B, 3>>,
}

impl<B: Backend> History<B> {
    pub fn new(parts: impl IntoIterator<Item = Tensor<B, 3>>) -> Self {
        Self { parts: parts.into_iter().collect() }
    }

    pub fn extended(&self, more: impl IntoIterator<Item = Tensor<B, 3>>) -> Self {
        let mut parts = self.parts.clone();
        parts.extend(more);
        Self { parts }
    }

    /// [batch, len, dim]
    pub fn concat(&self) -> Tensor<B, 3> {
        Tensor::cat(self.parts.clone(), 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_extension_leaves_original_untouched() {
        let device = Default::default();
        let word   = Tensor::<TestBackend, 3>::ones([1, 2, 3], &device);
        let hidden = Tensor::<TestBackend, 3>::zeros([1, 2, 4], &device);

        let base     = History::new([word]);
        let extended = base.extended([hidden]);

        assert_eq!(base.concat().dims(), [1, 2, 3]);
        assert_eq!(extended.concat().dims(), [1, 2, 7]);

        // Parts keep their order in the concatenation.
        let row: Vec<f32> = extended.concat().into_data().iter::<f32>().take(7).collect();
        assert_eq!(row, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }
}
