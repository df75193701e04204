// ============================================================
// Layer 4 — Synthetic Examples
// ============================================================
// Random tokenized examples for running the reader without a
// real dataset. Each question borrows a short run of tokens
// from its document so the two sequences overlap, the way a
// real question echoes its passage.

use anyhow::{bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::domain::example::ReaderExample;
use crate::domain::traits::ExampleSource;

#[derive(Debug, Clone)]
pub struct SyntheticExamples {
    pub count:        usize,
    pub vocab_size:   usize,
    pub num_features: usize,
    pub max_doc_len:  usize,
    pub seed:         u64,
}

impl SyntheticExamples {
    pub fn new(count: usize, vocab_size: usize, num_features: usize) -> Self {
        Self {
            count,
            vocab_size,
            num_features,
            max_doc_len: 40,
            seed:        42,
        }
    }

    pub fn with_max_doc_len(mut self, max_doc_len: usize) -> Self {
        self.max_doc_len = max_doc_len;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl ExampleSource for SyntheticExamples {
    fn load_all(&self) -> Result<Vec<ReaderExample>> {
        // id 0 is padding, so at least one more id is needed
        if self.vocab_size < 2 {
            bail!("vocab_size must be at least 2, got {}", self.vocab_size);
        }
        if self.max_doc_len == 0 {
            bail!("max_doc_len must be positive");
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let vocab   = self.vocab_size as u32;

        let examples = (0..self.count)
            .map(|i| {
                let doc_len  = rng.gen_range(1..=self.max_doc_len);
                let document: Vec<u32> = (0..doc_len).map(|_| rng.gen_range(1..vocab)).collect();

                // Echo up to three document tokens, then add a couple of others.
                let echo_start = rng.gen_range(0..doc_len);
                let echo_end   = (echo_start + rng.gen_range(1..=3)).min(doc_len);
                let mut question = document[echo_start..echo_end].to_vec();
                question.extend((0..rng.gen_range(0..3)).map(|_| rng.gen_range(1..vocab)));

                let rows = if self.num_features > 0 { doc_len } else { 0 };
                let features = (0..rows)
                    .map(|pos| {
                        (0..self.num_features)
                            .map(|f| match f {
                                // exact-match flag
                                0 => f32::from(question.contains(&document[pos])),
                                _ => rng.gen::<f32>(),
                            })
                            .collect()
                    })
                    .collect();

                ReaderExample {
                    id: format!("synthetic-{i}"),
                    document,
                    features,
                    question,
                }
            })
            .collect();

        Ok(examples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_examples_respect_bounds() {
        let examples = SyntheticExamples::new(20, 50, 3)
            .with_max_doc_len(8)
            .load_all()
            .unwrap();

        assert_eq!(examples.len(), 20);
        for example in &examples {
            assert!((1..=8).contains(&example.document.len()));
            assert!(!example.question.is_empty());
            assert!(example.max_token_id().unwrap() < 50);
            assert!(example.document.iter().chain(&example.question).all(|&t| t > 0));
            assert_eq!(example.features.len(), example.document.len());
            assert!(example.features.iter().all(|row| row.len() == 3));
        }
    }

    #[test]
    fn test_same_seed_same_examples() {
        let a = SyntheticExamples::new(5, 30, 0).with_seed(7).load_all().unwrap();
        let b = SyntheticExamples::new(5, 30, 0).with_seed(7).load_all().unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|e| e.features.is_empty()));
    }

    #[test]
    fn test_rejects_tiny_vocabulary() {
        assert!(SyntheticExamples::new(1, 1, 0).load_all().is_err());
    }
}
