// ============================================================
// Layer 2 — Inspect Use Case
// ============================================================
// Builds the reader from a config and reports the widths of
// every stage, so a config can be sanity-checked before any
// weights exist.

use anyhow::Result;
use burn::{module::Module, prelude::*};

use crate::ml::encoder::RnnType;
use crate::ml::model::ReaderConfig;

/// Architecture summary of one reader configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderSummary {
    pub rnn_type:             RnnType,
    pub doc_input_dim:        usize,
    pub question_input_dim:   usize,
    pub low_level_dim:        usize,
    pub history_dim:          usize,
    pub self_boosted_dim:     usize,
    pub final_dim:            usize,
    pub num_params:           usize,
}

pub struct InspectUseCase {
    cfg: ReaderConfig,
}

impl InspectUseCase {
    pub fn new(cfg: ReaderConfig) -> Self {
        Self { cfg }
    }

    pub fn execute<B: Backend>(&self, device: &B::Device) -> Result<ReaderSummary> {
        let model = self.cfg.init::<B>(device)?;

        let summary = ReaderSummary {
            rnn_type:           self.cfg.rnn_type,
            doc_input_dim:      self.cfg.doc_input_dim(),
            question_input_dim: self.cfg.question_input_dim(),
            low_level_dim:      self.cfg.doc_low_level_dim(),
            history_dim:        self.cfg.history_dim(),
            self_boosted_dim:   self.cfg.fusion().self_boosted_history_dim(),
            final_dim:          2 * self.cfg.hidden_size,
            num_params:         model.num_params(),
        };

        tracing::info!("Built FusionNet reader with {} parameters", summary.num_params);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_summary_widths() {
        let cfg = ReaderConfig::new(50)
            .with_embedding_dim(4)
            .with_hidden_size(3)
            .with_attention_size(5)
            .with_num_features(2)
            .with_concat_rnn_layers(false);

        let summary = InspectUseCase::new(cfg)
            .execute::<NdArray>(&Default::default())
            .unwrap();

        // word + features + aligned question embedding
        assert_eq!(summary.doc_input_dim, 4 + 2 + 4);
        assert_eq!(summary.question_input_dim, 4);
        assert_eq!(summary.low_level_dim, 6);
        // word + low + high
        assert_eq!(summary.history_dim, 4 + 6 + 6);
        assert_eq!(summary.final_dim, 6);
        assert!(summary.num_params > 50 * 4);
    }

    #[test]
    fn test_invalid_config_fails() {
        let cfg = ReaderConfig::new(50).with_hidden_size(0);
        assert!(InspectUseCase::new(cfg).execute::<NdArray>(&Default::default()).is_err());
    }
}
