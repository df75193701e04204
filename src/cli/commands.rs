// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags:
//
//   init-config — write a ReaderConfig JSON file
//   inspect     — build the reader and print stage widths
//   predict     — rank answer spans for tokenized examples
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::ml::encoder::RnnType;
use crate::ml::model::ReaderConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a reader config file with the given hyperparameters
    InitConfig(InitConfigArgs),

    /// Build the reader from a config and report its architecture
    Inspect(InspectArgs),

    /// Predict answer spans for tokenized examples
    Predict(PredictArgs),
}

/// Burn backend to run the reader on
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// CPU, pure Rust
    Ndarray,
    /// GPU through wgpu
    Wgpu,
}

/// Recurrent cell choice on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellArg {
    Lstm,
    Gru,
}

impl From<CellArg> for RnnType {
    fn from(c: CellArg) -> Self {
        match c {
            CellArg::Lstm => RnnType::Lstm,
            CellArg::Gru  => RnnType::Gru,
        }
    }
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Where to write the config
    #[arg(long, default_value = "reader_config.json")]
    pub config: String,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,

    /// Number of distinct token ids (id 0 is padding)
    #[arg(long, default_value_t = 30000)]
    pub vocab_size: usize,

    /// Word embedding width
    #[arg(long, default_value_t = 300)]
    pub embedding_dim: usize,

    /// Hidden size of every recurrent layer (outputs are twice this)
    #[arg(long, default_value_t = 128)]
    pub hidden_size: usize,

    /// Stacked layers in the low-level document and question encoders
    #[arg(long, default_value_t = 1)]
    pub layers: usize,

    /// Projection width of the fully-aware attentions
    #[arg(long, default_value_t = 250)]
    pub attention_size: usize,

    /// Per-token document feature width
    #[arg(long, default_value_t = 0)]
    pub num_features: usize,

    /// Dropout on embeddings and reading-encoder inputs
    #[arg(long, default_value_t = 0.4)]
    pub dropout: f64,

    #[arg(long, value_enum, default_value_t = CellArg::Lstm)]
    pub rnn_type: CellArg,

    /// Add the frozen contextual encoder to the embeddings
    #[arg(long)]
    pub contextual: bool,

    /// Run recurrent layers per length group so padding never enters the state
    #[arg(long)]
    pub rnn_padding: bool,

    /// Stop document tokens attending to themselves in self-boosted attention
    #[arg(long)]
    pub exclude_self_match: bool,

    /// Longest answer span, in tokens
    #[arg(long, default_value_t = 15)]
    pub max_span_len: usize,
}

/// The application layer never sees clap types.
impl From<&InitConfigArgs> for ReaderConfig {
    fn from(a: &InitConfigArgs) -> Self {
        ReaderConfig::new(a.vocab_size)
            .with_embedding_dim(a.embedding_dim)
            .with_hidden_size(a.hidden_size)
            .with_doc_layers(a.layers)
            .with_question_layers(a.layers)
            .with_attention_size(a.attention_size)
            .with_num_features(a.num_features)
            .with_dropout_emb(a.dropout)
            .with_dropout_rnn(a.dropout)
            .with_rnn_type(a.rnn_type.into())
            .with_use_contextual(a.contextual)
            .with_rnn_padding(a.rnn_padding)
            .with_self_attention_exclude_diagonal(a.exclude_self_match)
            .with_max_span_len(a.max_span_len)
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Reader config written by `init-config`
    #[arg(long, default_value = "reader_config.json")]
    pub config: String,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Reader config written by `init-config`
    #[arg(long, default_value = "reader_config.json")]
    pub config: String,

    /// JSON array of tokenized examples
    #[arg(long, conflicts_with = "synthetic", required_unless_present = "synthetic")]
    pub examples: Option<String>,

    /// Generate this many random examples instead of reading a file
    #[arg(long)]
    pub synthetic: Option<usize>,

    /// Seed for synthetic examples
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Spans to report per example
    #[arg(long, default_value_t = 3)]
    pub top_n: usize,

    /// Examples per forward pass
    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Print predictions as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(long, value_enum, default_value_t = BackendKind::Ndarray)]
    pub backend: BackendKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_init_config_flags_reach_reader_config() {
        let cli = Cli::try_parse_from([
            "fusionnet-reader", "init-config",
            "--vocab-size", "900", "--hidden-size", "32", "--layers", "2",
            "--rnn-type", "gru", "--exclude-self-match",
        ])
        .unwrap();

        let Commands::InitConfig(args) = cli.command else {
            panic!("expected init-config");
        };
        let cfg = ReaderConfig::from(&args);
        assert_eq!(cfg.vocab_size, 900);
        assert_eq!(cfg.hidden_size, 32);
        assert_eq!((cfg.doc_layers, cfg.question_layers), (2, 2));
        assert_eq!(cfg.rnn_type, RnnType::Gru);
        assert!(cfg.self_attention_exclude_diagonal);
        assert!(!cfg.use_contextual);
    }

    #[test]
    fn test_predict_needs_a_source() {
        assert!(Cli::try_parse_from(["fusionnet-reader", "predict"]).is_err());
        assert!(Cli::try_parse_from([
            "fusionnet-reader", "predict", "--examples", "a.json", "--synthetic", "3",
        ])
        .is_err());

        let cli = Cli::try_parse_from(["fusionnet-reader", "predict", "--synthetic", "3"]).unwrap();
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.synthetic, Some(3));
        assert_eq!(args.backend, BackendKind::Ndarray);
    }
}
