use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::data::batcher::{ReaderBatch, PAD_ID};
use crate::error::{ReaderError, ReaderResult};
use crate::ml::{
    attention::{weighted_avg, LinearSeqAttn, SymmetricBilinearMatch, SymmetricBilinearMatchConfig},
    contextual::{ContextualBiLstm, ContextualBiLstmConfig, ContextualEncoder},
    decoder::{ForwardMode, SpanDecoder, SpanScores},
    encoder::{RnnType, StackedBrnn, StackedBrnnConfig},
    fusion::{FusionEncoder, FusionEncoderConfig, ReadingState},
    history::History,
    mask::PaddingMask,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct ReaderConfig {
    pub vocab_size: usize,
    #[config(default = 300)]
    pub embedding_dim: usize,
    #[config(default = 128)]
    pub hidden_size: usize,
    /// Depth of the low-level document reading encoder.
    #[config(default = 1)]
    pub doc_layers: usize,
    /// Depth of the low-level question reading encoder.
    #[config(default = 1)]
    pub question_layers: usize,
    #[config(default = 250)]
    pub attention_size: usize,
    /// Per-token manual features appended to the document input.
    #[config(default = 0)]
    pub num_features: usize,
    #[config(default = 0.4)]
    pub dropout_emb: f64,
    #[config(default = 0.4)]
    pub dropout_rnn: f64,
    #[config(default = true)]
    pub dropout_rnn_output: bool,
    #[config(default = true)]
    pub concat_rnn_layers: bool,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type: RnnType,
    #[config(default = false)]
    pub use_contextual: bool,
    #[config(default = 600)]
    pub contextual_dim: usize,
    /// Append attention-aligned question embeddings to the document input.
    #[config(default = true)]
    pub use_qemb: bool,
    /// Run recurrences over real tokens only.
    #[config(default = false)]
    pub rnn_padding: bool,
    #[config(default = false)]
    pub self_attention_exclude_diagonal: bool,
    /// Longest span considered when extracting answers.
    #[config(default = 15)]
    pub max_span_len: usize,
}

impl ReaderConfig {
    pub fn validate(&self) -> ReaderResult<()> {
        let invalid = |msg: String| Err(ReaderError::InvalidConfig(msg));

        for (name, value) in [
            ("vocab_size", self.vocab_size),
            ("embedding_dim", self.embedding_dim),
            ("hidden_size", self.hidden_size),
            ("doc_layers", self.doc_layers),
            ("question_layers", self.question_layers),
            ("attention_size", self.attention_size),
            ("max_span_len", self.max_span_len),
        ] {
            if value == 0 {
                return invalid(format!("{name} must be positive"));
            }
        }
        for (name, p) in [("dropout_emb", self.dropout_emb), ("dropout_rnn", self.dropout_rnn)] {
            if !(0.0..1.0).contains(&p) {
                return invalid(format!("{name} must be in [0, 1), got {p}"));
            }
        }
        if self.use_contextual && (self.contextual_dim == 0 || self.contextual_dim % 2 != 0) {
            return invalid(format!(
                "contextual_dim must be a positive even number, got {}",
                self.contextual_dim
            ));
        }
        if self.doc_low_level_dim() != self.question_low_level_dim() {
            return invalid(format!(
                "concatenated reading layers need doc_layers == question_layers ({} != {})",
                self.doc_layers, self.question_layers
            ));
        }
        Ok(())
    }

    fn contextual_width(&self) -> usize {
        if self.use_contextual { self.contextual_dim } else { 0 }
    }

    pub fn doc_input_dim(&self) -> usize {
        let qemb = if self.use_qemb { self.embedding_dim } else { 0 };
        self.embedding_dim + self.contextual_width() + self.num_features + qemb
    }

    pub fn question_input_dim(&self) -> usize {
        self.embedding_dim + self.contextual_width()
    }

    pub fn doc_low_level_dim(&self) -> usize {
        self.reading_rnn(self.doc_input_dim(), self.doc_layers).output_size()
    }

    pub fn question_low_level_dim(&self) -> usize {
        self.reading_rnn(self.question_input_dim(), self.question_layers).output_size()
    }

    /// word + contextual + low-level + high-level
    pub fn history_dim(&self) -> usize {
        self.embedding_dim + self.contextual_width() + self.doc_low_level_dim() + 2 * self.hidden_size
    }

    fn reading_rnn(&self, input: usize, layers: usize) -> StackedBrnnConfig {
        StackedBrnnConfig::new(input, self.hidden_size)
            .with_num_layers(layers)
            .with_dropout_rate(self.dropout_rnn)
            .with_dropout_output(self.dropout_rnn_output)
            .with_concat_layers(self.concat_rnn_layers)
            .with_padding(self.rnn_padding)
            .with_rnn_type(self.rnn_type)
    }

    pub fn fusion(&self) -> FusionEncoderConfig {
        FusionEncoderConfig::new(
            self.history_dim(),
            self.attention_size,
            self.hidden_size,
            self.doc_low_level_dim(),
        )
        .with_exclude_self_match(self.self_attention_exclude_diagonal)
        .with_padding(self.rnn_padding)
        .with_rnn_type(self.rnn_type)
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ReaderResult<FusionNetReader<B>> {
        self.validate()?;

        let h2 = 2 * self.hidden_size;
        let low_question = self.question_low_level_dim();
        let single = |input: usize| {
            self.reading_rnn(input, 1).with_concat_layers(false).init(device)
        };

        let contextual = self.use_contextual.then(|| {
            ContextualBiLstmConfig::new(self.vocab_size, self.embedding_dim, self.contextual_dim)
                .init(device)
        });
        if let Some(width) = contextual.as_ref().map(|c| c.output_dim()) {
            if width != self.contextual_dim {
                return Err(ReaderError::ShapeMismatch {
                    what:     "contextual vectors",
                    expected: self.contextual_dim,
                    actual:   width,
                });
            }
        }
        let qemb_match = self.use_qemb.then(|| {
            SymmetricBilinearMatchConfig::new(self.embedding_dim, self.embedding_dim).init(device)
        });

        Ok(FusionNetReader {
            embedding: padded_embedding(self.vocab_size, self.embedding_dim, device),
            contextual,
            qemb_match,
            emb_dropout: DropoutConfig::new(self.dropout_emb).init(),
            low_level_doc_rnn: self.reading_rnn(self.doc_input_dim(), self.doc_layers).init(device),
            low_level_question_rnn: self
                .reading_rnn(self.question_input_dim(), self.question_layers)
                .init(device),
            high_level_doc_rnn:         single(self.doc_low_level_dim()),
            high_level_question_rnn:    single(low_question),
            understanding_question_rnn: single(low_question + h2),
            fusion:           self.fusion().init(device),
            question_pooling: LinearSeqAttn::new(h2, device),
            decoder:          SpanDecoder::new(h2, h2, device),
            num_features:     self.num_features,
            vocab_size:       self.vocab_size,
        })
    }
}

/// Embedding table whose padding row (id 0) is all zeros, so padded
/// positions feed nothing into the recurrences.
pub(crate) fn padded_embedding<B: Backend>(
    vocab_size: usize,
    dim:        usize,
    device:     &B::Device,
) -> Embedding<B> {
    let mut embedding = EmbeddingConfig::new(vocab_size, dim).init(device);
    let pad = PAD_ID as usize;
    embedding.weight = embedding.weight.map(|w| {
        w.slice_assign([pad..pad + 1, 0..dim], Tensor::zeros([1, dim], device))
    });
    embedding
}

#[derive(Module, Debug)]
pub struct FusionNetReader<B: Backend> {
    embedding:                  Embedding<B>,
    contextual:                 Option<ContextualBiLstm<B>>,
    qemb_match:                 Option<SymmetricBilinearMatch<B>>,
    emb_dropout:                Dropout,
    low_level_doc_rnn:          StackedBrnn<B>,
    low_level_question_rnn:     StackedBrnn<B>,
    high_level_doc_rnn:         StackedBrnn<B>,
    high_level_question_rnn:    StackedBrnn<B>,
    understanding_question_rnn: StackedBrnn<B>,
    fusion:                     FusionEncoder<B>,
    question_pooling:           LinearSeqAttn<B>,
    decoder:                    SpanDecoder<B>,
    num_features:               usize,
    vocab_size:                 usize,
}

impl<B: Backend> FusionNetReader<B> {
    /// Start/end distributions over document positions, [batch, len_d] each.
    pub fn forward(&self, batch: &ReaderBatch<B>, mode: ForwardMode) -> ReaderResult<SpanScores<B>> {
        let (doc_mask, question_mask) = self.check(batch)?;
        let state = self.read(batch, &doc_mask, &question_mask);

        let question_hiddens = state.question_understanding.clone();
        let doc_hiddens = self.fusion.forward(state, &doc_mask, &question_mask);

        let q_weights = self.question_pooling.forward(question_hiddens.clone(), &question_mask);
        let question  = weighted_avg(question_hiddens, q_weights);

        Ok(self.decoder.forward(doc_hiddens, question, &doc_mask, mode))
    }

    /// Low, high and understanding cross-attention weights, [batch, len_d, len_q].
    pub fn cross_attention_weights(&self, batch: &ReaderBatch<B>) -> ReaderResult<[Tensor<B, 3>; 3]> {
        let (doc_mask, question_mask) = self.check(batch)?;
        let state = self.read(batch, &doc_mask, &question_mask);
        Ok(self.fusion.level_weights(&state, &question_mask))
    }

    fn check(&self, batch: &ReaderBatch<B>) -> ReaderResult<(PaddingMask<B>, PaddingMask<B>)> {
        let [doc_items, doc_len] = batch.doc_tokens.dims();
        let [q_items, q_len]     = batch.question_tokens.dims();

        if batch.doc_mask.dims() != [doc_items, doc_len] {
            return Err(ReaderError::BatchMismatch(format!(
                "document mask {:?} vs tokens {:?}", batch.doc_mask.dims(), [doc_items, doc_len]
            )));
        }
        if batch.question_mask.dims() != [q_items, q_len] {
            return Err(ReaderError::BatchMismatch(format!(
                "question mask {:?} vs tokens {:?}", batch.question_mask.dims(), [q_items, q_len]
            )));
        }
        if doc_items == 0 {
            return Err(ReaderError::BatchMismatch("batch has no items".to_string()));
        }
        if doc_items != q_items {
            return Err(ReaderError::BatchMismatch(format!(
                "{doc_items} documents vs {q_items} questions"
            )));
        }

        match &batch.doc_features {
            Some(features) => {
                let [items, len, width] = features.dims();
                if [items, len] != [doc_items, doc_len] {
                    return Err(ReaderError::BatchMismatch(format!(
                        "document features {:?} vs tokens {:?}", [items, len], [doc_items, doc_len]
                    )));
                }
                if width != self.num_features {
                    return Err(ReaderError::ShapeMismatch {
                        what:     "document features",
                        expected: self.num_features,
                        actual:   width,
                    });
                }
            }
            None if self.num_features > 0 => {
                return Err(ReaderError::ShapeMismatch {
                    what:     "document features",
                    expected: self.num_features,
                    actual:   0,
                });
            }
            None => {}
        }

        self.check_vocabulary(batch.doc_tokens.clone(), "document")?;
        self.check_vocabulary(batch.question_tokens.clone(), "question")?;

        let doc_mask      = PaddingMask::new(batch.doc_mask.clone(), "document")?;
        let question_mask = PaddingMask::new(batch.question_mask.clone(), "question")?;
        doc_mask.ensure_non_empty("document")?;
        question_mask.ensure_non_empty("question")?;

        tracing::debug!(
            "forward: batch={} len_d={} len_q={}", doc_items, doc_len, q_len
        );
        Ok((doc_mask, question_mask))
    }

    /// Every id, padding included, must index the embedding table.
    fn check_vocabulary(&self, tokens: Tensor<B, 2, Int>, sequence: &'static str) -> ReaderResult<()> {
        let [_, len] = tokens.dims();
        let bad = tokens
            .into_data()
            .iter::<i64>()
            .enumerate()
            .find(|&(_, token)| token < 0 || token as u64 >= self.vocab_size as u64);

        match bad {
            Some((pos, token)) => Err(ReaderError::TokenOutOfVocabulary {
                sequence,
                item: pos / len,
                token,
                vocab_size: self.vocab_size,
            }),
            None => Ok(()),
        }
    }

    /// Embeddings and the three reading levels.
    fn read(
        &self,
        batch:         &ReaderBatch<B>,
        doc_mask:      &PaddingMask<B>,
        question_mask: &PaddingMask<B>,
    ) -> ReadingState<B> {
        let doc_word      = self.embedding.forward(batch.doc_tokens.clone());
        let question_word = self.embedding.forward(batch.question_tokens.clone());

        let mut doc_parts      = vec![doc_word.clone()];
        let mut question_parts = vec![question_word.clone()];
        if let Some(contextual) = &self.contextual {
            doc_parts.push(contextual.encode(batch.doc_tokens.clone(), doc_mask));
            question_parts.push(contextual.encode(batch.question_tokens.clone(), question_mask));
        }

        let doc_emb      = self.emb_dropout.forward(Tensor::cat(doc_parts.clone(), 2));
        let question_emb = self.emb_dropout.forward(Tensor::cat(question_parts.clone(), 2));

        let mut doc_input = vec![doc_emb];
        if let Some(qemb) = &self.qemb_match {
            doc_input.push(qemb.forward(
                doc_word,
                question_word.clone(),
                question_mask,
                question_word,
            ));
        }
        if let Some(features) = &batch.doc_features {
            doc_input.push(features.clone());
        }

        let doc_low      = self.low_level_doc_rnn.forward(Tensor::cat(doc_input, 2), doc_mask);
        let question_low = self.low_level_question_rnn.forward(question_emb, question_mask);

        let doc_high      = self.high_level_doc_rnn.forward(doc_low.clone(), doc_mask);
        let question_high = self.high_level_question_rnn.forward(question_low.clone(), question_mask);

        let question_understanding = self.understanding_question_rnn.forward(
            Tensor::cat(vec![question_low.clone(), question_high.clone()], 2),
            question_mask,
        );

        ReadingState {
            doc_history:      History::new(doc_parts).extended([doc_low.clone(), doc_high.clone()]),
            question_history: History::new(question_parts)
                .extended([question_low.clone(), question_high.clone()]),
            doc_low,
            doc_high,
            question_low,
            question_high,
            question_understanding,
        }
    }
}
