// ============================================================
// Layer 5 — Stacked Bidirectional RNN Encoder
// ============================================================
// Every reading, understanding and fusion step of the reader
// is one of these stacks.
//
//   input [batch, len, in]
//     │  dropout (dropout_rnn)
//     ▼
//   BiRnn layer 1 ──► [batch, len, 2h]
//     │  dropout
//     ▼
//   BiRnn layer N ──► [batch, len, 2h]
//     │
//     ▼
//   concat all layers (2h·N) or keep the last one (2h)
//     │  optional output dropout
//     ▼
//
// With `padding` on, items are grouped by real length and each
// group only runs over its real tokens. The backward direction
// then starts at the last real token instead of at padding.
// Results go back to their original batch slot before returning.

use burn::{
    nn::{
        gru::{Gru, GruConfig},
        BiLstm, BiLstmConfig, Dropout, DropoutConfig,
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::ml::mask::PaddingMask;

/// Recurrent cell used inside each bidirectional layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RnnType {
    Lstm,
    Gru,
}

impl std::fmt::Display for RnnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RnnType::Lstm => write!(f, "lstm"),
            RnnType::Gru  => write!(f, "gru"),
        }
    }
}

#[derive(Config, Debug)]
pub struct StackedBrnnConfig {
    pub input_size:  usize,
    pub hidden_size: usize,
    #[config(default = 1)]
    pub num_layers: usize,
    #[config(default = 0.0)]
    pub dropout_rate: f64,
    #[config(default = false)]
    pub dropout_output: bool,
    #[config(default = false)]
    pub concat_layers: bool,
    #[config(default = false)]
    pub padding: bool,
    #[config(default = "RnnType::Lstm")]
    pub rnn_type: RnnType,
}

impl StackedBrnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> StackedBrnn<B> {
        let layers = (0..self.num_layers)
            .map(|i| {
                let input = if i == 0 { self.input_size } else { 2 * self.hidden_size };
                BiRnn::new(self.rnn_type, input, self.hidden_size, device)
            })
            .collect();

        StackedBrnn {
            layers,
            dropout:        DropoutConfig::new(self.dropout_rate).init(),
            dropout_output: self.dropout_output,
            concat_layers:  self.concat_layers,
            padding:        self.padding,
            hidden_size:    self.hidden_size,
        }
    }

    /// Width of the encoder output.
    pub fn output_size(&self) -> usize {
        if self.concat_layers {
            2 * self.hidden_size * self.num_layers
        } else {
            2 * self.hidden_size
        }
    }
}

/// One bidirectional layer. Exactly one of the two cell kinds is set.
#[derive(Module, Debug)]
pub struct BiRnn<B: Backend> {
    lstm:         Option<BiLstm<B>>,
    gru_forward:  Option<Gru<B>>,
    gru_backward: Option<Gru<B>>,
}

impl<B: Backend> BiRnn<B> {
    fn new(rnn_type: RnnType, input: usize, hidden: usize, device: &B::Device) -> Self {
        match rnn_type {
            RnnType::Lstm => Self {
                lstm:         Some(BiLstmConfig::new(input, hidden, true).init(device)),
                gru_forward:  None,
                gru_backward: None,
            },
            RnnType::Gru => Self {
                lstm:         None,
                gru_forward:  Some(GruConfig::new(input, hidden, true).init(device)),
                gru_backward: Some(GruConfig::new(input, hidden, true).init(device)),
            },
        }
    }

    /// [batch, len, in] → [batch, len, 2·hidden]
    fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        if let Some(lstm) = &self.lstm {
            return lstm.forward(x, None).0;
        }
        match (&self.gru_forward, &self.gru_backward) {
            (Some(fwd), Some(bwd)) => {
                let forward  = fwd.forward(x.clone(), None);
                let backward = bwd.forward(x.flip([1]), None).flip([1]);
                Tensor::cat(vec![forward, backward], 2)
            }
            _ => unreachable!("BiRnn is built with either an LSTM or a pair of GRUs"),
        }
    }
}

#[derive(Module, Debug)]
pub struct StackedBrnn<B: Backend> {
    layers:         Vec<BiRnn<B>>,
    dropout:        Dropout,
    dropout_output: bool,
    concat_layers:  bool,
    padding:        bool,
    hidden_size:    usize,
}

impl<B: Backend> StackedBrnn<B> {
    pub fn output_size(&self) -> usize {
        if self.concat_layers {
            2 * self.hidden_size * self.layers.len()
        } else {
            2 * self.hidden_size
        }
    }

    /// `x`: [batch, len, input_size] → [batch, len, output_size]
    pub fn forward(&self, x: Tensor<B, 3>, mask: &PaddingMask<B>) -> Tensor<B, 3> {
        if self.padding {
            self.forward_padded(x, mask.lengths())
        } else {
            self.forward_unpadded(x)
        }
    }

    fn forward_unpadded(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut outputs: Vec<Tensor<B, 3>> = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let input = match outputs.last() {
                Some(prev) => prev.clone(),
                None       => x.clone(),
            };
            outputs.push(layer.forward(self.dropout.forward(input)));
        }

        let output = if self.concat_layers {
            Tensor::cat(outputs, 2)
        } else {
            outputs.pop().unwrap_or(x)
        };

        if self.dropout_output {
            self.dropout.forward(output)
        } else {
            output
        }
    }

    fn forward_padded(&self, x: Tensor<B, 3>, lengths: &[usize]) -> Tensor<B, 3> {
        let [batch, seq_len, input_size] = x.dims();
        let device   = x.device();
        let out_size = self.output_size();

        // Longest first; equal lengths stay in batch order.
        let mut order: Vec<usize> = (0..batch).collect();
        order.sort_by(|&a, &b| lengths[b].cmp(&lengths[a]));

        let mut restored: Vec<Option<Tensor<B, 3>>> = vec![None; batch];
        let mut groups = 0usize;
        for group in order.chunk_by(|&a, &b| lengths[a] == lengths[b]) {
            let len  = lengths[group[0]].min(seq_len);
            let rows = group.len();
            groups += 1;

            if len == 0 {
                for &item in group {
                    restored[item] = Some(Tensor::zeros([1, seq_len, out_size], &device));
                }
                continue;
            }

            let indices: Vec<i64> = group.iter().map(|&i| i as i64).collect();
            let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices, [rows]), &device);
            let packed  = x.clone()
                .select(0, indices)
                .slice([0..rows, 0..len, 0..input_size]);

            let mut encoded = self.forward_unpadded(packed);
            if len < seq_len {
                let pad = Tensor::zeros([rows, seq_len - len, out_size], &device);
                encoded = Tensor::cat(vec![encoded, pad], 1);
            }

            for (row, &item) in group.iter().enumerate() {
                restored[item] = Some(encoded.clone().slice([row..row + 1, 0..seq_len, 0..out_size]));
            }
        }

        tracing::trace!("padded encoding of {} items in {} length groups", batch, groups);

        Tensor::cat(restored.into_iter().flatten().collect(), 0)
    }
}
