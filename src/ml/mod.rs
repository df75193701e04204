// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn network code lives here. The data layer only builds
// tensors; nothing outside this layer touches a module.
//
//   mask.rs        — padding masks with host-side lengths
//   attention.rs   — masked softmax and the three attention heads
//   encoder.rs     — stacked bidirectional RNN (LSTM or GRU),
//                    optionally padding-aware
//   contextual.rs  — frozen contextual embedding provider
//   history.rs     — history-of-word accumulator
//   fusion.rs      — multi-level + self-boosted fusion encoder
//   decoder.rs     — start → GRU memory → end span decoder
//   model.rs       — ReaderConfig and the full FusionNet reader
//   inferencer.rs  — batched inference and span search
//
// Reference: Huang et al. (2018) FusionNet
//            Chen et al. (2017) Reading Wikipedia to Answer
//            Open-Domain Questions (DrQA)

pub mod mask;

pub mod attention;

pub mod encoder;

pub mod contextual;

pub mod history;

pub mod fusion;

pub mod decoder;

/// ReaderConfig and FusionNetReader
pub mod model;

/// Batched inference and span extraction
pub mod inferencer;
