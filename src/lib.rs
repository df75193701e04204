#![recursion_limit = "256"]

//! FusionNet machine reading comprehension on Burn.
//!
//! Given an already-tokenized document and question, the reader scores
//! every document position as an answer start and end, and
//! [`ml::inferencer::best_spans`] turns those scores into ranked spans.

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod infra;
pub mod ml;

pub use data::batcher::{ReaderBatch, ReaderBatcher};
pub use domain::example::ReaderExample;
pub use domain::span::{PredictedSpan, Prediction};
pub use error::{ReaderError, ReaderResult};
pub use ml::inferencer::Inferencer;
pub use ml::model::{FusionNetReader, ReaderConfig};
