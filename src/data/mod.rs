// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between "examples somewhere" and "tensors on a
// device". Examples are already tokenized when they get here.
//
//   JSON file ──► JsonExampleLoader ─┐
//                                    ├──► ReaderBatcher ──► ReaderBatch
//   SyntheticExamples ───────────────┘
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Loads tokenized examples from a JSON file
pub mod loader;

/// Random examples for smoke runs and architecture checks
pub mod synthetic;

/// Implements Burn's Batcher trait to create padded tensor batches
pub mod batcher;
