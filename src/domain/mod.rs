// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only structs, enums and traits
//
// Examples arrive already tokenized: tokenization and feature
// extraction happen upstream of this crate.

/// An already-tokenized document/question pair
pub mod example;

/// Predicted answer spans
pub mod span;

// Abstractions the data and ML layers implement
pub mod traits;
