// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-system concerns shared by the application layer.
//
//   config_store.rs — ReaderConfig as pretty JSON on disk.
//                     The config fully determines the model
//                     architecture, so it is the one artifact
//                     every command reads.
//
// Reference: Rust Book §9 (Error Handling with anyhow)

/// ReaderConfig persistence
pub mod config_store;
