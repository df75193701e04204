// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Each use case wires the lower layers together for one CLI
// command. No printing here (that's Layer 1) and no tensor
// math (that's Layer 5).
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Writing a starter config file
pub mod init_config_use_case;

// Building the reader and reporting its architecture
pub mod inspect_use_case;

// Running span prediction over a set of examples
pub mod predict_use_case;
