//! Cross-crate scenario tests for the federated user directory.
//!
//! The scenarios live under `tests/`; this crate has no library code.
