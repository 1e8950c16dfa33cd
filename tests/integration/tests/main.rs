//! End-to-end scenario tests.
//!
//! Every test builds the full service graph through `ud_server::initialize`
//! with a static read-only directory, so no external server is needed.

mod common;
mod delegation;
mod outages;
mod precedence;
