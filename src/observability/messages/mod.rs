// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! * `config` - configuration loading and clamping
//! * `process` - translator child process lifecycle
//! * `translator` - handle lifecycle and per-call events
//! * `wasm` - module loading, instantiation and traps

pub mod config;
pub mod process;
pub mod translator;
pub mod wasm;

/// A message that can also emit itself with its fields as structured tracing fields.
pub trait StructuredLog {
    fn log(&self);
}
