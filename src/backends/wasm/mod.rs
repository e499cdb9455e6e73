// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wasmtime host for the translator module.
//!
//! # Flow
//! ```text
//! load_wasm_bytes -> ensure_core_module -> create_engine -> WasmtimeMemory
//! ```
//!
//! The resulting [`WasmtimeMemory`] implements `LinearMemory` and is driven by
//! `backends::in_process::InProcessChannel`.

pub mod detector;
pub mod engine;
pub mod error;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod loader;
pub mod memory;

pub use detector::ensure_core_module;
pub use engine::create_engine;
pub use error::{WasmError, WasmResult};
pub use loader::load_wasm_bytes;
pub use memory::{InstanceOptions, WasmtimeMemory};
