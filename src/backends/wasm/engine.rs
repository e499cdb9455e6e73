// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wasmtime engine configuration for the translator module.

use crate::backends::wasm::error::{WasmError, WasmResult};
use wasmtime::{Config, Engine};

/// Creates an engine for a single-threaded core module.
///
/// * threads, multi-memory and memory64 are disabled
/// * the component model is disabled (core modules only)
/// * fuel is consumed so a runaway translation stops instead of hanging the host
pub fn create_engine() -> WasmResult<Engine> {
    let mut config = Config::new();

    config.wasm_component_model(false);
    config.wasm_threads(false);
    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| WasmError::EngineError(e.to_string()))
}
