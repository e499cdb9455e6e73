// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while loading, validating and instantiating a translator module.
//!
//! Everything here happens before the first request. Failures at call time are
//! reported as `ChannelError` instead.

use thiserror::Error;

/// Message for binaries that use the component model instead of a core module.
pub const WASM_COMPONENT_UNSUPPORTED: &str = "Component Model binaries are not supported: \
the translator must be a core WebAssembly module exporting memory, malloc, free, initialize and invoke.";

#[derive(Error, Debug)]
pub enum WasmError {
    #[error("Invalid WASM binary: {0}")]
    InvalidWasmBinary(String),

    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Size limits and similar checks on the raw bytes.
    #[error("Invalid input: {0}")]
    ValidationError(String),

    #[error("Engine creation error: {0}")]
    EngineError(String),

    /// Compilation, linking or instantiation failed.
    #[error("WASM module error: {0}")]
    ModuleError(String),

    #[error("WASM parser error: {0}")]
    ParserError(#[from] wasmparser::BinaryReaderError),
}

pub type WasmResult<T> = Result<T, WasmError>;
