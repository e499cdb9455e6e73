// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM binary encoding detection
//!
//! The translator must be a classic core module. Component Model binaries, and
//! the legacy version-1 components marked by a `component` custom section, are
//! rejected before any compilation work is spent on them.

use crate::backends::wasm::error::{WasmError, WASM_COMPONENT_UNSUPPORTED};

use wasmparser::{Encoding, Parser, Payload};

/// Checks that `bytes` is a well-formed core module.
///
/// # Errors
/// * `WasmError::ParserError` - the binary is empty, truncated or malformed
/// * `WasmError::UnsupportedEncoding` - the binary is a component
pub fn ensure_core_module(bytes: &[u8]) -> Result<(), WasmError> {
    let mut encoding = None;
    let mut has_component_section = false;

    for payload in Parser::new(0).parse_all(bytes) {
        match payload? {
            Payload::Version { encoding: enc, .. } => {
                encoding = Some(enc);
            }
            Payload::CustomSection(reader) if reader.name() == "component" => {
                has_component_section = true;
            }
            _ => {}
        }
    }

    let encoding =
        encoding.ok_or_else(|| WasmError::InvalidWasmBinary("Invalid WASM binary".to_string()))?;

    match encoding {
        Encoding::Module if !has_component_section => Ok(()),
        _ => Err(WasmError::UnsupportedEncoding(
            WASM_COMPONENT_UNSUPPORTED.to_string(),
        )),
    }
}
