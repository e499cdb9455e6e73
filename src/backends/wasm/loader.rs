// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Translator module loading and size validation.
//!
//! Reads the binary from disk and checks its size. Format checks belong to the
//! detector.

use crate::backends::wasm::error::{WasmError, WasmResult};
use crate::observability::messages::wasm::{ModuleLoadFailed, ModuleLoaded};
use std::path::Path;

/// Maximum allowed size for a translator module (64 MB). A full shader compiler
/// built to WebAssembly is several megabytes.
pub const MAX_WASM_SIZE: usize = 64 * 1024 * 1024;

/// Loads WASM bytes from a file and validates the size
///
/// # Errors
/// * `WasmError::IoError` - the file cannot be read
/// * `WasmError::ValidationError` - the file is empty or larger than [`MAX_WASM_SIZE`]
pub fn load_wasm_bytes<P: AsRef<Path>>(path: P) -> WasmResult<Vec<u8>> {
    let path = path.as_ref();
    let module_path = path.display().to_string();

    let fail = |error: WasmError| {
        tracing::error!(
            "{}",
            ModuleLoadFailed {
                module_path: &module_path,
                error: &error,
            }
        );
        error
    };

    let bytes = std::fs::read(path).map_err(|e| fail(WasmError::IoError(e)))?;

    if bytes.is_empty() {
        return Err(fail(WasmError::ValidationError(format!(
            "WASM file is empty: {}",
            module_path
        ))));
    }

    if bytes.len() > MAX_WASM_SIZE {
        return Err(fail(WasmError::ValidationError(format!(
            "WASM file too large: {} bytes (max: {} bytes)",
            bytes.len(),
            MAX_WASM_SIZE
        ))));
    }

    tracing::info!(
        "{}",
        ModuleLoaded {
            module_path: &module_path,
            size_bytes: bytes.len(),
        }
    );

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_small_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let module = wat::parse_str("(module)").unwrap();
        temp_file.write_all(&module).unwrap();

        let bytes = load_wasm_bytes(temp_file.path()).unwrap();
        assert_eq!(bytes, module);
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let temp_file = NamedTempFile::new().unwrap();

        match load_wasm_bytes(temp_file.path()) {
            Err(WasmError::ValidationError(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected ValidationError for empty file, got {:?}", other),
        }
    }

    #[test]
    fn test_file_too_large() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&vec![0u8; MAX_WASM_SIZE + 1]).unwrap();

        match load_wasm_bytes(temp_file.path()) {
            Err(WasmError::ValidationError(msg)) => {
                assert!(msg.contains("too large"));
                assert!(msg.contains(&format!("{}", MAX_WASM_SIZE + 1)));
            }
            other => panic!("Expected ValidationError for oversized file, got {:?}", other),
        }
    }

    #[test]
    fn test_nonexistent_file() {
        let result = load_wasm_bytes("/nonexistent/path/to/translator.wasm");
        assert!(matches!(result, Err(WasmError::IoError(_))));
    }
}
