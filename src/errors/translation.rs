// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Error code the translator uses for "shader compilation failed".
pub const COMPILE_FAILED: i32 = -32002;

/// Code the stdio build of the translator reports for the same condition.
pub const LEGACY_COMPILE_FAILED: i32 = 2;

/// A failure reported by the compiler backend itself.
///
/// Compilation is deterministic, so these are never retried. The info log is the
/// backend's full diagnostic output and is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationError {
    pub code: i32,
    pub message: String,
    pub info_log: Option<String>,
}

impl TranslationError {
    pub fn is_compile_failure(&self) -> bool {
        self.code == COMPILE_FAILED || self.code == LEGACY_COMPILE_FAILED
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "translation failed (code {}): {}", self.code, self.message)?;
        if let Some(log) = &self.info_log {
            write!(f, "\n--- info log ---\n{}", log)?;
        }
        Ok(())
    }
}

impl std::error::Error for TranslationError {}
