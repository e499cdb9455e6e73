// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for module handles and translation calls.
//!
//! This module contains message types for logging events related to:
//! * opening and closing a module handle
//! * the request/response cycle of a translation
//! * tolerated protocol irregularities

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Module handle is ready for translation calls.
///
/// # Log Level
/// `info!` - Important operational event
pub struct HandleOpened<'a> {
    pub binding: &'a str,
}

impl Display for HandleOpened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Translator handle opened ({} binding)", self.binding)
    }
}

/// Startup or one-time initialization failed; the transport has been released.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct HandleOpenFailed<'a> {
    pub binding: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for HandleOpenFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to open translator handle ({} binding): {}",
            self.binding, self.error
        )
    }
}

/// Module handle closed and its resources released.
///
/// # Log Level
/// `info!` - Important operational event
pub struct HandleClosed<'a> {
    pub binding: &'a str,
}

impl Display for HandleClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Translator handle closed ({} binding)", self.binding)
    }
}

/// The finalize step failed. Resources are released regardless.
///
/// # Log Level
/// `warn!`
pub struct FinalizeFailed<'a> {
    pub binding: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for FinalizeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Finalize failed for {} binding, releasing resources anyway: {}",
            self.binding, self.error
        )
    }
}

/// Translation request sent.
///
/// # Log Level
/// `debug!` - Per-call detail
///
/// # Example
/// ```
/// use shader_bridge::observability::messages::translator::TranslationStarted;
///
/// let msg = TranslationStarted {
///     request_id: 3,
///     stage: "vertex",
///     input_dialect: "webgl2",
///     output_dialect: "spirv",
///     source_bytes: 840,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TranslationStarted<'a> {
    pub request_id: u64,
    pub stage: &'a str,
    pub input_dialect: &'a str,
    pub output_dialect: &'a str,
    pub source_bytes: usize,
}

impl Display for TranslationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Translation {} started: {} shader, {} -> {}, {} bytes of source",
            self.request_id, self.stage, self.input_dialect, self.output_dialect, self.source_bytes
        )
    }
}

/// Translation succeeded.
///
/// # Log Level
/// `debug!` - Per-call detail
pub struct TranslationCompleted {
    pub request_id: u64,
    pub object_code_bytes: usize,
    pub warnings: usize,
    pub duration: Duration,
}

impl Display for TranslationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Translation {} completed in {:?}: {} bytes of object code, {} warning(s)",
            self.request_id, self.duration, self.object_code_bytes, self.warnings
        )
    }
}

impl StructuredLog for TranslationCompleted {
    fn log(&self) {
        tracing::debug!(
            request_id = self.request_id,
            object_code_bytes = self.object_code_bytes,
            warnings = self.warnings,
            duration_ms = self.duration.as_millis() as u64,
            "{}",
            self
        );
    }
}

/// Translation failed with an error of any kind.
///
/// # Log Level
/// `debug!` - The error itself is returned to the caller
pub struct TranslationFailed<'a> {
    pub request_id: u64,
    pub error: &'a dyn std::error::Error,
}

impl Display for TranslationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Translation {} failed: {}", self.request_id, self.error)
    }
}

/// The compiler's info log for one call, verbatim.
///
/// # Log Level
/// `debug!`
pub struct CompilerInfoLog<'a> {
    pub request_id: u64,
    pub info_log: &'a str,
}

impl Display for CompilerInfoLog<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Translation {} info log:\n{}",
            self.request_id,
            self.info_log.trim_end()
        )
    }
}

/// Response id did not match the outstanding request.
///
/// # Log Level
/// `warn!` - Logged whether or not the response is kept
pub struct ResponseIdMismatch<'a> {
    pub expected: u64,
    pub actual: &'a str,
    /// Whether the configured policy rejects the response.
    pub fatal: bool,
}

impl Display for ResponseIdMismatch<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Response id mismatch: expected {}, got {} ({})",
            self.expected,
            self.actual,
            if self.fatal {
                "rejecting response"
            } else {
                "keeping response"
            }
        )
    }
}

impl StructuredLog for ResponseIdMismatch<'_> {
    fn log(&self) {
        tracing::warn!(
            expected = self.expected,
            actual = self.actual,
            fatal = self.fatal,
            "{}",
            self
        );
    }
}

/// The peer did not acknowledge a shutdown request properly.
///
/// # Log Level
/// `warn!`
pub struct ShutdownNotAcknowledged<'a> {
    pub binding: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ShutdownNotAcknowledged<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Shutdown was not acknowledged ({} binding): {}",
            self.binding, self.error
        )
    }
}
