// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the in-process binding.
//!
//! This module contains message types for logging events related to:
//! * translator module loading and validation
//! * instantiation and export resolution
//! * traps and buffer management during calls

use crate::traits::GuestPtr;
use std::fmt::{Display, Formatter};

/// WASM module loaded successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use shader_bridge::observability::messages::wasm::ModuleLoaded;
///
/// let msg = ModuleLoaded {
///     module_path: "translator/angle_translator.wasm",
///     size_bytes: 4_718_592,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ModuleLoaded<'a> {
    pub module_path: &'a str,
    pub size_bytes: usize,
}

impl Display for ModuleLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded WASM module: {} ({} bytes)",
            self.module_path, self.size_bytes
        )
    }
}

/// WASM module loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use shader_bridge::observability::messages::wasm::ModuleLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = ModuleLoadFailed {
///     module_path: "translator/missing.wasm",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ModuleLoadFailed<'a> {
    pub module_path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ModuleLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load WASM module '{}': {}",
            self.module_path, self.error
        )
    }
}

/// Instance created and exports resolved.
///
/// # Log Level
/// `info!` - Important operational event
pub struct InstanceCreated {
    pub memory_bytes: usize,
    pub fuel_level: u64,
    pub has_finalize: bool,
}

impl Display for InstanceCreated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Created translator instance: memory={} bytes, fuel_level={}, finalize={}",
            self.memory_bytes,
            self.fuel_level,
            if self.has_finalize { "exported" } else { "absent" }
        )
    }
}

/// An optional export is absent; the matching step becomes a no-op.
///
/// # Log Level
/// `debug!`
pub struct OptionalExportMissing<'a> {
    pub name: &'a str,
}

impl Display for OptionalExportMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Module does not export optional '{}'", self.name)
    }
}

/// The module's `initialize` entry point reported success.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ModuleInitialized;

impl Display for ModuleInitialized {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Translator module initialized")
    }
}

/// A trap left the instance in an unknown state; it will not be entered again.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ModulePoisoned<'a> {
    pub entry_point: &'a str,
}

impl Display for ModulePoisoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Module trapped in '{}'; instance is poisoned and will reject further calls",
            self.entry_point
        )
    }
}

/// Freeing a guest buffer failed after the call using it had already failed.
///
/// # Log Level
/// `warn!` - The earlier error is reported to the caller, this one is only logged
pub struct BufferFreeFailed<'a> {
    pub ptr: GuestPtr,
    pub error: &'a dyn std::error::Error,
}

impl Display for BufferFreeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to free guest buffer at {}: {}",
            self.ptr, self.error
        )
    }
}
