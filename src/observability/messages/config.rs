// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading.

use std::fmt::{Display, Formatter};

/// Configuration file parsed and validated.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use shader_bridge::observability::messages::config::ConfigLoaded;
///
/// let msg = ConfigLoaded {
///     path: "translator.yaml",
///     backend: "wasm",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub backend: &'a str,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded configuration '{}' (backend: {})",
            self.path, self.backend
        )
    }
}

/// Configured fuel was outside the allowed range and has been clamped.
///
/// # Log Level
/// `warn!` - Configuration was adjusted
pub struct FuelClamped {
    pub requested: u64,
    pub applied: u64,
    pub minimum: u64,
    pub maximum: u64,
}

impl Display for FuelClamped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fuel level {} is outside [{}, {}]; using {}",
            self.requested, self.minimum, self.maximum, self.applied
        )
    }
}
