// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while loading or validating a translator configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The section required by the selected backend is absent.
    #[error("backend '{backend}' requires a '{section}' section")]
    MissingSection {
        backend: &'static str,
        section: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
