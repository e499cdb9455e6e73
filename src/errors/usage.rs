// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::ConfigError;
use thiserror::Error;

/// Caller mistakes. Never retried.
#[derive(Error, Debug)]
pub enum UsageError {
    /// A translate call was attempted after the module handle was closed.
    #[error("translator handle is closed")]
    Closed,

    #[error("unknown input dialect '{0}' (expected one of webgl, webgln, webgl2, webgl3, gles2, gles3, gles31, gles32)")]
    UnknownInputDialect(String),

    #[error("unknown output dialect '{0}' (expected essl, glsl, glsl<version>, spirv, hlsl9, hlsl11 or msl)")]
    UnknownOutputDialect(String),

    #[error("unknown shader stage '{0}'")]
    UnknownStage(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("configuration error: {0}")]
    Config(ConfigError),
}
