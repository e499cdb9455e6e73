// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shader stage and dialect tag vocabulary.
//!
//! Tags are parsed up front so an unknown tag is a usage error raised before any
//! channel I/O happens. The output dialect also decides how object code travels
//! on the wire: binary formats are base64, text formats are plain strings.

use crate::errors::UsageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GLSL desktop profile versions the translator accepts after the `glsl` prefix.
pub const GLSL_VERSIONS: [u32; 10] = [130, 140, 150, 330, 400, 410, 420, 430, 440, 450];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
    Geometry,
    TessControl,
    TessEval,
}

impl ShaderStage {
    pub fn as_str(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
            ShaderStage::Geometry => "geometry",
            ShaderStage::TessControl => "tess_control",
            ShaderStage::TessEval => "tess_eval",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShaderStage {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertex" => Ok(ShaderStage::Vertex),
            "fragment" => Ok(ShaderStage::Fragment),
            "compute" => Ok(ShaderStage::Compute),
            "geometry" => Ok(ShaderStage::Geometry),
            "tess_control" => Ok(ShaderStage::TessControl),
            "tess_eval" => Ok(ShaderStage::TessEval),
            other => Err(UsageError::UnknownStage(other.to_string())),
        }
    }
}

/// Source language variant the shader is written in (`spec` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputDialect {
    #[default]
    Webgl,
    /// WebGL 1.0 without highp in fragment shaders.
    Webgln,
    Webgl2,
    Webgl3,
    Gles2,
    Gles3,
    Gles31,
    Gles32,
}

impl InputDialect {
    pub fn as_str(self) -> &'static str {
        match self {
            InputDialect::Webgl => "webgl",
            InputDialect::Webgln => "webgln",
            InputDialect::Webgl2 => "webgl2",
            InputDialect::Webgl3 => "webgl3",
            InputDialect::Gles2 => "gles2",
            InputDialect::Gles3 => "gles3",
            InputDialect::Gles31 => "gles31",
            InputDialect::Gles32 => "gles32",
        }
    }
}

impl fmt::Display for InputDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputDialect {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webgl" => Ok(InputDialect::Webgl),
            "webgln" => Ok(InputDialect::Webgln),
            "webgl2" => Ok(InputDialect::Webgl2),
            "webgl3" => Ok(InputDialect::Webgl3),
            "gles2" => Ok(InputDialect::Gles2),
            "gles3" => Ok(InputDialect::Gles3),
            "gles31" => Ok(InputDialect::Gles31),
            "gles32" => Ok(InputDialect::Gles32),
            other => Err(UsageError::UnknownInputDialect(other.to_string())),
        }
    }
}

/// Target language the translator emits (`output` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputDialect {
    #[default]
    Essl,
    /// Desktop GLSL. `None` is the compatibility profile (bare `glsl` tag).
    Glsl(Option<u32>),
    Spirv,
    Hlsl9,
    Hlsl11,
    Msl,
}

impl OutputDialect {
    /// Binary formats carry object code as base64, never as plain text.
    pub fn is_binary(self) -> bool {
        matches!(self, OutputDialect::Spirv)
    }
}

impl fmt::Display for OutputDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDialect::Essl => f.write_str("essl"),
            OutputDialect::Glsl(None) => f.write_str("glsl"),
            OutputDialect::Glsl(Some(version)) => write!(f, "glsl{}", version),
            OutputDialect::Spirv => f.write_str("spirv"),
            OutputDialect::Hlsl9 => f.write_str("hlsl9"),
            OutputDialect::Hlsl11 => f.write_str("hlsl11"),
            OutputDialect::Msl => f.write_str("msl"),
        }
    }
}

impl FromStr for OutputDialect {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "essl" => return Ok(OutputDialect::Essl),
            "glsl" => return Ok(OutputDialect::Glsl(None)),
            "spirv" => return Ok(OutputDialect::Spirv),
            "hlsl9" => return Ok(OutputDialect::Hlsl9),
            "hlsl11" => return Ok(OutputDialect::Hlsl11),
            "msl" => return Ok(OutputDialect::Msl),
            _ => {}
        }

        s.strip_prefix("glsl")
            .and_then(|suffix| suffix.parse::<u32>().ok())
            .filter(|version| GLSL_VERSIONS.contains(version))
            .map(|version| OutputDialect::Glsl(Some(version)))
            .ok_or_else(|| UsageError::UnknownOutputDialect(s.to_string()))
    }
}

impl TryFrom<String> for OutputDialect {
    type Error = UsageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputDialect> for String {
    fn from(value: OutputDialect) -> Self {
        value.to_string()
    }
}
