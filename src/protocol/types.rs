// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Caller-facing request and result types.
//!
//! These are the explicit, typed shapes of what travels over the wire. Optional
//! parts are declared here and validated once at decode time.

use super::dialect::{InputDialect, OutputDialect, ShaderStage};
use crate::errors::UsageError;
use serde::Serialize;
use std::collections::BTreeMap;

/// Compile flag asking the backend to emit object code.
pub const OBJECT_CODE: &str = "object_code";

/// Compile flag asking the backend to zero-initialize locals.
pub const INITIALIZE_UNINITIALIZED_LOCALS: &str = "initialize_uninitialized_locals";

/// Resource flag that switches the backend to hashed identifiers instead of the `_u` prefix.
pub const ENABLE_NAME_HASHING: &str = "EnableNameHashing";

/// Per-call knobs besides source, stage and dialects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    pub want_reflection: bool,
    pub compile_flags: BTreeMap<String, bool>,
    pub resource_flags: BTreeMap<String, bool>,
    pub resource_limits: BTreeMap<String, i64>,
}

impl TranslateOptions {
    pub fn with_reflection(mut self) -> Self {
        self.want_reflection = true;
        self
    }

    pub fn compile_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.compile_flags.insert(name.into(), value);
        self
    }

    pub fn resource_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.resource_flags.insert(name.into(), value);
        self
    }

    pub fn resource_limit(mut self, name: impl Into<String>, value: i64) -> Self {
        self.resource_limits.insert(name.into(), value);
        self
    }
}

/// One translation call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    shader_source: String,
    shader_stage: ShaderStage,
    input_dialect: InputDialect,
    output_dialect: OutputDialect,
    want_reflection: bool,
    compile_flags: BTreeMap<String, bool>,
    resource_flags: BTreeMap<String, bool>,
    resource_limits: BTreeMap<String, i64>,
}

impl TranslationRequest {
    /// Builds a request, filling in `object_code` and `initialize_uninitialized_locals`
    /// (both `true`) unless the caller set them.
    ///
    /// Resource flags and limits share one namespace on the wire, so a name used in
    /// both maps is rejected.
    pub fn new(
        source: impl Into<String>,
        stage: ShaderStage,
        input_dialect: InputDialect,
        output_dialect: OutputDialect,
        options: TranslateOptions,
    ) -> Result<Self, UsageError> {
        if let Some(name) = options
            .resource_flags
            .keys()
            .find(|name| options.resource_limits.contains_key(*name))
        {
            return Err(UsageError::InvalidParameter(format!(
                "resource '{}' is set both as a flag and as a limit",
                name
            )));
        }

        let mut compile_flags = BTreeMap::from([
            (OBJECT_CODE.to_string(), true),
            (INITIALIZE_UNINITIALIZED_LOCALS.to_string(), true),
        ]);
        compile_flags.extend(options.compile_flags);

        Ok(Self {
            shader_source: source.into(),
            shader_stage: stage,
            input_dialect,
            output_dialect,
            want_reflection: options.want_reflection,
            compile_flags,
            resource_flags: options.resource_flags,
            resource_limits: options.resource_limits,
        })
    }

    /// Rebuilds a request exactly as decoded from the wire, without default flags.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        shader_source: String,
        shader_stage: ShaderStage,
        input_dialect: InputDialect,
        output_dialect: OutputDialect,
        want_reflection: bool,
        compile_flags: BTreeMap<String, bool>,
        resource_flags: BTreeMap<String, bool>,
        resource_limits: BTreeMap<String, i64>,
    ) -> Self {
        Self {
            shader_source,
            shader_stage,
            input_dialect,
            output_dialect,
            want_reflection,
            compile_flags,
            resource_flags,
            resource_limits,
        }
    }

    pub fn shader_source(&self) -> &str {
        &self.shader_source
    }

    pub fn shader_stage(&self) -> ShaderStage {
        self.shader_stage
    }

    pub fn input_dialect(&self) -> InputDialect {
        self.input_dialect
    }

    pub fn output_dialect(&self) -> OutputDialect {
        self.output_dialect
    }

    pub fn want_reflection(&self) -> bool {
        self.want_reflection
    }

    pub fn compile_flags(&self) -> &BTreeMap<String, bool> {
        &self.compile_flags
    }

    pub fn resource_flags(&self) -> &BTreeMap<String, bool> {
        &self.resource_flags
    }

    pub fn resource_limits(&self) -> &BTreeMap<String, i64> {
        &self.resource_limits
    }

    pub fn wants_object_code(&self) -> bool {
        self.compile_flags.get(OBJECT_CODE).copied().unwrap_or(true)
    }
}

/// Translated output. Which variant appears is decided by the output dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ObjectCode {
    Text(String),
    Binary(Vec<u8>),
}

impl ObjectCode {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ObjectCode::Text(text) => Some(text),
            ObjectCode::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ObjectCode::Text(text) => text.as_bytes(),
            ObjectCode::Binary(bytes) => bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableInfo {
    pub original_name: String,
    pub mapped_name: String,
    pub location: Option<i32>,
    pub array_sizes: Vec<u32>,
    pub static_use: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniformBlock {
    pub block_name: String,
    pub mapped_name: Option<String>,
    pub instance_name: Option<String>,
    pub fields: Vec<VariableInfo>,
}

/// Active variables as reported by the backend, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReflectionTable {
    pub attributes: Vec<VariableInfo>,
    pub uniforms: Vec<VariableInfo>,
    pub uniform_blocks: Vec<UniformBlock>,
    pub varyings: Vec<VariableInfo>,
    pub outputs: Vec<VariableInfo>,
}

impl ReflectionTable {
    pub fn attribute(&self, original_name: &str) -> Option<&VariableInfo> {
        self.attributes
            .iter()
            .find(|var| var.original_name == original_name)
    }

    /// Looks up a standalone uniform first, then fields of uniform blocks.
    pub fn uniform(&self, original_name: &str) -> Option<&VariableInfo> {
        self.uniforms
            .iter()
            .chain(self.uniform_blocks.iter().flat_map(|block| block.fields.iter()))
            .find(|var| var.original_name == original_name)
    }

    pub fn varying(&self, original_name: &str) -> Option<&VariableInfo> {
        self.varyings
            .iter()
            .find(|var| var.original_name == original_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub object_code: Option<ObjectCode>,
    /// Backend diagnostics, verbatim. May hold warnings even on success.
    pub info_log: String,
    pub reflection: Option<ReflectionTable>,
    /// Non-fatal protocol irregularities tolerated while decoding this result.
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_compile_flags_are_filled_in() {
        let request = TranslationRequest::new(
            "void main() {}",
            ShaderStage::Vertex,
            InputDialect::Webgl,
            OutputDialect::Essl,
            TranslateOptions::default(),
        )
        .unwrap();

        assert_eq!(request.compile_flags().get(OBJECT_CODE), Some(&true));
        assert_eq!(
            request.compile_flags().get(INITIALIZE_UNINITIALIZED_LOCALS),
            Some(&true)
        );
        assert!(request.wants_object_code());
    }

    #[test]
    fn test_caller_flags_override_defaults() {
        let options = TranslateOptions::default()
            .compile_flag(OBJECT_CODE, false)
            .compile_flag("intermediate_tree", true);
        let request = TranslationRequest::new(
            "void main() {}",
            ShaderStage::Fragment,
            InputDialect::Webgl2,
            OutputDialect::Glsl(Some(330)),
            options,
        )
        .unwrap();

        assert!(!request.wants_object_code());
        assert_eq!(request.compile_flags().get("intermediate_tree"), Some(&true));
        assert_eq!(request.compile_flags().len(), 3);
    }

    #[test]
    fn test_resource_name_used_as_flag_and_limit_is_rejected() {
        let options = TranslateOptions::default()
            .resource_flag("MaxDrawBuffers", true)
            .resource_limit("MaxDrawBuffers", 8);

        let err = TranslationRequest::new(
            "void main() {}",
            ShaderStage::Fragment,
            InputDialect::Webgl2,
            OutputDialect::Essl,
            options,
        )
        .unwrap_err();

        match err {
            UsageError::InvalidParameter(message) => assert!(message.contains("MaxDrawBuffers")),
            other => panic!("Expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_distinct_resource_names_are_kept_apart() {
        let options = TranslateOptions::default()
            .resource_flag(ENABLE_NAME_HASHING, true)
            .resource_limit("MaxDrawBuffers", 8);

        let request = TranslationRequest::new(
            "void main() {}",
            ShaderStage::Fragment,
            InputDialect::Webgl2,
            OutputDialect::Essl,
            options,
        )
        .unwrap();

        assert_eq!(request.resource_flags().get(ENABLE_NAME_HASHING), Some(&true));
        assert_eq!(request.resource_limits().get("MaxDrawBuffers"), Some(&8));
    }

    fn var(name: &str, mapped: &str) -> VariableInfo {
        VariableInfo {
            original_name: name.to_string(),
            mapped_name: mapped.to_string(),
            location: None,
            array_sizes: vec![],
            static_use: true,
        }
    }

    #[test]
    fn test_uniform_lookup_searches_blocks() {
        let table = ReflectionTable {
            uniforms: vec![var("iTime", "_uiTime")],
            uniform_blocks: vec![UniformBlock {
                block_name: "Globals".to_string(),
                mapped_name: Some("_uGlobals".to_string()),
                instance_name: None,
                fields: vec![var("iResolution", "_uiResolution")],
            }],
            ..ReflectionTable::default()
        };

        assert_eq!(table.uniform("iTime").unwrap().mapped_name, "_uiTime");
        assert_eq!(table.uniform("iResolution").unwrap().mapped_name, "_uiResolution");
        assert!(table.uniform("iMouse").is_none());
        assert!(table.attribute("iTime").is_none());
    }
}
