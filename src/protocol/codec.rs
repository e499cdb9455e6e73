// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! JSON-RPC envelope encoding and decoding.
//!
//! A request is one JSON object: `jsonrpc`, `id`, `method` and (for `translate`)
//! a `params` object whose shader source is base64 so control characters and
//! encoding quirks in the source can never corrupt the envelope. A response
//! carries exactly one of `result` or `error`.
//!
//! Object code is decoded according to the output dialect of the request, never
//! by looking at the payload: binary dialects must use `object_code_base64`.

use super::dialect::{InputDialect, OutputDialect, ShaderStage};
use super::types::{
    ObjectCode, ReflectionTable, TranslationRequest, TranslationResult, UniformBlock, VariableInfo,
};
use crate::errors::{ProtocolError, TranslationError, TranslatorError};
use crate::observability::messages::translator::ResponseIdMismatch;
use crate::observability::messages::StructuredLog;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC codes meaning the peer could not parse or route the envelope itself.
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Translate,
    Shutdown,
}

/// What to do when a response id does not match the outstanding request.
///
/// Mismatches are always logged. `Reject` turns them into a protocol error;
/// `Warn` keeps the response and records the mismatch in the result's warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdMismatchPolicy {
    #[default]
    Reject,
    Warn,
}

/// Hands out request identifiers for one module handle, starting at 1.
#[derive(Debug, Default)]
pub struct RequestIds {
    last: u64,
}

impl RequestIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

#[derive(Serialize)]
struct RequestEnvelope<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<TranslateParams<'a>>,
}

#[derive(Serialize)]
struct TranslateParams<'a> {
    shader_code_base64: String,
    shader_type: ShaderStage,
    spec: InputDialect,
    output: OutputDialect,
    print_active_variables: bool,
    compile_options: &'a BTreeMap<String, bool>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    resources: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
struct IncomingRequest {
    id: u64,
    method: Method,
    #[serde(default)]
    params: Option<IncomingParams>,
}

#[derive(Deserialize)]
struct IncomingParams {
    shader_code_base64: String,
    shader_type: ShaderStage,
    #[serde(default)]
    spec: InputDialect,
    #[serde(default)]
    output: OutputDialect,
    #[serde(default)]
    print_active_variables: bool,
    #[serde(default)]
    compile_options: BTreeMap<String, bool>,
    #[serde(default)]
    resources: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

#[derive(Deserialize)]
struct ErrorObject {
    code: i32,
    message: String,
    #[serde(default)]
    data: Option<ErrorData>,
}

#[derive(Deserialize)]
struct ErrorData {
    #[serde(default)]
    info_log: Option<String>,
}

#[derive(Deserialize)]
struct WireResult {
    #[serde(default)]
    info_log: String,
    #[serde(default)]
    object_code: Option<String>,
    #[serde(default)]
    object_code_base64: Option<String>,
    #[serde(default)]
    active_variables: Option<WireActiveVariables>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct WireActiveVariables {
    attributes: Vec<WireVariable>,
    uniforms: Vec<WireVariable>,
    uniform_blocks: Vec<WireBlock>,
    input_varyings: Vec<WireVariable>,
    output_varyings: Vec<WireVariable>,
    output_variables: Vec<WireVariable>,
}

#[derive(Deserialize)]
struct WireVariable {
    name: String,
    #[serde(default)]
    mapped_name: String,
    #[serde(default)]
    location: Option<i32>,
    #[serde(default)]
    array_sizes: Vec<u32>,
    #[serde(default)]
    static_use: bool,
}

#[derive(Deserialize)]
struct WireBlock {
    name: String,
    #[serde(default)]
    mapped_name: Option<String>,
    #[serde(default)]
    instance_name: Option<String>,
    #[serde(default)]
    fields: Vec<WireVariable>,
}

/// Encodes a `translate` request as a single-line JSON envelope.
pub fn encode_request(id: u64, request: &TranslationRequest) -> Result<String, ProtocolError> {
    let mut resources = serde_json::Map::new();
    for (name, flag) in request.resource_flags() {
        resources.insert(name.clone(), Value::Bool(*flag));
    }
    for (name, limit) in request.resource_limits() {
        resources.insert(name.clone(), Value::from(*limit));
    }

    let envelope = RequestEnvelope {
        jsonrpc: JSONRPC_VERSION,
        id,
        method: Method::Translate,
        params: Some(TranslateParams {
            shader_code_base64: STANDARD.encode(request.shader_source().as_bytes()),
            shader_type: request.shader_stage(),
            spec: request.input_dialect(),
            output: request.output_dialect(),
            print_active_variables: request.want_reflection(),
            compile_options: request.compile_flags(),
            resources,
        }),
    };

    Ok(serde_json::to_string(&envelope)?)
}

/// Encodes a `shutdown` request. It carries no params.
pub fn encode_shutdown(id: u64) -> Result<String, ProtocolError> {
    let envelope = RequestEnvelope {
        jsonrpc: JSONRPC_VERSION,
        id,
        method: Method::Shutdown,
        params: None,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a request envelope the way a peer would see it.
///
/// Returns the request only for `translate`; `shutdown` has no params.
pub fn decode_request(
    message: &str,
) -> Result<(u64, Method, Option<TranslationRequest>), ProtocolError> {
    let incoming: IncomingRequest = serde_json::from_str(message)?;

    let request = match (incoming.method, incoming.params) {
        (Method::Translate, Some(params)) => Some(request_from_params(params)?),
        (Method::Translate, None) => {
            return Err(malformed("translate request is missing 'params'"));
        }
        (Method::Shutdown, _) => None,
    };

    Ok((incoming.id, incoming.method, request))
}

fn request_from_params(params: IncomingParams) -> Result<TranslationRequest, ProtocolError> {
    let source = String::from_utf8(STANDARD.decode(params.shader_code_base64)?)?;

    let mut resource_flags = BTreeMap::new();
    let mut resource_limits = BTreeMap::new();
    for (name, value) in params.resources {
        match value {
            Value::Bool(flag) => {
                resource_flags.insert(name, flag);
            }
            Value::Number(number) => {
                let limit = number
                    .as_i64()
                    .ok_or_else(|| malformed(&format!("resource '{}' is not an integer", name)))?;
                resource_limits.insert(name, limit);
            }
            _ => return Err(malformed(&format!("resource '{}' must be a bool or integer", name))),
        }
    }

    Ok(TranslationRequest::from_parts(
        source,
        params.shader_type,
        params.spec,
        params.output,
        params.print_active_variables,
        params.compile_options,
        resource_flags,
        resource_limits,
    ))
}

/// Decodes the response to a `translate` request.
///
/// `output` is the dialect the request asked for; it alone decides whether object
/// code is text or binary. `wants_object_code` mirrors the request's `object_code`
/// compile flag.
pub fn decode_response(
    message: &str,
    expected_id: u64,
    output: OutputDialect,
    wants_object_code: bool,
    policy: IdMismatchPolicy,
) -> Result<TranslationResult, TranslatorError> {
    let (result, warnings) = open_envelope(message, expected_id, policy)?;

    let wire: WireResult = serde_json::from_value(result).map_err(ProtocolError::from)?;

    let object_code = decode_object_code(&wire, output)?;
    if object_code.is_none() && wants_object_code {
        return Err(ProtocolError::MissingObjectCode.into());
    }

    let reflection = wire
        .active_variables
        .map(reflection_from_wire)
        .transpose()?;

    Ok(TranslationResult {
        object_code,
        info_log: wire.info_log,
        reflection,
        warnings,
    })
}

/// Decodes the acknowledgement of a `shutdown` request. Any `result` value is accepted.
pub fn decode_ack(
    message: &str,
    expected_id: u64,
    policy: IdMismatchPolicy,
) -> Result<(), TranslatorError> {
    open_envelope(message, expected_id, policy).map(|_| ())
}

/// Validates the envelope and returns the `result` value plus any tolerated warnings.
fn open_envelope(
    message: &str,
    expected_id: u64,
    policy: IdMismatchPolicy,
) -> Result<(Value, Vec<String>), TranslatorError> {
    let envelope: ResponseEnvelope = serde_json::from_str(message).map_err(ProtocolError::from)?;

    let mut warnings = Vec::new();
    if envelope.id != Value::from(expected_id) {
        let actual = envelope.id.to_string();
        ResponseIdMismatch {
            expected: expected_id,
            actual: &actual,
            fatal: policy == IdMismatchPolicy::Reject,
        }
        .log();
        match policy {
            IdMismatchPolicy::Reject => {
                return Err(ProtocolError::IdMismatch {
                    expected: expected_id,
                    actual,
                }
                .into());
            }
            IdMismatchPolicy::Warn => warnings.push(format!(
                "response id mismatch: expected {}, got {}",
                expected_id, actual
            )),
        }
    }

    match (envelope.result, envelope.error) {
        (Some(result), None) => Ok((result, warnings)),
        (None, Some(error)) => Err(error_from_wire(error)),
        _ => Err(ProtocolError::AmbiguousResponse.into()),
    }
}

fn error_from_wire(error: ErrorObject) -> TranslatorError {
    match error.code {
        PARSE_ERROR | INVALID_REQUEST | METHOD_NOT_FOUND => ProtocolError::PeerRejected {
            code: error.code,
            message: error.message,
        }
        .into(),
        code => TranslationError {
            code,
            message: error.message,
            info_log: error.data.and_then(|data| data.info_log),
        }
        .into(),
    }
}

fn decode_object_code(
    wire: &WireResult,
    output: OutputDialect,
) -> Result<Option<ObjectCode>, ProtocolError> {
    if output.is_binary() {
        if wire.object_code.is_some() {
            return Err(ProtocolError::ObjectCodeShape {
                dialect: output.to_string(),
                expected: "object_code_base64",
            });
        }
        return wire
            .object_code_base64
            .as_deref()
            .map(|encoded| Ok(ObjectCode::Binary(STANDARD.decode(encoded)?)))
            .transpose();
    }

    match (&wire.object_code, &wire.object_code_base64) {
        (Some(text), _) => Ok(Some(ObjectCode::Text(text.clone()))),
        (None, Some(encoded)) => {
            let text = String::from_utf8(STANDARD.decode(encoded)?)?;
            Ok(Some(ObjectCode::Text(text)))
        }
        (None, None) => Ok(None),
    }
}

fn reflection_from_wire(wire: WireActiveVariables) -> Result<ReflectionTable, ProtocolError> {
    let varyings = wire
        .input_varyings
        .into_iter()
        .chain(wire.output_varyings)
        .collect();

    Ok(ReflectionTable {
        attributes: variables_from_wire(wire.attributes)?,
        uniforms: variables_from_wire(wire.uniforms)?,
        uniform_blocks: wire
            .uniform_blocks
            .into_iter()
            .map(|block| {
                Ok(UniformBlock {
                    block_name: block.name,
                    mapped_name: block.mapped_name,
                    instance_name: block.instance_name,
                    fields: variables_from_wire(block.fields)?,
                })
            })
            .collect::<Result<_, ProtocolError>>()?,
        varyings: variables_from_wire(varyings)?,
        outputs: variables_from_wire(wire.output_variables)?,
    })
}

fn variables_from_wire(vars: Vec<WireVariable>) -> Result<Vec<VariableInfo>, ProtocolError> {
    vars.into_iter()
        .map(|var| {
            if var.mapped_name.is_empty() {
                return Err(ProtocolError::EmptyMappedName { name: var.name });
            }
            Ok(VariableInfo {
                original_name: var.name,
                mapped_name: var.mapped_name,
                location: var.location,
                array_sizes: var.array_sizes,
                static_use: var.static_use,
            })
        })
        .collect()
}

fn malformed(message: &str) -> ProtocolError {
    ProtocolError::Malformed(<serde_json::Error as serde::de::Error>::custom(message))
}
