// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wire protocol: dialect vocabulary, typed requests and results, and the
//! JSON-RPC codec shared by every binding.

pub mod codec;
pub mod dialect;
pub mod types;

pub use codec::{
    decode_ack, decode_request, decode_response, encode_request, encode_shutdown,
    IdMismatchPolicy, Method, RequestIds,
};
pub use dialect::{InputDialect, OutputDialect, ShaderStage, GLSL_VERSIONS};
pub use types::{
    ObjectCode, ReflectionTable, TranslateOptions, TranslationRequest, TranslationResult,
    UniformBlock, VariableInfo,
};
