// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// The peer answered, but the answer cannot be trusted. Never retried.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("string at offset {ptr} is not NUL-terminated within linear memory ({memory_size} bytes)")]
    MissingTerminator { ptr: u32, memory_size: usize },

    #[error("offset {ptr} is outside linear memory ({memory_size} bytes)")]
    OutOfBounds { ptr: u32, memory_size: usize },

    #[error("response is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("response id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: u64, actual: String },

    /// Both or neither of `result` and `error` were present.
    #[error("response must carry exactly one of 'result' or 'error'")]
    AmbiguousResponse,

    /// The peer could not parse or route our envelope.
    #[error("peer rejected the request envelope (code {code}): {message}")]
    PeerRejected { code: i32, message: String },

    #[error("object code for output dialect '{dialect}' must be sent as '{expected}'")]
    ObjectCodeShape {
        dialect: String,
        expected: &'static str,
    },

    #[error("object code was requested but the response carries none")]
    MissingObjectCode,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("reflection entry '{name}' has an empty mapped name")]
    EmptyMappedName { name: String },
}
