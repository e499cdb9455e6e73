// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::wasm::WasmError;
use thiserror::Error;

/// Transport failures between the host and the sandboxed translator.
///
/// The out-of-process binding enriches peer failures with the child's exit status and
/// the tail of its captured stderr so the caller can see why the peer went away.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("failed to start translator '{executable}': {source}")]
    Spawn {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer was not running and the single restart attempt for this call failed.
    #[error("translator '{executable}' could not be restarted: {reason}")]
    RestartFailed { executable: String, reason: String },

    #[error("no response from translator for request {request_id}; it may have crashed ({status}). stderr: '{stderr}'")]
    PeerExited {
        request_id: u64,
        status: String,
        stderr: String,
    },

    #[error("broken pipe while sending request {request_id}; translator likely crashed ({status}). stderr: '{stderr}'")]
    BrokenPipe {
        request_id: u64,
        status: String,
        stderr: String,
    },

    #[error("I/O error on translator channel: {0}")]
    Io(#[from] std::io::Error),

    /// `invoke` returned a zero address instead of a response buffer.
    #[error("module returned no result (invoke returned a null pointer)")]
    NullResult,

    #[error("module failed to allocate {size} bytes")]
    Allocation { size: u32 },

    #[error("module trapped in '{entry_point}': {message}")]
    Trap {
        entry_point: &'static str,
        message: String,
    },

    /// A previous trap left the module instance in an unknown state.
    #[error("module instance is unusable after an earlier trap")]
    Poisoned,

    #[error("module initialization failed (initialize returned false)")]
    InitializeFailed,

    #[error("module does not export '{name}': {reason}")]
    MissingExport { name: &'static str, reason: String },

    #[error("module error: {0}")]
    Module(#[from] WasmError),
}

impl ChannelError {
    /// True when the failure means the peer process died or its pipes broke.
    pub fn is_peer_failure(&self) -> bool {
        matches!(
            self,
            ChannelError::PeerExited { .. } | ChannelError::BrokenPipe { .. }
        )
    }
}
