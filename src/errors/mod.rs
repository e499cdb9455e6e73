// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy for the translator boundary.
//!
//! Every failure a caller can observe is one of four kinds:
//!
//! * [`UsageError`] - the caller did something wrong (closed handle, unknown dialect tag)
//! * [`ChannelError`] - the transport to the sandboxed module broke
//! * [`ProtocolError`] - the module answered with something we cannot decode
//! * [`TranslationError`] - the compiler backend reported a failure
//!
//! All four are wrapped by [`TranslatorError`], which is what every public
//! operation returns.

mod channel;
mod config;
mod protocol;
mod translation;
mod usage;

pub use channel::ChannelError;
pub use config::ConfigError;
pub use protocol::ProtocolError;
pub use translation::{TranslationError, COMPILE_FAILED, LEGACY_COMPILE_FAILED};
pub use usage::UsageError;

use thiserror::Error;

/// Coarse classification of a [`TranslatorError`], used for retry decisions and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    Channel,
    Protocol,
    Compile,
}

/// Top-level error returned by the translation client and the lifecycle manager.
#[derive(Error, Debug)]
pub enum TranslatorError {
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Compile(#[from] TranslationError),
}

impl TranslatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslatorError::Usage(_) => ErrorKind::Usage,
            TranslatorError::Channel(_) => ErrorKind::Channel,
            TranslatorError::Protocol(_) => ErrorKind::Protocol,
            TranslatorError::Compile(_) => ErrorKind::Compile,
        }
    }

    /// The compiler's diagnostic text, when the failure carries one.
    pub fn info_log(&self) -> Option<&str> {
        match self {
            TranslatorError::Compile(err) => err.info_log.as_deref(),
            _ => None,
        }
    }

    /// Whether the out-of-process binding may restart the peer and retry after this error.
    pub fn is_restartable(&self) -> bool {
        match self {
            TranslatorError::Channel(err) => err.is_peer_failure(),
            _ => false,
        }
    }
}

impl From<ConfigError> for TranslatorError {
    fn from(err: ConfigError) -> Self {
        TranslatorError::Usage(UsageError::Config(err))
    }
}

impl From<crate::backends::wasm::WasmError> for TranslatorError {
    fn from(err: crate::backends::wasm::WasmError) -> Self {
        TranslatorError::Channel(ChannelError::Module(err))
    }
}

/// Result alias used throughout the crate.
pub type TranslatorResult<T> = Result<T, TranslatorError>;
