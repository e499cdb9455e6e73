// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Caller-facing translation client.
//!
//! [`ShaderTranslator`] owns one [`ModuleHandle`] and turns typed requests into
//! envelopes and responses back into typed results. It never retries: compile
//! failures surface as they are, and the only bounded retry lives inside the
//! process transport.


use crate::backends::in_process::InProcessChannel;
use crate::backends::process::ProcessChannel;
use crate::backends::wasm::WasmtimeMemory;
use crate::config::{BackendType, Config};
use crate::errors::TranslatorResult;
use crate::lifecycle::{LifecycleState, ModuleHandle};
use crate::observability::messages::translator::{
    CompilerInfoLog, TranslationCompleted, TranslationFailed, TranslationStarted,
};
use crate::observability::messages::StructuredLog;
use crate::protocol::{
    decode_response, encode_request, IdMismatchPolicy, InputDialect, OutputDialect, ShaderStage,
    TranslateOptions, TranslationRequest, TranslationResult,
};
use crate::traits::Transport;
use std::time::Instant;

/// Translates shaders through one sandboxed translator instance.
///
/// # Example
/// ```no_run
/// use shader_bridge::client::ShaderTranslator;
/// use shader_bridge::config::load_and_validate_config;
/// use shader_bridge::protocol::{InputDialect, OutputDialect, ShaderStage, TranslateOptions};
///
/// let config = load_and_validate_config("configs/wasm.yaml")?;
/// let mut translator = ShaderTranslator::from_config(&config)?;
///
/// let result = translator.translate(
///     "void main() { gl_Position = vec4(0.0); }",
///     ShaderStage::Vertex,
///     InputDialect::Webgl,
///     OutputDialect::Glsl(Some(330)),
///     &TranslateOptions::default(),
/// )?;
/// println!("{}", result.info_log);
/// translator.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ShaderTranslator<T: Transport = Box<dyn Transport + Send>> {
    handle: ModuleHandle<T>,
}

impl ShaderTranslator {
    /// Opens the binding selected by `config.backend`.
    pub fn from_config(config: &Config) -> TranslatorResult<Self> {
        config.validate()?;

        let transport: Box<dyn Transport + Send> = match config.backend {
            BackendType::Wasm => {
                let wasm = config.wasm_section()?;
                let memory = WasmtimeMemory::load(&wasm.module, wasm.instance_options())?;
                Box::new(InProcessChannel::new(memory, wasm.response_ownership))
            }
            BackendType::Process => {
                let process = config.process_section()?;
                Box::new(ProcessChannel::new(process.process_options()))
            }
        };

        Self::open(transport, config.protocol.id_mismatch)
    }
}

impl<T: Transport> ShaderTranslator<T> {
    /// Starts and initializes the translator behind `transport`.
    pub fn open(transport: T, policy: IdMismatchPolicy) -> TranslatorResult<Self> {
        Ok(Self {
            handle: ModuleHandle::open(transport, policy)?,
        })
    }

    pub fn translate(
        &mut self,
        source: &str,
        stage: ShaderStage,
        input_dialect: InputDialect,
        output_dialect: OutputDialect,
        options: &TranslateOptions,
    ) -> TranslatorResult<TranslationResult> {
        let request = TranslationRequest::new(
            source,
            stage,
            input_dialect,
            output_dialect,
            options.clone(),
        )?;
        self.translate_request(&request)
    }

    /// Sends one prepared request and decodes its response.
    ///
    /// The compiler's info log is returned verbatim, on success in the result and on
    /// failure through [`TranslatorError::info_log`](crate::errors::TranslatorError::info_log).
    pub fn translate_request(
        &mut self,
        request: &TranslationRequest,
    ) -> TranslatorResult<TranslationResult> {
        let request_id = self.handle.next_id();
        let started = Instant::now();

        let outcome = self.exchange(request_id, request);
        match &outcome {
            Ok(result) => {
                if !result.info_log.is_empty() {
                    tracing::debug!(
                        "{}",
                        CompilerInfoLog {
                            request_id,
                            info_log: &result.info_log,
                        }
                    );
                }
                TranslationCompleted {
                    request_id,
                    object_code_bytes: result
                        .object_code
                        .as_ref()
                        .map(|code| code.as_bytes().len())
                        .unwrap_or(0),
                    warnings: result.warnings.len(),
                    duration: started.elapsed(),
                }
                .log();
            }
            Err(err) => {
                if let Some(info_log) = err.info_log() {
                    tracing::debug!(
                        "{}",
                        CompilerInfoLog {
                            request_id,
                            info_log,
                        }
                    );
                }
                tracing::warn!("{}", TranslationFailed { request_id, error: err });
            }
        }
        outcome
    }

    fn exchange(
        &mut self,
        request_id: u64,
        request: &TranslationRequest,
    ) -> TranslatorResult<TranslationResult> {
        let message = encode_request(request_id, request)?;
        tracing::debug!(
            "{}",
            TranslationStarted {
                request_id,
                stage: request.shader_stage().as_str(),
                input_dialect: request.input_dialect().as_str(),
                output_dialect: &request.output_dialect().to_string(),
                source_bytes: request.shader_source().len(),
            }
        );

        let response = self.handle.call(request_id, &message)?;
        decode_response(
            &response,
            request_id,
            request.output_dialect(),
            request.wants_object_code(),
            self.handle.policy(),
        )
    }

    /// Finalizes the translator and releases its resources. Idempotent.
    pub fn close(&mut self) -> TranslatorResult<()> {
        self.handle.close()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    pub fn state(&self) -> LifecycleState {
        self.handle.state()
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        self.handle.transport()
    }
}
