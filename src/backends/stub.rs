// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for the memory channel and the transport seam.

use crate::errors::{ChannelError, ProtocolError, TranslatorError, TranslatorResult};
use crate::protocol::{decode_request, Method, ObjectCode, TranslationRequest};
use crate::traits::{GuestPtr, LinearMemory, Transport};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const STUB_MEMORY_SIZE: usize = 64 * 1024;

/// What the stub module does when `invoke` is called.
pub enum Reply {
    /// Allocate a response buffer and write this JSON into it.
    Json(String),
    /// Return the null address.
    Null,
    /// Trap inside `invoke`.
    Trap,
    /// Return a buffer that runs to the end of memory with no terminator.
    Unterminated,
    /// Return a terminated buffer that is not UTF-8.
    InvalidUtf8,
}

type Responder = Box<dyn FnMut(&str) -> Reply + Send>;

/// A `LinearMemory` that counts every allocation and free.
pub struct TrackingMemory {
    bytes: Vec<u8>,
    next: u32,
    live: HashMap<u32, u32>,
    allocations: usize,
    frees: usize,
    invocations: usize,
    finalize_calls: usize,
    initialize_result: bool,
    failing_allocator: bool,
    free_budget: Option<usize>,
    last_request: Option<String>,
    responder: Responder,
}

impl TrackingMemory {
    pub fn new(responder: impl FnMut(&str) -> Reply + Send + 'static) -> Self {
        Self {
            bytes: vec![0; STUB_MEMORY_SIZE],
            next: 8,
            live: HashMap::new(),
            allocations: 0,
            frees: 0,
            invocations: 0,
            finalize_calls: 0,
            initialize_result: true,
            failing_allocator: false,
            free_budget: None,
            last_request: None,
            responder: Box::new(responder),
        }
    }

    pub fn with_initialize_result(mut self, result: bool) -> Self {
        self.initialize_result = result;
        self
    }

    pub fn with_failing_allocator(mut self) -> Self {
        self.failing_allocator = true;
        self
    }

    /// Lets `budget` frees succeed; every later free traps.
    pub fn with_trapping_free_after(mut self, budget: usize) -> Self {
        self.free_budget = Some(budget);
        self
    }

    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn frees(&self) -> usize {
        self.frees
    }

    pub fn live_allocations(&self) -> usize {
        self.live.len()
    }

    pub fn invocations(&self) -> usize {
        self.invocations
    }

    pub fn finalize_calls(&self) -> usize {
        self.finalize_calls
    }

    pub fn last_request(&self) -> Option<&str> {
        self.last_request.as_deref()
    }

    fn place(&mut self, payload: &[u8]) -> TranslatorResult<GuestPtr> {
        let ptr = self.allocate(payload.len() as u32)?;
        self.write(ptr, payload)?;
        Ok(ptr)
    }

    fn c_string_at(&self, ptr: GuestPtr) -> String {
        let tail = &self.bytes[ptr.offset()..];
        let end = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
        String::from_utf8_lossy(&tail[..end]).into_owned()
    }
}

impl LinearMemory for TrackingMemory {
    fn allocate(&mut self, size: u32) -> TranslatorResult<GuestPtr> {
        if self.failing_allocator || self.next as usize + size as usize > self.bytes.len() {
            return Ok(GuestPtr::NULL);
        }
        let ptr = self.next;
        // Keep every block 8-byte aligned like a real malloc.
        self.next += (size + 7) & !7;
        self.live.insert(ptr, size);
        self.allocations += 1;
        Ok(GuestPtr(ptr))
    }

    fn write(&mut self, ptr: GuestPtr, bytes: &[u8]) -> TranslatorResult<()> {
        let end = ptr.offset() + bytes.len();
        if end > self.bytes.len() {
            return Err(ProtocolError::OutOfBounds {
                ptr: ptr.0,
                memory_size: self.bytes.len(),
            }
            .into());
        }
        self.bytes[ptr.offset()..end].copy_from_slice(bytes);
        Ok(())
    }

    fn read(&mut self, ptr: GuestPtr, max: usize) -> TranslatorResult<Vec<u8>> {
        let start = ptr.offset().min(self.bytes.len());
        let end = (start + max).min(self.bytes.len());
        Ok(self.bytes[start..end].to_vec())
    }

    fn free(&mut self, ptr: GuestPtr) -> TranslatorResult<()> {
        if self.free_budget.is_some_and(|budget| self.frees >= budget) {
            return Err(ChannelError::Trap {
                entry_point: "free",
                message: "wasm trap: unreachable".to_string(),
            }
            .into());
        }
        match self.live.remove(&ptr.0) {
            Some(_) => {
                self.frees += 1;
                Ok(())
            }
            None => Err(ChannelError::Trap {
                entry_point: "free",
                message: format!("double free or invalid pointer {}", ptr),
            }
            .into()),
        }
    }

    fn size(&mut self) -> usize {
        self.bytes.len()
    }

    fn initialize(&mut self) -> TranslatorResult<bool> {
        Ok(self.initialize_result)
    }

    fn invoke(&mut self, request: GuestPtr) -> TranslatorResult<GuestPtr> {
        self.invocations += 1;
        let message = self.c_string_at(request);
        self.last_request = Some(message.clone());

        match (self.responder)(&message) {
            Reply::Json(json) => {
                let mut payload = json.into_bytes();
                payload.push(0);
                self.place(&payload)
            }
            Reply::Null => Ok(GuestPtr::NULL),
            Reply::Trap => Err(ChannelError::Trap {
                entry_point: "invoke",
                message: "wasm trap: unreachable".to_string(),
            }
            .into()),
            Reply::Unterminated => {
                let remaining = self.bytes.len() - self.next as usize;
                let ptr = self.place(&vec![b'x'; remaining])?;
                Ok(ptr)
            }
            Reply::InvalidUtf8 => self.place(&[0xff, 0xfe, 0xfd, 0x00]),
        }
    }

    fn finalize(&mut self) -> TranslatorResult<()> {
        self.finalize_calls += 1;
        Ok(())
    }
}

/// Answers requests the way a healthy translator would, echoing the request id.
///
/// Sources containing `undeclared_variable` fail with a compile error; every uniform
/// declared on its own line is reported with a `_u` prefixed mapped name.
pub fn loopback_reply(message: &str) -> Reply {
    Reply::Json(loopback_response(message))
}

pub fn loopback_response(message: &str) -> String {
    let (id, method, request) = match decode_request(message) {
        Ok(decoded) => decoded,
        Err(err) => {
            return serde_json::json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": format!("Parse error: {}", err) }
            })
            .to_string();
        }
    };

    let request = match (method, request) {
        (Method::Shutdown, _) | (_, None) => {
            return serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": "Shutdown acknowledged." })
                .to_string();
        }
        (Method::Translate, Some(request)) => request,
    };

    if request.shader_source().contains("undeclared_variable") {
        return serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": -32002,
                "message": "Shader compilation failed.",
                "data": { "info_log": "ERROR: 0:3: 'undeclared_variable' : undeclared identifier\n" }
            }
        })
        .to_string();
    }

    let mut result = serde_json::json!({ "info_log": "" });
    match fake_object_code(&request) {
        ObjectCode::Text(text) => result["object_code"] = text.into(),
        ObjectCode::Binary(bytes) => result["object_code_base64"] = STANDARD.encode(bytes).into(),
    }
    if request.want_reflection() {
        let uniforms: Vec<_> = uniform_names(request.shader_source())
            .into_iter()
            .map(|name| {
                serde_json::json!({
                    "name": name,
                    "mapped_name": format!("_u{}", name),
                    "static_use": true
                })
            })
            .collect();
        result["active_variables"] = serde_json::json!({ "uniforms": uniforms });
    }

    serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string()
}

fn fake_object_code(request: &TranslationRequest) -> ObjectCode {
    if request.output_dialect().is_binary() {
        ObjectCode::Binary(vec![0x03, 0x02, 0x23, 0x07, 0x00, 0x00, 0x01, 0x00])
    } else {
        ObjectCode::Text(format!(
            "// {}\n{}",
            request.output_dialect(),
            request.shader_source()
        ))
    }
}

fn uniform_names(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| line.trim().strip_prefix("uniform "))
        .filter_map(|decl| decl.trim_end_matches(';').split_whitespace().last())
        .map(str::to_string)
        .collect()
}

/// Counters shared between a [`LoopbackTransport`] and the test that built it.
#[derive(Debug, Default, Clone)]
pub struct TransportCalls {
    pub starts: usize,
    pub round_trips: usize,
    pub finalizes: usize,
    pub releases: usize,
}

/// A `Transport` that answers in-process with [`loopback_response`].
pub struct LoopbackTransport {
    calls: Arc<Mutex<TransportCalls>>,
    fail_start: bool,
    fail_finalize: bool,
}

impl LoopbackTransport {
    pub fn new() -> (Self, Arc<Mutex<TransportCalls>>) {
        let calls = Arc::new(Mutex::new(TransportCalls::default()));
        (
            Self {
                calls: Arc::clone(&calls),
                fail_start: false,
                fail_finalize: false,
            },
            calls,
        )
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    fn record(&self, f: impl FnOnce(&mut TransportCalls)) {
        let mut calls = self.calls.lock().unwrap();
        f(&mut calls);
    }
}

impl Transport for LoopbackTransport {
    fn binding(&self) -> &'static str {
        "loopback"
    }

    fn start(&mut self) -> TranslatorResult<()> {
        self.record(|calls| calls.starts += 1);
        if self.fail_start {
            return Err(ChannelError::InitializeFailed.into());
        }
        Ok(())
    }

    fn round_trip(&mut self, _request_id: u64, message: &str) -> TranslatorResult<String> {
        self.record(|calls| calls.round_trips += 1);
        Ok(loopback_response(message))
    }

    fn finalize(&mut self, _request_id: u64, shutdown: &str) -> TranslatorResult<Option<String>> {
        self.record(|calls| calls.finalizes += 1);
        if self.fail_finalize {
            return Err(TranslatorError::Channel(ChannelError::Trap {
                entry_point: "finalize",
                message: "wasm trap: unreachable".to_string(),
            }));
        }
        Ok(Some(loopback_response(shutdown)))
    }

    fn release(&mut self) {
        self.record(|calls| calls.releases += 1);
    }
}
