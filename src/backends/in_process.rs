// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-process binding: requests travel through the module's linear memory.
//!
//! Each call follows the same memory protocol:
//!
//! 1. allocate `len + 1` bytes with the module's `malloc`
//! 2. write the request followed by one NUL terminator
//! 3. call `invoke` with the request address
//! 4. free the request buffer, whatever `invoke` did
//! 5. read the NUL-terminated response
//! 6. free the response buffer when the host owns it
//!
//! A trap anywhere in the module poisons the channel. The instance state is unknown
//! after a trap, so later calls fail fast instead of touching it again.

use crate::errors::{ChannelError, ProtocolError, TranslatorError, TranslatorResult, UsageError};
use crate::observability::messages::wasm::{BufferFreeFailed, ModuleInitialized, ModulePoisoned};
use crate::traits::{GuestPtr, LinearMemory, Transport};
use serde::Deserialize;

/// Bytes fetched per step while scanning for a terminator.
const READ_CHUNK: usize = 4096;

/// Who releases the response buffer returned by `invoke`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseOwnership {
    /// The module allocated the response with `malloc`; the host frees it after reading.
    #[default]
    Host,
    /// The module reuses its own buffer; the host never frees it.
    Module,
}

pub struct InProcessChannel<M: LinearMemory> {
    memory: Option<M>,
    ownership: ResponseOwnership,
    poisoned: bool,
}

impl<M: LinearMemory> InProcessChannel<M> {
    pub fn new(memory: M, ownership: ResponseOwnership) -> Self {
        Self {
            memory: Some(memory),
            ownership,
            poisoned: false,
        }
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Test access to the wrapped memory, e.g. to inspect allocation counters.
    #[cfg(test)]
    pub(crate) fn memory(&self) -> Option<&M> {
        self.memory.as_ref()
    }

    fn live_memory(&mut self) -> TranslatorResult<&mut M> {
        if self.poisoned {
            return Err(ChannelError::Poisoned.into());
        }
        self.memory
            .as_mut()
            .ok_or_else(|| TranslatorError::from(UsageError::Closed))
    }

    /// Marks the channel unusable when `result` is a trap.
    fn track_trap<T>(&mut self, result: TranslatorResult<T>) -> TranslatorResult<T> {
        if let Err(TranslatorError::Channel(ChannelError::Trap { entry_point, .. })) = &result {
            self.poisoned = true;
            tracing::error!(
                "{}",
                ModulePoisoned {
                    entry_point: *entry_point
                }
            );
        }
        result
    }

    fn exchange(&mut self, message: &str) -> TranslatorResult<String> {
        let ownership = self.ownership;
        let memory = self.live_memory()?;

        let mut shadowed = Vec::new();
        let result = exchange_through(memory, ownership, message, &mut shadowed);

        for (ptr, error) in shadowed {
            tracing::warn!("{}", BufferFreeFailed { ptr, error: &error });
            // The caller sees the earlier error, but a trap still poisons the instance.
            let _ = self.track_trap::<()>(Err(error));
        }
        result
    }
}

/// Buffers whose `free` failed while an earlier error was already being returned.
type Shadowed = Vec<(GuestPtr, TranslatorError)>;

fn exchange_through<M: LinearMemory + ?Sized>(
    memory: &mut M,
    ownership: ResponseOwnership,
    message: &str,
    shadowed: &mut Shadowed,
) -> TranslatorResult<String> {
    let response = call_with_guest_string(memory, message.as_bytes(), shadowed, |memory, request| {
        memory.invoke(request)
    })?;
    if response.is_null() {
        return Err(ChannelError::NullResult.into());
    }

    let text = read_c_string(memory, response);
    match ownership {
        ResponseOwnership::Host => {
            let freed = memory.free(response);
            settle(text, freed, response, shadowed)
        }
        ResponseOwnership::Module => text,
    }
}

/// Combines a step's result with the `free` that followed it. The step's error wins;
/// a free error it hides is recorded in `shadowed`.
fn settle<T>(
    result: TranslatorResult<T>,
    freed: TranslatorResult<()>,
    ptr: GuestPtr,
    shadowed: &mut Shadowed,
) -> TranslatorResult<T> {
    match (result, freed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(free_err)) => Err(free_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(free_err)) => {
            shadowed.push((ptr, free_err));
            Err(err)
        }
    }
}

impl<M: LinearMemory> Transport for InProcessChannel<M> {
    fn binding(&self) -> &'static str {
        "in-process"
    }

    fn start(&mut self) -> TranslatorResult<()> {
        let result = self.live_memory().and_then(|memory| memory.initialize());
        match self.track_trap(result)? {
            true => {
                tracing::info!("{}", ModuleInitialized);
                Ok(())
            }
            false => Err(ChannelError::InitializeFailed.into()),
        }
    }

    fn round_trip(&mut self, _request_id: u64, message: &str) -> TranslatorResult<String> {
        let result = self.exchange(message);
        self.track_trap(result)
    }

    fn finalize(&mut self, _request_id: u64, _shutdown: &str) -> TranslatorResult<Option<String>> {
        // A poisoned instance must not be entered again, not even to tear it down.
        if self.poisoned {
            return Ok(None);
        }
        let result = match self.memory.as_mut() {
            Some(memory) => memory.finalize(),
            None => Ok(()),
        };
        self.track_trap(result).map(|_| None)
    }

    fn release(&mut self) {
        self.memory = None;
    }
}

/// Copies `bytes` plus a NUL terminator into a fresh guest buffer, runs `f` with its
/// address and frees the buffer on every path.
pub fn with_guest_string<M, T, F>(memory: &mut M, bytes: &[u8], f: F) -> TranslatorResult<T>
where
    M: LinearMemory + ?Sized,
    F: FnOnce(&mut M, GuestPtr) -> TranslatorResult<T>,
{
    let mut shadowed = Vec::new();
    let result = call_with_guest_string(memory, bytes, &mut shadowed, f);
    for (ptr, error) in &shadowed {
        tracing::warn!("{}", BufferFreeFailed { ptr: *ptr, error });
    }
    result
}

fn call_with_guest_string<M, T, F>(
    memory: &mut M,
    bytes: &[u8],
    shadowed: &mut Shadowed,
    f: F,
) -> TranslatorResult<T>
where
    M: LinearMemory + ?Sized,
    F: FnOnce(&mut M, GuestPtr) -> TranslatorResult<T>,
{
    let size = u32::try_from(bytes.len() + 1).map_err(|_| {
        UsageError::InvalidParameter(format!(
            "request of {} bytes does not fit in a 32-bit address space",
            bytes.len()
        ))
    })?;

    let ptr = memory.allocate(size)?;
    if ptr.is_null() {
        return Err(ChannelError::Allocation { size }.into());
    }

    let mut buffer = Vec::with_capacity(bytes.len() + 1);
    buffer.extend_from_slice(bytes);
    buffer.push(0);

    let result = memory.write(ptr, &buffer).and_then(|_| f(memory, ptr));
    let freed = memory.free(ptr);
    settle(result, freed, ptr, shadowed)
}

/// Reads a NUL-terminated UTF-8 string starting at `ptr`.
///
/// The scan never runs past the end of linear memory: a missing terminator is an
/// error, not an empty or truncated string.
pub fn read_c_string<M: LinearMemory + ?Sized>(
    memory: &mut M,
    ptr: GuestPtr,
) -> TranslatorResult<String> {
    let memory_size = memory.size();
    if ptr.offset() >= memory_size {
        return Err(ProtocolError::OutOfBounds {
            ptr: ptr.0,
            memory_size,
        }
        .into());
    }

    let mut bytes = Vec::new();
    let mut cursor = ptr.offset();
    while cursor < memory_size {
        let want = READ_CHUNK.min(memory_size - cursor);
        let chunk = memory.read(GuestPtr(cursor as u32), want)?;
        if chunk.is_empty() {
            break;
        }
        if let Some(end) = chunk.iter().position(|byte| *byte == 0) {
            bytes.extend_from_slice(&chunk[..end]);
            return String::from_utf8(bytes).map_err(|e| ProtocolError::from(e).into());
        }
        cursor += chunk.len();
        bytes.extend_from_slice(&chunk);
    }

    Err(ProtocolError::MissingTerminator {
        ptr: ptr.0,
        memory_size,
    }
    .into())
}
