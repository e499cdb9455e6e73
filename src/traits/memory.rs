// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::TranslatorResult;
use std::fmt;

/// An address inside a module's linear memory. Zero is the null address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuestPtr(pub u32);

impl GuestPtr {
    pub const NULL: GuestPtr = GuestPtr(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GuestPtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A sandboxed module addressed through a flat byte region and an explicit allocator.
///
/// Besides the allocator this exposes the module's fixed entry points. Implementations
/// report traps as `ChannelError::Trap` and never panic on guest misbehaviour.
pub trait LinearMemory {
    /// Calls the module's `malloc`. A null result is returned as-is; the caller decides.
    fn allocate(&mut self, size: u32) -> TranslatorResult<GuestPtr>;

    fn write(&mut self, ptr: GuestPtr, bytes: &[u8]) -> TranslatorResult<()>;

    /// Copies up to `max` bytes starting at `ptr`, stopping at the end of the region.
    fn read(&mut self, ptr: GuestPtr, max: usize) -> TranslatorResult<Vec<u8>>;

    fn free(&mut self, ptr: GuestPtr) -> TranslatorResult<()>;

    /// Current size of the addressable region in bytes.
    fn size(&mut self) -> usize;

    /// One-time setup. `false` means the module refused to start.
    fn initialize(&mut self) -> TranslatorResult<bool>;

    fn invoke(&mut self, request: GuestPtr) -> TranslatorResult<GuestPtr>;

    /// Optional teardown entry point. A module without one is a no-op.
    fn finalize(&mut self) -> TranslatorResult<()>;
}

impl<M: LinearMemory + ?Sized> LinearMemory for Box<M> {
    fn allocate(&mut self, size: u32) -> TranslatorResult<GuestPtr> {
        (**self).allocate(size)
    }

    fn write(&mut self, ptr: GuestPtr, bytes: &[u8]) -> TranslatorResult<()> {
        (**self).write(ptr, bytes)
    }

    fn read(&mut self, ptr: GuestPtr, max: usize) -> TranslatorResult<Vec<u8>> {
        (**self).read(ptr, max)
    }

    fn free(&mut self, ptr: GuestPtr) -> TranslatorResult<()> {
        (**self).free(ptr)
    }

    fn size(&mut self) -> usize {
        (**self).size()
    }

    fn initialize(&mut self) -> TranslatorResult<bool> {
        (**self).initialize()
    }

    fn invoke(&mut self, request: GuestPtr) -> TranslatorResult<GuestPtr> {
        (**self).invoke(request)
    }

    fn finalize(&mut self) -> TranslatorResult<()> {
        (**self).finalize()
    }
}
