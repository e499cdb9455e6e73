// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::TranslatorResult;

/// A request/response channel to one translator instance.
///
/// Messages are complete JSON envelopes without a trailing newline. A transport moves
/// them and reports channel failures; it never interprets their content beyond what
/// its own startup and shutdown require.
pub trait Transport {
    /// Short name of the binding, used in log messages.
    fn binding(&self) -> &'static str;

    /// Brings the peer up and runs its one-time initialization.
    fn start(&mut self) -> TranslatorResult<()>;

    /// Sends one request and returns exactly one response.
    fn round_trip(&mut self, request_id: u64, message: &str) -> TranslatorResult<String>;

    /// Asks the peer to shut down. `shutdown` is the encoded shutdown envelope; bindings
    /// that speak it return the peer's acknowledgement line.
    fn finalize(&mut self, request_id: u64, shutdown: &str) -> TranslatorResult<Option<String>>;

    /// Releases every resource the transport holds. Must be safe to call in any state.
    fn release(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn binding(&self) -> &'static str {
        (**self).binding()
    }

    fn start(&mut self) -> TranslatorResult<()> {
        (**self).start()
    }

    fn round_trip(&mut self, request_id: u64, message: &str) -> TranslatorResult<String> {
        (**self).round_trip(request_id, message)
    }

    fn finalize(&mut self, request_id: u64, shutdown: &str) -> TranslatorResult<Option<String>> {
        (**self).finalize(request_id, shutdown)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
