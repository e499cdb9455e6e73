// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Module lifecycle: exactly one initialize, any number of calls, exactly one
//! effective close.
//!
//! `ModuleHandle` wraps a [`Transport`] and enforces the order
//! `Uninitialized -> Ready -> Closed`. Teardown is tied to `Drop`, so a handle
//! that goes out of scope while an error unwinds still finalizes and releases
//! the translator.

use crate::errors::{TranslatorResult, UsageError};
use crate::observability::messages::translator::{
    FinalizeFailed, HandleClosed, HandleOpenFailed, HandleOpened, ShutdownNotAcknowledged,
};
use crate::protocol::{decode_ack, encode_shutdown, IdMismatchPolicy, RequestIds};
use crate::traits::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Ready,
    Closed,
}

/// A live session with one translator instance.
pub struct ModuleHandle<T: Transport> {
    transport: T,
    state: LifecycleState,
    ids: RequestIds,
    policy: IdMismatchPolicy,
}

impl<T: Transport> ModuleHandle<T> {
    /// Starts the transport and runs the translator's one-time initialization.
    ///
    /// On failure the transport is released before the error is returned; no
    /// handle exists afterwards.
    pub fn open(transport: T, policy: IdMismatchPolicy) -> TranslatorResult<Self> {
        let mut handle = Self {
            transport,
            state: LifecycleState::Uninitialized,
            ids: RequestIds::new(),
            policy,
        };

        let binding = handle.transport.binding();
        if let Err(err) = handle.transport.start() {
            tracing::error!(
                "{}",
                HandleOpenFailed {
                    binding,
                    error: &err,
                }
            );
            // Closed, so Drop does not try to finalize a translator that never came up.
            handle.state = LifecycleState::Closed;
            handle.transport.release();
            return Err(err);
        }

        handle.state = LifecycleState::Ready;
        tracing::info!("{}", HandleOpened { binding });
        Ok(handle)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == LifecycleState::Closed
    }

    pub fn policy(&self) -> IdMismatchPolicy {
        self.policy
    }

    /// Next request identifier for this handle.
    pub fn next_id(&mut self) -> u64 {
        self.ids.next_id()
    }

    /// One request/response exchange. Fails with `UsageError::Closed` before any
    /// I/O once the handle is closed.
    pub fn call(&mut self, request_id: u64, message: &str) -> TranslatorResult<String> {
        match self.state {
            LifecycleState::Ready => self.transport.round_trip(request_id, message),
            LifecycleState::Uninitialized | LifecycleState::Closed => {
                Err(UsageError::Closed.into())
            }
        }
    }

    /// Finalizes the translator and releases the channel.
    ///
    /// Idempotent. Finalize and acknowledgement failures are logged, never
    /// returned; the channel is released regardless.
    pub fn close(&mut self) -> TranslatorResult<()> {
        if self.state == LifecycleState::Closed {
            return Ok(());
        }
        let was_ready = self.state == LifecycleState::Ready;
        self.state = LifecycleState::Closed;
        let binding = self.transport.binding();

        if was_ready {
            self.finalize(binding);
        }
        self.transport.release();

        tracing::info!("{}", HandleClosed { binding });
        Ok(())
    }

    fn finalize(&mut self, binding: &'static str) {
        let id = self.ids.next_id();
        let shutdown = match encode_shutdown(id) {
            Ok(shutdown) => shutdown,
            Err(err) => {
                tracing::warn!(
                    "{}",
                    FinalizeFailed {
                        binding,
                        error: &err,
                    }
                );
                return;
            }
        };

        match self.transport.finalize(id, &shutdown) {
            Ok(Some(ack)) => {
                if let Err(err) = decode_ack(&ack, id, self.policy) {
                    tracing::warn!(
                        "{}",
                        ShutdownNotAcknowledged {
                            binding,
                            error: &err,
                        }
                    );
                }
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(
                "{}",
                FinalizeFailed {
                    binding,
                    error: &err,
                }
            ),
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Drop for ModuleHandle<T> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
