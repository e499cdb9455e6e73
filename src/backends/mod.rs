// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bindings that carry encoded requests to a sandboxed shader translator.
//!
//! # Available Backends
//!
//! ## In-process (`in_process` + `wasm`)
//! The translator is a WebAssembly module instantiated with wasmtime:
//! - **Transport**: NUL-terminated strings in the module's linear memory
//! - **Isolation**: no preopened directories, arguments or environment; fuel-bounded calls
//! - **Failure model**: a trap poisons the instance, there is no restart
//!
//! ## Out-of-process (`process`)
//! The translator is a child process speaking line-delimited JSON-RPC:
//! - **Transport**: one request line on stdin, one response line on stdout
//! - **Isolation**: a separate address space; stderr captured for diagnostics
//! - **Failure model**: one restart-and-retry per call
//!
//! ## Stub (Test-Only)
//! - **TrackingMemory**: a `LinearMemory` that counts every allocation and free
//! - **LoopbackTransport**: a `Transport` answering like a healthy translator
//!
//! # Architecture
//!
//! ```text
//! ShaderTranslator → ModuleHandle → Transport (InProcessChannel<M> | ProcessChannel)
//!                                               │
//!                                               └─ LinearMemory (WasmtimeMemory)
//! ```
//!
//! # Example
//! ```rust,no_run
//! use shader_bridge::backends::in_process::{InProcessChannel, ResponseOwnership};
//! use shader_bridge::backends::wasm::{InstanceOptions, WasmtimeMemory};
//!
//! let memory = WasmtimeMemory::load(
//!     "translator/angle_shader_translator.wasm",
//!     InstanceOptions { fuel: 1_000_000_000, inherit_stderr: false },
//! )?;
//! let channel = InProcessChannel::new(memory, ResponseOwnership::Host);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod in_process;
pub mod process;
#[cfg(test)]
pub mod stub;
pub mod wasm;
