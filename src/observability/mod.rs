// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Log lines are built from message structs that implement `Display`, so call
//! sites never carry ad-hoc strings and the wording of every event lives in one
//! place.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::wasm` - module loading, instantiation and traps
//! * `messages::process` - translator child process lifecycle
//! * `messages::translator` - handle lifecycle and per-call events
//! * `messages::config` - configuration loading and clamping
//!
//! # Usage
//!
//! ```rust
//! use shader_bridge::observability::messages::translator::TranslationStarted;
//!
//! let msg = TranslationStarted {
//!     request_id: 1,
//!     stage: "fragment",
//!     input_dialect: "webgl",
//!     output_dialect: "glsl330",
//!     source_bytes: 512,
//! };
//!
//! tracing::debug!("{}", msg);
//! ```

pub mod messages;
