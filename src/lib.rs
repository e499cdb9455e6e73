// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // in-process and out-of-process bindings
pub mod client;     // caller-facing translator
pub mod config;     // YAML configuration
pub mod errors;     // error taxonomy
pub mod lifecycle;  // initialize / close discipline
pub mod observability;
pub mod protocol;   // JSON-RPC wire codec
pub mod traits;     // memory and transport seams
