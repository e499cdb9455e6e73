// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default fuel granted per entry-point call (1 billion instructions). Large
/// shaders legitimately take hundreds of millions.
pub const DEFAULT_FUEL_LEVEL: u64 = 1_000_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (10 billion instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 10_000_000_000;

/// Argument that switches the stdio translator into line-delimited JSON-RPC mode.
pub const DEFAULT_PROCESS_ARG: &str = "--json-rpc";
/// How long a peer gets to exit after stdin is closed before it is killed.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 500;
/// Lines of peer stderr kept for error reports.
pub const DEFAULT_STDERR_CAPTURE_LINES: usize = 64;
