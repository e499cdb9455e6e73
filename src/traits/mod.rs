// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod memory;
pub mod transport;

pub use memory::{GuestPtr, LinearMemory};
pub use transport::Transport;
