// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the translator child process.

use std::fmt::{Display, Formatter};

/// Translator process spawned.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use shader_bridge::observability::messages::process::PeerStarted;
///
/// let msg = PeerStarted {
///     executable: "/usr/local/bin/angle_shader_translator",
///     pid: 4242,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PeerStarted<'a> {
    pub executable: &'a str,
    pub pid: u32,
}

impl Display for PeerStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Started translator '{}' (pid {})", self.executable, self.pid)
    }
}

/// The peer died or was found dead and is being replaced.
///
/// # Log Level
/// `warn!` - Recoverable, but the peer crashed
pub struct PeerRestarting<'a> {
    pub executable: &'a str,
    pub reason: &'a str,
}

impl Display for PeerRestarting<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Restarting translator '{}': {}",
            self.executable, self.reason
        )
    }
}

/// One line the peer wrote to stderr.
///
/// # Log Level
/// `debug!`
pub struct PeerStderr<'a> {
    pub line: &'a str,
}

impl Display for PeerStderr<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "translator stderr: {}", self.line)
    }
}

/// The peer exited on its own after stdin was closed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PeerStopped<'a> {
    pub executable: &'a str,
    pub status: &'a str,
}

impl Display for PeerStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Translator '{}' stopped ({})", self.executable, self.status)
    }
}

/// The peer outlived its grace period and was killed.
///
/// # Log Level
/// `warn!`
pub struct PeerKilled<'a> {
    pub executable: &'a str,
    pub grace_ms: u64,
}

impl Display for PeerKilled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Translator '{}' did not exit within {}ms; killing it",
            self.executable, self.grace_ms
        )
    }
}

/// Shutdown skipped because there is no live peer to tell.
///
/// # Log Level
/// `info!`
pub struct PeerNotRunning<'a> {
    pub executable: &'a str,
}

impl Display for PeerNotRunning<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Translator '{}' is not running; skipping shutdown request",
            self.executable
        )
    }
}
