// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Out-of-process binding: newline-delimited JSON over a child's stdin/stdout.
//!
//! The peer's allocator is implicit. Each request is one line, each response is
//! exactly one line. The child's stderr is drained by a background thread into a
//! bounded buffer so peer failures can be reported with its last words.
//!
//! # Restart policy
//!
//! Every call has a budget of one restart. It is spent either before the call,
//! when the peer is found dead, or after a peer failure mid-exchange, in which
//! case the request is sent once more to the new peer. Translation is
//! deterministic, so resending is safe. When the budget is spent the error
//! surfaces unchanged.

mod peer;

use crate::errors::{ChannelError, TranslatorResult};
use crate::observability::messages::process::{PeerNotRunning, PeerRestarting};
use crate::traits::Transport;
use peer::Peer;
use std::path::PathBuf;
use std::time::Duration;

/// How to launch and stop the translator process.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub shutdown_grace: Duration,
    pub stderr_capture_lines: usize,
}

pub struct ProcessChannel {
    options: ProcessOptions,
    peer: Option<Peer>,
    restarts: usize,
}

impl ProcessChannel {
    pub fn new(options: ProcessOptions) -> Self {
        Self {
            options,
            peer: None,
            restarts: 0,
        }
    }

    /// Number of restart attempts made over the channel's lifetime.
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    fn executable(&self) -> String {
        self.options.executable.display().to_string()
    }

    fn spawn(&self) -> Result<Peer, ChannelError> {
        Peer::spawn(
            &self.options.executable,
            &self.options.args,
            self.options.stderr_capture_lines,
        )
    }

    fn peer_is_running(&mut self) -> bool {
        self.peer.as_mut().map(Peer::is_running).unwrap_or(false)
    }

    /// Replaces the current peer with a fresh one. Spends the caller's restart budget.
    fn restart(&mut self, reason: &str) -> TranslatorResult<()> {
        self.restarts += 1;
        tracing::warn!(
            "{}",
            PeerRestarting {
                executable: &self.executable(),
                reason,
            }
        );

        if let Some(old) = self.peer.take() {
            old.terminate(Duration::ZERO);
        }

        let peer = self.spawn().map_err(|err| ChannelError::RestartFailed {
            executable: self.executable(),
            reason: err.to_string(),
        })?;
        self.peer = Some(peer);
        Ok(())
    }

    fn exchange(&mut self, request_id: u64, message: &str) -> TranslatorResult<String> {
        match self.peer.as_mut() {
            Some(peer) => peer.exchange(request_id, message),
            None => Err(ChannelError::PeerExited {
                request_id,
                status: "not started".to_string(),
                stderr: String::new(),
            }
            .into()),
        }
    }

    #[cfg(test)]
    fn kill_peer(&mut self) {
        if let Some(peer) = self.peer.as_mut() {
            peer.kill();
        }
    }
}

impl Transport for ProcessChannel {
    fn binding(&self) -> &'static str {
        "process"
    }

    fn start(&mut self) -> TranslatorResult<()> {
        if self.peer_is_running() {
            return Ok(());
        }
        let peer = self.spawn()?;
        self.peer = Some(peer);
        Ok(())
    }

    fn round_trip(&mut self, request_id: u64, message: &str) -> TranslatorResult<String> {
        let mut restart_available = true;

        if !self.peer_is_running() {
            restart_available = false;
            self.restart("peer is not running")?;
        }

        match self.exchange(request_id, message) {
            Err(err) if restart_available && err.is_restartable() => {
                self.restart(&err.to_string())?;
                self.exchange(request_id, message)
            }
            other => other,
        }
    }

    fn finalize(&mut self, request_id: u64, shutdown: &str) -> TranslatorResult<Option<String>> {
        if !self.peer_is_running() {
            tracing::info!(
                "{}",
                PeerNotRunning {
                    executable: &self.executable(),
                }
            );
            return Ok(None);
        }
        self.exchange(request_id, shutdown).map(Some)
    }

    fn release(&mut self) {
        if let Some(peer) = self.peer.take() {
            peer.terminate(self.options.shutdown_grace);
        }
    }
}

impl Drop for ProcessChannel {
    fn drop(&mut self) {
        self.release();
    }
}
