// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One spawned translator process and its pipes.

use crate::errors::{ChannelError, ProtocolError, TranslatorResult};
use crate::observability::messages::process::{PeerKilled, PeerStarted, PeerStderr, PeerStopped};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long to wait for the exit status and the last stderr lines after a failure.
const FAILURE_SETTLE: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

type StderrTail = Arc<Mutex<VecDeque<String>>>;

pub(super) struct Peer {
    executable: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    stderr_tail: StderrTail,
    drain: Option<JoinHandle<()>>,
}

impl Peer {
    pub(super) fn spawn(
        executable: &Path,
        args: &[String],
        stderr_capture_lines: usize,
    ) -> Result<Self, ChannelError> {
        let name = executable.display().to_string();

        let mut child = Command::new(executable)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ChannelError::Spawn {
                executable: name.clone(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ChannelError::Spawn {
                    executable: name,
                    source: std::io::Error::new(
                        std::io::ErrorKind::BrokenPipe,
                        "child pipes were not created",
                    ),
                });
            }
        };

        let stderr_tail: StderrTail = Arc::new(Mutex::new(VecDeque::new()));
        let drain = child.stderr.take().map(|stderr| {
            let tail = Arc::clone(&stderr_tail);
            thread::spawn(move || drain_stderr(stderr, tail, stderr_capture_lines))
        });

        tracing::info!(
            "{}",
            PeerStarted {
                executable: &name,
                pid: child.id(),
            }
        );

        Ok(Self {
            executable: name,
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            stderr_tail,
            drain,
        })
    }

    pub(super) fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    #[cfg(test)]
    pub(super) fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }

    /// Writes one request line and reads one response line.
    pub(super) fn exchange(&mut self, request_id: u64, message: &str) -> TranslatorResult<String> {
        let written = match self.stdin.as_mut() {
            Some(stdin) => stdin
                .write_all(message.as_bytes())
                .and_then(|_| stdin.write_all(b"\n"))
                .and_then(|_| stdin.flush()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "stdin already closed",
            )),
        };
        if written.is_err() {
            let (status, stderr) = self.failure_context();
            return Err(ChannelError::BrokenPipe {
                request_id,
                status,
                stderr,
            }
            .into());
        }

        let mut line = Vec::new();
        let read = self
            .stdout
            .read_until(b'\n', &mut line)
            .map_err(ChannelError::Io)?;
        if read == 0 {
            let (status, stderr) = self.failure_context();
            return Err(ChannelError::PeerExited {
                request_id,
                status,
                stderr,
            }
            .into());
        }

        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        // A live peer that answers with garbage is a protocol failure, not a crash.
        Ok(String::from_utf8(line).map_err(ProtocolError::from)?)
    }

    /// Closes stdin and waits up to `grace` for the process to exit, then kills it.
    pub(super) fn terminate(mut self, grace: Duration) {
        drop(self.stdin.take());

        match self.wait_for_exit(grace) {
            Some(status) => tracing::info!(
                "{}",
                PeerStopped {
                    executable: &self.executable,
                    status: &status,
                }
            ),
            None => {
                tracing::warn!(
                    "{}",
                    PeerKilled {
                        executable: &self.executable,
                        grace_ms: grace.as_millis() as u64,
                    }
                );
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }

        // The drain thread ends on its own once every holder of the pipe has exited.
        drop(self.drain.take());
    }

    fn wait_for_exit(&mut self, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Some(status.to_string()),
                Ok(None) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                _ => return None,
            }
        }
    }

    /// Exit status and captured stderr, used to explain a failed exchange.
    fn failure_context(&mut self) -> (String, String) {
        let status = self
            .wait_for_exit(FAILURE_SETTLE)
            .unwrap_or_else(|| "still running".to_string());

        // Give the drain thread a moment to pick up the final lines.
        let deadline = Instant::now() + FAILURE_SETTLE;
        while let Some(drain) = &self.drain {
            if drain.is_finished() || Instant::now() >= deadline {
                break;
            }
            thread::sleep(POLL_INTERVAL);
        }

        (status, self.stderr_tail())
    }

    pub(super) fn stderr_tail(&self) -> String {
        self.stderr_tail
            .lock()
            .map(|tail| tail.iter().cloned().collect::<Vec<_>>().join("\n"))
            .unwrap_or_default()
    }
}

fn drain_stderr<R: std::io::Read>(stderr: R, tail: StderrTail, capacity: usize) {
    for line in BufReader::new(stderr).lines() {
        let Ok(line) = line else { break };
        tracing::debug!("{}", PeerStderr { line: &line });
        if capacity == 0 {
            continue;
        }
        if let Ok(mut tail) = tail.lock() {
            if tail.len() == capacity {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }
}
