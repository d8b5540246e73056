//! Shared test doubles for service and adapter tests.

use std::collections::VecDeque;
use std::process::ExitStatus;
use std::sync::Mutex;

use anyhow::Result;

use crate::application::ports::{CommandRunner, ProgressReporter};

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    ExitStatus::from_raw(code as u32)
}

/// `CommandRunner` double that records every call instead of spawning.
///
/// `run` replies are consumed front-to-back (empty output once scripted
/// replies run out); `probe` replies likewise, defaulting to `true`.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Vec<String>>>,
    stdins: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<Vec<String>>>,
    probes: Mutex<VecDeque<bool>>,
    exit_code: Mutex<i32>,
}

impl RecordingRunner {
    /// Queue one scripted `run` reply.
    pub fn reply_with(&self, lines: Vec<String>) {
        self.replies.lock().expect("lock").push_back(lines);
    }

    /// Queue scripted `probe` replies.
    pub fn probe_replies(&self, replies: Vec<bool>) {
        self.probes.lock().expect("lock").extend(replies);
    }

    /// Make `run_with_stdin` report this exit code.
    pub fn exit_with(&self, code: i32) {
        *self.exit_code.lock().expect("lock") = code;
    }

    /// Every recorded argv.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("lock").clone()
    }

    /// Every recorded argv, space-joined for easy matching.
    #[must_use]
    pub fn joined_calls(&self) -> Vec<String> {
        self.calls().iter().map(|argv| argv.join(" ")).collect()
    }

    /// Every stdin payload passed to `run_with_stdin`.
    #[must_use]
    pub fn stdin_payloads(&self) -> Vec<String> {
        self.stdins.lock().expect("lock").clone()
    }

    fn record(&self, argv: &[String]) {
        self.calls.lock().expect("lock").push(argv.to_vec());
    }
}

impl CommandRunner for RecordingRunner {
    async fn run(&self, argv: &[String]) -> Result<Vec<String>> {
        self.record(argv);
        Ok(self
            .replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_default())
    }

    async fn probe(&self, argv: &[String]) -> Result<bool> {
        self.record(argv);
        Ok(self
            .probes
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or(true))
    }

    async fn run_with_stdin(
        &self,
        argv: &[String],
        input: &str,
        _log_name: &str,
    ) -> Result<ExitStatus> {
        self.record(argv);
        self.stdins.lock().expect("lock").push(input.to_string());
        Ok(exit_status(*self.exit_code.lock().expect("lock")))
    }
}

/// `ProgressReporter` double that collects messages with their severity.
#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    #[must_use]
    pub fn messages(&self) -> Vec<(&'static str, String)> {
        self.messages.lock().expect("lock").clone()
    }

    /// All warning messages, space-joined.
    #[must_use]
    pub fn warnings(&self) -> String {
        self.messages()
            .iter()
            .filter(|(kind, _)| *kind == "warn")
            .map(|(_, msg)| msg.clone())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn push(&self, kind: &'static str, message: &str) {
        self.messages
            .lock()
            .expect("lock")
            .push((kind, message.to_string()));
    }
}

impl ProgressReporter for RecordingReporter {
    fn header(&self, message: &str) {
        self.push("header", message);
    }

    fn step(&self, message: &str) {
        self.push("step", message);
    }

    fn success(&self, message: &str) {
        self.push("success", message);
    }

    fn warn(&self, message: &str) {
        self.push("warn", message);
    }
}
