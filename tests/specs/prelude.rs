//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing han CLI behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

// Aggressive timeouts for fast tests.
const HAN_TIMEOUT_HEALTH_MS: &str = "300";
const HAN_TIMEOUT_IPC_MS: &str = "1000";
const HAN_TIMEOUT_SPAWN_MS: &str = "3000";
const HAN_CONNECT_POLL_MS: &str = "10";

/// Returns the path to a built binary, resolving relative to the test
/// binary itself when CARGO_MANIFEST_DIR points at a stale checkout.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>, so its
    // grandparent is target/debug/ where han and hand are built.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// Returns the path to the han binary.
fn han_binary() -> PathBuf {
    binary_path("han")
}

/// Returns the path to the hand coordinator binary.
pub fn hand_binary() -> PathBuf {
    binary_path("hand")
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: vec![
                (
                    "HAN_DAEMON_BINARY".into(),
                    hand_binary().to_string_lossy().into(),
                ),
                // Ephemeral coordinator port per state dir
                ("HAN_SLOT_PORT".into(), "0".into()),
                ("HAN_TIMEOUT_HEALTH_MS".into(), HAN_TIMEOUT_HEALTH_MS.into()),
                ("HAN_TIMEOUT_IPC_MS".into(), HAN_TIMEOUT_IPC_MS.into()),
                ("HAN_TIMEOUT_SPAWN_MS".into(), HAN_TIMEOUT_SPAWN_MS.into()),
                ("HAN_CONNECT_POLL_MS".into(), HAN_CONNECT_POLL_MS.into()),
            ],
            stdin: None,
        }
    }

    /// Add CLI arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set working directory
    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    /// Set environment variable
    pub fn env(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.envs
            .push((key.to_string(), value.as_ref().to_string()));
        self
    }

    /// Pipe a JSON payload to stdin
    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Build the command without running it
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(han_binary());
        cmd.args(&self.args);

        if let Some(ref dir) = self.dir {
            cmd.current_dir(dir);
        }

        // Prevent ambient session/project hints from leaking into tests.
        for var in [
            "HAN_SESSION_ID",
            "CLAUDE_SESSION_ID",
            "HAN_STOP_ORCHESTRATING",
            "HAN_DISABLE_HOOKS",
            "HAN_PLUGIN_PATH",
            "HAN_GLOBAL_SLOTS",
            "CLAUDE_PROJECT_DIR",
        ] {
            cmd.env_remove(var);
        }

        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        cmd
    }

    fn output(&self) -> Output {
        let mut cmd = self.command();

        match self.stdin {
            Some(ref payload) => {
                cmd.stdin(Stdio::piped())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                let mut child = cmd.spawn().expect("command should spawn");
                child
                    .stdin
                    .take()
                    .expect("stdin should be piped")
                    .write_all(payload.as_bytes())
                    .expect("payload should write");
                child.wait_with_output().expect("command should run")
            }
            None => cmd.output().expect("command should run"),
        }
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.output();
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect a specific exit code
    pub fn exits(self, code: i32) -> RunAssert {
        let output = self.output();
        assert_eq!(
            output.status.code(),
            Some(code),
            "expected exit code {code}\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    /// Get stdout as string
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    /// Get stderr as string
    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        let stdout = self.stdout();
        similar_asserts::assert_eq!(stdout, expected);
        self
    }

    /// Assert stdout contains substring.
    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    /// Assert stderr contains substring.
    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }

    /// Assert stderr does not contain substring.
    pub fn stderr_lacks(self, unexpected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            !stderr.contains(unexpected),
            "stderr should not contain '{}'\nstderr: {}",
            unexpected,
            stderr
        );
        self
    }
}

// =============================================================================
// Project
// =============================================================================

/// Temporary test project with helper methods.
pub struct Project {
    dir: tempfile::TempDir,
    /// Isolated state directory for this test
    state_dir: tempfile::TempDir,
}

impl Project {
    /// Create an empty project
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            state_dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Get the project path
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the isolated state directory path
    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Write a file at the given path (parents created automatically)
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    /// Read a file from the project (empty string when absent)
    pub fn read(&self, path: impl AsRef<Path>) -> String {
        std::fs::read_to_string(self.dir.path().join(path.as_ref())).unwrap_or_default()
    }

    /// Install a plugin with the given hooks manifest
    pub fn plugin(&self, name: &str, manifest: &str) {
        self.file(format!(".han/plugins/{name}/hooks.toml"), manifest);
    }

    /// Run han in this project's context
    pub fn han(&self) -> CliBuilder {
        CliBuilder::new()
            .pwd(self.path())
            .env("HAN_STATE_DIR", self.state_path().to_string_lossy())
            // Isolate HOME so user-level plugins and transcripts stay out
            .env("HOME", self.state_path().join("home").to_string_lossy())
    }

    /// Payload for an event with a fixed session id
    pub fn payload(&self, event: &str) -> String {
        format!(r#"{{"session_id": "spec-session", "hook_event_name": "{event}"}}"#)
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        // Always try to stop the coordinator (no-op if not running)
        let mut cmd = self.han().args(&["daemon", "stop"]).command();
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        let _ = cmd.status();
    }
}
