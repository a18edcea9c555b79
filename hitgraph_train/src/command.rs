//! Shell command batches.
//!
//! [`BashRunner`] pipes `set -e` followed by the commands into a single
//! `bash` process, so the batch stops at the first failing command. Combined
//! stdout/stderr is streamed line by line to the `subprocess` log target.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};

use crate::error::{HitTrainError, Result};
use crate::logging::SUBPROCESS_TARGET;

/// Runs a batch of shell commands.
pub trait CommandRunner {
    /// Run `commands` in order and return the exit status (0 on success).
    ///
    /// # Errors
    /// `CommandExecution` when the batch exits with a non-zero status.
    fn run(&self, commands: &[String]) -> Result<i32>;
}

/// Runs commands through `bash` with `set -e`.
#[derive(Debug, Clone, Default)]
pub struct BashRunner {
    dry_run: bool,
    env: Vec<(String, String)>,
}

impl BashRunner {
    /// Create a runner that executes commands.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log the commands, never execute them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Add an environment variable for the child shell.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Full script sent to bash.
    pub fn script(commands: &[String]) -> String {
        let mut script = String::from("set -e\n");
        for command in commands {
            script.push_str(command);
            if !command.ends_with('\n') {
                script.push('\n');
            }
        }
        script
    }
}

impl CommandRunner for BashRunner {
    fn run(&self, commands: &[String]) -> Result<i32> {
        log::info!("Sending cmds:\n{:#?}", commands);
        if self.dry_run {
            log::info!("Dry mode - not running command");
            return Ok(0);
        }

        let last_command = commands.last().cloned().unwrap_or_default();
        let spawn_error = |e: std::io::Error| HitTrainError::CommandExecution {
            command: format!("bash: {}", e),
            status: -1,
        };

        // stderr is merged into stdout by the outer shell
        let mut child = Command::new("bash")
            .arg("-c")
            .arg("exec 2>&1; exec bash -s")
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        // stdin is fed from a thread while this thread drains stdout
        let script = Self::script(commands);
        let writer = child.stdin.take().map(|mut stdin| {
            std::thread::spawn(move || stdin.write_all(script.as_bytes()))
        });

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line.map_err(spawn_error)?;
                log::info!(target: SUBPROCESS_TARGET, "{}", line);
            }
        }

        let status = child.wait().map_err(spawn_error)?;
        if let Some(handle) = writer {
            // broken pipe is expected when set -e stops bash early
            let _ = handle.join();
        }
        let code = status.code().unwrap_or(-1);

        if code == 0 {
            log::info!("Command exited with status 0 - all good");
            Ok(0)
        } else {
            Err(HitTrainError::CommandExecution {
                command: last_command,
                status: code,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmds(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_script_layout() {
        let script = BashRunner::script(&cmds(&["echo a", "echo b\n"]));
        assert_eq!(script, "set -e\necho a\necho b\n");
    }

    #[test]
    fn test_dry_run_never_fails() {
        let runner = BashRunner::new().with_dry_run(true);
        assert_eq!(runner.run(&cmds(&["exit 3"])).unwrap(), 0);
    }

    #[test]
    fn test_success_and_failure() {
        let runner = BashRunner::new();
        assert_eq!(runner.run(&cmds(&["echo hello", "true"])).unwrap(), 0);

        let err = runner.run(&cmds(&["false", "echo unreachable"])).unwrap_err();
        match err {
            HitTrainError::CommandExecution { status, .. } => assert_eq!(status, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_is_passed() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("value.txt");
        let runner = BashRunner::new().with_env("HITGRAPH_TEST_VALUE", "42");

        runner
            .run(&[format!("echo $HITGRAPH_TEST_VALUE > {}", out.display())])
            .unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap().trim(), "42");
    }
}
