//! Executor: runs synthesized command lines
//!
//! The crate only needs "run this command, give me its text". `Executor` is
//! that boundary; `ProcessExecutor` is a thin std::process adapter and any
//! `Fn(&str) -> Result<String, ExecuteError>` closure works as a stand-in.

use std::io;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("Failed to spawn command: {0}")]
    Spawn(#[from] io::Error),
    #[error("Command '{command}' failed with exit code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Empty command")]
    EmptyCommand,
}

/// Runs a command line and returns its text output
pub trait Executor {
    fn execute(&self, command: &str) -> Result<String, ExecuteError>;
}

impl<F> Executor for F
where
    F: Fn(&str) -> Result<String, ExecuteError>,
{
    fn execute(&self, command: &str) -> Result<String, ExecuteError> {
        self(command)
    }
}

/// Result of running a process to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteResult {
    pub stdout: String,
    pub stderr: String,
    pub code: Option<i32>,
}

impl ExecuteResult {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Report text: stdout, or stderr when stdout is empty (`cdo -V` prints
    /// its banner to stderr)
    pub fn text(&self) -> &str {
        if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }
}

/// Runs commands as child processes, without a shell
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    envs: Vec<(String, String)>,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra environment variable for every spawned process
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Run `command`, split on whitespace, and capture its output
    pub fn run(&self, command: &str) -> Result<ExecuteResult, ExecuteError> {
        let mut words = command.split_whitespace();
        let program = words.next().ok_or(ExecuteError::EmptyCommand)?;

        let output = Command::new(program)
            .args(words)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .output()?;

        Ok(ExecuteResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        })
    }
}

impl Executor for ProcessExecutor {
    fn execute(&self, command: &str) -> Result<String, ExecuteError> {
        log::debug!("executing: {}", command);
        let result = self.run(command)?;
        if !result.success() {
            return Err(ExecuteError::Failed {
                command: command.to_string(),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        for line in result.stderr.lines().filter(|l| l.contains("Warning")) {
            log::warn!("{}", line.trim());
        }
        Ok(result.text().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            ProcessExecutor::new().execute("   "),
            Err(ExecuteError::EmptyCommand)
        ));
    }

    #[test]
    fn closures_are_executors() {
        let fake = |cmd: &str| -> Result<String, ExecuteError> { Ok(cmd.to_uppercase()) };
        assert_eq!(fake.execute("cdo -ntime x.nc").unwrap(), "CDO -NTIME X.NC");
    }

    #[test]
    fn text_falls_back_to_stderr() {
        let result = ExecuteResult {
            stdout: "\n".into(),
            stderr: "Climate Data Operators version 2.0.5".into(),
            code: Some(0),
        };
        assert_eq!(result.text(), "Climate Data Operators version 2.0.5");
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let err = ProcessExecutor::new()
            .execute("cdoq-no-such-program-xyz -V")
            .unwrap_err();
        assert!(matches!(err, ExecuteError::Spawn(_)));
    }

    #[cfg(unix)]
    #[test]
    fn execute_captures_stdout() {
        let out = ProcessExecutor::new().execute("echo 12").unwrap();
        assert_eq!(out.trim(), "12");
    }

    #[cfg(unix)]
    #[test]
    fn execute_reports_failure() {
        match ProcessExecutor::new().execute("false") {
            Err(ExecuteError::Failed { command, code, .. }) => {
                assert_eq!(command, "false");
                assert_eq!(code, Some(1));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn env_is_passed_through() {
        let out = ProcessExecutor::new()
            .with_env("CDOQ_TEST_VALUE", "7")
            .execute("printenv CDOQ_TEST_VALUE")
            .unwrap();
        assert_eq!(out.trim(), "7");
    }
}
