// src/executor.rs

//! Command execution strategies
//!
//! Every external tool (git, hg, curl, rpmbuild, createrepo) is driven
//! through the [`Executor`] trait so the whole pipeline can run either for
//! real or as a side-effect-free simulation. [`RealExecutor`] spawns the
//! subprocess and captures its output; [`PrintExecutor`] only echoes the
//! command and reports success.

use std::process::Command;
use tracing::debug;

/// Outcome of one externally-run command.
///
/// Produced by an [`Executor`]; callers inspect `return_code` rather than
/// relying on the executor to raise.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// Synthetic success, used by the dry-run executor
    pub fn ok() -> Self {
        Self {
            return_code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.return_code == 0
    }
}

/// Strategy for running external commands
pub trait Executor {
    /// Run `command` (argv form) and report its outcome.
    ///
    /// Never fails on a non-zero exit; a command that could not even be
    /// spawned is reported with return code -1 and the spawn error in
    /// stderr.
    fn run(&self, command: &[String]) -> ExecutionResult;
}

/// Executes commands as real subprocesses
pub struct RealExecutor;

impl Executor for RealExecutor {
    fn run(&self, command: &[String]) -> ExecutionResult {
        debug!("CMD: {}", shell_join(command));

        let Some((program, args)) = command.split_first() else {
            return ExecutionResult {
                return_code: -1,
                stdout: String::new(),
                stderr: "empty command".to_string(),
            };
        };

        match Command::new(program).args(args).output() {
            Ok(output) => ExecutionResult {
                return_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => ExecutionResult {
                return_code: -1,
                stdout: String::new(),
                stderr: format!("failed to spawn {}: {}", program, e),
            },
        }
    }
}

/// Echoes commands without executing them
pub struct PrintExecutor;

impl Executor for PrintExecutor {
    fn run(&self, command: &[String]) -> ExecutionResult {
        println!("{}", shell_join(command));
        ExecutionResult::ok()
    }
}

/// Render an argv as a cut-and-pasteable shell line
pub fn shell_join(command: &[String]) -> String {
    command
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+@%,{}".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
