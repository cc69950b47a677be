use anyhow::{anyhow, Context, Result};
use std::io;
use std::path::PathBuf;
use std::process::Command;

use crate::error::InstallError;

/// External programs the installer shells out to. Replaced by a fake in tests.
pub trait Toolbox {
    /// Absolute path of `tool` when it is available.
    fn find(&self, tool: &str) -> Option<PathBuf>;

    /// Runs `command` to completion; non-zero exit is an error.
    fn run(&self, command: &mut Command, context_message: &str) -> Result<()>;
}

/// Resolves tools on `PATH` and runs them as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemToolbox;

impl Toolbox for SystemToolbox {
    fn find(&self, tool: &str) -> Option<PathBuf> {
        which::which(tool).ok()
    }

    fn run(&self, command: &mut Command, context_message: &str) -> Result<()> {
        run_command(command, context_message)
    }
}

pub fn run_command(command: &mut Command, context_message: &str) -> Result<()> {
    let output = match command.output() {
        Ok(output) => output,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(InstallError::MissingTool {
                tool: command.get_program().to_string_lossy().into_owned(),
                purpose: context_message.to_string(),
            }
            .into());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("{context_message}: command failed to start"))
        }
    };
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    Err(anyhow!(
        "{context_message}: status={} stdout='{}' stderr='{}'",
        output.status,
        stdout.trim(),
        stderr.trim()
    ))
}

pub fn require_tool(tools: &dyn Toolbox, tool: &str, purpose: &str) -> Result<PathBuf> {
    tools.find(tool).ok_or_else(|| {
        InstallError::MissingTool {
            tool: tool.to_string(),
            purpose: purpose.to_string(),
        }
        .into()
    })
}
