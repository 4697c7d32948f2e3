//! Runner for the external skills CLI.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::types::CommandOutput;

/// Program plus leading arguments, e.g. `npx -y skills`. Subcommands are
/// appended per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillsCli {
    program: String,
    args: Vec<String>,
}

impl SkillsCli {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument vector for `extra` (without the program).
    pub fn args_with(&self, extra: &[String]) -> Vec<String> {
        self.args.iter().chain(extra).cloned().collect()
    }

    /// Render a command line for logs and previews.
    pub fn preview(&self, extra: &[String]) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args_with(extra))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion and capture output. Spawn failures are errors; a
    /// non-zero exit is reported through [`CommandOutput::success`].
    pub async fn run(
        &self,
        extra: &[String],
        cwd: Option<&Path>,
        envs: &[(&str, &str)],
    ) -> anyhow::Result<CommandOutput> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(self.args_with(extra))
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in envs {
            cmd.env(key, value);
        }

        tracing::debug!(command = %self.preview(extra), cwd = ?cwd.map(PathBuf::from), "running skills cli");
        let output = cmd
            .output()
            .await
            .with_context(|| format!("failed to run {}", self.program))?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
