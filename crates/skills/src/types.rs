use std::{fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

// ── Levels and agent directory conventions ──────────────────────────────────

/// Where a skill is installed: per project or per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Project-local: `<workspace-root>/<agent-dir>`
    Project,
    /// User-global: `~/<agent-dir>`
    User,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "project" => Ok(Self::Project),
            "user" | "global" => Ok(Self::User),
            other => anyhow::bail!("unknown level '{other}': expected 'project' or 'user'"),
        }
    }
}

/// Which coding agent's directory convention a skill lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentMode {
    ClaudeCode,
    Codex,
    Cursor,
    GithubCopilot,
    Opencode,
    /// The shared `.agents/skills` directory that symlink installs point into.
    Agents,
}

impl AgentMode {
    pub const ALL: [Self; 6] = [
        Self::ClaudeCode,
        Self::Codex,
        Self::Cursor,
        Self::GithubCopilot,
        Self::Opencode,
        Self::Agents,
    ];

    /// Agents the installer can target. The shared directory is populated
    /// implicitly by symlink installs.
    pub const INSTALL_TARGETS: [Self; 5] = [
        Self::ClaudeCode,
        Self::Codex,
        Self::Cursor,
        Self::GithubCopilot,
        Self::Opencode,
    ];

    /// Identifier used on the wire and as the installer's `--agent` value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClaudeCode => "claude-code",
            Self::Codex => "codex",
            Self::Cursor => "cursor",
            Self::GithubCopilot => "github-copilot",
            Self::Opencode => "opencode",
            Self::Agents => "agents",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ClaudeCode => "Claude Code",
            Self::Codex => "Codex",
            Self::Cursor => "Cursor",
            Self::GithubCopilot => "GitHub Copilot",
            Self::Opencode => "OpenCode",
            Self::Agents => "Shared (.agents)",
        }
    }

    /// Skills directory relative to the workspace root (project) or the
    /// home directory (user).
    pub fn relative_dir(self, level: Level) -> &'static str {
        match (self, level) {
            (Self::ClaudeCode, _) => ".claude/skills",
            (Self::Codex, _) => ".codex/skills",
            (Self::Cursor, _) => ".cursor/skills",
            (Self::GithubCopilot, Level::Project) => ".github/skills",
            (Self::GithubCopilot, Level::User) => ".copilot/skills",
            (Self::Opencode, Level::Project) => ".opencode/skill",
            (Self::Opencode, Level::User) => ".config/opencode/skill",
            (Self::Agents, _) => ".agents/skills",
        }
    }

    pub fn is_shared(self) -> bool {
        self == Self::Agents
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown agent '{s}'"))
    }
}

// ── Installed skill records ─────────────────────────────────────────────────

/// An installed skill as produced by a scan.
///
/// Records are rebuilt on every scan. `marketplace_id` and `update_available`
/// are overlaid afterwards by the coordinator since the scan is stateless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub path: PathBuf,
    pub level: Level,
    pub agent_mode: AgentMode,
    /// Modification time in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_available: Option<bool>,
}

// ── Install requests ────────────────────────────────────────────────────────

/// How the installer places skill files into agent directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    /// One copy in the shared directory, symlinked into each agent directory.
    #[default]
    Symlink,
    /// An independent copy per agent directory.
    Copy,
}

impl FromStr for InstallMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "symlink" => Ok(Self::Symlink),
            "copy" => Ok(Self::Copy),
            other => anyhow::bail!("unknown install method '{other}': expected 'symlink' or 'copy'"),
        }
    }
}

/// Everything the installer needs for one install action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallRequest {
    /// `owner/repo`.
    pub repository_ref: String,
    /// A single skill within the repository; `None` installs all of them.
    #[serde(default)]
    pub skill_name: Option<String>,
    pub scope: Level,
    pub agents: Vec<AgentMode>,
    #[serde(default)]
    pub method: InstallMethod,
    #[serde(default)]
    pub telemetry: bool,
}

/// Exit status and captured output of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Text worth showing the user on failure: stderr, else the tail of stdout.
    pub fn diagnostic(&self) -> Option<String> {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return Some(stderr.to_string());
        }
        let tail: Vec<&str> = self
            .stdout
            .lines()
            .rev()
            .filter(|l| !l.trim().is_empty())
            .take(5)
            .collect();
        if tail.is_empty() {
            return None;
        }
        Some(tail.into_iter().rev().collect::<Vec<_>>().join("\n"))
    }
}
