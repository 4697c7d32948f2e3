use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    command::SkillsCli,
    types::{CommandOutput, InstallMethod, InstallRequest, Level},
};

/// Installs skills from a repository into agent directories.
///
/// One call per user action; per-agent partial failures are folded into the
/// single [`CommandOutput::success`] flag.
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, request: &InstallRequest) -> anyhow::Result<CommandOutput>;
}

/// Installer backed by the external skills CLI.
pub struct CliInstaller {
    cli: SkillsCli,
    /// Working directory for project-scope installs.
    project_root: PathBuf,
}

impl CliInstaller {
    pub fn new(cli: SkillsCli, project_root: PathBuf) -> Self {
        Self { cli, project_root }
    }
}

#[async_trait]
impl Installer for CliInstaller {
    async fn install(&self, request: &InstallRequest) -> anyhow::Result<CommandOutput> {
        let args = install_args(request)?;
        let envs: &[(&str, &str)] = if request.telemetry {
            &[]
        } else {
            &[("DISABLE_TELEMETRY", "1"), ("DO_NOT_TRACK", "1")]
        };
        let cwd = match request.scope {
            Level::Project => Some(self.project_root.as_path()),
            Level::User => None,
        };

        let output = self.cli.run(&args, cwd, envs).await?;
        if output.success {
            tracing::info!(repo = %request.repository_ref, skill = ?request.skill_name, "installed skill");
        } else {
            tracing::warn!(
                repo = %request.repository_ref,
                stderr = %output.stderr.trim(),
                "skill install failed"
            );
        }
        Ok(output)
    }
}

/// Arguments for `add`: `add <owner/repo> [--skill <name>] [-g] --agent <a>... [--copy] -y`.
pub fn install_args(request: &InstallRequest) -> anyhow::Result<Vec<String>> {
    let (owner, repo) = parse_repository_ref(&request.repository_ref)?;
    if request.agents.is_empty() {
        anyhow::bail!("select at least one agent to install into");
    }

    let mut args = vec!["add".to_string(), format!("{owner}/{repo}")];
    if let Some(skill) = request.skill_name.as_deref().filter(|s| !s.trim().is_empty()) {
        args.push("--skill".into());
        args.push(skill.trim().to_string());
    }
    if request.scope == Level::User {
        args.push("-g".into());
    }
    for agent in &request.agents {
        args.push("--agent".into());
        args.push(agent.as_str().into());
    }
    if request.method == InstallMethod::Copy {
        args.push("--copy".into());
    }
    args.push("-y".into());
    Ok(args)
}

/// Parse `owner/repo` from a repository reference.
/// Accepts `owner/repo`, `https://github.com/owner/repo`, or with trailing slash/`.git`.
pub fn parse_repository_ref(source: &str) -> anyhow::Result<(String, String)> {
    let s = source.trim().trim_end_matches('/').trim_end_matches(".git");
    let s = s
        .strip_prefix("https://github.com/")
        .or_else(|| s.strip_prefix("http://github.com/"))
        .or_else(|| s.strip_prefix("github.com/"))
        .unwrap_or(s);
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        anyhow::bail!(
            "invalid repository '{}': expected 'owner/repo' or GitHub URL",
            source
        );
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Canonical `owner/repo` form of a repository reference.
pub fn normalize_repository_ref(source: &str) -> anyhow::Result<String> {
    let (owner, repo) = parse_repository_ref(source)?;
    Ok(format!("{owner}/{repo}"))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::types::AgentMode};

    fn request() -> InstallRequest {
        InstallRequest {
            repository_ref: "https://github.com/acme/tools.git".into(),
            skill_name: Some("pdf-export".into()),
            scope: Level::User,
            agents: vec![AgentMode::ClaudeCode, AgentMode::Codex],
            method: InstallMethod::Symlink,
            telemetry: false,
        }
    }

    #[test]
    fn test_parse_repository_ref_valid() {
        let (owner, repo) = parse_repository_ref("vercel-labs/agent-skills").unwrap();
        assert_eq!(owner, "vercel-labs");
        assert_eq!(repo, "agent-skills");
    }

    #[test]
    fn test_parse_repository_ref_github_url() {
        for input in [
            "https://github.com/owner/repo",
            "https://github.com/owner/repo/",
            "https://github.com/owner/repo.git",
            "github.com/owner/repo",
        ] {
            let (o, r) = parse_repository_ref(input).unwrap();
            assert_eq!((o.as_str(), r.as_str()), ("owner", "repo"), "{input}");
        }
    }

    #[test]
    fn test_parse_repository_ref_invalid() {
        assert!(parse_repository_ref("noslash").is_err());
        assert!(parse_repository_ref("too/many/parts").is_err());
        assert!(parse_repository_ref("/empty-owner").is_err());
        assert!(parse_repository_ref("empty-repo/").is_err());
    }

    #[test]
    fn user_scope_symlink_args() {
        assert_eq!(install_args(&request()).unwrap(), [
            "add",
            "acme/tools",
            "--skill",
            "pdf-export",
            "-g",
            "--agent",
            "claude-code",
            "--agent",
            "codex",
            "-y"
        ]);
    }

    #[test]
    fn project_scope_copy_without_skill() {
        let mut req = request();
        req.scope = Level::Project;
        req.method = InstallMethod::Copy;
        req.skill_name = None;
        req.agents = vec![AgentMode::Cursor];
        assert_eq!(install_args(&req).unwrap(), [
            "add",
            "acme/tools",
            "--agent",
            "cursor",
            "--copy",
            "-y"
        ]);
    }

    #[test]
    fn no_agents_is_rejected() {
        let mut req = request();
        req.agents.clear();
        assert!(install_args(&req).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn cli_installer_opts_out_of_telemetry() {
        let tmp = tempfile::tempdir().unwrap();
        let installer = CliInstaller::new(
            SkillsCli::new("sh", vec![
                "-c".into(),
                "test \"$DO_NOT_TRACK\" = 1 && test \"$DISABLE_TELEMETRY\" = 1".into(),
            ]),
            tmp.path().to_path_buf(),
        );
        let out = installer.install(&request()).await.unwrap();
        assert!(out.success, "telemetry opt-out must reach the child");
    }
}
