//! Update checks and bulk updates through the skills CLI.

use std::{collections::HashMap, path::PathBuf};

use {async_trait::async_trait, serde_json::Value};

use crate::{command::SkillsCli, types::CommandOutput};

/// Reports and applies upstream updates for installed skills.
#[async_trait]
pub trait UpdateChecker: Send + Sync {
    /// For each of `names`, whether a newer version exists. Names the checker
    /// says nothing about map to `false`.
    async fn check(&self, names: &[String]) -> anyhow::Result<HashMap<String, bool>>;

    /// Update every installed skill.
    async fn update_all(&self) -> anyhow::Result<CommandOutput>;
}

/// [`UpdateChecker`] running `check` and `update` subcommands.
pub struct CliUpdateChecker {
    cli: SkillsCli,
    cwd: Option<PathBuf>,
}

impl CliUpdateChecker {
    pub fn new(cli: SkillsCli, cwd: Option<PathBuf>) -> Self {
        Self { cli, cwd }
    }
}

#[async_trait]
impl UpdateChecker for CliUpdateChecker {
    async fn check(&self, names: &[String]) -> anyhow::Result<HashMap<String, bool>> {
        let output = self
            .cli
            .run(&["check".to_string()], self.cwd.as_deref(), &[])
            .await?;
        if !output.success {
            anyhow::bail!(
                "update check failed: {}",
                output.diagnostic().unwrap_or_else(|| "no output".into())
            );
        }
        let flags = parse_check_output(&output.stdout, names);
        tracing::info!(
            checked = names.len(),
            outdated = flags.values().filter(|v| **v).count(),
            "update check finished"
        );
        Ok(flags)
    }

    async fn update_all(&self) -> anyhow::Result<CommandOutput> {
        let output = self
            .cli
            .run(&["update".to_string()], self.cwd.as_deref(), &[])
            .await?;
        if !output.success {
            tracing::warn!(stderr = %output.stderr.trim(), "skill update failed");
        }
        Ok(output)
    }
}

/// Interpret `check` output.
///
/// Accepted shapes, tried in order:
/// - a JSON object mapping names to booleans (or to objects with an
///   `updateAvailable`/`update_available`/`outdated` flag),
/// - a JSON array of outdated names (strings or objects with `name`),
/// - free text, where a line containing a known name and the word "update"
///   marks that name, unless it also says "up to date".
pub fn parse_check_output(stdout: &str, names: &[String]) -> HashMap<String, bool> {
    let mut flags: HashMap<String, bool> = names.iter().map(|n| (n.clone(), false)).collect();

    match serde_json::from_str::<Value>(stdout.trim()) {
        Ok(Value::Object(map)) => {
            for (name, value) in map {
                if let Some(flag) = flags.get_mut(&name) {
                    *flag = value_flag(&value);
                }
            }
        },
        Ok(Value::Array(items)) => {
            for item in items {
                let name = match &item {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(obj) => obj.get("name").and_then(Value::as_str),
                    _ => None,
                };
                let outdated = match &item {
                    Value::Object(_) => value_flag_or(&item, true),
                    _ => true,
                };
                if let Some(flag) = name.and_then(|n| flags.get_mut(n)) {
                    *flag = outdated;
                }
            }
        },
        _ => {
            for line in stdout.lines() {
                let lower = line.to_lowercase();
                if !lower.contains("update") || lower.contains("up to date") {
                    continue;
                }
                for (name, flag) in flags.iter_mut() {
                    if mentions(line, name) {
                        *flag = true;
                    }
                }
            }
        },
    }
    flags
}

fn value_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Object(_) => value_flag_or(value, false),
        _ => false,
    }
}

fn value_flag_or(value: &Value, default: bool) -> bool {
    ["updateAvailable", "update_available", "outdated"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_bool))
        .unwrap_or(default)
}

/// `name` appears as a whole token (not as part of a longer skill name).
fn mentions(line: &str, name: &str) -> bool {
    line.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_' || c == '/'))
        .any(|token| token == name || token.rsplit('/').next() == Some(name))
}
