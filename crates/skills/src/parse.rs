use {
    anyhow::{Context, bail},
    serde::Deserialize,
};

/// The frontmatter fields the inventory cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SkillFrontmatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parse YAML frontmatter from a skill markdown file.
pub fn parse_frontmatter(content: &str) -> anyhow::Result<SkillFrontmatter> {
    let (frontmatter, _body) = split_frontmatter(content)?;
    let meta: SkillFrontmatter =
        serde_yaml::from_str(&frontmatter).context("invalid skill frontmatter")?;
    Ok(meta)
}

/// Name and description for a skill, falling back to `fallback_name` and an
/// empty description when the file has no usable frontmatter.
pub fn describe(content: &str, fallback_name: &str) -> (String, String) {
    let meta = match parse_frontmatter(content) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::debug!(%fallback_name, %e, "using directory name for skill");
            SkillFrontmatter::default()
        },
    };
    let name = meta
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback_name.to_string());
    let description = meta
        .description
        .map(|d| d.trim().to_string())
        .unwrap_or_default();
    (name, description)
}

fn split_frontmatter(content: &str) -> anyhow::Result<(String, String)> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("---") {
        bail!("skill file must start with YAML frontmatter delimited by ---");
    }

    let after_open = &trimmed[3..];
    let close_pos = after_open
        .find("\n---")
        .context("skill file missing closing --- for frontmatter")?;

    let frontmatter = after_open[..close_pos].trim().to_string();
    let body = after_open[close_pos + 4..].trim().to_string();
    Ok((frontmatter, body))
}
