//! Discrete commands sent by the UI.

use std::{path::PathBuf, str::FromStr};

use {
    serde::{Deserialize, Serialize},
    skilldeck_skills::{AgentMode, Level},
};

use crate::{error::Error, state::Panel};

/// A user intent. On the wire each intent is a JSON object tagged by `type`,
/// e.g. `{"type":"search","query":"pdf"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    /// Rescan installed skills and refetch the first marketplace page.
    Refresh,
    Search {
        query: String,
    },
    LoadMore,
    SetActivePanel {
        panel: Panel,
    },
    Install {
        repository_ref: String,
        #[serde(default)]
        skill_name: Option<String>,
    },
    DeleteSkill {
        path: PathBuf,
        name: String,
        level: Level,
        agent_mode: AgentMode,
    },
    OpenSkill {
        path: PathBuf,
    },
    OpenUrl {
        url: String,
    },
    PanelScroll {
        panel: Panel,
        offset: u32,
    },
    /// The renderer (re)attached and needs the current snapshot.
    WebviewReady,
    CheckUpdates,
    UpdateAllSkills,
}

impl FromStr for Intent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(s)?)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(r#"{"type":"refresh"}"#, Intent::Refresh)]
    #[case(r#"{"type":"search","query":"pdf"}"#, Intent::Search { query: "pdf".into() })]
    #[case(r#"{"type":"loadMore"}"#, Intent::LoadMore)]
    #[case(
        r#"{"type":"setActivePanel","panel":"marketplace"}"#,
        Intent::SetActivePanel { panel: Panel::Marketplace }
    )]
    #[case(
        r#"{"type":"install","repositoryRef":"acme/tools"}"#,
        Intent::Install { repository_ref: "acme/tools".into(), skill_name: None }
    )]
    #[case(
        r#"{"type":"install","repositoryRef":"acme/tools","skillName":"pdf-export"}"#,
        Intent::Install {
            repository_ref: "acme/tools".into(),
            skill_name: Some("pdf-export".into()),
        }
    )]
    #[case(
        r#"{"type":"deleteSkill","path":"/p/.claude/skills/a","name":"a","level":"project","agentMode":"claude-code"}"#,
        Intent::DeleteSkill {
            path: "/p/.claude/skills/a".into(),
            name: "a".into(),
            level: Level::Project,
            agent_mode: AgentMode::ClaudeCode,
        }
    )]
    #[case(
        r#"{"type":"panelScroll","panel":"installed","offset":120}"#,
        Intent::PanelScroll { panel: Panel::Installed, offset: 120 }
    )]
    #[case(r#"{"type":"webviewReady"}"#, Intent::WebviewReady)]
    #[case(r#"{"type":"checkUpdates"}"#, Intent::CheckUpdates)]
    #[case(r#"{"type":"updateAllSkills"}"#, Intent::UpdateAllSkills)]
    fn decodes_wire_intents(#[case] json: &str, #[case] expected: Intent) {
        assert_eq!(json.parse::<Intent>().unwrap(), expected);
    }

    #[test]
    fn unknown_intent_is_rejected() {
        let err = r#"{"type":"reboot"}"#.parse::<Intent>().unwrap_err();
        assert!(matches!(err, Error::InvalidIntent(_)));
    }
}
