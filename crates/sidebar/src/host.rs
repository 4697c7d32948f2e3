//! The UI shell's side of user interaction: dialogs, notifications and
//! opening things outside the sidebar.

use std::path::Path;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    skilldeck_skills::{AgentMode, InstallMethod, Level, SkillRecord},
};

/// What the install wizard is asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallPrompt {
    pub repository_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_name: Option<String>,
}

/// Answers collected by the install wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallChoices {
    pub scope: Level,
    pub agents: Vec<AgentMode>,
    #[serde(default)]
    pub method: InstallMethod,
    #[serde(default)]
    pub telemetry: bool,
}

/// Which installations of a multiply-installed skill to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteScope {
    /// Only the row the user acted on.
    Selected,
    /// Every installation sharing the name.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A one-shot message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Dialogs and side effects provided by the UI shell.
///
/// Dialog methods may take as long as the user needs; the coordinator calls
/// them from spawned tasks so intents keep flowing meanwhile.
#[async_trait]
pub trait Host: Send + Sync {
    /// Run the install wizard (scope, agents, method, telemetry).
    /// `None` means the user cancelled at some step.
    async fn pick_install_options(&self, prompt: &InstallPrompt) -> Option<InstallChoices>;

    /// Ask whether to delete only `selected` or every entry of `installations`.
    /// Only called when the skill is installed more than once.
    async fn choose_delete_scope(
        &self,
        selected: &SkillRecord,
        installations: &[SkillRecord],
    ) -> Option<DeleteScope>;

    fn notify(&self, notice: Notice);

    async fn open_path(&self, path: &Path) -> anyhow::Result<()>;

    async fn open_url(&self, url: &str) -> anyhow::Result<()>;
}
