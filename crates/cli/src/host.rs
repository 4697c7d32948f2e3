//! [`Host`] for a headless UI on the other end of stdio.
//!
//! There is nobody to click through dialogs, so the install wizard and the
//! delete prompt are answered from command-line flags. Notices are forwarded
//! to stdout as JSON lines alongside snapshots.

use std::path::Path;

use {
    async_trait::async_trait,
    skilldeck_sidebar::{DeleteScope, Host, InstallChoices, InstallPrompt, Notice},
    skilldeck_skills::SkillRecord,
    tokio::sync::mpsc,
    tracing::{debug, info},
};

use crate::transport::Outbound;

/// Preset answers for the dialogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogAnswers {
    pub install: InstallChoices,
    pub delete_scope: DeleteScope,
}

pub struct StdioHost {
    answers: DialogAnswers,
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl StdioHost {
    pub fn new(answers: DialogAnswers, outbound: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { answers, outbound }
    }
}

#[async_trait]
impl Host for StdioHost {
    async fn pick_install_options(&self, prompt: &InstallPrompt) -> Option<InstallChoices> {
        info!(
            repository = %prompt.repository_ref,
            skill = prompt.skill_name.as_deref().unwrap_or("*"),
            scope = %self.answers.install.scope,
            "answering install wizard from flags"
        );
        Some(self.answers.install.clone())
    }

    async fn choose_delete_scope(
        &self,
        selected: &SkillRecord,
        installations: &[SkillRecord],
    ) -> Option<DeleteScope> {
        debug!(
            name = %selected.name,
            installations = installations.len(),
            scope = ?self.answers.delete_scope,
            "answering delete prompt from flags"
        );
        Some(self.answers.delete_scope)
    }

    fn notify(&self, notice: Notice) {
        let _ = self.outbound.send(Outbound::Notice(notice));
    }

    async fn open_path(&self, path: &Path) -> anyhow::Result<()> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || open::that(&path)).await??;
        Ok(())
    }

    async fn open_url(&self, url: &str) -> anyhow::Result<()> {
        let url = url.to_string();
        tokio::task::spawn_blocking(move || open::that(&url)).await??;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        skilldeck_sidebar::NoticeLevel,
        skilldeck_skills::{AgentMode, InstallMethod, Level},
    };

    fn answers() -> DialogAnswers {
        DialogAnswers {
            install: InstallChoices {
                scope: Level::User,
                agents: vec![AgentMode::Codex],
                method: InstallMethod::Copy,
                telemetry: false,
            },
            delete_scope: DeleteScope::All,
        }
    }

    #[tokio::test]
    async fn dialogs_use_preset_answers() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let host = StdioHost::new(answers(), tx);
        let prompt = InstallPrompt {
            repository_ref: "acme/tools".into(),
            skill_name: None,
        };
        assert_eq!(host.pick_install_options(&prompt).await, Some(answers().install));

        let record = SkillRecord {
            name: "pdf".into(),
            description: String::new(),
            path: "/tmp/pdf".into(),
            level: Level::User,
            agent_mode: AgentMode::Codex,
            updated_at: None,
            marketplace_id: None,
            update_available: None,
        };
        assert_eq!(
            host.choose_delete_scope(&record, std::slice::from_ref(&record))
                .await,
            Some(DeleteScope::All)
        );
    }

    #[test]
    fn notices_are_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = StdioHost::new(answers(), tx);
        host.notify(Notice::warning("slow network"));
        match rx.try_recv().unwrap() {
            Outbound::Notice(notice) => {
                assert_eq!(notice.level, NoticeLevel::Warning);
                assert_eq!(notice.message, "slow network");
            },
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
