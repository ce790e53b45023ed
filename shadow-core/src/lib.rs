pub mod config;

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use shadow_database::Database;
use shadow_database::model::{settings::ProgressionSettings, users::User};
use shadow_whatsapp::{InboundMessage, Transport};
use tokio::sync::RwLock;

pub use config::BotConfig;
pub use shadow_whatsapp::BoxFuture;

pub type Error = anyhow::Error;

/// Handles shared by every command and event handler.
#[derive(Clone)]
pub struct Data {
    pub db: Database,
    pub transport: Arc<dyn Transport>,
    pub config: Arc<BotConfig>,
    /// Resolved once at startup from config defaults and stored settings.
    pub progression: ProgressionSettings,
    pub started_at: Instant,
    pub maintenance: Arc<RwLock<MaintenanceStatus>>,
}

impl Data {
    pub fn new(
        db: Database,
        transport: Arc<dyn Transport>,
        config: Arc<BotConfig>,
        progression: ProgressionSettings,
    ) -> Self {
        Self {
            db,
            transport,
            config,
            progression,
            started_at: Instant::now(),
            maintenance: Default::default(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Everything a command handler sees about one invocation.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub data: &'a Data,
    pub message: &'a InboundMessage,
    /// The invoking user as loaded before dispatch.
    pub user: &'a User,
    pub command: &'a str,
    pub args: &'a [String],
}

impl<'a> CommandContext<'a> {
    pub fn db(&self) -> &'a Database {
        &self.data.db
    }

    pub fn config(&self) -> &'a BotConfig {
        &self.data.config
    }

    /// Reply in the chat the command came from.
    pub async fn reply(&self, text: impl AsRef<str>) -> Result<(), Error> {
        self.data
            .transport
            .send_text(&self.message.chat, text.as_ref(), &[])
            .await
    }

    /// Reply and tag the invoking user.
    pub async fn reply_mentioning_sender(&self, text: impl AsRef<str>) -> Result<(), Error> {
        let mentions = [self.message.sender_jid()];
        self.data
            .transport
            .send_text(&self.message.chat, text.as_ref(), &mentions)
            .await
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackupSummary {
    pub finished_at: u64,
    pub files: Vec<String>,
    pub pruned: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemorySummary {
    pub checked_at: u64,
    pub resident_bytes: Option<u64>,
    pub over_threshold: bool,
    pub removed_files: usize,
    pub purged_limits: usize,
}

/// Latest outcome of each background job, shown by the status command.
#[derive(Clone, Debug, Default)]
pub struct MaintenanceStatus {
    pub last_backup: Option<BackupSummary>,
    pub last_backup_error: Option<String>,
    pub last_memory_check: Option<MemorySummary>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shadow_database::Database;
    use shadow_database::impls::users::get_or_create_user;
    use shadow_database::model::users::ProfileHints;
    use shadow_whatsapp::InboundMessage;
    use shadow_whatsapp::mock::RecordingTransport;

    use super::{BotConfig, CommandContext, Data};

    #[tokio::test]
    async fn replies_go_to_the_source_chat() {
        let db = Database::in_memory().await.unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let config = BotConfig::default();
        let data = Data::new(db, transport.clone(), Arc::new(config.clone()), config.progression);
        let user = get_or_create_user(&data.db, "5", &ProfileHints::default(), None)
            .await
            .unwrap();
        let message = InboundMessage {
            id: "1".to_owned(),
            chat: "9@g.us".to_owned(),
            sender: "5".to_owned(),
            push_name: String::new(),
            username: String::new(),
            content: ".اوامر".to_owned(),
            group: Some("9@g.us".to_owned()),
            timestamp: 0,
        };

        let ctx = CommandContext {
            data: &data,
            message: &message,
            user: &user,
            command: "اوامر",
            args: &[],
        };
        ctx.reply("plain").await.unwrap();
        ctx.reply_mentioning_sender("tagged").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].chat, "9@g.us");
        assert!(sent[0].mentions.is_empty());
        assert_eq!(sent[1].mentions, vec!["5@s.whatsapp.net".to_owned()]);
    }
}
