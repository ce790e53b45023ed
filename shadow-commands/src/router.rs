use std::time::Instant;

use anyhow::Context as _;
use shadow_core::{CommandContext, Data, Error};
use shadow_database::impls::{
    command_logs::{increment_command_usage, record_command_log},
    rate_limit::check_command_limit,
    users::record_command_usage,
};
use shadow_database::model::{command_logs::NewCommandLog, users::User};
use shadow_utils::parse::parse_command;
use shadow_whatsapp::InboundMessage;
use tracing::{debug, error, info, warn};

use crate::CommandRegistry;
use crate::replies::{
    GENERIC_FAILURE, permission_denied_message, rate_limited_message, unknown_command_message,
};

const PERMISSION_DENIED: &str = "permission denied";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Ordinary text, including a lone prefix.
    NotCommand,
    Unknown { name: String },
    RateLimited { retry_after_secs: u64 },
    PermissionDenied,
    Succeeded { latency_ms: u64 },
    Failed,
}

/// Route one message from an unblocked, already loaded `user` to its command.
pub async fn dispatch(
    registry: &CommandRegistry,
    data: &Data,
    message: &InboundMessage,
    user: &User,
) -> Result<DispatchOutcome, Error> {
    let Some(parsed) = parse_command(&message.content) else {
        return Ok(DispatchOutcome::NotCommand);
    };

    info!(user = %user.identity, name = %user.display_label(), command = %parsed.name, "command received");

    let Some(command) = registry.get(&parsed.name) else {
        data.transport
            .send_text(&message.chat, &unknown_command_message(&parsed.name), &[])
            .await?;
        return Ok(DispatchOutcome::Unknown { name: parsed.name });
    };
    let meta = command.meta;

    let limit = check_command_limit(&data.db, &data.config.rate_limits, &user.identity, meta.name);
    if !limit.allowed {
        data.transport
            .send_text(&message.chat, &rate_limited_message(limit.retry_after_secs), &[])
            .await?;
        return Ok(DispatchOutcome::RateLimited {
            retry_after_secs: limit.retry_after_secs,
        });
    }

    if !user.role.satisfies(meta.required_role) {
        debug!(user = %user.identity, command = meta.name, role = %user.role, "permission denied");
        data.transport
            .send_text(&message.chat, &permission_denied_message(meta.required_role), &[])
            .await?;
        record_command_log(
            &data.db,
            &NewCommandLog {
                user_id: user.id,
                group_id: message.group.as_deref(),
                command_name: meta.name,
                full_command: &message.content,
                success: false,
                response_time_ms: 0,
                error_message: Some(PERMISSION_DENIED),
            },
        )
        .await?;
        return Ok(DispatchOutcome::PermissionDenied);
    }

    let ctx = CommandContext {
        data,
        message,
        user,
        command: meta.name,
        args: &parsed.args,
    };

    let started = Instant::now();
    let result = (command.handler)(ctx).await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    // Bookkeeping failures are command failures too.
    let result = match result {
        Ok(()) => record_success(data, message, user, meta.name, latency_ms).await,
        Err(source) => Err(source),
    };

    match result {
        Ok(()) => {
            debug!(command = meta.name, latency_ms, "command completed");
            Ok(DispatchOutcome::Succeeded { latency_ms })
        }
        Err(source) => {
            error!(?source, command = meta.name, user = %user.identity, "command failed");

            if let Err(send_error) = data
                .transport
                .send_text(&message.chat, GENERIC_FAILURE, &[])
                .await
            {
                warn!(?send_error, "failed to report command failure");
            }

            let error_message = format!("{source:#}");
            if let Err(log_error) = record_command_log(
                &data.db,
                &NewCommandLog {
                    user_id: user.id,
                    group_id: message.group.as_deref(),
                    command_name: meta.name,
                    full_command: &message.content,
                    success: false,
                    response_time_ms: latency_ms,
                    error_message: Some(&error_message),
                },
            )
            .await
            {
                warn!(?log_error, command = meta.name, "failed to record command failure");
            }

            Ok(DispatchOutcome::Failed)
        }
    }
}

/// Rewards, usage counter and audit row for a handler that returned `Ok`.
async fn record_success(
    data: &Data,
    message: &InboundMessage,
    user: &User,
    command_name: &str,
    latency_ms: u64,
) -> Result<(), Error> {
    record_command_usage(&data.db, &user.identity, &data.progression)
        .await
        .context("failed to record command usage")?;
    increment_command_usage(&data.db, command_name)
        .await
        .context("failed to update command usage counter")?;
    record_command_log(
        &data.db,
        &NewCommandLog {
            user_id: user.id,
            group_id: message.group.as_deref(),
            command_name,
            full_command: &message.content,
            success: true,
            response_time_ms: latency_ms,
            error_message: None,
        },
    )
    .await
    .context("failed to record command log")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use shadow_core::{BotConfig, BoxFuture, CommandContext, Data, Error};
    use shadow_database::Database;
    use shadow_database::cache::RateLimitPolicy;
    use shadow_database::impls::command_logs::{
        command_usage, ensure_commands_registered, recent_command_logs,
    };
    use shadow_database::impls::users::{find_user_by_identity, get_or_create_user};
    use shadow_database::model::settings::ProgressionSettings;
    use shadow_database::model::users::{ProfileHints, Role, User};
    use shadow_whatsapp::InboundMessage;
    use shadow_whatsapp::mock::RecordingTransport;

    use super::{DispatchOutcome, dispatch};
    use crate::{Command, CommandMeta, CommandRegistry};

    struct Fixture {
        registry: CommandRegistry,
        data: Data,
        transport: Arc<RecordingTransport>,
    }

    async fn fixture_with(config: BotConfig, registry: CommandRegistry) -> Fixture {
        let db = Database::in_memory().await.unwrap();
        ensure_commands_registered(&db, &registry.names()).await.unwrap();

        let transport = Arc::new(RecordingTransport::new());
        let data = Data::new(
            db,
            transport.clone(),
            Arc::new(config),
            ProgressionSettings::default(),
        );

        Fixture {
            registry,
            data,
            transport,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(BotConfig::default(), CommandRegistry::new()).await
    }

    fn message(sender: &str, content: &str) -> InboundMessage {
        InboundMessage {
            id: "3EB0C0FFEE".to_owned(),
            chat: format!("{sender}@s.whatsapp.net"),
            sender: sender.to_owned(),
            push_name: format!("user {sender}"),
            username: format!("user {sender}"),
            content: content.to_owned(),
            group: None,
            timestamp: 1_700_000_000,
        }
    }

    async fn user(fx: &Fixture, identity: &str, role: Option<Role>) -> User {
        let hints = ProfileHints {
            display_name: format!("user {identity}"),
            username: format!("user {identity}"),
        };
        get_or_create_user(&fx.data.db, identity, &hints, role)
            .await
            .unwrap()
    }

    async fn send(fx: &Fixture, sender: &User, content: &str) -> DispatchOutcome {
        let message = message(&sender.identity, content);
        dispatch(&fx.registry, &fx.data, &message, sender)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn profile_for_new_user() {
        let fx = fixture().await;
        let alpha = user(&fx, "111", None).await;

        let outcome = send(&fx, &alpha, ".معلوماتي").await;
        assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));

        let reply = fx.transport.sent().pop().unwrap();
        assert!(reply.text.contains("user 111"));
        assert!(reply.text.contains("*مستوى الظل:* 1"));
        assert_eq!(reply.mentions, vec!["111@s.whatsapp.net".to_owned()]);

        let stored = find_user_by_identity(&fx.data.db, "111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_commands_used, 1);
        assert_eq!(stored.experience, 10);
        assert_eq!(stored.diamonds, 1);

        let logs = recent_command_logs(&fx.data.db, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].success);
        assert_eq!(logs[0].command_name, "معلوماتي");
        assert_eq!(
            command_usage(&fx.data.db, "معلوماتي").await.unwrap(),
            Some(1)
        );
    }

    #[tokio::test]
    async fn stats_lists_the_strongest_users() {
        let fx = fixture().await;
        let alpha = user(&fx, "111", None).await;
        user(&fx, "999", Some(Role::Developer)).await;

        send(&fx, &alpha, ".الاحصائيات").await;

        let reply = fx.transport.last_text().unwrap();
        assert!(reply.contains("🥇 user 111 (مستوى 1)"));
        assert!(!reply.contains("🥈"));
        assert!(reply.contains("*أسياد الظل:* 1"));
    }

    #[tokio::test]
    async fn developer_blocks_user() {
        let fx = fixture().await;
        let developer = user(&fx, "999", Some(Role::Developer)).await;
        user(&fx, "1234567890", None).await;

        let outcome = send(&fx, &developer, ".حظر 1234567890 spam").await;
        assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));

        let target = find_user_by_identity(&fx.data.db, "1234567890")
            .await
            .unwrap()
            .unwrap();
        let block = target.block.unwrap();
        assert_eq!(block.reason, "spam");
        assert_eq!(block.blocked_by.as_deref(), Some("999"));
        assert!(fx.transport.last_text().unwrap().contains("📝 السبب: spam"));
    }

    #[tokio::test]
    async fn block_without_target_shows_usage() {
        let fx = fixture().await;
        let developer = user(&fx, "999", Some(Role::Developer)).await;

        send(&fx, &developer, ".حظر").await;
        assert!(fx.transport.last_text().unwrap().contains(".حظر 1234567890"));
    }

    #[tokio::test]
    async fn refusal_is_reported_to_the_actor() {
        let fx = fixture().await;
        let developer = user(&fx, "999", Some(Role::Developer)).await;
        user(&fx, "888", Some(Role::Developer)).await;

        let outcome = send(&fx, &developer, ".حظر 888").await;
        assert!(matches!(outcome, DispatchOutcome::Succeeded { .. }));
        assert!(fx.transport.last_text().unwrap().starts_with("❌"));

        let peer = find_user_by_identity(&fx.data.db, "888")
            .await
            .unwrap()
            .unwrap();
        assert!(!peer.is_blocked());
    }

    #[tokio::test]
    async fn third_warning_blocks() {
        let fx = fixture().await;
        let admin = user(&fx, "500", Some(Role::Admin)).await;
        user(&fx, "600", None).await;

        for _ in 0..3 {
            send(&fx, &admin, ".تحذير 600 flood").await;
        }

        let target = find_user_by_identity(&fx.data.db, "600")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(target.warnings, 3);
        let block = target.block.unwrap();
        assert_eq!(block.reason, "تم الحظر تلقائياً بعد 3 تحذيرات");
        assert!(block.blocked_by.is_none());
        assert!(fx.transport.last_text().unwrap().contains("3/3"));
    }

    #[tokio::test]
    async fn unknown_command_writes_no_log() {
        let fx = fixture().await;
        let alpha = user(&fx, "111", None).await;

        let outcome = send(&fx, &alpha, ".xyz123").await;
        assert_eq!(
            outcome,
            DispatchOutcome::Unknown {
                name: "xyz123".to_owned()
            }
        );
        assert!(fx.transport.last_text().unwrap().contains("غير موجود"));
        assert!(recent_command_logs(&fx.data.db, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn permission_denied_is_logged() {
        let fx = fixture().await;
        let alpha = user(&fx, "111", None).await;
        user(&fx, "222", None).await;

        let outcome = send(&fx, &alpha, ".حظر 222").await;
        assert_eq!(outcome, DispatchOutcome::PermissionDenied);
        assert!(fx.transport.last_text().unwrap().contains("لأسياد الظل"));

        let target = find_user_by_identity(&fx.data.db, "222")
            .await
            .unwrap()
            .unwrap();
        assert!(!target.is_blocked());

        let logs = recent_command_logs(&fx.data.db, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].success);
        assert_eq!(logs[0].error_message.as_deref(), Some("permission denied"));

        let actor = find_user_by_identity(&fx.data.db, "111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(actor.total_commands_used, 0);
    }

    const BROKEN: CommandMeta = CommandMeta {
        name: "معطل",
        desc: "always fails",
        category: "general",
        usage: ".معطل",
        required_role: Role::User,
    };

    fn broken(_ctx: CommandContext<'_>) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async { Err::<(), Error>(anyhow::anyhow!("storage offline")) })
    }

    #[tokio::test]
    async fn handler_failure_is_logged() {
        let registry = CommandRegistry::from_commands(vec![Command {
            meta: &BROKEN,
            handler: broken,
        }]);
        let fx = fixture_with(BotConfig::default(), registry).await;
        let alpha = user(&fx, "111", None).await;

        let outcome = send(&fx, &alpha, ".معطل").await;
        assert_eq!(outcome, DispatchOutcome::Failed);
        assert_eq!(
            fx.transport.last_text().as_deref(),
            Some(crate::replies::GENERIC_FAILURE)
        );

        let logs = recent_command_logs(&fx.data.db, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].success);
        assert_eq!(logs[0].error_message.as_deref(), Some("storage offline"));
        assert_eq!(command_usage(&fx.data.db, "معطل").await.unwrap(), Some(0));
    }

    const DROP_TABLE: CommandMeta = CommandMeta {
        name: "اسقاط",
        desc: "drops a table, then replies",
        category: "general",
        usage: ".اسقاط",
        required_role: Role::User,
    };

    fn drop_table(ctx: CommandContext<'_>) -> BoxFuture<'_, Result<(), Error>> {
        Box::pin(async move {
            let table = ctx.args.first().map(String::as_str).unwrap_or("commands");
            sqlx::query(&format!("DROP TABLE {table}"))
                .execute(ctx.db().pool())
                .await?;
            ctx.reply("done").await
        })
    }

    async fn drop_table_fixture() -> Fixture {
        let registry = CommandRegistry::from_commands(vec![Command {
            meta: &DROP_TABLE,
            handler: drop_table,
        }]);
        fixture_with(BotConfig::default(), registry).await
    }

    #[tokio::test]
    async fn bookkeeping_failure_is_a_command_failure() {
        let fx = drop_table_fixture().await;
        let alpha = user(&fx, "111", None).await;

        let outcome = send(&fx, &alpha, ".اسقاط commands").await;
        assert_eq!(outcome, DispatchOutcome::Failed);

        let texts: Vec<String> = fx.transport.sent().into_iter().map(|sent| sent.text).collect();
        assert_eq!(
            texts,
            vec!["done".to_owned(), crate::replies::GENERIC_FAILURE.to_owned()]
        );

        let logs = recent_command_logs(&fx.data.db, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(!logs[0].success);
        let error_message = logs[0].error_message.as_deref().unwrap();
        assert!(error_message.contains("failed to update command usage counter"));
    }

    #[tokio::test]
    async fn missing_audit_table_still_reports_failure() {
        let fx = drop_table_fixture().await;
        let alpha = user(&fx, "111", None).await;

        let message = message(&alpha.identity, ".اسقاط command_logs");
        let outcome = dispatch(&fx.registry, &fx.data, &message, &alpha).await;

        assert_eq!(outcome.unwrap(), DispatchOutcome::Failed);
        assert_eq!(
            fx.transport.last_text().as_deref(),
            Some(crate::replies::GENERIC_FAILURE)
        );
    }

    #[tokio::test]
    async fn lone_prefix_is_not_a_command() {
        let fx = fixture().await;
        let alpha = user(&fx, "111", None).await;

        assert_eq!(send(&fx, &alpha, ".").await, DispatchOutcome::NotCommand);
        assert_eq!(send(&fx, &alpha, "hello").await, DispatchOutcome::NotCommand);
        assert!(fx.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn rate_limited_commands_are_rejected() {
        let mut config = BotConfig::default();
        config.rate_limits.command = RateLimitPolicy {
            max_hits: 1,
            window: Duration::from_secs(60),
            block: Duration::from_secs(60),
        };
        let fx = fixture_with(config, CommandRegistry::new()).await;
        let alpha = user(&fx, "111", None).await;

        assert!(matches!(
            send(&fx, &alpha, ".اوامر").await,
            DispatchOutcome::Succeeded { .. }
        ));
        let outcome = send(&fx, &alpha, ".اوامر").await;
        let DispatchOutcome::RateLimited { retry_after_secs } = outcome else {
            panic!("expected rate limit, got {outcome:?}");
        };
        assert!(retry_after_secs >= 1);
        assert!(fx.transport.last_text().unwrap().contains("تجاوزت"));

        let logs = recent_command_logs(&fx.data.db, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
    }
}
