use anyhow::Context as _;
use shadow_utils::time::start_of_utc_day;

use crate::{database::Database, model::stats::GeneralStats};

const ACTIVE_WINDOW_SECS: u64 = 7 * 86_400;

#[derive(sqlx::FromRow)]
struct UserCountsRow {
    total: i64,
    active: i64,
    blocked: i64,
    admins: i64,
    developers: i64,
    average_experience: Option<f64>,
    max_level: Option<i64>,
}

fn non_negative(value: i64, what: &str) -> anyhow::Result<u64> {
    u64::try_from(value).with_context(|| format!("{what} out of u64 range"))
}

/// Aggregate counters for the stats and status commands, evaluated at `now`.
pub async fn general_stats(db: &Database, now: u64) -> anyhow::Result<GeneralStats> {
    let active_since = i64::try_from(now.saturating_sub(ACTIVE_WINDOW_SECS))
        .context("active_since out of i64 range")?;
    let today = i64::try_from(start_of_utc_day(now)).context("today out of i64 range")?;

    let users: UserCountsRow = sqlx::query_as(
        "SELECT
            COUNT(*) AS total,
            COALESCE(SUM(CASE WHEN last_activity >= ? THEN 1 ELSE 0 END), 0) AS active,
            COALESCE(SUM(CASE WHEN is_blocked = 1 THEN 1 ELSE 0 END), 0) AS blocked,
            COALESCE(SUM(CASE WHEN user_type = 'admin' THEN 1 ELSE 0 END), 0) AS admins,
            COALESCE(SUM(CASE WHEN user_type = 'developer' THEN 1 ELSE 0 END), 0) AS developers,
            (SELECT AVG(experience_points) FROM users WHERE user_type = 'user') AS average_experience,
            MAX(level) AS max_level
         FROM users",
    )
    .bind(active_since)
    .fetch_one(db.pool())
    .await?;

    let total_groups: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups")
        .fetch_one(db.pool())
        .await?;

    let (registered_commands, total_command_usage): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(usage_count), 0) FROM commands")
            .fetch_one(db.pool())
            .await?;

    let commands_today: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM command_logs WHERE executed_at >= ?")
            .bind(today)
            .fetch_one(db.pool())
            .await?;

    Ok(GeneralStats {
        total_users: non_negative(users.total, "total users")?,
        active_users: non_negative(users.active, "active users")?,
        blocked_users: non_negative(users.blocked, "blocked users")?,
        admin_users: non_negative(users.admins, "admin users")?,
        developer_users: non_negative(users.developers, "developer users")?,
        total_groups: non_negative(total_groups, "group count")?,
        registered_commands: non_negative(registered_commands, "command count")?,
        commands_today: non_negative(commands_today, "commands today")?,
        average_experience: users.average_experience.unwrap_or(0.0),
        max_level: users
            .max_level
            .map(|level| non_negative(level, "max level"))
            .transpose()?
            .unwrap_or(1),
        total_command_usage: non_negative(total_command_usage, "command usage")?,
    })
}

#[cfg(test)]
mod tests {
    use shadow_utils::time::now_unix_secs;

    use super::*;
    use crate::impls::{
        command_logs::{ensure_commands_registered, increment_command_usage, record_command_log},
        groups::upsert_group,
        users::{add_experience, block_user, get_or_create_user},
    };
    use crate::model::{
        command_logs::NewCommandLog,
        settings::ProgressionSettings,
        users::{ProfileHints, Role},
    };

    #[tokio::test]
    async fn empty_database_has_sane_defaults() {
        let db = Database::in_memory().await.unwrap();
        let stats = general_stats(&db, now_unix_secs()).await.unwrap();
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.max_level, 1);
        assert_eq!(stats.average_experience, 0.0);
        assert_eq!(stats.total_command_usage, 0);
    }

    #[tokio::test]
    async fn counts_users_groups_and_commands() {
        let db = Database::in_memory().await.unwrap();
        let hints = ProfileHints::default();
        let settings = ProgressionSettings::default();

        let developer = get_or_create_user(&db, "1", &hints, Some(Role::Developer))
            .await
            .unwrap();
        get_or_create_user(&db, "2", &hints, Some(Role::Admin)).await.unwrap();
        get_or_create_user(&db, "3", &hints, None).await.unwrap();
        get_or_create_user(&db, "4", &hints, None).await.unwrap();
        add_experience(&db, "3", 300, &settings).await.unwrap();
        add_experience(&db, "4", 100, &settings).await.unwrap();
        block_user(&db, &developer, "4", "spam").await.unwrap();

        upsert_group(&db, "g@g.us").await.unwrap();
        ensure_commands_registered(&db, &["a", "b"]).await.unwrap();
        increment_command_usage(&db, "a").await.unwrap();
        increment_command_usage(&db, "b").await.unwrap();
        record_command_log(
            &db,
            &NewCommandLog {
                user_id: developer.id,
                group_id: None,
                command_name: "a",
                full_command: ".a",
                success: true,
                response_time_ms: 1,
                error_message: None,
            },
        )
        .await
        .unwrap();

        let stats = general_stats(&db, now_unix_secs()).await.unwrap();
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.active_users, 4);
        assert_eq!(stats.blocked_users, 1);
        assert_eq!(stats.admin_users, 1);
        assert_eq!(stats.developer_users, 1);
        assert_eq!(stats.total_groups, 1);
        assert_eq!(stats.registered_commands, 2);
        assert_eq!(stats.commands_today, 1);
        assert_eq!(stats.average_experience, 200.0);
        assert_eq!(stats.max_level, 4);
        assert_eq!(stats.total_command_usage, 2);
    }
}
