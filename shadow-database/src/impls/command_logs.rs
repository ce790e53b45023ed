use anyhow::Context as _;
use shadow_utils::time::now_unix_secs;

use crate::{
    database::Database,
    model::command_logs::{CommandLogEntry, NewCommandLog},
};

#[derive(sqlx::FromRow)]
struct CommandLogRow {
    id: i64,
    user_id: i64,
    group_id: Option<String>,
    command_name: String,
    full_command: String,
    success: bool,
    response_time_ms: i64,
    error_message: Option<String>,
    executed_at: i64,
}

/// Append an audit row and return its id.
pub async fn record_command_log(db: &Database, entry: &NewCommandLog<'_>) -> anyhow::Result<i64> {
    let response_time_ms =
        i64::try_from(entry.response_time_ms).context("response_time_ms out of i64 range")?;
    let executed_at = i64::try_from(now_unix_secs()).context("executed_at out of i64 range")?;

    let id = sqlx::query(
        "INSERT INTO command_logs (
            user_id, group_id, command_name, full_command,
            success, response_time_ms, error_message, executed_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(entry.user_id)
    .bind(entry.group_id)
    .bind(entry.command_name)
    .bind(entry.full_command)
    .bind(entry.success)
    .bind(response_time_ms)
    .bind(entry.error_message)
    .bind(executed_at)
    .execute(db.pool())
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Bump the usage counter of a registered command. Returns false for unknown names.
pub async fn increment_command_usage(db: &Database, command_name: &str) -> anyhow::Result<bool> {
    let updated = sqlx::query(
        "UPDATE commands SET usage_count = usage_count + 1 WHERE command_name = ?",
    )
    .bind(command_name)
    .execute(db.pool())
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// Make sure every name has a `commands` row. Returns how many were added.
pub async fn ensure_commands_registered(db: &Database, names: &[&str]) -> anyhow::Result<u64> {
    let created_at = i64::try_from(now_unix_secs()).context("created_at out of i64 range")?;
    let mut tx = db.pool().begin().await?;
    let mut inserted = 0;

    for name in names {
        inserted += sqlx::query(
            "INSERT INTO commands (command_name, created_at) VALUES (?, ?)
             ON CONFLICT (command_name) DO NOTHING",
        )
        .bind(*name)
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

pub async fn command_usage(db: &Database, command_name: &str) -> anyhow::Result<Option<u64>> {
    let count: Option<i64> =
        sqlx::query_scalar("SELECT usage_count FROM commands WHERE command_name = ?")
            .bind(command_name)
            .fetch_optional(db.pool())
            .await?;

    count
        .map(u64::try_from)
        .transpose()
        .context("usage_count row out of u64 range")
}

/// Most recent audit rows first.
pub async fn recent_command_logs(db: &Database, limit: u32) -> anyhow::Result<Vec<CommandLogEntry>> {
    let rows: Vec<CommandLogRow> = sqlx::query_as(
        "SELECT id, user_id, group_id, command_name, full_command, success,
                response_time_ms, error_message, executed_at
         FROM command_logs
         ORDER BY id DESC
         LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(db.pool())
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        entries.push(CommandLogEntry {
            id: row.id,
            user_id: row.user_id,
            group_id: row.group_id,
            command_name: row.command_name,
            full_command: row.full_command,
            success: row.success,
            response_time_ms: u64::try_from(row.response_time_ms)
                .context("response_time_ms row out of u64 range")?,
            error_message: row.error_message,
            executed_at: u64::try_from(row.executed_at)
                .context("executed_at row out of u64 range")?,
        });
    }

    Ok(entries)
}
