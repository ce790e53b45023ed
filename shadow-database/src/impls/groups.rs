use anyhow::Context as _;
use shadow_utils::time::now_unix_secs;

use crate::database::Database;

/// Record activity in a group, registering it on first sight.
pub async fn upsert_group(db: &Database, group_jid: &str) -> anyhow::Result<()> {
    let now = i64::try_from(now_unix_secs()).context("now out of i64 range")?;

    sqlx::query(
        "INSERT INTO groups (group_jid, message_count, first_seen, last_activity)
         VALUES (?1, 1, ?2, ?2)
         ON CONFLICT (group_jid) DO UPDATE SET
            message_count = message_count + 1,
            last_activity = excluded.last_activity",
    )
    .bind(group_jid)
    .bind(now)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn group_message_count(db: &Database, group_jid: &str) -> anyhow::Result<Option<u64>> {
    let count: Option<i64> =
        sqlx::query_scalar("SELECT message_count FROM groups WHERE group_jid = ?")
            .bind(group_jid)
            .fetch_optional(db.pool())
            .await?;

    count
        .map(u64::try_from)
        .transpose()
        .context("message_count row out of u64 range")
}
