use anyhow::Context as _;
use shadow_utils::time::now_unix_secs;
use sqlx::{Sqlite, SqliteConnection};
use tracing::info;

use crate::{
    database::Database,
    model::{
        settings::ProgressionSettings,
        users::{
            BlockRecord, ModerationError, ProfileHints, Role, User, WarningOutcome,
            ensure_can_moderate,
        },
    },
};

const USER_COLUMNS: &str = "id, whatsapp_id, username, display_name, user_type, experience_points, level, diamonds,
    warnings, is_blocked, block_reason, blocked_by, blocked_at, total_commands_used,
    last_activity, registration_date, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    whatsapp_id: String,
    username: String,
    display_name: String,
    user_type: String,
    experience_points: i64,
    level: i64,
    diamonds: i64,
    warnings: i64,
    is_blocked: bool,
    block_reason: Option<String>,
    blocked_by: Option<String>,
    blocked_at: Option<i64>,
    total_commands_used: i64,
    last_activity: i64,
    registration_date: i64,
    updated_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let block = if row.is_blocked {
            Some(BlockRecord {
                reason: row.block_reason.unwrap_or_default(),
                blocked_by: row.blocked_by,
                blocked_at: row
                    .blocked_at
                    .map(u64::try_from)
                    .transpose()
                    .context("blocked_at row out of u64 range")?
                    .unwrap_or_default(),
            })
        } else {
            None
        };

        Ok(Self {
            id: row.id,
            identity: row.whatsapp_id,
            username: row.username,
            display_name: row.display_name,
            role: row.user_type.parse()?,
            experience: u64::try_from(row.experience_points)
                .context("experience_points row out of u64 range")?,
            level: u64::try_from(row.level).context("level row out of u64 range")?,
            diamonds: u64::try_from(row.diamonds).context("diamonds row out of u64 range")?,
            warnings: u32::try_from(row.warnings).context("warnings row out of u32 range")?,
            block,
            total_commands_used: u64::try_from(row.total_commands_used)
                .context("total_commands_used row out of u64 range")?,
            last_activity: u64::try_from(row.last_activity)
                .context("last_activity row out of u64 range")?,
            registered_at: u64::try_from(row.registration_date)
                .context("registration_date row out of u64 range")?,
            updated_at: u64::try_from(row.updated_at).context("updated_at row out of u64 range")?,
        })
    }
}

async fn fetch_user<'e, E>(executor: E, identity: &str) -> anyhow::Result<Option<User>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE whatsapp_id = ?"))
            .bind(identity)
            .fetch_optional(executor)
            .await?;

    row.map(User::try_from).transpose()
}

async fn write_user(conn: &mut SqliteConnection, user: &User) -> anyhow::Result<()> {
    let experience = i64::try_from(user.experience).context("experience out of i64 range")?;
    let level = i64::try_from(user.level).context("level out of i64 range")?;
    let diamonds = i64::try_from(user.diamonds).context("diamonds out of i64 range")?;
    let total_commands_used =
        i64::try_from(user.total_commands_used).context("total_commands_used out of i64 range")?;
    let last_activity = i64::try_from(user.last_activity).context("last_activity out of i64 range")?;
    let updated_at = i64::try_from(user.updated_at).context("updated_at out of i64 range")?;
    let blocked_at = user
        .block
        .as_ref()
        .map(|block| i64::try_from(block.blocked_at))
        .transpose()
        .context("blocked_at out of i64 range")?;

    sqlx::query(
        "UPDATE users SET
            username = ?, display_name = ?, user_type = ?,
            experience_points = ?, level = ?, diamonds = ?,
            warnings = ?, is_blocked = ?, block_reason = ?,
            blocked_by = ?, blocked_at = ?, total_commands_used = ?,
            last_activity = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(user.role.as_str())
    .bind(experience)
    .bind(level)
    .bind(diamonds)
    .bind(i64::from(user.warnings))
    .bind(user.block.is_some())
    .bind(user.block.as_ref().map(|block| block.reason.as_str()))
    .bind(user.block.as_ref().and_then(|block| block.blocked_by.as_deref()))
    .bind(blocked_at)
    .bind(total_commands_used)
    .bind(last_activity)
    .bind(updated_at)
    .bind(user.id)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn find_user_by_identity(db: &Database, identity: &str) -> anyhow::Result<Option<User>> {
    fetch_user(db.pool(), identity).await
}

async fn require_user(db: &Database, identity: &str) -> anyhow::Result<User> {
    match fetch_user(db.pool(), identity).await? {
        Some(user) => Ok(user),
        None => Err(ModerationError::UserNotFound.into()),
    }
}

/// Persist every field of `user`, stamping `updated_at`.
pub async fn save_user(db: &Database, user: &mut User) -> anyhow::Result<()> {
    user.updated_at = now_unix_secs();
    let mut conn = db.pool().acquire().await?;
    write_user(&mut conn, user).await
}

/// Look a user up by identity, registering them on first sight. Existing users
/// get their activity stamp refreshed and are raised to `role_hint` if their
/// stored role is lower.
pub async fn get_or_create_user(
    db: &Database,
    identity: &str,
    hints: &ProfileHints,
    role_hint: Option<Role>,
) -> anyhow::Result<User> {
    let now = now_unix_secs();

    if let Some(mut user) = fetch_user(db.pool(), identity).await? {
        user.last_activity = now;
        if !hints.display_name.is_empty() {
            user.display_name = hints.display_name.clone();
        }
        if let Some(role) = role_hint
            && role > user.role
        {
            info!(user = %identity, from = %user.role, to = %role, "raising user to configured role");
            user.role = role;
        }
        save_user(db, &mut user).await?;
        return Ok(user);
    }

    let now_i64 = i64::try_from(now).context("now out of i64 range")?;
    let role = role_hint.unwrap_or_default();

    sqlx::query(
        "INSERT INTO users (
            whatsapp_id, username, display_name, user_type,
            last_activity, registration_date, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?5)
         ON CONFLICT (whatsapp_id) DO NOTHING",
    )
    .bind(identity)
    .bind(&hints.username)
    .bind(&hints.display_name)
    .bind(role.as_str())
    .bind(now_i64)
    .execute(db.pool())
    .await?;

    let user = fetch_user(db.pool(), identity)
        .await?
        .with_context(|| format!("user {identity} missing after insert"))?;

    info!(user = %identity, name = %user.display_label(), role = %user.role, "registered new user");
    Ok(user)
}

/// Grant experience and return the resulting level.
pub async fn add_experience(
    db: &Database,
    identity: &str,
    points: u64,
    settings: &ProgressionSettings,
) -> anyhow::Result<u64> {
    let mut user = require_user(db, identity).await?;
    let before = user.level;
    let level = user.grant_experience(points, settings.level_up_threshold);
    save_user(db, &mut user).await?;

    if level > before {
        info!(user = %identity, level, "user levelled up");
    }
    Ok(level)
}

pub async fn add_diamonds(db: &Database, identity: &str, amount: u64) -> anyhow::Result<u64> {
    let mut user = require_user(db, identity).await?;
    let diamonds = user.grant_diamonds(amount);
    save_user(db, &mut user).await?;
    Ok(diamonds)
}

/// Count a successful command and grant its rewards in a single save.
pub async fn record_command_usage(
    db: &Database,
    identity: &str,
    settings: &ProgressionSettings,
) -> anyhow::Result<User> {
    let mut user = require_user(db, identity).await?;
    let before = user.level;

    user.total_commands_used = user.total_commands_used.saturating_add(1);
    user.grant_experience(settings.experience_per_command, settings.level_up_threshold);
    user.grant_diamonds(settings.diamonds_per_command);
    save_user(db, &mut user).await?;

    if user.level > before {
        info!(user = %identity, level = user.level, "user levelled up");
    }
    Ok(user)
}

#[derive(Clone, Debug)]
pub struct WarnResult {
    pub user: User,
    pub outcome: WarningOutcome,
}

pub async fn warn_user(
    db: &Database,
    actor: &User,
    identity: &str,
    reason: &str,
    max_warnings: u32,
) -> anyhow::Result<WarnResult> {
    let mut user = require_user(db, identity).await?;
    ensure_can_moderate(actor, &user)?;

    let outcome = user.apply_warning(max_warnings, now_unix_secs());
    if outcome.ignored {
        info!(user = %identity, by = %actor.identity, %reason, "warning on blocked user ignored");
        return Ok(WarnResult { user, outcome });
    }

    save_user(db, &mut user).await?;
    info!(
        user = %identity,
        by = %actor.identity,
        %reason,
        warnings = outcome.warnings,
        auto_blocked = outcome.auto_blocked,
        "user warned"
    );

    Ok(WarnResult { user, outcome })
}

pub async fn block_user(
    db: &Database,
    actor: &User,
    identity: &str,
    reason: &str,
) -> anyhow::Result<User> {
    let mut user = require_user(db, identity).await?;
    ensure_can_moderate(actor, &user)?;

    user.apply_block(reason, &actor.identity, now_unix_secs())?;
    save_user(db, &mut user).await?;

    info!(user = %identity, by = %actor.identity, %reason, "user blocked");
    Ok(user)
}

pub async fn unblock_user(db: &Database, actor: &User, identity: &str) -> anyhow::Result<User> {
    let mut user = require_user(db, identity).await?;
    ensure_can_moderate(actor, &user)?;

    user.apply_unblock()?;
    save_user(db, &mut user).await?;

    info!(user = %identity, by = %actor.identity, "user unblocked");
    Ok(user)
}

pub async fn promote_to_admin(db: &Database, actor: &User, identity: &str) -> anyhow::Result<User> {
    let mut user = require_user(db, identity).await?;
    if user.role >= Role::Admin {
        return Err(ModerationError::AlreadyPrivileged.into());
    }
    ensure_can_moderate(actor, &user)?;

    let now = now_unix_secs();
    let now_i64 = i64::try_from(now).context("now out of i64 range")?;
    user.role = Role::Admin;
    user.updated_at = now;

    let mut tx = db.pool().begin().await?;
    write_user(&mut tx, &user).await?;
    sqlx::query(
        "INSERT INTO admins (user_id, can_ban, can_warn, can_manage_groups, can_view_logs, appointed_by, appointed_at)
         VALUES (?, 0, 1, 0, 0, ?, ?)",
    )
    .bind(user.id)
    .bind(&actor.identity)
    .bind(now_i64)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(user = %identity, by = %actor.identity, "user promoted to admin");
    Ok(user)
}

pub async fn demote_from_admin(db: &Database, actor: &User, identity: &str) -> anyhow::Result<User> {
    let mut user = require_user(db, identity).await?;
    if user.role != Role::Admin {
        return Err(ModerationError::NotAdmin.into());
    }
    ensure_can_moderate(actor, &user)?;

    user.role = Role::User;
    user.updated_at = now_unix_secs();

    let mut tx = db.pool().begin().await?;
    write_user(&mut tx, &user).await?;
    sqlx::query("UPDATE admins SET is_active = 0 WHERE user_id = ?")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(user = %identity, by = %actor.identity, "admin demoted");
    Ok(user)
}

/// Users seen within the last `days`, most recent first.
pub async fn list_active_users(db: &Database, days: u64) -> anyhow::Result<Vec<User>> {
    let since = now_unix_secs().saturating_sub(days.saturating_mul(86_400));
    let since_i64 = i64::try_from(since).context("since out of i64 range")?;

    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE last_activity >= ? ORDER BY last_activity DESC"
    ))
    .bind(since_i64)
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(User::try_from).collect()
}

/// Plain users ranked by level, then experience.
pub async fn top_users_by_level(db: &Database, limit: u32) -> anyhow::Result<Vec<User>> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE user_type = 'user'
         ORDER BY level DESC, experience_points DESC
         LIMIT ?"
    ))
    .bind(i64::from(limit))
    .fetch_all(db.pool())
    .await?;

    rows.into_iter().map(User::try_from).collect()
}
