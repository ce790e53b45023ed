use tracing::warn;

use crate::{
    database::Database,
    model::settings::{
        DIAMONDS_PER_COMMAND_KEY, EXPERIENCE_PER_COMMAND_KEY, LEVEL_UP_THRESHOLD_KEY,
        MAX_WARNINGS_KEY, ProgressionSettings,
    },
};

pub async fn get_setting(db: &Database, key: &str) -> anyhow::Result<Option<String>> {
    let value = sqlx::query_scalar("SELECT setting_value FROM bot_settings WHERE setting_key = ?")
        .bind(key)
        .fetch_optional(db.pool())
        .await?;

    Ok(value)
}

pub async fn set_setting(db: &Database, key: &str, value: &str) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO bot_settings (setting_key, setting_value) VALUES (?, ?)
         ON CONFLICT (setting_key) DO UPDATE SET setting_value = excluded.setting_value",
    )
    .bind(key)
    .bind(value)
    .execute(db.pool())
    .await?;

    Ok(())
}

async fn positive_setting(db: &Database, key: &str, default: u64) -> anyhow::Result<u64> {
    let Some(raw) = get_setting(db, key).await? else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => {
            warn!(setting = key, value = %raw, default, "ignoring invalid setting");
            Ok(default)
        }
    }
}

/// Overlay operator-set `bot_settings` rows on top of the configured `defaults`.
pub async fn load_progression_settings(
    db: &Database,
    defaults: ProgressionSettings,
) -> anyhow::Result<ProgressionSettings> {
    let max_warnings = positive_setting(db, MAX_WARNINGS_KEY, u64::from(defaults.max_warnings)).await?;

    Ok(ProgressionSettings {
        level_up_threshold: positive_setting(db, LEVEL_UP_THRESHOLD_KEY, defaults.level_up_threshold)
            .await?,
        max_warnings: u32::try_from(max_warnings).unwrap_or(defaults.max_warnings),
        experience_per_command: positive_setting(
            db,
            EXPERIENCE_PER_COMMAND_KEY,
            defaults.experience_per_command,
        )
        .await?,
        diamonds_per_command: positive_setting(
            db,
            DIAMONDS_PER_COMMAND_KEY,
            defaults.diamonds_per_command,
        )
        .await?,
    })
}
