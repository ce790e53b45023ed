use std::path::PathBuf;
use std::time::Duration;

use shadow_database::cache::RateLimitPolicy;
use shadow_database::model::{
    rate_limit::RateLimitSettings, settings::ProgressionSettings, users::Role,
};
use shadow_utils::env::{EnvReader, process_env};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathsConfig {
    pub db_path: PathBuf,
    pub backup_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub session_dir: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupConfig {
    pub enabled: bool,
    pub interval: Duration,
    pub max_files: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhatsAppConfig {
    pub bridge_url: String,
    pub poll_timeout: Duration,
    pub phone_number: Option<String>,
    pub pairing_code: bool,
    pub reconnect_max_attempts: u32,
    pub reconnect_delay: Duration,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PermissionsConfig {
    pub developers: Vec<String>,
    pub admins: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryConfig {
    pub threshold_bytes: u64,
    pub check_interval: Duration,
}

/// Process configuration, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotConfig {
    pub name: String,
    pub version: String,
    pub environment: String,
    pub log_level: String,
    pub paths: PathsConfig,
    pub backup: BackupConfig,
    pub rate_limits: RateLimitSettings,
    pub whatsapp: WhatsAppConfig,
    pub permissions: PermissionsConfig,
    pub welcome_message: bool,
    /// Progression values; an operator-set `bot_settings` row takes precedence.
    pub progression: ProgressionSettings,
    pub memory: MemoryConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self::from_reader(&EnvReader::new(|_: &str| None))
    }
}

fn policy<F>(reader: &EnvReader<F>, prefix: &str, defaults: RateLimitPolicy) -> RateLimitPolicy
where
    F: Fn(&str) -> Option<String>,
{
    let max_hits = reader.env_u64(&format!("{prefix}_MAX"), u64::from(defaults.max_hits));
    let window_secs = reader.env_u64(&format!("{prefix}_WINDOW_SECONDS"), defaults.window.as_secs());

    RateLimitPolicy {
        max_hits: u32::try_from(max_hits).unwrap_or(u32::MAX),
        window: Duration::from_secs(window_secs),
        block: defaults.block,
    }
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_reader(&process_env())
    }

    pub fn from_reader<F>(reader: &EnvReader<F>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let progression_defaults = ProgressionSettings::default();
        let rate_defaults = RateLimitSettings::default();
        let backup_enabled =
            reader.env_bool("BACKUP_ENABLED", false) || reader.env_bool("AUTO_BACKUP", false);

        Self {
            name: reader.env_string("BOT_NAME", "شادو"),
            version: reader.env_string("BOT_VERSION", "1.0.0"),
            environment: reader.env_string("BOT_ENV", "development"),
            log_level: reader.env_string("LOG_LEVEL", "info").to_ascii_lowercase(),
            paths: PathsConfig {
                db_path: reader.env_string("DB_PATH", "data/shadow.db").into(),
                backup_dir: reader.env_string("BACKUP_DIR", "backups").into(),
                logs_dir: reader.env_string("LOGS_DIR", "logs").into(),
                temp_dir: reader.env_string("TEMP_DIR", "temp").into(),
                session_dir: reader.env_string("SESSION_DIR", "session").into(),
            },
            backup: BackupConfig {
                enabled: backup_enabled,
                interval: Duration::from_secs(
                    reader.env_u64("BACKUP_INTERVAL_HOURS", 24).saturating_mul(3600),
                ),
                max_files: usize::try_from(reader.env_u64("MAX_BACKUP_FILES", 7)).unwrap_or(7),
            },
            rate_limits: RateLimitSettings {
                command: policy(reader, "RATE_LIMIT", rate_defaults.command),
                heavy: policy(reader, "HEAVY_RATE_LIMIT", rate_defaults.heavy),
                message: policy(reader, "MESSAGE_RATE_LIMIT", rate_defaults.message),
            },
            whatsapp: WhatsAppConfig {
                bridge_url: reader.env_string("WHATSAPP_BRIDGE_URL", "http://127.0.0.1:3001"),
                poll_timeout: Duration::from_secs(
                    reader.env_u64("WHATSAPP_POLL_TIMEOUT_SECONDS", 30),
                ),
                phone_number: reader
                    .env_optional("PHONE_NUMBER")
                    .and_then(|raw| shadow_utils::parse::normalize_phone_number(&raw)),
                pairing_code: reader.env_bool("PAIRING_CODE", false),
                reconnect_max_attempts: u32::try_from(reader.env_u64("RECONNECT_MAX_ATTEMPTS", 5))
                    .unwrap_or(5),
                reconnect_delay: Duration::from_secs(reader.env_u64("RECONNECT_DELAY_SECONDS", 5)),
            },
            permissions: PermissionsConfig {
                developers: normalized_numbers(reader.env_list("DEVELOPER_NUMBERS")),
                admins: normalized_numbers(reader.env_list("ADMIN_NUMBERS")),
            },
            welcome_message: reader.env_bool("WELCOME_MESSAGE", false),
            progression: ProgressionSettings {
                level_up_threshold: reader
                    .env_u64("LEVEL_UP_THRESHOLD", progression_defaults.level_up_threshold),
                max_warnings: u32::try_from(
                    reader.env_u64("MAX_WARNINGS", u64::from(progression_defaults.max_warnings)),
                )
                .unwrap_or(progression_defaults.max_warnings),
                experience_per_command: reader
                    .env_u64("XP_PER_COMMAND", progression_defaults.experience_per_command),
                diamonds_per_command: reader
                    .env_u64("DIAMONDS_PER_COMMAND", progression_defaults.diamonds_per_command),
            },
            memory: MemoryConfig {
                threshold_bytes: reader
                    .env_u64("MEMORY_THRESHOLD_MB", 500)
                    .saturating_mul(1024 * 1024),
                check_interval: Duration::from_secs(
                    reader
                        .env_u64("MEMORY_CHECK_INTERVAL_MINUTES", 30)
                        .saturating_mul(60),
                ),
            },
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("BOT_NAME");
        }
        if self.paths.db_path.as_os_str().is_empty() {
            missing.push("DB_PATH");
        }
        if !missing.is_empty() {
            anyhow::bail!("missing required settings: {}", missing.join(", "));
        }

        if self.progression.level_up_threshold == 0 {
            anyhow::bail!("LEVEL_UP_THRESHOLD must be positive");
        }
        if self.progression.max_warnings == 0 {
            anyhow::bail!("MAX_WARNINGS must be positive");
        }
        for (key, policy) in [
            ("RATE_LIMIT", self.rate_limits.command),
            ("HEAVY_RATE_LIMIT", self.rate_limits.heavy),
            ("MESSAGE_RATE_LIMIT", self.rate_limits.message),
        ] {
            if policy.max_hits == 0 || policy.window.is_zero() {
                anyhow::bail!("{key}_MAX and {key}_WINDOW_SECONDS must be positive");
            }
        }
        if self.backup.enabled && (self.backup.interval.is_zero() || self.backup.max_files == 0) {
            anyhow::bail!("BACKUP_INTERVAL_HOURS and MAX_BACKUP_FILES must be positive");
        }
        if self.memory.check_interval.is_zero() {
            anyhow::bail!("MEMORY_CHECK_INTERVAL_MINUTES must be positive");
        }
        if self.whatsapp.pairing_code && self.whatsapp.phone_number.is_none() {
            anyhow::bail!("PAIRING_CODE=true requires PHONE_NUMBER");
        }

        Ok(())
    }

    /// Role configured for `identity` through the permission lists.
    pub fn role_hint(&self, identity: &str) -> Option<Role> {
        if self.permissions.developers.iter().any(|number| number == identity) {
            Some(Role::Developer)
        } else if self.permissions.admins.iter().any(|number| number == identity) {
            Some(Role::Admin)
        } else {
            None
        }
    }

    /// Feature names shown in status output and backup snapshots.
    pub fn enabled_features(&self) -> Vec<&'static str> {
        let mut features = Vec::new();
        if self.backup.enabled {
            features.push("auto_backup");
        }
        if self.welcome_message {
            features.push("welcome_message");
        }
        if self.whatsapp.pairing_code {
            features.push("pairing_code");
        }
        features
    }
}

fn normalized_numbers(raw: Vec<String>) -> Vec<String> {
    raw.iter()
        .filter_map(|number| shadow_utils::parse::normalize_phone_number(number))
        .collect()
}
