use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;
use serde_json::{Value, json};
use shadow_core::{BackupSummary, BotConfig, Data};
use shadow_database::cache::RateLimitPolicy;
use shadow_database::impls::stats::general_stats;
use shadow_utils::backup::{BackupArtifact, ensure_dir, prune_backups};
use shadow_utils::housekeeping::recent_files;
use shadow_utils::time::{file_timestamp, now_unix_secs};
use tracing::info;

const LOG_MANIFEST_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Snapshot the database and write the config, log and info manifests, then
/// prune every artifact kind to the configured retention.
pub async fn create_backup(data: &Data) -> anyhow::Result<BackupSummary> {
    let config = &data.config;
    let dir = config.paths.backup_dir.as_path();
    ensure_dir(dir)
        .await
        .with_context(|| format!("failed to create backup dir {}", dir.display()))?;

    let now = Utc::now();
    let stamp = file_timestamp(now);
    let created_at = now.to_rfc3339();
    let mut files = Vec::new();

    let db_file = BackupArtifact::Database.file_name(&stamp);
    data.db.snapshot_to(&dir.join(&db_file)).await?;
    files.push(db_file);

    let configs = config_snapshot(config, &created_at);
    files.push(write_json(dir, BackupArtifact::Configs, &stamp, &configs).await?);

    let log_files = match recent_files(&config.paths.logs_dir, LOG_MANIFEST_WINDOW).await {
        Ok(names) => names,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(source) => return Err(source).context("failed to list log files"),
    };
    let logs = json!({
        "created_at": created_at,
        "logs_dir": config.paths.logs_dir.display().to_string(),
        "files": log_files,
    });
    files.push(write_json(dir, BackupArtifact::Logs, &stamp, &logs).await?);

    let stats = general_stats(&data.db, now_unix_secs()).await?;
    let info_name = BackupArtifact::Info.file_name(&stamp);
    let mut listed = files.clone();
    listed.push(info_name);
    let backup_info = json!({
        "created_at": created_at,
        "version": config.version,
        "environment": config.environment,
        "files": listed,
        "stats": stats,
    });
    files.push(write_json(dir, BackupArtifact::Info, &stamp, &backup_info).await?);

    let pruned = prune_backups(dir, config.backup.max_files)
        .await
        .context("failed to prune old backups")?
        .len();

    info!(dir = %dir.display(), files = files.len(), pruned, "backup written");

    Ok(BackupSummary {
        finished_at: now_unix_secs(),
        files,
        pruned,
    })
}

fn config_snapshot(config: &BotConfig, created_at: &str) -> Value {
    fn limit(policy: RateLimitPolicy) -> Value {
        json!({
            "max": policy.max_hits,
            "window_seconds": policy.window.as_secs(),
            "block_seconds": policy.block.as_secs(),
        })
    }

    json!({
        "created_at": created_at,
        "name": config.name,
        "version": config.version,
        "environment": config.environment,
        "features": config.enabled_features(),
        "rate_limits": {
            "command": limit(config.rate_limits.command),
            "heavy": limit(config.rate_limits.heavy),
            "message": limit(config.rate_limits.message),
        },
    })
}

async fn write_json(
    dir: &Path,
    artifact: BackupArtifact,
    stamp: &str,
    value: &Value,
) -> anyhow::Result<String> {
    let name = artifact.file_name(stamp);
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(dir.join(&name), body)
        .await
        .with_context(|| format!("failed to write {name}"))?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};

    use shadow_core::{BotConfig, Data};
    use shadow_database::Database;
    use shadow_utils::backup::BackupArtifact;
    use shadow_whatsapp::mock::RecordingTransport;

    use super::create_backup;

    async fn data_in(root: &std::path::Path, max_files: usize) -> Data {
        let mut config = BotConfig::default();
        config.paths.db_path = root.join("data").join("shadow.db");
        config.paths.backup_dir = root.join("backups");
        config.paths.logs_dir = root.join("logs");
        config.backup.max_files = max_files;

        let db = Database::connect(&config.paths.db_path).await.unwrap();
        let progression = config.progression;
        Data::new(
            db,
            Arc::new(RecordingTransport::new()),
            Arc::new(config),
            progression,
        )
    }

    #[tokio::test]
    async fn writes_every_artifact() {
        let root = tempfile::tempdir().unwrap();
        let data = data_in(root.path(), 7).await;
        std::fs::create_dir_all(root.path().join("logs")).unwrap();
        File::create(root.path().join("logs").join("bot.log")).unwrap();

        let summary = create_backup(&data).await.unwrap();

        assert_eq!(summary.files.len(), 4);
        assert_eq!(summary.pruned, 0);
        for (file, artifact) in summary.files.iter().zip(BackupArtifact::ALL) {
            assert_eq!(BackupArtifact::classify(file), Some(artifact));
            assert!(root.path().join("backups").join(file).exists());
        }

        let logs_manifest = std::fs::read_to_string(root.path().join("backups").join(&summary.files[2]))
            .unwrap();
        assert!(logs_manifest.contains("bot.log"));

        let info: serde_json::Value = serde_json::from_slice(
            &std::fs::read(root.path().join("backups").join(&summary.files[3])).unwrap(),
        )
        .unwrap();
        assert_eq!(info["files"].as_array().unwrap().len(), 4);
        assert_eq!(info["stats"]["total_users"], 0);
    }

    #[tokio::test]
    async fn prunes_old_artifacts_per_kind() {
        let root = tempfile::tempdir().unwrap();
        let data = data_in(root.path(), 1).await;
        let backups = root.path().join("backups");
        std::fs::create_dir_all(&backups).unwrap();
        for name in [
            "shadow-db-2020-01-01T00-00-00.db",
            "shadow-configs-2020-01-01T00-00-00.json",
        ] {
            let file = File::create(backups.join(name)).unwrap();
            file.set_modified(SystemTime::now() - Duration::from_secs(3600))
                .unwrap();
        }

        let summary = create_backup(&data).await.unwrap();

        assert_eq!(summary.pruned, 2);
        assert!(!backups.join("shadow-db-2020-01-01T00-00-00.db").exists());
        assert!(backups.join(&summary.files[0]).exists());
    }
}
