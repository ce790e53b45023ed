use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

/// The kinds of file a backup run produces. Retention is applied to each kind
/// independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackupArtifact {
    Database,
    Configs,
    Logs,
    Info,
}

impl BackupArtifact {
    pub const ALL: [BackupArtifact; 4] = [
        BackupArtifact::Database,
        BackupArtifact::Configs,
        BackupArtifact::Logs,
        BackupArtifact::Info,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            BackupArtifact::Database => "shadow-db-",
            BackupArtifact::Configs => "shadow-configs-",
            BackupArtifact::Logs => "shadow-logs-",
            BackupArtifact::Info => "shadow-backup-info-",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            BackupArtifact::Database => "db",
            _ => "json",
        }
    }

    pub fn file_name(self, timestamp: &str) -> String {
        format!("{}{}.{}", self.prefix(), timestamp, self.extension())
    }

    /// Recognise a backup file by its name.
    pub fn classify(file_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|artifact| file_name.starts_with(artifact.prefix()))
    }
}

/// Create `dir` (and parents) if it does not exist yet.
pub async fn ensure_dir(dir: &Path) -> io::Result<()> {
    if tokio::fs::try_exists(dir).await? {
        return Ok(());
    }

    tokio::fs::create_dir_all(dir).await?;
    info!(dir = %dir.display(), "created directory");
    Ok(())
}

/// Keep the `keep` newest files of every artifact kind in `dir` and delete the
/// rest. Returns the deleted paths. Files that are not backups are left alone.
pub async fn prune_backups(dir: &Path, keep: usize) -> io::Result<Vec<PathBuf>> {
    let mut groups: HashMap<BackupArtifact, Vec<(SystemTime, PathBuf)>> = HashMap::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(artifact) = BackupArtifact::classify(&file_name.to_string_lossy()) else {
            continue;
        };

        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        groups
            .entry(artifact)
            .or_default()
            .push((modified, entry.path()));
    }

    let mut deleted = Vec::new();
    for (artifact, mut files) in groups {
        if files.len() <= keep {
            continue;
        }

        // Newest first; names embed the timestamp so they break mtime ties.
        files.sort_by(|left, right| right.0.cmp(&left.0).then_with(|| right.1.cmp(&left.1)));

        for (_, path) in files.into_iter().skip(keep) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    info!(?artifact, path = %path.display(), "removed old backup");
                    deleted.push(path);
                }
                Err(source) => {
                    warn!(?source, path = %path.display(), "failed to remove old backup");
                }
            }
        }
    }

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    use super::{BackupArtifact, ensure_dir, prune_backups};

    fn touch(dir: &std::path::Path, name: &str, age_secs: u64) {
        let file = File::create(dir.join(name)).unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
            .unwrap();
    }

    #[test]
    fn classifies_by_prefix() {
        assert_eq!(
            BackupArtifact::classify("shadow-db-2024-01-01T00-00-00.db"),
            Some(BackupArtifact::Database)
        );
        assert_eq!(
            BackupArtifact::classify("shadow-backup-info-x.json"),
            Some(BackupArtifact::Info)
        );
        assert_eq!(BackupArtifact::classify("notes.txt"), None);
        assert_eq!(
            BackupArtifact::Configs.file_name("ts"),
            "shadow-configs-ts.json"
        );
    }

    #[tokio::test]
    async fn prunes_each_artifact_group_independently() {
        let dir = tempfile::tempdir().unwrap();
        for (index, age) in [500_u64, 400, 300, 200, 100].into_iter().enumerate() {
            touch(dir.path(), &format!("shadow-db-{index}.db"), age);
        }
        touch(dir.path(), "shadow-configs-a.json", 1_000);
        touch(dir.path(), "shadow-configs-b.json", 10);
        touch(dir.path(), "unrelated.txt", 9_999);

        let deleted = prune_backups(dir.path(), 2).await.unwrap();
        assert_eq!(deleted.len(), 3);

        let mut remaining: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                "shadow-configs-a.json",
                "shadow-configs-b.json",
                "shadow-db-3.db",
                "shadow-db-4.db",
                "unrelated.txt",
            ]
        );
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).await.unwrap();
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
