use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::warn;

/// Delete regular files in `dir` last modified more than `max_age` ago.
/// Names containing any `protected` fragment are skipped. A missing directory
/// counts as nothing to clean.
pub async fn remove_files_older_than(dir: &Path, max_age: Duration, protected: &[&str]) -> usize {
    match remove_aged_files(dir, max_age, protected).await {
        Ok(removed) => removed,
        Err(source) if source.kind() == io::ErrorKind::NotFound => 0,
        Err(source) => {
            warn!(?source, dir = %dir.display(), "failed to clean directory");
            0
        }
    }
}

async fn remove_aged_files(dir: &Path, max_age: Duration, protected: &[&str]) -> io::Result<usize> {
    let now = SystemTime::now();
    let mut removed = 0;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if protected.iter().any(|fragment| name.contains(fragment)) {
            continue;
        }

        let Some(metadata) = regular_file(&name, entry.metadata().await) else {
            continue;
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(source) => warn!(?source, file = %name, "failed to remove aged file"),
        }
    }

    Ok(removed)
}

/// Names of regular files in `dir` modified within `max_age`, sorted.
pub async fn recent_files(dir: &Path, max_age: Duration) -> io::Result<Vec<String>> {
    let now = SystemTime::now();
    let mut names = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(metadata) = regular_file(&name, entry.metadata().await) else {
            continue;
        };

        let fresh = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_none_or(|age| age <= max_age);
        if fresh {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Metadata of a regular file. Unreadable entries are logged and skipped.
fn regular_file(name: &str, metadata: io::Result<Metadata>) -> Option<Metadata> {
    match metadata {
        Ok(metadata) if metadata.is_file() => Some(metadata),
        Ok(_) => None,
        Err(source) => {
            warn!(?source, file = %name, "failed to read file metadata");
            None
        }
    }
}

/// Parse the resident set size out of `/proc/<pid>/status` content.
pub fn parse_vm_rss_bytes(status: &str) -> Option<u64> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let mut fields = line["VmRSS:".len()..].split_whitespace();
    let value = fields.next()?.parse::<u64>().ok()?;
    let multiplier = match fields.next() {
        Some("kB") | None => 1024,
        Some("mB") => 1024 * 1024,
        Some(_) => return None,
    };
    value.checked_mul(multiplier)
}

/// Resident memory of this process, where the platform exposes it.
pub fn resident_memory_bytes() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_rss_bytes(&status)
}
