use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata record for a single VOD archive job.
///
/// Written wholesale to `vod.json` inside the store directory so an
/// interrupted job can be resumed. Everything except the `live` flag is set
/// before downloading begins; the pipeline only ever flips `live` once the
/// recording has finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VodRecord {
    /// Numeric VOD id assigned by the origin platform.
    pub id: u64,
    /// Id of the user who owns the VOD.
    pub user_id: u64,
    /// Timestamp the VOD was created at.
    pub created_at: DateTime<Utc>,
    /// Expected VOD length in seconds, as reported by the origin.
    pub duration: u64,
    /// Directory holding the downloaded parts and produced artifacts.
    pub store_directory: PathBuf,
    /// Whether the VOD is still being recorded.
    #[serde(default)]
    pub live: bool,
}

impl VodRecord {
    /// Directory the downloader writes numbered segments into.
    pub fn parts_dir(&self) -> PathBuf {
        self.store_directory.join("parts")
    }

    /// Merged transport stream produced by the merger.
    pub fn merged_path(&self) -> PathBuf {
        self.store_directory.join("merged.ts")
    }

    /// Final container file produced by the converter.
    pub fn converted_path(&self) -> PathBuf {
        self.store_directory.join("vod.mp4")
    }

    /// Persisted metadata record.
    pub fn metadata_path(&self) -> PathBuf {
        self.store_directory.join("vod.json")
    }

    /// Persist the record to `vod.json`, replacing any previous copy.
    pub fn save(&self) -> Result<()> {
        let path = self.metadata_path();
        let json = serde_json::to_string(self).context("Failed to serialize VOD record")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write VOD record: {}", path.display()))?;
        Ok(())
    }

    /// Load a previously saved record from a store directory, if one exists.
    pub fn load(store_directory: &Path) -> Result<Option<VodRecord>> {
        let path = store_directory.join("vod.json");
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read VOD record: {}", path.display()))?;
        let record: VodRecord = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse VOD record: {}", path.display()))?;

        Ok(Some(record))
    }

    /// Directory name for the finished archive, built from the creation date
    /// and the sanitized VOD title.
    pub fn archive_dir_name(&self, title: &str) -> String {
        format!(
            "{} - {}",
            sanitize_date(&self.created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            sanitize_text(title)
        )
    }
}

/// Seconds elapsed between a given timestamp and now.
pub fn time_since(timestamp: DateTime<Utc>) -> i64 {
    Utc::now().timestamp() - timestamp.timestamp()
}

/// Replace characters which aren't allowed in directory or file names.
pub fn sanitize_text(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | ',' | '_' | '-' | '(' | ')' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Flatten an RFC3339 timestamp into a form usable in file names.
pub fn sanitize_date(date: &str) -> String {
    date.replace('T', "_").replace(':', "-").replace('Z', "")
}
