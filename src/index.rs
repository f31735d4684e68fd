use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::parser::tracks::fold_key;

pub const INDEX_VERSION: u32 = 1;

/// One scheduled week of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub category: String,
    pub class_letter: String,
    pub group: String,
    pub series: String,
    pub week: u32,
    pub week_start: NaiveDate,
    pub track: String,
    pub cars: String,
    /// The series' `Races ...` sentence, verbatim.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleIndex {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,
    pub tracks: Vec<String>,
    pub records: Vec<ScheduleRecord>,
}

impl ScheduleIndex {
    pub fn new(records: Vec<ScheduleRecord>, tracks: Vec<String>) -> Self {
        ScheduleIndex {
            version: INDEX_VERSION,
            source_file: None,
            source_digest: None,
            tracks,
            records,
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read index {}", path.display()))?;
        let index: ScheduleIndex = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to decode index {}", path.display()))?;
        if index.version != INDEX_VERSION {
            anyhow::bail!(
                "Index {} has version {}, expected {}",
                path.display(),
                index.version,
                INDEX_VERSION
            );
        }
        Ok(index)
    }

    pub fn write(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Records whose track contains `query`, ignoring case and diacritics.
    pub fn find_by_track(&self, query: &str) -> Vec<&ScheduleRecord> {
        let q = fold_key(query.trim());
        if q.is_empty() {
            return Vec::new();
        }
        self.records
            .iter()
            .filter(|r| fold_key(&r.track).contains(&q))
            .collect()
    }
}

/// Lowercase hex SHA-256 of a file's bytes.
pub fn source_digest(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(digest_hex(&bytes))
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
