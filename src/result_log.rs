//! Append-only Markdown log of run results

use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry stamped with the current UTC time
    pub fn append(&self, color: &str, summary: &str) -> bool {
        self.append_at(Utc::now(), color, summary)
    }

    /// Append an entry. I/O errors are logged and reported as `false`.
    pub fn append_at(&self, at: DateTime<Utc>, color: &str, summary: &str) -> bool {
        match self.write_entry(&format_entry(at, color, summary)) {
            Ok(()) => {
                info!("Log entry appended to {}", self.path.display());
                true
            }
            Err(e) => {
                error!("Error appending to log file {}: {}", self.path.display(), e);
                false
            }
        }
    }

    fn write_entry(&self, entry: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())
    }
}

pub fn format_entry(at: DateTime<Utc>, color: &str, summary: &str) -> String {
    format!(
        "\n---\n**Timestamp:** {}\n**Color:** {}\n**Summary:**\n```\n{}\n```\n",
        at.format("%Y-%m-%d %H:%M:%S UTC"),
        color,
        summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_format() {
        let at = Utc.with_ymd_and_hms(2025, 4, 23, 14, 30, 0).unwrap();
        assert_eq!(
            format_entry(at, "blue", "Blue is testing today."),
            "\n---\n**Timestamp:** 2025-04-23 14:30:00 UTC\n**Color:** blue\n**Summary:**\n```\nBlue is testing today.\n```\n"
        );
    }

    #[test]
    fn test_entries_accumulate() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = ResultLog::new(dir.path().join("logs").join("hotline_log.md"));
        let at = Utc.with_ymd_and_hms(2025, 4, 23, 14, 30, 0).unwrap();

        assert!(log.append_at(at, "blue", "first"));
        assert!(log.append_at(at, "error_api", "second"));

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.matches("**Timestamp:**").count(), 2);
        assert!(contents.find("first").unwrap() < contents.find("second").unwrap());
    }

    #[test]
    fn test_unwritable_path_reports_false() {
        let dir = tempfile::TempDir::new().unwrap();
        // the log path is an existing directory
        let log = ResultLog::new(dir.path());
        assert!(!log.append("blue", "x"));
    }
}
