use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use avlindex_core::{AuditEntry, AuditSink};
use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;

/// Appends one line per engine event to a log file and mirrors it to `tracing`.
pub struct FileAudit {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAudit {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAudit {
    fn record(&self, entry: &AuditEntry) -> avlindex_core::Result<()> {
        let line = format_line(Local::now().naive_local(), entry);
        tracing::info!(target: "avlindex::audit", "{line}");
        let mut file = self.file.lock();
        writeln!(file, "{line}")?;
        file.flush()?;
        Ok(())
    }
}

/// `[yyyy-mm-dd HH:MM:SS] [ACTION] [subject] -> detail`
pub fn format_line(at: NaiveDateTime, entry: &AuditEntry) -> String {
    format!(
        "[{}] [{}] [{}] -> {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        entry.action,
        entry.subject,
        entry.detail
    )
}

#[cfg(test)]
mod tests {
    use avlindex_core::AuditAction;
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn line_layout() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 0)
            .unwrap();
        let entry = AuditEntry::new(AuditAction::Remove, "[ID: 061002234243] Le Van Cuong", "removed");
        assert_eq!(
            format_line(at, &entry),
            "[2024-03-09 07:05:00] [REMOVE] [[ID: 061002234243] Le Van Cuong] -> removed"
        );
    }
}
