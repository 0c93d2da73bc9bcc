//! Copies the checked files into a single destination folder.

use super::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Errors beyond this many are only counted in the summary.
const MAX_LISTED_ERRORS: usize = 10;

/// What to do when the destination already contains a file with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictPolicy {
    #[default]
    Skip,
    Overwrite,
    /// Writes `name (1).ext`, `name (2).ext`, ...
    KeepBoth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub file_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub destination: PathBuf,
    pub total: usize,
    pub copied: usize,
    pub skipped: usize,
    /// Source path and the reason it failed.
    pub errors: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}

impl ExportReport {
    /// A short human readable result message.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        if self.cancelled {
            lines.push(format!(
                "Export cancelled after {} of {} files.",
                self.copied + self.skipped + self.errors.len(),
                self.total
            ));
        }
        lines.push(format!(
            "Copied {} of {} files to {}.",
            self.copied,
            self.total,
            self.destination.display()
        ));
        if self.skipped > 0 {
            lines.push(format!("Skipped {} existing files.", self.skipped));
        }
        if !self.errors.is_empty() {
            lines.push("Failed:".to_string());
            for (path, reason) in self.errors.iter().take(MAX_LISTED_ERRORS) {
                lines.push(format!("  {}: {}", path.display(), reason));
            }
            if self.errors.len() > MAX_LISTED_ERRORS {
                lines.push(format!("... {} files failed in total", self.errors.len()));
            }
        }
        lines.join("\n")
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.errors.is_empty()
    }
}

pub struct Exporter;

impl Exporter {
    /// Copies `files` flat into `dest`.
    ///
    /// Per-file failures are collected in the report; only failing to create
    /// `dest` itself is an error. Cancellation stops before the next file.
    pub fn export<F>(
        files: &[PathBuf],
        dest: &Path,
        policy: ConflictPolicy,
        cancel: &AtomicBool,
        mut progress: F,
    ) -> CoreResult<ExportReport>
    where
        F: FnMut(ExportProgress),
    {
        fs::create_dir_all(dest).map_err(|e| CoreError::io(e, dest))?;
        tracing::info!(files = files.len(), dest = %dest.display(), ?policy, "Starting export");

        let mut report = ExportReport {
            destination: dest.to_path_buf(),
            total: files.len(),
            ..Default::default()
        };

        for (i, source) in files.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                tracing::info!("🛑 Export cancelled by user");
                report.cancelled = true;
                break;
            }

            let Some(file_name) = source.file_name() else {
                report.errors.push((source.clone(), "not a file".to_string()));
                continue;
            };
            progress(ExportProgress {
                current: i + 1,
                total: files.len(),
                file_name: file_name.to_string_lossy().to_string(),
            });

            let mut target = dest.join(file_name);
            if target.exists() {
                match policy {
                    ConflictPolicy::Skip => {
                        tracing::debug!(target = %target.display(), "Skipping existing file");
                        report.skipped += 1;
                        continue;
                    }
                    ConflictPolicy::Overwrite => {}
                    ConflictPolicy::KeepBoth => target = unique_target(&target),
                }
            }

            match copy_preserving_mtime(source, &target) {
                Ok(()) => report.copied += 1,
                Err(e) => {
                    tracing::warn!(source = %source.display(), "Failed to export file: {}", e);
                    report.errors.push((source.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            copied = report.copied,
            skipped = report.skipped,
            failed = report.errors.len(),
            "✅ Export finished"
        );
        Ok(report)
    }
}

fn copy_preserving_mtime(source: &Path, target: &Path) -> std::io::Result<()> {
    let modified = fs::metadata(source)?.modified()?;
    fs::copy(source, target)?;
    let file = fs::OpenOptions::new().write(true).open(target)?;
    file.set_modified(modified)
}

/// First free `stem (n).ext` next to `target`.
fn unique_target(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = target.parent().unwrap_or_else(|| Path::new(""));

    let mut n = 1;
    loop {
        let candidate = parent.join(format!("{stem} ({n}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn source_files(dir: &Path) -> Vec<PathBuf> {
        let a = dir.join("src/a/spec.pdf");
        let b = dir.join("src/b/drawing.pdf");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, "spec").unwrap();
        fs::write(&b, "drawing").unwrap();
        vec![a, b]
    }

    #[test]
    fn test_export_copies_flat_and_creates_destination() {
        let dir = tempfile::tempdir().unwrap();
        let files = source_files(dir.path());
        let dest = dir.path().join("out/nested");

        let mut seen = Vec::new();
        let report = Exporter::export(
            &files,
            &dest,
            ConflictPolicy::Skip,
            &AtomicBool::new(false),
            |p| seen.push(p.current),
        )
        .unwrap();

        assert_eq!(report.copied, 2);
        assert!(report.is_success());
        assert_eq!(fs::read_to_string(dest.join("spec.pdf")).unwrap(), "spec");
        assert!(dest.join("drawing.pdf").exists());
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn test_export_preserves_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let files = source_files(dir.path());
        let old = SystemTime::now() - Duration::from_secs(30 * 24 * 3600);
        fs::OpenOptions::new()
            .write(true)
            .open(&files[0])
            .unwrap()
            .set_modified(old)
            .unwrap();

        let dest = dir.path().join("out");
        Exporter::export(&files, &dest, ConflictPolicy::Skip, &AtomicBool::new(false), |_| {}).unwrap();

        let copied = fs::metadata(dest.join("spec.pdf")).unwrap().modified().unwrap();
        let diff = copied
            .duration_since(old)
            .unwrap_or_else(|e| e.duration());
        assert!(diff < Duration::from_secs(2));
    }

    #[test]
    fn test_conflict_policies() {
        let dir = tempfile::tempdir().unwrap();
        let files = source_files(dir.path());
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("spec.pdf"), "existing").unwrap();

        let cancel = AtomicBool::new(false);
        let report = Exporter::export(&files, &dest, ConflictPolicy::Skip, &cancel, |_| {}).unwrap();
        assert_eq!((report.copied, report.skipped), (1, 1));
        assert_eq!(fs::read_to_string(dest.join("spec.pdf")).unwrap(), "existing");

        let report = Exporter::export(&files[..1], &dest, ConflictPolicy::KeepBoth, &cancel, |_| {}).unwrap();
        assert_eq!(report.copied, 1);
        assert_eq!(fs::read_to_string(dest.join("spec (1).pdf")).unwrap(), "spec");

        Exporter::export(&files[..1], &dest, ConflictPolicy::KeepBoth, &cancel, |_| {}).unwrap();
        assert!(dest.join("spec (2).pdf").exists());

        Exporter::export(&files[..1], &dest, ConflictPolicy::Overwrite, &cancel, |_| {}).unwrap();
        assert_eq!(fs::read_to_string(dest.join("spec.pdf")).unwrap(), "spec");
    }

    #[test]
    fn test_missing_source_is_collected_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = source_files(dir.path());
        files.insert(0, dir.path().join("vanished.pdf"));

        let report = Exporter::export(
            &files,
            &dir.path().join("out"),
            ConflictPolicy::Skip,
            &AtomicBool::new(false),
            |_| {},
        )
        .unwrap();

        assert_eq!(report.copied, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(!report.is_success());
        assert!(report.summary().contains("vanished.pdf"));
    }

    #[test]
    fn test_cancelled_export_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let files = source_files(dir.path());
        let cancel = AtomicBool::new(false);

        let report = Exporter::export(&files, &dir.path().join("out"), ConflictPolicy::Skip, &cancel, |_| {
            cancel.store(true, Ordering::Relaxed);
        })
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.copied, 1);
        assert!(report.summary().starts_with("Export cancelled"));
    }

    #[test]
    fn test_summary_truncates_error_list() {
        let report = ExportReport {
            destination: PathBuf::from("/out"),
            total: 12,
            errors: (0..12)
                .map(|i| (PathBuf::from(format!("/in/{i}.pdf")), "denied".to_string()))
                .collect(),
            ..Default::default()
        };

        let summary = report.summary();
        assert_eq!(summary.matches("denied").count(), 10);
        assert!(summary.ends_with("... 12 files failed in total"));
    }

    #[test]
    fn test_conflict_policy_serialization() {
        assert_eq!(
            serde_json::to_string(&ConflictPolicy::KeepBoth).unwrap(),
            "\"keepBoth\""
        );
    }
}
