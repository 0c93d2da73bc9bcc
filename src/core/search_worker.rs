//! The background search: walks the chosen root folders, applies the
//! composite filter per file and streams matches back in batches.

use super::walk::{build_walker, classify, is_file_entry};
use super::{CoreError, CoreResult, FileEntry, SearchFilter};
use ignore::Walk;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const DEFAULT_RESULT_BATCH_SIZE: usize = 50; // Matches per `Matches` event
const DEFAULT_PROGRESS_INTERVAL: usize = 100; // Files between `Progress` events

/// Messages emitted while a search is running.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// The counting pass finished; `total` regular files will be examined.
    Started { total: usize },
    /// Periodic progress of the matching pass.
    Progress { processed: usize, total: usize },
    /// A batch of newly found matches, in walk order.
    Matches(Vec<FileEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchSummary {
    pub processed: usize,
    pub matched: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub result_batch_size: usize,
    pub progress_interval: usize,
    /// Gitignore-style patterns for files and folders that are never searched.
    pub exclude_patterns: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            result_batch_size: DEFAULT_RESULT_BATCH_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Walks a set of root folders and reports files matching a `SearchFilter`.
///
/// The worker is synchronous; callers run it on a blocking thread and share
/// an `AtomicBool` with it for cooperative cancellation.
pub struct SearchWorker {
    roots: Vec<PathBuf>,
    filter: SearchFilter,
    options: SearchOptions,
}

impl SearchWorker {
    pub fn new(roots: Vec<PathBuf>, filter: &SearchFilter, options: SearchOptions) -> Self {
        Self {
            roots,
            filter: filter.normalized(),
            options,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Counts the regular files below all roots (first pass, used for progress).
    ///
    /// Roots are counted in parallel; the first error (including cancellation) wins.
    pub fn count_files(&self, cancel: &AtomicBool) -> CoreResult<usize> {
        self.roots
            .par_iter()
            .map(|root| self.count_root(root, cancel))
            .try_reduce(|| 0, |a, b| Ok(a + b))
    }

    fn count_root(&self, root: &Path, cancel: &AtomicBool) -> CoreResult<usize> {
        let mut count = 0;
        for result in self.walker(root) {
            if cancel.load(Ordering::Relaxed) {
                return Err(CoreError::Cancelled);
            }
            if result.is_ok_and(|entry| is_file_entry(&entry)) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Runs the search, feeding `sink` with events until done or cancelled.
    ///
    /// After cancellation is observed no further events are emitted and
    /// `CoreError::Cancelled` is returned.
    pub fn run<F>(&self, cancel: &AtomicBool, mut sink: F) -> CoreResult<SearchSummary>
    where
        F: FnMut(SearchEvent),
    {
        let total = self.count_files(cancel)?;
        tracing::info!(roots = self.roots.len(), total, "🔎 Search started");
        sink(SearchEvent::Started { total });

        let batch_size = self.options.result_batch_size.max(1);
        let progress_interval = self.options.progress_interval.max(1);
        let mut summary = SearchSummary {
            total,
            ..Default::default()
        };
        let mut batch = Vec::with_capacity(batch_size);

        for root in &self.roots {
            if cancel.load(Ordering::Relaxed) {
                return Err(CoreError::Cancelled);
            }

            for result in self.walker(root) {
                if cancel.load(Ordering::Relaxed) {
                    tracing::info!(processed = summary.processed, "🛑 Search cancelled");
                    return Err(CoreError::Cancelled);
                }

                let entry = match result {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                if !is_file_entry(&entry) {
                    continue;
                }

                let (_, metadata) = classify(&entry);
                let file = FileEntry::new(entry.path(), metadata.as_ref());
                summary.processed += 1;

                if self.filter.matches(&file) {
                    summary.matched += 1;
                    batch.push(file);
                    if batch.len() >= batch_size {
                        sink(SearchEvent::Matches(std::mem::take(&mut batch)));
                    }
                }

                if summary.processed % progress_interval == 0 {
                    sink(SearchEvent::Progress {
                        processed: summary.processed,
                        total,
                    });
                }
            }
        }

        if cancel.load(Ordering::Relaxed) {
            return Err(CoreError::Cancelled);
        }
        if !batch.is_empty() {
            sink(SearchEvent::Matches(batch));
        }
        sink(SearchEvent::Progress {
            processed: summary.processed,
            total,
        });

        tracing::info!(
            processed = summary.processed,
            matched = summary.matched,
            "✅ Search completed"
        );
        Ok(summary)
    }

    /// Hidden files are searched too, even when the tree does not show them.
    fn walker(&self, root: &Path) -> Walk {
        build_walker(root, &self.options.exclude_patterns, true).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AttributeFilter;
    use tracing_test::traced_test;
    use std::fs;
    use tempfile::TempDir;

    fn create_file(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "x").unwrap();
        path
    }

    fn setup_tree() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        create_file(root, "battery/BAT_spec_A1.pdf");
        create_file(root, "battery/BAT_drawing_A1.pdf");
        create_file(root, "battery/old/bat_spec_A0.pdf");
        create_file(root, "display/DSP_spec.pdf");
        create_file(root, "notes.txt");
        create_file(root, ".hidden/spec_hidden.pdf");
        dir
    }

    fn keyword(word: &str) -> SearchFilter {
        SearchFilter {
            keyword: word.to_string(),
            ..Default::default()
        }
    }

    fn collect(worker: &SearchWorker) -> (Vec<SearchEvent>, CoreResult<SearchSummary>) {
        let cancel = AtomicBool::new(false);
        let mut events = Vec::new();
        let result = worker.run(&cancel, |e| events.push(e));
        (events, result)
    }

    fn matched_names(events: &[SearchEvent]) -> Vec<String> {
        let mut names: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::Matches(batch) => Some(batch.clone()),
                _ => None,
            })
            .flatten()
            .map(|f| f.name)
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_count_files_counts_regular_files_only() {
        let dir = setup_tree();
        let worker = SearchWorker::new(
            vec![dir.path().to_path_buf()],
            &SearchFilter::default(),
            SearchOptions::default(),
        );
        assert_eq!(worker.count_files(&AtomicBool::new(false)).unwrap(), 6);
    }

    #[test]
    #[traced_test]
    fn test_search_streams_matches_including_hidden_files() {
        let dir = setup_tree();
        let worker = SearchWorker::new(
            vec![dir.path().to_path_buf()],
            &keyword("SPEC"),
            SearchOptions::default(),
        );

        let (events, result) = collect(&worker);
        let summary = result.unwrap();

        assert_eq!(events.first(), Some(&SearchEvent::Started { total: 6 }));
        assert_eq!(summary.processed, 6);
        assert_eq!(summary.matched, 4);
        assert_eq!(
            matched_names(&events),
            vec![
                "BAT_spec_A1.pdf",
                "DSP_spec.pdf",
                "bat_spec_A0.pdf",
                "spec_hidden.pdf"
            ]
        );
        assert!(logs_contain("Search started"));
    }

    #[test]
    fn test_matches_are_batched() {
        let dir = setup_tree();
        let options = SearchOptions {
            result_batch_size: 3,
            progress_interval: 2,
            ..Default::default()
        };
        let worker = SearchWorker::new(vec![dir.path().to_path_buf()], &keyword("pdf"), options);

        let (events, result) = collect(&worker);
        assert_eq!(result.unwrap().matched, 5);

        let batch_sizes: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                SearchEvent::Matches(b) => Some(b.len()),
                _ => None,
            })
            .collect();
        assert_eq!(batch_sizes, vec![3, 2]);

        let progress_count = events
            .iter()
            .filter(|e| matches!(e, SearchEvent::Progress { .. }))
            .count();
        // Every 2nd of 6 files plus the final report.
        assert_eq!(progress_count, 4);
        assert_eq!(
            events.last(),
            Some(&SearchEvent::Progress {
                processed: 6,
                total: 6
            })
        );
    }

    #[test]
    fn test_attribute_filters_apply_to_file_names() {
        let dir = setup_tree();
        let filter = SearchFilter {
            category: AttributeFilter::new(true, "bat"),
            custom: AttributeFilter::new(true, "a1"),
            ..Default::default()
        };
        let worker = SearchWorker::new(
            vec![dir.path().to_path_buf()],
            &filter,
            SearchOptions::default(),
        );

        let (events, _) = collect(&worker);
        assert_eq!(
            matched_names(&events),
            vec!["BAT_drawing_A1.pdf", "BAT_spec_A1.pdf"]
        );
    }

    #[test]
    fn test_multiple_roots_are_searched_in_order() {
        let dir = setup_tree();
        let roots = vec![dir.path().join("display"), dir.path().join("battery")];
        let worker = SearchWorker::new(roots, &keyword("spec"), SearchOptions::default());

        let (events, _) = collect(&worker);
        let first_batch = events
            .iter()
            .find_map(|e| match e {
                SearchEvent::Matches(b) => Some(b.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(first_batch[0].name, "DSP_spec.pdf");
        assert_eq!(first_batch.len(), 3);
    }

    #[test]
    fn test_exclude_patterns_prune_directories() {
        let dir = setup_tree();
        let options = SearchOptions {
            exclude_patterns: vec!["old/".to_string(), ".hidden/".to_string()],
            ..Default::default()
        };
        let worker = SearchWorker::new(vec![dir.path().to_path_buf()], &keyword("spec"), options);

        let (events, result) = collect(&worker);
        assert_eq!(result.unwrap().total, 4);
        assert_eq!(matched_names(&events), vec!["BAT_spec_A1.pdf", "DSP_spec.pdf"]);
    }

    #[test]
    fn test_precancelled_search_emits_nothing() {
        let dir = setup_tree();
        let worker = SearchWorker::new(
            vec![dir.path().to_path_buf()],
            &keyword("spec"),
            SearchOptions::default(),
        );
        let cancel = AtomicBool::new(true);
        let mut events = Vec::new();

        let result = worker.run(&cancel, |e| events.push(e));

        assert!(matches!(result, Err(CoreError::Cancelled)));
        assert!(events.is_empty());
    }

    #[test]
    fn test_cancellation_during_walk_stops_streaming() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..20 {
            create_file(dir.path(), &format!("doc_{i:02}.pdf"));
        }
        let options = SearchOptions {
            result_batch_size: 2,
            ..Default::default()
        };
        let worker = SearchWorker::new(vec![dir.path().to_path_buf()], &keyword("doc"), options);
        let cancel = AtomicBool::new(false);
        let mut batches = 0;

        let result = worker.run(&cancel, |e| {
            if let SearchEvent::Matches(_) = e {
                batches += 1;
                cancel.store(true, Ordering::Relaxed);
            }
        });

        assert!(matches!(result, Err(CoreError::Cancelled)));
        assert_eq!(batches, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_counted_and_matched() {
        let dir = tempfile::tempdir().unwrap();
        let real = create_file(dir.path(), "store/real.pdf");
        std::os::unix::fs::symlink(&real, dir.path().join("report_link.pdf")).unwrap();
        let worker = SearchWorker::new(
            vec![dir.path().to_path_buf()],
            &keyword("report"),
            SearchOptions::default(),
        );

        let (events, result) = collect(&worker);
        let summary = result.unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.matched, 1);
        assert_eq!(matched_names(&events), vec!["report_link.pdf"]);
        let linked = events
            .iter()
            .find_map(|e| match e {
                SearchEvent::Matches(b) => b.first().cloned(),
                _ => None,
            })
            .unwrap();
        // Size and mtime come from the link target.
        assert_eq!(linked.size, 1);
    }

    #[test]
    fn test_missing_root_yields_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let worker = SearchWorker::new(
            vec![dir.path().join("does-not-exist")],
            &keyword("x"),
            SearchOptions::default(),
        );
        let (events, result) = collect(&worker);
        assert_eq!(result.unwrap().processed, 0);
        assert!(matched_names(&events).is_empty());
    }
}
