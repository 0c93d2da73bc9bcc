use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Builds a gitignore-style matcher for the user's exclude patterns.
///
/// Patterns are anchored at `root`, so `build/` excludes every `build`
/// directory below it and `*.tmp` excludes matching files at any depth.
/// Invalid lines are logged and skipped so one typo does not disable the rest.
pub fn build_exclude_matcher(root: &Path, patterns: &[String]) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);

    for pattern in patterns {
        let trimmed_pattern = pattern.trim();
        if trimmed_pattern.is_empty() || trimmed_pattern.starts_with('#') {
            continue;
        }
        if let Err(e) = builder.add_line(None, trimmed_pattern) {
            tracing::warn!(pattern = trimmed_pattern, "Skipping invalid exclude pattern: {}", e);
        }
    }

    builder.build().unwrap_or_else(|e| {
        tracing::error!("Failed to build exclude matcher: {}", e);
        Gitignore::empty()
    })
}

/// Returns `true` if `path` (or one of its parents below the matcher root) is excluded.
pub fn is_excluded(matcher: &Gitignore, path: &Path, is_dir: bool) -> bool {
    if matcher.is_empty() {
        return false;
    }
    // `matched_path_or_any_parents` panics outside of (or at) the matcher root.
    if path == matcher.path() || !path.starts_with(matcher.path()) {
        return matcher.matched(path, is_dir).is_ignore();
    }
    matcher
        .matched_path_or_any_parents(path, is_dir)
        .is_ignore()
}
