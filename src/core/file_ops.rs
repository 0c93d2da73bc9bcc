//! File-system actions triggered from the tree's context menu.

use super::{CoreError, CoreResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Opens a file or folder with the system's default application.
pub fn open_path(path: &Path) -> CoreResult<()> {
    if !path.exists() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    open::that(path).map_err(|e| CoreError::io(e, path))
}

/// Opens the folder containing `path` (or the folder itself).
pub fn reveal_path(path: &Path) -> CoreResult<()> {
    if !path.exists() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    let folder = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };
    open::that(folder).map_err(|e| CoreError::io(e, folder))
}

pub fn create_folder(parent: &Path, name: &str) -> CoreResult<PathBuf> {
    let name = validate_name(name)?;
    if !parent.is_dir() {
        return Err(CoreError::NotFound(parent.to_path_buf()));
    }
    let target = parent.join(name);
    if target.exists() {
        return Err(CoreError::AlreadyExists(target));
    }
    fs::create_dir(&target).map_err(|e| CoreError::io(e, &target))?;
    tracing::info!(path = %target.display(), "Created folder");
    Ok(target)
}

/// Renames in place; the item stays in the same parent folder.
pub fn rename_path(path: &Path, new_name: &str) -> CoreResult<PathBuf> {
    let new_name = validate_name(new_name)?;
    if !path.exists() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let target = parent.join(new_name);
    if target == path {
        return Ok(target);
    }
    if target.exists() {
        return Err(CoreError::AlreadyExists(target));
    }
    fs::rename(path, &target).map_err(|e| CoreError::io(e, path))?;
    tracing::info!(from = %path.display(), to = %target.display(), "Renamed");
    Ok(target)
}

/// Deletes a file, or a folder with everything in it.
pub fn delete_path(path: &Path) -> CoreResult<()> {
    let metadata = fs::symlink_metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
        _ => CoreError::io(e, path),
    })?;
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| CoreError::io(e, path))?;
    tracing::info!(path = %path.display(), "Deleted");
    Ok(())
}

fn validate_name(name: &str) -> CoreResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\'])
        || trimmed.contains('\0')
    {
        return Err(CoreError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}
