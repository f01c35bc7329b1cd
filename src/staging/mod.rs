//! Staging of release metadata into the package source directory.
//!
//! setup.py ships the license, docs, lock files and requirements listings
//! as package data, so they have to sit inside the package directory while
//! the packaging tool runs. They are copied in before the build and removed
//! again afterwards.

mod guard;

pub use guard::StagedRelease;

use crate::config::CleanupPolicy;
use crate::error::{Result, StageError, UnstageError};
use crate::requirements::RequirementsMode;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Files that must exist at the repository root and are staged for the build
pub const REQUIRED_FILES: [&str; 11] = [
    ".VERSION",
    "LICENSE",
    "AUTHORS.rst",
    "CONTRIBUTING.rst",
    "HISTORY.rst",
    "README.rst",
    "USAGE.rst",
    "Pipfile",
    "Pipfile.lock",
    "requirements.txt",
    "dev-requirements.txt",
];

/// Required files produced by the pipeline itself rather than committed
pub fn is_generated(file: &str) -> bool {
    RequirementsMode::ALL.iter().any(|mode| mode.file_name() == file)
}

/// Required files that are missing from `root`, in list order
pub fn missing_files(root: &Path, required_files: &[&str]) -> Vec<PathBuf> {
    required_files
        .iter()
        .map(|file| root.join(file))
        .filter(|path| !path.is_file())
        .collect()
}

/// Suffix of the on-disk backup of a package file a staged copy replaced
pub const BACKUP_SUFFIX: &str = ".orig";

/// Backup location for `path`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Copy every required file from `root` into `dest_dir`.
///
/// All sources are checked before anything is copied, so a missing file
/// leaves the destination untouched. A file already present in `dest_dir`
/// is moved to its [`backup_path`] first and moved back by unstaging, by
/// the guard or by [`unstage`].
pub async fn stage(
    root: &Path,
    required_files: &[&str],
    dest_dir: &Path,
    policy: CleanupPolicy,
) -> Result<StagedRelease> {
    if !dest_dir.is_dir() {
        return Err(StageError::PackageDirMissing {
            path: dest_dir.to_path_buf(),
        }
        .into());
    }
    if let Some(path) = missing_files(root, required_files).into_iter().next() {
        return Err(StageError::MissingRequiredFile { path }.into());
    }
    if let Some(path) = required_files
        .iter()
        .map(|file| backup_path(&dest_dir.join(file)))
        .find(|backup| backup.exists())
    {
        return Err(StageError::StaleBackup { path }.into());
    }

    let mut staged = StagedRelease::new(root, dest_dir, policy);
    for file in required_files {
        let target = dest_dir.join(file);
        let backup = if tokio::fs::symlink_metadata(&target).await.is_ok() {
            let backup = backup_path(&target);
            tokio::fs::rename(&target, &backup)
                .await
                .map_err(|source| StageError::BackupFailed {
                    path: target.clone(),
                    source,
                })?;
            log::debug!("Moved existing {} to {}", target.display(), backup.display());
            Some(backup)
        } else {
            None
        };
        staged.track(file, backup);

        tokio::fs::copy(root.join(file), &target)
            .await
            .map_err(|source| StageError::CopyFailed {
                file: file.to_string(),
                dest: dest_dir.to_path_buf(),
                source,
            })?;
        log::debug!("Staged {} into {}", file, dest_dir.display());
    }

    log::info!("Staged {} file(s) into {}", required_files.len(), dest_dir.display());
    Ok(staged)
}

/// Remove every required file from `dest_dir`, moving back any backup left
/// next to it, and remove the generated development requirements from
/// `root`.
///
/// Files that are already gone are skipped. Returns the paths removed or
/// restored.
pub fn unstage(root: &Path, required_files: &[&str], dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut cleaned = Vec::new();
    for file in required_files {
        let path = dest_dir.join(file);
        let backup = backup_path(&path);
        if backup.exists() {
            restore_backup(&backup, &path)?;
            cleaned.push(path);
        } else if remove_if_present(&path)? {
            cleaned.push(path);
        }
    }

    let dev_requirements = root.join(RequirementsMode::Develop.file_name());
    if remove_if_present(&dev_requirements)? {
        cleaned.push(dev_requirements);
    }
    Ok(cleaned)
}

/// Move a backup over the staged copy it was displaced by
pub(crate) fn restore_backup(backup: &Path, path: &Path) -> Result<()> {
    std::fs::rename(backup, path).map_err(|source| {
        UnstageError::RestoreFailed {
            path: path.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Remove a file, treating "not found" as already removed
pub(crate) fn remove_if_present(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(UnstageError::RemoveFailed {
            path: path.to_path_buf(),
            source,
        }
        .into()),
    }
}
