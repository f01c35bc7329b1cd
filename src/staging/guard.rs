//! RAII guard for staged release files.
//!
//! Under [`CleanupPolicy::Always`] the guard unstages when dropped, so an
//! error return, a panic or a cancelled future never leaves copies behind.

use crate::config::CleanupPolicy;
use crate::error::Result;
use crate::requirements::RequirementsMode;
use std::path::{Path, PathBuf};

use super::{remove_if_present, restore_backup};

#[derive(Debug)]
struct StagedFile {
    name: String,
    backup: Option<PathBuf>,
}

/// Files copied into the package directory for one build
#[derive(Debug)]
pub struct StagedRelease {
    root: PathBuf,
    dest_dir: PathBuf,
    files: Vec<StagedFile>,
    armed: bool,
}

impl StagedRelease {
    pub(super) fn new(root: &Path, dest_dir: &Path, policy: CleanupPolicy) -> Self {
        Self {
            root: root.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
            files: Vec::new(),
            armed: policy == CleanupPolicy::Always,
        }
    }

    pub(super) fn track(&mut self, name: &str, backup: Option<PathBuf>) {
        self.files.push(StagedFile {
            name: name.to_string(),
            backup,
        });
    }

    /// Destination paths of the staged copies
    pub fn files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|f| self.dest_dir.join(&f.name))
            .collect()
    }

    /// Whether dropping the guard cleans up
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Remove the staged copies, restore files they replaced and delete the
    /// generated development requirements.
    pub fn unstage(mut self) -> Result<()> {
        self.armed = false;
        self.release()
    }

    /// Leave every staged file in place and return their paths.
    ///
    /// Backups of replaced package files stay on disk for
    /// [`unstage`](super::unstage) to move back.
    pub fn persist(mut self) -> Vec<PathBuf> {
        self.armed = false;
        for backup in self.files.iter().filter_map(|f| f.backup.as_ref()) {
            log::warn!("Original package file kept at {}", backup.display());
        }
        let left = self.files();
        self.files.clear();
        left
    }

    /// Best effort: every file is attempted, the first failure is returned
    fn release(&mut self) -> Result<()> {
        let mut first_error = None;

        for file in self.files.drain(..).rev() {
            let path = self.dest_dir.join(&file.name);
            let outcome = match &file.backup {
                Some(backup) => restore_backup(backup, &path),
                None => remove_if_present(&path).map(|_| ()),
            };
            if let Err(e) = outcome {
                log::warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        let dev_requirements = self.root.join(RequirementsMode::Develop.file_name());
        if let Err(e) = remove_if_present(&dev_requirements) {
            log::warn!("{}", e);
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                log::info!("Unstaged release files from {}", self.dest_dir.display());
                Ok(())
            }
        }
    }
}

impl Drop for StagedRelease {
    fn drop(&mut self) {
        if self.armed {
            log::warn!(
                "Release did not finish; removing staged files from {}",
                self.dest_dir.display()
            );
            // Errors were already logged by release(); drop must not panic.
            let _ = self.release();
        }
    }
}
