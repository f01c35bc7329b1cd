//! Clean command implementation.
//!
//! Removes staged copies, moves back package files they replaced and
//! deletes the generated development requirements left behind by a run that
//! failed under the `on-success` cleanup policy or was killed outright.

use crate::cli::RuntimeConfig;
use crate::error::Result;
use crate::staging::{REQUIRED_FILES, unstage};

/// Execute clean command
pub(super) fn execute_clean(config: &RuntimeConfig) -> Result<()> {
    let ctx = config.context();
    config.verbose_println(&format!(
        "Removing staged files from {}",
        ctx.package_dir().display()
    ));

    let cleaned = unstage(&ctx.root, &REQUIRED_FILES, &ctx.package_dir())?;
    if cleaned.is_empty() {
        config.info_println("Nothing to clean up");
    } else {
        for path in &cleaned {
            config.indent(&format!("cleaned {}", path.display()));
        }
        config.success_println(&format!("Cleaned {} file(s)", cleaned.len()));
    }
    Ok(())
}
