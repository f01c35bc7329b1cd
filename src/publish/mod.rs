//! Distribution building and upload.
//!
//! setuptools builds an sdist and a legacy egg; twine uploads exactly the
//! artifacts that build produced.

use crate::config::ReleaseContext;
use crate::error::{PublishError, Result};
use crate::process::{CommandRunner, ToolCommand};
use std::path::{Path, PathBuf};

/// Version marker read to locate the artifacts of this release
pub const VERSION_FILE: &str = ".VERSION";

/// Distributions produced by one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    /// Source distributions (`.tar.gz`, `.zip`)
    pub sdists: Vec<PathBuf>,
    /// Binary distributions (`.egg`, `.whl`)
    pub bdists: Vec<PathBuf>,
}

impl ArtifactSet {
    /// Every artifact, sources first
    pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
        self.sdists.iter().chain(self.bdists.iter())
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.sdists.len() + self.bdists.len()
    }

    /// Whether nothing was found
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn classify(&mut self, path: PathBuf) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.ends_with(".tar.gz") || name.ends_with(".zip") {
            self.sdists.push(path);
        } else if name.ends_with(".egg") || name.ends_with(".whl") {
            self.bdists.push(path);
        } else {
            log::debug!("Ignoring unrecognised file in dist dir: {}", path.display());
        }
    }
}

/// Read the release version from the version marker
pub async fn read_version(root: &Path) -> Result<String> {
    let path = root.join(VERSION_FILE);
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| PublishError::VersionUnreadable {
            path: path.clone(),
            source,
        })?;
    Ok(raw.trim().to_string())
}

/// Find the distributions of `name`-`version` in `dist_dir`
pub fn collect_artifacts(dist_dir: &Path, name: &str, version: &str) -> Result<ArtifactSet> {
    let pattern = format!(
        "{}/{}-{}*",
        glob::Pattern::escape(&dist_dir.to_string_lossy()),
        glob::Pattern::escape(name),
        glob::Pattern::escape(version)
    );
    let entries = glob::glob(&pattern).map_err(|e| PublishError::InvalidPattern {
        pattern: pattern.clone(),
        reason: e.to_string(),
    })?;

    // The glob also matches 0.2.10 when looking for 0.2.1
    let prefix = format!("{name}-{version}");
    let belongs_to_release = |path: &Path| {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(prefix.as_str()))
            .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('-'))
    };

    let mut artifacts = ArtifactSet::default();
    for path in entries.filter_map(|entry| entry.ok()) {
        if path.is_file() && belongs_to_release(&path) {
            artifacts.classify(path);
        }
    }
    artifacts.sdists.sort();
    artifacts.bdists.sort();
    Ok(artifacts)
}

/// Version as setuptools spells it in artifact names.
///
/// `python setup.py --version` prints the normalized form (`0.2.1-beta`
/// becomes `0.2.1b0`). The version marker is used when the query fails or
/// prints nothing.
pub async fn distribution_version<R: CommandRunner>(
    ctx: &ReleaseContext,
    runner: &R,
    declared: &str,
) -> Result<String> {
    let query = ToolCommand::new(ctx.config.tools.python.as_str(), &ctx.root)
        .args(["setup.py", "--version"])
        .capture_stdout();
    let output = runner.run(&query).await?;

    // setup.py may print warnings before the version
    let reported = output
        .stdout
        .lines()
        .map(str::trim)
        .rfind(|line| !line.is_empty());
    match reported {
        Some(version) if output.success_status() => {
            if version != declared {
                log::debug!("setuptools normalized version {} to {}", declared, version);
            }
            Ok(version.to_string())
        }
        _ => {
            log::warn!(
                "'{}' did not report a version; using {}",
                query.display(),
                declared
            );
            Ok(declared.to_string())
        }
    }
}

fn setup_command(ctx: &ReleaseContext) -> ToolCommand {
    ToolCommand::new(ctx.config.tools.python.as_str(), &ctx.root).args([
        "setup.py",
        "sdist",
        "bdist_egg",
    ])
}

fn upload_command(ctx: &ReleaseContext, artifacts: &ArtifactSet) -> ToolCommand {
    ToolCommand::new(ctx.config.tools.python.as_str(), &ctx.root)
        .args(["-m", "twine", "upload", "--repository"])
        .arg(ctx.config.repository.as_str())
        .args(artifacts.all().map(|p| p.to_string_lossy().into_owned()))
}

/// Build source and binary distributions, then upload them when `publish`
pub async fn build<R: CommandRunner>(
    ctx: &ReleaseContext,
    runner: &R,
    publish: bool,
) -> Result<ArtifactSet> {
    let version = read_version(&ctx.root).await?;
    let name = &ctx.config.package_name;

    log::info!("Building {}-{}", name, version);
    let setup = setup_command(ctx);
    let output = runner.run(&setup).await?;
    if !output.success_status() {
        return Err(PublishError::BuildFailed {
            command: setup.display(),
            code: output.code,
        }
        .into());
    }

    let version = distribution_version(ctx, runner, &version).await?;
    let dist_dir = ctx.dist_dir();
    let artifacts = collect_artifacts(&dist_dir, name, &version)?;
    for (kind, found) in [("source", &artifacts.sdists), ("binary", &artifacts.bdists)] {
        if found.is_empty() {
            return Err(PublishError::MissingArtifacts {
                kind,
                name: name.clone(),
                version: version.clone(),
                dist_dir: dist_dir.clone(),
            }
            .into());
        }
    }

    if publish {
        log::info!(
            "Uploading {} artifact(s) to '{}'",
            artifacts.len(),
            ctx.config.repository
        );
        let upload = upload_command(ctx, &artifacts);
        let output = runner.run(&upload).await?;
        if !output.success_status() {
            return Err(PublishError::UploadFailed {
                repository: ctx.config.repository.clone(),
                command: upload.display(),
                code: output.code,
            }
            .into());
        }
    }

    Ok(artifacts)
}
