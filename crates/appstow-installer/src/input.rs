use anyhow::{anyhow, Context, Result};
use appstow_core::ArtifactKind;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::InstallError;

/// The file being installed, resolved once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub base_name: String,
    pub kind: ArtifactKind,
}

/// Canonicalizes `raw` (after `~` expansion against `home`) and classifies
/// it by file name.
pub fn resolve_artifact(raw: &str, home: &Path) -> Result<Artifact> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InstallError::EmptyArtifactPath.into());
    }

    let expanded = expand_tilde(trimmed, home);
    let path = fs::canonicalize(&expanded)
        .with_context(|| format!("failed to resolve artifact path: {}", expanded.display()))?;
    let metadata =
        fs::metadata(&path).with_context(|| format!("failed to stat {}", path.display()))?;
    if !metadata.is_file() {
        return Err(InstallError::NotARegularFile { path }.into());
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("artifact file name is not valid UTF-8: {}", path.display()))?
        .to_string();

    Ok(Artifact {
        kind: ArtifactKind::classify(&file_name),
        base_name: ArtifactKind::base_name(&file_name).to_string(),
        path,
    })
}

pub(crate) fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    if raw == "~" {
        return home.to_path_buf();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(raw),
    }
}
