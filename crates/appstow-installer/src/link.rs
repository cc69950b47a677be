use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::InstallLayout;

pub fn mark_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .permissions();
        permissions.set_mode(permissions.mode() | 0o111);
        fs::set_permissions(path, permissions)
            .with_context(|| format!("failed to set executable mode on {}", path.display()))?;
    }

    Ok(())
}

/// Points `<bin>/<app_name>` at `target`, replacing whatever was there.
pub fn expose_launcher(layout: &InstallLayout, app_name: &str, target: &Path) -> Result<PathBuf> {
    let destination = layout.launcher_path(app_name);
    ensure_parent(&destination)?;

    let pending = pending_path(&destination)?;
    remove_if_present(&pending)?;
    create_symlink(target, &pending)?;
    replace_with(&pending, &destination)?;
    info!(
        launcher = %destination.display(),
        target = %target.display(),
        "exposed launcher"
    );
    Ok(destination)
}

/// Copies `source` to `<bin>/<app_name>` as an executable, replacing whatever
/// was there.
pub fn install_binary_copy(
    layout: &InstallLayout,
    app_name: &str,
    source: &Path,
) -> Result<PathBuf> {
    let destination = layout.launcher_path(app_name);
    ensure_parent(&destination)?;

    let pending = pending_path(&destination)?;
    remove_if_present(&pending)?;
    fs::copy(source, &pending).with_context(|| {
        format!(
            "failed to copy {} to {}",
            source.display(),
            pending.display()
        )
    })?;
    mark_executable(&pending)?;
    replace_with(&pending, &destination)?;
    info!(binary = %destination.display(), "installed binary");
    Ok(destination)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn pending_path(destination: &Path) -> Result<PathBuf> {
    let file_name = destination
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid launcher path: {}", destination.display()))?;
    Ok(destination.with_file_name(format!(".{file_name}.appstow-{}", std::process::id())))
}

fn remove_if_present(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_ok() {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove stale entry: {}", path.display()))?;
    }
    Ok(())
}

// rename(2) swaps the directory entry in one step, so a reader of the bin
// directory sees either the old launcher or the new one.
fn replace_with(pending: &Path, destination: &Path) -> Result<()> {
    fs::rename(pending, destination).with_context(|| {
        format!(
            "failed to replace {} with {}",
            destination.display(),
            pending.display()
        )
    })
}

fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).with_context(|| {
            format!(
                "failed to create symlink {} -> {}",
                link.display(),
                target.display()
            )
        })
    }

    #[cfg(not(unix))]
    {
        Err(anyhow!(
            "launcher links are supported only on unix hosts: {} -> {}",
            link.display(),
            target.display()
        ))
    }
}
