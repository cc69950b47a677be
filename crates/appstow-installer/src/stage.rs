use anyhow::{Context, Result};
use appstow_core::ArchiveFormat;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::error::InstallError;
use crate::prompt::{confirm, Prompter};
use crate::tools::{require_tool, Toolbox};
use crate::InstallLayout;

/// Extracts `archive` into a fresh staging directory, then replaces
/// `install_dir` with the archive content once the user agrees to drop an
/// existing install.
///
/// The staging directory is removed only after a successful copy. An abort at
/// the overwrite prompt leaves it behind.
pub fn stage_archive(
    layout: &InstallLayout,
    tools: &dyn Toolbox,
    prompter: &mut dyn Prompter,
    archive: &Path,
    format: ArchiveFormat,
    install_dir: &Path,
) -> Result<()> {
    let staging = make_staging_dir(layout, "extract")?;
    extract_archive(tools, format, archive, &staging)?;

    let source_root = effective_source_root(&staging)?;
    prepare_install_dir(prompter, install_dir)?;
    copy_dir_recursive(&source_root, install_dir)?;
    info!(
        install_dir = %install_dir.display(),
        "copied archive content"
    );

    if let Err(err) = remove_tree(&staging) {
        warn!("failed to cleanup staging dir {}: {err:#}", staging.display());
    }
    Ok(())
}

/// Removes a directory tree, first giving every directory full owner access
/// so read-only directories can be emptied.
pub(crate) fn remove_tree(dir: &Path) -> Result<()> {
    make_dirs_writable(dir)?;
    fs::remove_dir_all(dir).with_context(|| format!("failed to remove {}", dir.display()))
}

fn make_dirs_writable(dir: &Path) -> Result<()> {
    let metadata =
        fs::symlink_metadata(dir).with_context(|| format!("failed to stat {}", dir.display()))?;
    if !metadata.is_dir() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = metadata.permissions();
        if permissions.mode() & 0o700 != 0o700 {
            permissions.set_mode(permissions.mode() | 0o700);
            fs::set_permissions(dir, permissions)
                .with_context(|| format!("failed to make {} writable", dir.display()))?;
        }
    }

    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("failed reading entry in {}", dir.display()))?;
        make_dirs_writable(&entry.path())?;
    }
    Ok(())
}

pub(crate) fn make_staging_dir(layout: &InstallLayout, prefix: &str) -> Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before unix epoch")?
        .as_nanos();
    let dir = layout
        .staging_dir()
        .join(format!("appstow-{prefix}-{}-{nanos}", std::process::id()));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed creating staging dir: {}", dir.display()))?;
    Ok(dir)
}

pub fn build_extract_command(
    extractor: &Path,
    format: ArchiveFormat,
    archive: &Path,
    dst: &Path,
) -> Command {
    let mut command = Command::new(extractor);
    match format.tar_flag() {
        None => {
            command.arg("-q").arg(archive).arg("-d").arg(dst);
        }
        Some(flag) => {
            command
                .arg(format!("-x{flag}f"))
                .arg(archive)
                .arg("-C")
                .arg(dst);
        }
    }
    command
}

pub fn extract_archive(
    tools: &dyn Toolbox,
    format: ArchiveFormat,
    archive: &Path,
    dst: &Path,
) -> Result<()> {
    let extractor = require_tool(
        tools,
        format.extractor(),
        &format!("extracting {} archives", format.as_str()),
    )?;
    info!(
        archive = %archive.display(),
        format = format.as_str(),
        "extracting archive"
    );
    let mut command = build_extract_command(&extractor, format, archive, dst);
    tools.run(
        &mut command,
        &format!("failed to extract {} archive {}", format.as_str(), archive.display()),
    )
}

/// Returns the lone top-level directory when it wraps all extracted content,
/// otherwise `dir` itself.
pub fn effective_source_root(dir: &Path) -> Result<PathBuf> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry =
            entry.with_context(|| format!("failed reading entry in {}", dir.display()))?;
        entries.push(entry);
        if entries.len() > 1 {
            debug!(dir = %dir.display(), "multiple top-level entries; no wrapper collapse");
            return Ok(dir.to_path_buf());
        }
    }

    let Some(only) = entries.pop() else {
        return Ok(dir.to_path_buf());
    };
    let file_type = only
        .file_type()
        .with_context(|| format!("failed to inspect {}", only.path().display()))?;
    if file_type.is_dir() {
        debug!(root = %only.path().display(), "collapsing single wrapper directory");
        return Ok(only.path());
    }
    Ok(dir.to_path_buf())
}

/// Clears the way for a fresh install into `dir`. An existing directory is
/// deleted only after an explicit yes.
pub fn prepare_install_dir(prompter: &mut dyn Prompter, dir: &Path) -> Result<()> {
    if fs::symlink_metadata(dir).is_ok() {
        let question = format!("{} already exists. Overwrite?", dir.display());
        if !confirm(prompter, &question)? {
            return Err(InstallError::OverwriteDeclined {
                path: dir.to_path_buf(),
            }
            .into());
        }
        remove_existing(dir)?;
    }

    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

fn remove_existing(path: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?;
    if metadata.is_dir() {
        remove_tree(path)
            .with_context(|| format!("failed to remove existing install: {}", path.display()))
    } else {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove existing install: {}", path.display()))
    }
}

/// Copies the content of `src` into `dst`, keeping permissions and symlinks.
pub(crate) fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).with_context(|| format!("failed to create {}", dst.display()))?;
    for entry in fs::read_dir(src).with_context(|| format!("failed to read {}", src.display()))? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let metadata = fs::symlink_metadata(&src_path)
            .with_context(|| format!("failed to stat {}", src_path.display()))?;
        if metadata.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
            fs::set_permissions(&dst_path, metadata.permissions()).with_context(|| {
                format!("failed to copy permissions to {}", dst_path.display())
            })?;
            continue;
        }

        #[cfg(unix)]
        if metadata.file_type().is_symlink() {
            let target = fs::read_link(&src_path)
                .with_context(|| format!("failed to read symlink {}", src_path.display()))?;
            std::os::unix::fs::symlink(&target, &dst_path).with_context(|| {
                format!(
                    "failed to create symlink {} -> {}",
                    dst_path.display(),
                    target.display()
                )
            })?;
            continue;
        }

        fs::copy(&src_path, &dst_path).with_context(|| {
            format!(
                "failed to copy {} to {}",
                src_path.display(),
                dst_path.display()
            )
        })?;
    }
    Ok(())
}
