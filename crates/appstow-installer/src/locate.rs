use anyhow::{Context, Result};
use appstow_core::PromptPolicy;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::InstallError;
use crate::prompt::Prompter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutableChoice {
    /// The only executable under the base directory.
    Auto(PathBuf),
    /// Picked from a numbered list.
    Selected(PathBuf),
    NoneFound,
    /// Empty answer at the numbered list.
    Skipped,
}

impl ExecutableChoice {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Auto(path) | Self::Selected(path) => Some(path),
            Self::NoneFound | Self::Skipped => None,
        }
    }
}

/// Regular files under `base` with any execute bit set, sorted by path.
/// Symlinks are neither followed nor reported.
pub fn find_executables(base: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    collect_executables(base, &mut found)?;
    found.sort();
    Ok(found)
}

fn collect_executables(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry.with_context(|| format!("failed reading entry in {}", dir.display()))?;
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if metadata.is_dir() {
            collect_executables(&path, found)?;
        } else if metadata.is_file() && is_executable(&metadata) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;

    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}

pub fn select_executable(
    prompter: &mut dyn Prompter,
    base: &Path,
    policy: PromptPolicy,
) -> Result<ExecutableChoice> {
    let mut candidates = find_executables(base)?;
    debug!(base = %base.display(), count = candidates.len(), "executable candidates");
    match candidates.len() {
        0 => return Ok(ExecutableChoice::NoneFound),
        1 => return Ok(ExecutableChoice::Auto(candidates.remove(0))),
        _ => {}
    }

    let question = render_candidate_menu(base, &candidates);
    let attempts = policy.selection_attempts.max(1);
    let mut attempt = 1;
    loop {
        let answer = prompter.ask(&question)?;
        if answer.is_empty() {
            return Ok(ExecutableChoice::Skipped);
        }

        match parse_selection(&answer, candidates.len()) {
            Ok(index) => return Ok(ExecutableChoice::Selected(candidates.swap_remove(index))),
            Err(err) if attempt < attempts => {
                prompter.report(&err.to_string());
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn render_candidate_menu(base: &Path, candidates: &[PathBuf]) -> String {
    let mut menu = String::from("Multiple executables found:\n");
    for (index, candidate) in candidates.iter().enumerate() {
        let shown = candidate.strip_prefix(base).unwrap_or(candidate);
        menu.push_str(&format!("  {}) {}\n", index + 1, shown.display()));
    }
    menu.push_str(&format!(
        "Select the main executable [1-{}], or leave empty to enter a path:",
        candidates.len()
    ));
    menu
}

/// Maps a 1-based answer onto a 0-based index.
pub(crate) fn parse_selection(answer: &str, max: usize) -> Result<usize, InstallError> {
    match answer.parse::<usize>() {
        Ok(choice) if (1..=max).contains(&choice) => Ok(choice - 1),
        _ => Err(InstallError::InvalidSelection {
            input: answer.to_string(),
            max,
        }),
    }
}

/// Manual fallback: relative answers resolve against `base`, absolute ones
/// are taken as-is. Empty means no launcher.
pub fn prompt_executable_path(
    prompter: &mut dyn Prompter,
    base: &Path,
) -> Result<Option<PathBuf>> {
    let answer = prompter.ask(&format!(
        "Path to the main executable (relative to {}), or leave empty to skip:",
        base.display()
    ))?;
    if answer.is_empty() {
        return Ok(None);
    }

    let candidate = Path::new(&answer);
    let path = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    };
    if !path.is_file() {
        return Err(InstallError::ExecutableNotFound { path }.into());
    }
    Ok(Some(path))
}

/// Automatic detection first, manual path entry when that yields nothing.
pub fn resolve_executable(
    prompter: &mut dyn Prompter,
    base: &Path,
    policy: PromptPolicy,
) -> Result<Option<PathBuf>> {
    let choice = select_executable(prompter, base, policy)?;
    if let Some(path) = choice.path() {
        return Ok(Some(path.to_path_buf()));
    }
    prompt_executable_path(prompter, base)
}
