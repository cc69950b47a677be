use anyhow::{anyhow, Context, Result};
use appstow_core::PromptPolicy;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

use crate::prompt::Prompter;
use crate::tools::Toolbox;
use crate::InstallLayout;

const REMOTE_PREFIX: &str = "https://";

/// Fetch tools in preference order.
const FETCH_TOOLS: [&str; 2] = ["curl", "wget"];

pub struct IconRequest<'a> {
    pub app_name: &'a str,
    pub fallback_extension: &'a str,
    pub policy: PromptPolicy,
}

/// Asks for an icon until one resolves or the answer is empty.
///
/// Local paths are returned verbatim; `https://` sources are downloaded to
/// `<icons>/<app_name>.<ext>`. Failures are reported and the prompt repeats,
/// up to `policy.icon_attempts` when set.
pub fn resolve_icon(
    layout: &InstallLayout,
    tools: &dyn Toolbox,
    prompter: &mut dyn Prompter,
    request: &IconRequest<'_>,
) -> Result<Option<PathBuf>> {
    let mut failures = 0_u32;
    loop {
        let answer = prompter.ask("Icon (local path or https:// URL), or leave empty for none:")?;
        if answer.is_empty() {
            return Ok(None);
        }

        let attempt = if answer.starts_with(REMOTE_PREFIX) {
            let extension = icon_extension_from_url(&answer, request.fallback_extension);
            let destination = layout.icon_path(request.app_name, &extension);
            download_icon(tools, &answer, &destination).map(|()| destination)
        } else {
            local_icon(&answer)
        };

        match attempt {
            Ok(path) => return Ok(Some(path)),
            Err(err) => {
                warn!("icon rejected: {err:#}");
                prompter.report(&format!("error: {err:#}"));
                failures += 1;
                if request.policy.icon_attempts.is_some_and(|max| failures >= max) {
                    prompter.report("giving up on the icon; continuing without one");
                    return Ok(None);
                }
            }
        }
    }
}

fn local_icon(answer: &str) -> Result<PathBuf> {
    let path = PathBuf::from(answer);
    if path.exists() {
        return Ok(path);
    }
    Err(anyhow!("icon file does not exist: {}", path.display()))
}

/// Extension from the last path segment of `url`, ignoring query and
/// fragment. Falls back when the segment has no plausible extension.
pub fn icon_extension_from_url(url: &str, fallback: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);
    let file_name = without_query
        .strip_prefix(REMOTE_PREFIX)
        .and_then(|rest| rest.split_once('/'))
        .map(|(_, path)| path.rsplit('/').next().unwrap_or(""))
        .unwrap_or("");

    match file_name.rsplit_once('.') {
        Some((stem, extension))
            if !stem.is_empty()
                && !extension.is_empty()
                && extension.len() <= 5
                && extension.chars().all(|ch| ch.is_ascii_alphanumeric()) =>
        {
            extension.to_ascii_lowercase()
        }
        _ => fallback.to_string(),
    }
}

pub fn download_icon(tools: &dyn Toolbox, url: &str, destination: &Path) -> Result<()> {
    let (tool, tool_path) = FETCH_TOOLS
        .iter()
        .find_map(|tool| tools.find(tool).map(|path| (*tool, path)))
        .ok_or_else(|| anyhow!("neither curl nor wget is available to download {url}"))?;
    debug!(tool, url, "downloading icon");

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create icon dir: {}", parent.display()))?;
    }

    let part_path = destination.with_file_name(format!(
        "{}.part",
        destination
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("icon")
    ));

    let mut command = build_fetch_command(tool, &tool_path, url, &part_path);
    if let Err(err) = tools.run(&mut command, &format!("{tool} download failed")) {
        let _ = fs::remove_file(&part_path);
        return Err(err);
    }

    fs::rename(&part_path, destination).with_context(|| {
        format!(
            "failed to move downloaded icon into place: {}",
            destination.display()
        )
    })
}

pub(crate) fn build_fetch_command(tool: &str, tool_path: &Path, url: &str, out: &Path) -> Command {
    let mut command = Command::new(tool_path);
    if tool == "curl" {
        command.arg("-fsSL").arg("-o").arg(out).arg(url);
    } else {
        command.arg("-q").arg("-O").arg(out).arg(url);
    }
    command
}
