use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::InstallLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    pub name: String,
    pub exec: PathBuf,
    pub icon: Option<PathBuf>,
    pub comment: Option<String>,
    pub category: String,
    pub terminal: bool,
}

pub fn render_desktop_entry(entry: &DesktopEntry) -> String {
    let mut desktop = String::new();
    desktop.push_str("[Desktop Entry]\n");
    desktop.push_str("Type=Application\n");
    desktop.push_str(&format!("Name={}\n", sanitize_value(&entry.name)));
    desktop.push_str(&format!("Exec={}\n", render_exec(&entry.exec)));
    desktop.push_str(&format!("Terminal={}\n", entry.terminal));
    desktop.push_str(&format!(
        "Categories={};\n",
        sanitize_value(&entry.category).replace(';', "_")
    ));
    if let Some(comment) = entry.comment.as_deref().map(sanitize_value) {
        if !comment.is_empty() {
            desktop.push_str(&format!("Comment={comment}\n"));
        }
    }
    if let Some(icon) = &entry.icon {
        let icon = sanitize_value(&icon.display().to_string());
        if !icon.is_empty() {
            desktop.push_str(&format!("Icon={icon}\n"));
        }
    }
    desktop
}

/// Writes `<applications>/<file_stem>.desktop`, replacing any previous file,
/// with mode 0644.
pub fn write_desktop_entry(
    layout: &InstallLayout,
    file_stem: &str,
    entry: &DesktopEntry,
) -> Result<PathBuf> {
    let path = layout.desktop_entry_path(file_stem);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    fs::write(&path, render_desktop_entry(entry).as_bytes())
        .with_context(|| format!("failed to write desktop entry: {}", path.display()))?;
    set_entry_mode(&path)?;
    info!(path = %path.display(), "wrote desktop entry");
    Ok(path)
}

fn set_entry_mode(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o644))
            .with_context(|| format!("failed to set mode on {}", path.display()))?;
    }

    Ok(())
}

fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

// Characters that force a quoted Exec argument.
const EXEC_RESERVED: &[char] = &[
    '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(', ')', '`',
];

fn render_exec(path: &Path) -> String {
    let rendered = sanitize_value(&path.display().to_string()).replace('%', "%%");
    let needs_quotes = rendered
        .chars()
        .any(|ch| ch.is_whitespace() || EXEC_RESERVED.contains(&ch));
    if !needs_quotes {
        return rendered;
    }

    let mut quoted = String::with_capacity(rendered.len() + 2);
    quoted.push('"');
    for ch in rendered.chars() {
        if matches!(ch, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
