use std::ffi::OsStr;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anstyle::{AnsiColor, Effects, Style};
use anyhow::Result;
use appstow_installer::{InstallOutcome, Toolbox};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

/// Rich only when both stdout and stderr are terminals.
pub(crate) fn current_output_style() -> OutputStyle {
    if io::stdout().is_terminal() && io::stderr().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

impl TerminalRenderer {
    pub(crate) fn current() -> Self {
        Self {
            style: current_output_style(),
        }
    }

    pub(crate) fn style(self) -> OutputStyle {
        self.style
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_section(self, title: &str) {
        if let Some(line) = render_section_header(self.style, title) {
            println!();
            println!("{}", colorize(section_style(), &line));
        }
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "step" => "[STEP]",
        "warn" => "[WARN]",
        "err" => "[ERR]",
        _ => "[..]",
    }
}

fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(format!("== {title} ==")),
    }
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

/// Status lines for a finished install, ending with the summary line.
pub(crate) fn format_install_outcome_lines(
    outcome: &InstallOutcome,
    style: OutputStyle,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(executable) = &outcome.executable {
        if outcome.launcher.as_ref() != Some(executable) {
            lines.push(render_status_line(
                style,
                "step",
                &format!("executable: {}", executable.display()),
            ));
        }
    }
    if let Some(entry) = &outcome.desktop_entry {
        lines.push(render_status_line(
            style,
            "step",
            &format!("desktop entry: {}", entry.display()),
        ));
    }
    if let Some(icon) = &outcome.icon {
        lines.push(render_status_line(
            style,
            "step",
            &format!("icon: {}", icon.display()),
        ));
    }
    if outcome.install_root.is_some() && outcome.launcher.is_none() {
        lines.push(render_status_line(
            style,
            "warn",
            "no executable chosen; launcher and desktop entry were skipped",
        ));
    }
    lines.push(render_status_line(style, "ok", &outcome.summary()));
    lines
}

/// Wraps the real toolbox with a spinner for external steps in rich mode.
pub(crate) struct ProgressToolbox<'a> {
    inner: &'a dyn Toolbox,
    style: OutputStyle,
    elevation: &'a str,
}

impl<'a> ProgressToolbox<'a> {
    pub(crate) fn new(inner: &'a dyn Toolbox, style: OutputStyle, elevation: &'a str) -> Self {
        Self {
            inner,
            style,
            elevation: elevation.trim(),
        }
    }

    fn start_spinner(&self, command: &Command) -> Option<ProgressBar> {
        if !shows_spinner(self.style, command.get_program(), self.elevation) {
            return None;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan.bold} {msg} {elapsed}") {
            spinner.set_style(style.tick_chars("|/-\\ "));
        }
        spinner.set_message(format!("running {}", program_label(command.get_program())));
        spinner.enable_steady_tick(Duration::from_millis(80));
        Some(spinner)
    }
}

impl Toolbox for ProgressToolbox<'_> {
    fn find(&self, tool: &str) -> Option<PathBuf> {
        self.inner.find(tool)
    }

    fn run(&self, command: &mut Command, context_message: &str) -> Result<()> {
        let spinner = self.start_spinner(command);
        let result = self.inner.run(command, context_message);
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result
    }
}

// The elevation tool may ask for a password on the terminal.
fn shows_spinner(style: OutputStyle, program: &OsStr, elevation: &str) -> bool {
    if style == OutputStyle::Plain {
        return false;
    }
    elevation.is_empty() || program_label(program) != elevation
}

fn program_label(program: &OsStr) -> String {
    Path::new(program)
        .file_name()
        .unwrap_or(program)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appstow_core::ArtifactKind;

    fn outcome(kind: ArtifactKind, name: &str) -> InstallOutcome {
        InstallOutcome {
            kind,
            app_name: name.to_string(),
            install_root: None,
            executable: None,
            launcher: None,
            desktop_entry: None,
            icon: None,
        }
    }

    #[test]
    fn render_status_line_plain_is_unadorned() {
        assert_eq!(
            render_status_line(OutputStyle::Plain, "ok", "Installed tool"),
            "Installed tool"
        );
    }

    #[test]
    fn render_status_line_rich_includes_badge() {
        assert_eq!(
            render_status_line(OutputStyle::Rich, "ok", "Installed tool"),
            "[OK] Installed tool"
        );
        assert_eq!(
            render_status_line(OutputStyle::Rich, "step", "installing tool.zip (zip)"),
            "[STEP] installing tool.zip (zip)"
        );
        assert_eq!(
            render_status_line(OutputStyle::Rich, "warn", "no executable chosen"),
            "[WARN] no executable chosen"
        );
    }

    #[test]
    fn section_header_only_in_rich_mode() {
        assert_eq!(render_section_header(OutputStyle::Plain, "summary"), None);
        assert_eq!(
            render_section_header(OutputStyle::Rich, "summary").as_deref(),
            Some("== summary ==")
        );
    }

    #[test]
    fn outcome_lines_for_linked_archive_end_with_summary() {
        let mut result = outcome(ArtifactKind::Archive(appstow_core::ArchiveFormat::TarGz), "tool");
        result.install_root = Some(PathBuf::from("/h/.local/opt/tool"));
        result.executable = Some(PathBuf::from("/h/.local/opt/tool/bin/tool"));
        result.launcher = Some(PathBuf::from("/h/.local/bin/tool"));
        result.desktop_entry = Some(PathBuf::from("/h/.local/share/applications/tool.desktop"));

        assert_eq!(
            format_install_outcome_lines(&result, OutputStyle::Plain),
            vec![
                "executable: /h/.local/opt/tool/bin/tool".to_string(),
                "desktop entry: /h/.local/share/applications/tool.desktop".to_string(),
                "Installed tool to /h/.local/opt/tool; launcher: /h/.local/bin/tool".to_string(),
            ]
        );
    }

    #[test]
    fn outcome_lines_warn_when_no_launcher_was_created() {
        let mut result = outcome(ArtifactKind::Archive(appstow_core::ArchiveFormat::Zip), "assets");
        result.install_root = Some(PathBuf::from("/h/.local/opt/assets"));

        let lines = format_install_outcome_lines(&result, OutputStyle::Rich);
        assert_eq!(
            lines,
            vec![
                "[WARN] no executable chosen; launcher and desktop entry were skipped".to_string(),
                "[OK] Installed assets to /h/.local/opt/assets; no launcher created".to_string(),
            ]
        );
    }

    #[test]
    fn outcome_lines_for_raw_binary_skip_duplicate_executable() {
        let mut result = outcome(ArtifactKind::Binary, "raw");
        let binary = PathBuf::from("/h/.local/bin/raw");
        result.install_root = Some(binary.clone());
        result.executable = Some(binary.clone());
        result.launcher = Some(binary);

        assert_eq!(
            format_install_outcome_lines(&result, OutputStyle::Plain),
            vec!["Installed raw to /h/.local/bin/raw".to_string()]
        );
    }

    #[test]
    fn outcome_lines_for_debian_package() {
        let result = outcome(ArtifactKind::Deb, "tool_1.0_amd64");
        assert_eq!(
            format_install_outcome_lines(&result, OutputStyle::Plain),
            vec!["Installed tool_1.0_amd64 with the system package manager".to_string()]
        );
    }

    #[test]
    fn spinner_is_skipped_in_plain_mode_and_under_elevation() {
        assert!(!shows_spinner(OutputStyle::Plain, OsStr::new("/usr/bin/tar"), "sudo"));
        assert!(shows_spinner(OutputStyle::Rich, OsStr::new("/usr/bin/tar"), "sudo"));
        assert!(!shows_spinner(OutputStyle::Rich, OsStr::new("/usr/bin/sudo"), "sudo"));
        assert!(shows_spinner(OutputStyle::Rich, OsStr::new("/usr/bin/dpkg"), ""));
    }

    #[test]
    fn progress_toolbox_delegates_to_inner_toolbox() {
        struct Recording;

        impl Toolbox for Recording {
            fn find(&self, tool: &str) -> Option<PathBuf> {
                (tool == "tar").then(|| PathBuf::from("/bin/tar"))
            }

            fn run(&self, _command: &mut Command, context_message: &str) -> Result<()> {
                Err(anyhow::anyhow!("{context_message}: status=exit status: 2"))
            }
        }

        let tools = ProgressToolbox::new(&Recording, OutputStyle::Plain, "sudo");
        assert_eq!(tools.find("tar"), Some(PathBuf::from("/bin/tar")));
        assert_eq!(tools.find("unzip"), None);
        let err = tools
            .run(&mut Command::new("/bin/tar"), "failed to extract")
            .expect_err("inner failure must propagate");
        assert!(err.to_string().starts_with("failed to extract"));
    }
}
