use anyhow::{Context, Result};
use appstow_core::{ArchiveFormat, ArtifactKind, InstallerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::deb::install_deb;
use crate::desktop::{write_desktop_entry, DesktopEntry};
use crate::error::InstallError;
use crate::icon::{resolve_icon, IconRequest};
use crate::input::Artifact;
use crate::link::{expose_launcher, install_binary_copy, mark_executable};
use crate::locate::resolve_executable;
use crate::prompt::Prompter;
use crate::stage::{prepare_install_dir, stage_archive};
use crate::tools::Toolbox;
use crate::InstallLayout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub kind: ArtifactKind,
    pub app_name: String,
    /// Durable location of the installed files.
    pub install_root: Option<PathBuf>,
    pub executable: Option<PathBuf>,
    pub launcher: Option<PathBuf>,
    pub desktop_entry: Option<PathBuf>,
    pub icon: Option<PathBuf>,
}

impl InstallOutcome {
    fn new(kind: ArtifactKind, app_name: impl Into<String>) -> Self {
        Self {
            kind,
            app_name: app_name.into(),
            install_root: None,
            executable: None,
            launcher: None,
            desktop_entry: None,
            icon: None,
        }
    }

    pub fn summary(&self) -> String {
        match (&self.install_root, &self.launcher) {
            (Some(root), Some(launcher)) if root == launcher => format!(
                "Installed {} to {}",
                self.app_name,
                launcher.display()
            ),
            (Some(root), Some(launcher)) => format!(
                "Installed {} to {}; launcher: {}",
                self.app_name,
                root.display(),
                launcher.display()
            ),
            (Some(root), None) => format!(
                "Installed {} to {}; no launcher created",
                self.app_name,
                root.display()
            ),
            (None, _) => format!("Installed {} with the system package manager", self.app_name),
        }
    }
}

/// One interactive install run: dispatches on the artifact kind and walks the
/// matching branch to completion.
pub struct InstallSession<'a> {
    layout: &'a InstallLayout,
    config: &'a InstallerConfig,
    tools: &'a dyn Toolbox,
    prompter: &'a mut dyn Prompter,
}

impl<'a> InstallSession<'a> {
    pub fn new(
        layout: &'a InstallLayout,
        config: &'a InstallerConfig,
        tools: &'a dyn Toolbox,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            layout,
            config,
            tools,
            prompter,
        }
    }

    pub fn install(&mut self, artifact: &Artifact) -> Result<InstallOutcome> {
        info!(
            artifact = %artifact.path.display(),
            kind = artifact.kind.as_str(),
            "installing artifact"
        );
        match artifact.kind {
            ArtifactKind::Deb => self.install_deb_package(artifact),
            ArtifactKind::AppImage => self.install_appimage(artifact),
            ArtifactKind::Archive(format) => self.install_archive(artifact, format),
            ArtifactKind::Binary => self.install_binary(artifact),
        }
    }

    fn install_deb_package(&mut self, artifact: &Artifact) -> Result<InstallOutcome> {
        install_deb(self.tools, &artifact.path, &self.config.tools.elevation)?;
        Ok(InstallOutcome::new(artifact.kind, artifact.base_name.as_str()))
    }

    fn install_appimage(&mut self, artifact: &Artifact) -> Result<InstallOutcome> {
        let app_name = self.ask_app_name(&artifact.base_name)?;
        self.layout.ensure_base_dirs()?;

        let install_dir = self.layout.install_dir(&app_name);
        prepare_install_dir(self.prompter, &install_dir)?;
        let executable = install_dir.join(format!("{app_name}.AppImage"));
        fs::copy(&artifact.path, &executable).with_context(|| {
            format!(
                "failed to copy {} to {}",
                artifact.path.display(),
                executable.display()
            )
        })?;

        let mut outcome = InstallOutcome::new(artifact.kind, app_name);
        outcome.install_root = Some(install_dir);
        self.expose(&mut outcome, executable)?;
        Ok(outcome)
    }

    fn install_archive(
        &mut self,
        artifact: &Artifact,
        format: ArchiveFormat,
    ) -> Result<InstallOutcome> {
        let app_name = self.ask_app_name(&artifact.base_name)?;
        self.layout.ensure_base_dirs()?;

        let install_dir = self.layout.install_dir(&app_name);
        stage_archive(
            self.layout,
            self.tools,
            self.prompter,
            &artifact.path,
            format,
            &install_dir,
        )?;

        let executable = resolve_executable(self.prompter, &install_dir, self.config.prompts)?;
        let mut outcome = InstallOutcome::new(artifact.kind, app_name);
        outcome.install_root = Some(install_dir);
        if let Some(executable) = executable {
            self.expose(&mut outcome, executable)?;
        }
        Ok(outcome)
    }

    fn install_binary(&mut self, artifact: &Artifact) -> Result<InstallOutcome> {
        let app_name = self.ask_app_name(&artifact.base_name)?;
        self.layout.ensure_base_dirs()?;

        let binary = install_binary_copy(self.layout, &app_name, &artifact.path)?;
        let mut outcome = InstallOutcome::new(artifact.kind, app_name);
        outcome.install_root = Some(binary.clone());
        outcome.executable = Some(binary.clone());
        outcome.launcher = Some(binary.clone());
        self.register(&mut outcome, &binary)?;
        Ok(outcome)
    }

    /// Marks `executable`, links it into the bin directory and registers the
    /// desktop entry.
    fn expose(&mut self, outcome: &mut InstallOutcome, executable: PathBuf) -> Result<()> {
        if !executable.is_file() {
            return Err(InstallError::ExecutableNotFound { path: executable }.into());
        }
        mark_executable(&executable)?;
        let launcher = expose_launcher(self.layout, &outcome.app_name, &executable)?;
        outcome.launcher = Some(launcher);
        self.register(outcome, &executable)?;
        outcome.executable = Some(executable);
        Ok(())
    }

    fn register(&mut self, outcome: &mut InstallOutcome, exec: &Path) -> Result<()> {
        let request = IconRequest {
            app_name: &outcome.app_name,
            fallback_extension: &self.config.icons.fallback_extension,
            policy: self.config.prompts,
        };
        let icon = resolve_icon(self.layout, self.tools, self.prompter, &request)?;
        let comment = self.prompter.ask("Comment (optional):")?;

        let entry = DesktopEntry {
            name: outcome.app_name.clone(),
            exec: exec.to_path_buf(),
            icon: icon.clone(),
            comment: Some(comment).filter(|value| !value.is_empty()),
            category: self.config.desktop.category.clone(),
            terminal: self.config.desktop.terminal,
        };
        outcome.desktop_entry = Some(write_desktop_entry(
            self.layout,
            &outcome.app_name,
            &entry,
        )?);
        outcome.icon = icon;
        Ok(())
    }

    fn ask_app_name(&mut self, default: &str) -> Result<String> {
        let answer = self.prompter.ask(&format!("App name [{default}]:"))?;
        let name = if answer.is_empty() {
            default.to_string()
        } else {
            answer
        };
        if name.is_empty() || name == "." || name == ".." || name.contains('/') {
            return Err(InstallError::InvalidAppName { name }.into());
        }
        Ok(name)
    }
}
