use anyhow::{Context, Result};
use appstow_core::InstallerConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Well-known per-user directories an install writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    home: PathBuf,
    app_root: PathBuf,
    bin_dir: PathBuf,
    applications_dir: PathBuf,
    icons_dir: PathBuf,
    staging_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            app_root: home.join(".local").join("opt"),
            bin_dir: home.join(".local").join("bin"),
            applications_dir: home.join(".local").join("share").join("applications"),
            icons_dir: home.join(".local").join("share").join("icons"),
            staging_dir: std::env::temp_dir(),
            home,
        }
    }

    /// Applies `[paths]` overrides on top of the layout derived from `home`.
    /// `[paths].home` wins over the `home` argument.
    pub fn from_config(config: &InstallerConfig, home: impl Into<PathBuf>) -> Self {
        let paths = &config.paths;
        let mut layout = Self::new(paths.home.clone().unwrap_or_else(|| home.into()));
        if let Some(dir) = &paths.app_root {
            layout.app_root = dir.clone();
        }
        if let Some(dir) = &paths.bin_dir {
            layout.bin_dir = dir.clone();
        }
        if let Some(dir) = &paths.applications_dir {
            layout.applications_dir = dir.clone();
        }
        if let Some(dir) = &paths.icons_dir {
            layout.icons_dir = dir.clone();
        }
        if let Some(dir) = &paths.staging_dir {
            layout.staging_dir = dir.clone();
        }
        layout
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn applications_dir(&self) -> &Path {
        &self.applications_dir
    }

    pub fn icons_dir(&self) -> &Path {
        &self.icons_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn install_dir(&self, app_name: &str) -> PathBuf {
        self.app_root.join(app_name)
    }

    pub fn launcher_path(&self, app_name: &str) -> PathBuf {
        self.bin_dir.join(app_name)
    }

    pub fn desktop_entry_path(&self, app_name: &str) -> PathBuf {
        self.applications_dir.join(format!("{app_name}.desktop"))
    }

    pub fn icon_path(&self, app_name: &str, extension: &str) -> PathBuf {
        self.icons_dir.join(format!("{app_name}.{extension}"))
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            &self.app_root,
            &self.bin_dir,
            &self.applications_dir,
            &self.icons_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn default_user_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set; cannot resolve user home")?;
    Ok(PathBuf::from(home))
}
