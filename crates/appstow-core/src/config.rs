use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

pub const CONFIG_ENV: &str = "APPSTOW_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    pub paths: PathsConfig,
    pub desktop: DesktopConfig,
    pub icons: IconsConfig,
    pub prompts: PromptPolicy,
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub home: Option<PathBuf>,
    pub app_root: Option<PathBuf>,
    pub bin_dir: Option<PathBuf>,
    pub applications_dir: Option<PathBuf>,
    pub icons_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DesktopConfig {
    pub category: String,
    pub terminal: bool,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            category: "Utility".to_string(),
            terminal: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IconsConfig {
    pub fallback_extension: String,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            fallback_extension: "png".to_string(),
        }
    }
}

/// How many times interactive prompts may be re-asked after a failure.
///
/// `icon_attempts = None` keeps asking until the user gives up with an empty
/// answer. `selection_attempts = 1` aborts on the first invalid choice.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PromptPolicy {
    pub icon_attempts: Option<u32>,
    pub selection_attempts: u32,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            icon_attempts: None,
            selection_attempts: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    /// Privilege elevation command prefixed to package manager calls. Empty
    /// runs them directly.
    pub elevation: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            elevation: "sudo".to_string(),
        }
    }
}

impl InstallerConfig {
    pub fn from_toml_str(input: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(input).context("failed to parse appstow config")?;
        if config.prompts.selection_attempts == 0 {
            return Err(anyhow!("prompts.selection_attempts must be at least 1"));
        }
        if config.prompts.icon_attempts == Some(0) {
            return Err(anyhow!("prompts.icon_attempts must be at least 1 when set"));
        }
        if config.desktop.category.trim().is_empty() {
            return Err(anyhow!("desktop.category must not be empty"));
        }
        let extension = config.icons.fallback_extension.trim();
        if extension.is_empty() || extension.contains(['.', '/']) {
            return Err(anyhow!(
                "icons.fallback_extension must be a bare extension such as 'png': '{}'",
                config.icons.fallback_extension
            ));
        }
        Ok(config)
    }

    /// Reads `path`. A missing file is an error only when `required` is set.
    pub fn load(path: &Path, required: bool) -> anyhow::Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read config file: {}", path.display()));
            }
        };
        Self::from_toml_str(&raw)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }
}

/// Default config location under the XDG config home, falling back to
/// `~/.config`.
pub fn default_config_path(xdg_config_home: Option<&Path>, home: &Path) -> PathBuf {
    let base = match xdg_config_home {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        _ => home.join(".config"),
    };
    base.join("appstow").join("config.toml")
}
