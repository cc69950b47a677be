mod archive;
mod config;

pub use archive::{ArchiveFormat, ArtifactKind};
pub use config::{
    default_config_path, DesktopConfig, IconsConfig, InstallerConfig, PathsConfig, PromptPolicy,
    ToolsConfig, CONFIG_ENV,
};
