mod deb;
mod desktop;
mod error;
mod icon;
mod input;
mod install;
mod layout;
mod link;
mod locate;
mod prompt;
mod stage;
mod tools;

pub use deb::install_deb;
pub use desktop::{render_desktop_entry, write_desktop_entry, DesktopEntry};
pub use error::{install_error, InstallError};
pub use icon::{download_icon, icon_extension_from_url, resolve_icon, IconRequest};
pub use input::{resolve_artifact, Artifact};
pub use install::{InstallOutcome, InstallSession};
pub use layout::{default_user_home, InstallLayout};
pub use link::{expose_launcher, install_binary_copy, mark_executable};
pub use locate::{
    find_executables, prompt_executable_path, resolve_executable, select_executable,
    ExecutableChoice,
};
pub use prompt::{confirm, LinePrompter, Prompter};
pub use stage::{
    build_extract_command, effective_source_root, extract_archive, prepare_install_dir,
    stage_archive,
};
pub use tools::{require_tool, run_command, SystemToolbox, Toolbox};
