use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use crate::tools::{require_tool, Toolbox};

/// Resolved programs for the Debian branch.
pub(crate) struct DebTools {
    elevation: Option<PathBuf>,
    dpkg: PathBuf,
    apt_get: PathBuf,
}

impl DebTools {
    /// All tools are checked before anything runs. An empty `elevation` means
    /// the package manager is invoked directly.
    pub(crate) fn locate(tools: &dyn Toolbox, elevation: &str) -> Result<Self> {
        let elevation = match elevation.trim() {
            "" => None,
            tool => Some(require_tool(
                tools,
                tool,
                "elevating privileges for the package manager",
            )?),
        };
        Ok(Self {
            elevation,
            dpkg: require_tool(tools, "dpkg", "installing Debian packages")?,
            apt_get: require_tool(tools, "apt-get", "repairing package dependencies")?,
        })
    }

    fn command(&self, program: &Path) -> Command {
        match &self.elevation {
            Some(elevation) => {
                let mut command = Command::new(elevation);
                command.arg(program);
                command
            }
            None => Command::new(program),
        }
    }

    pub(crate) fn install_command(&self, package: &Path) -> Command {
        let mut command = self.command(&self.dpkg);
        command.arg("-i").arg(package);
        command
    }

    pub(crate) fn repair_command(&self) -> Command {
        let mut command = self.command(&self.apt_get);
        command.arg("install").arg("-f").arg("-y");
        command
    }
}

/// Installs `package` through the system package manager. A failed install
/// gets one dependency-repair pass and one retry.
pub fn install_deb(tools: &dyn Toolbox, package: &Path, elevation: &str) -> Result<()> {
    let deb = DebTools::locate(tools, elevation)?;
    info!(package = %package.display(), "installing Debian package");

    let context = format!("failed to install {}", package.display());
    let Err(first) = tools.run(&mut deb.install_command(package), &context) else {
        return Ok(());
    };
    warn!("package install failed, repairing dependencies: {first:#}");

    tools.run(
        &mut deb.repair_command(),
        "failed to repair package dependencies",
    )?;
    tools.run(&mut deb.install_command(package), &context)
}
