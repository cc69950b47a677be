use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use appstow_core::{default_config_path, InstallerConfig, CONFIG_ENV};
use appstow_installer::{
    default_user_home, resolve_artifact, InstallLayout, InstallSession, LinePrompter, Prompter,
    SystemToolbox,
};
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod render;

use render::{format_install_outcome_lines, ProgressToolbox, TerminalRenderer};

#[derive(Parser, Debug)]
#[command(name = "appstow")]
#[command(
    about = "Install downloaded applications into your home directory",
    long_about = None
)]
struct Cli {
    /// Artifact to install; asked for interactively when omitted.
    artifact: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `[paths].home` from the config file.
    #[arg(long)]
    home: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConfigSource {
    path: PathBuf,
    /// Explicitly named files must exist.
    required: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli)
}

fn run_cli(cli: Cli) -> Result<()> {
    let user_home = match &cli.home {
        Some(home) => home.clone(),
        None => default_user_home()?,
    };
    let source = config_source(
        cli.config.as_deref(),
        env::var_os(CONFIG_ENV),
        env::var_os("XDG_CONFIG_HOME"),
        &user_home,
    );
    debug!(path = %source.path.display(), required = source.required, "loading config");
    let mut config = InstallerConfig::load(&source.path, source.required)?;
    if let Some(home) = cli.home {
        config.paths.home = Some(home);
    }
    let layout = InstallLayout::from_config(&config, user_home);

    let renderer = TerminalRenderer::current();
    let tools = ProgressToolbox::new(&SystemToolbox, renderer.style(), &config.tools.elevation);
    let stdin = io::stdin();
    let mut prompter = LinePrompter::new(stdin.lock(), io::stdout());

    let raw = match cli.artifact {
        Some(raw) => raw,
        None => prompter.ask("Path to the file to install:")?,
    };
    let artifact = resolve_artifact(&raw, layout.home())?;
    renderer.print_status(
        "step",
        &format!(
            "installing {} ({})",
            artifact.path.display(),
            artifact.kind.as_str()
        ),
    );

    let outcome = InstallSession::new(&layout, &config, &tools, &mut prompter).install(&artifact)?;
    renderer.print_section("summary");
    renderer.print_lines(&format_install_outcome_lines(&outcome, renderer.style()));
    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for_verbosity(verbose).into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// `--config` first, then `$APPSTOW_CONFIG`, then the XDG default. Empty
/// environment values count as unset.
fn config_source(
    flag: Option<&Path>,
    env_path: Option<OsString>,
    xdg_config_home: Option<OsString>,
    home: &Path,
) -> ConfigSource {
    if let Some(path) = flag {
        return ConfigSource {
            path: path.to_path_buf(),
            required: true,
        };
    }
    if let Some(path) = env_path.filter(|value| !value.is_empty()) {
        return ConfigSource {
            path: PathBuf::from(path),
            required: true,
        };
    }

    let xdg = xdg_config_home
        .filter(|value| !value.is_empty())
        .map(PathBuf::from);
    ConfigSource {
        path: default_config_path(xdg.as_deref(), home),
        required: false,
    }
}
