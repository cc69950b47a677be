use std::path::PathBuf;

use thiserror::Error;

/// Install failures callers may want to tell apart. Everything else travels as
/// plain `anyhow` context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("no artifact path given")]
    EmptyArtifactPath,

    #[error("not a regular file: {}", path.display())]
    NotARegularFile { path: PathBuf },

    #[error("required tool '{tool}' was not found on PATH ({purpose})")]
    MissingTool { tool: String, purpose: String },

    #[error("install aborted: existing directory {} was kept", path.display())]
    OverwriteDeclined { path: PathBuf },

    #[error("invalid selection '{input}': expected a number from 1 to {max}")]
    InvalidSelection { input: String, max: usize },

    #[error("executable not found: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("invalid app name '{name}'")]
    InvalidAppName { name: String },
}

/// Returns the `InstallError` carried anywhere in an error chain.
pub fn install_error(err: &anyhow::Error) -> Option<&InstallError> {
    err.chain().find_map(|cause| cause.downcast_ref::<InstallError>())
}
