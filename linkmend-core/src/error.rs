use camino::Utf8PathBuf;
use thiserror::Error;

/// A version-control query could not be answered. Fatal to the run.
#[derive(Debug, Error)]
pub enum RepositoryAccessError {
    #[error("failed to run `git {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {command}` failed in {cwd}: {stderr}")]
    Failed {
        command: String,
        cwd: Utf8PathBuf,
        stderr: String,
    },

    #[error("`git {command}` returned a non UTF-8 path")]
    NonUtf8Path { command: String },
}

/// Error type for pipeline results. Always exit code 1.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Repository(#[from] RepositoryAccessError),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}
