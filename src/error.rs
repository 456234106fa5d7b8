use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Spark home directory not found: {0}")]
    LauncherHomeMissing(PathBuf),

    #[error("spark-submit binary not found: {0}")]
    LauncherMissing(PathBuf),

    #[error("Directory for spark configuration presets not found: {0}")]
    ConfigDirMissing(PathBuf),

    #[error("Error reading preset directory {path}: {source}")]
    ConfigDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No presets found, please add some presets to the preset directory: {0}")]
    NoPresetsFound(PathBuf),

    #[error("preset not found: {0}")]
    PresetNotFound(String),

    #[error("Retries exceeded after {attempts} attempts")]
    RetriesExceeded { attempts: u32 },

    #[error("Launcher error: {0}")]
    Launch(#[from] LaunchError),
}

/// Failure of a single launcher invocation.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Failed to start launcher: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to collect launcher output: {0}")]
    Io(#[source] std::io::Error),

    #[error("Launcher exited unsuccessfully (exit code: {0:?})")]
    ExitStatus(Option<i32>),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
