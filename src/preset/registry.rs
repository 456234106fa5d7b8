use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use super::Preset;
use crate::error::{GatewayError, Result};

/// File suffix of preset documents.
pub const PRESET_SUFFIX: &str = ".yaml";

/// Read-only mapping from preset name to [`Preset`].
///
/// Built once at startup and never mutated afterwards, so it can be shared
/// across request handlers without locking.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: HashMap<String, Preset>,
}

impl PresetRegistry {
    /// Scan `dir` (non-recursively) for `*.yaml` documents.
    ///
    /// Files are processed in name order. Unreadable or invalid documents are
    /// skipped with a log line; only directory-level problems and an empty
    /// result are errors.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ConfigDirMissing`] if `dir` does not exist
    /// - [`GatewayError::ConfigDirUnreadable`] if it cannot be listed
    /// - [`GatewayError::NoPresetsFound`] if no valid preset was found
    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let unreadable = |source| GatewayError::ConfigDirUnreadable {
            path: dir.to_path_buf(),
            source,
        };

        match fs::metadata(dir).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(GatewayError::ConfigDirMissing(dir.to_path_buf()));
            }
            Err(e) => return Err(unreadable(e)),
        }

        let mut entries = fs::read_dir(dir).await.map_err(unreadable)?;
        let mut candidates: Vec<(String, PathBuf)> = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(name) = preset_name(&file_name) else {
                continue;
            };
            candidates.push((name.to_string(), entry.path()));
        }
        candidates.sort();

        let mut presets = HashMap::new();
        for (name, path) in candidates {
            match fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Error reading preset");
                    continue;
                }
            }

            let raw = match fs::read_to_string(&path).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Error reading preset");
                    continue;
                }
            };

            match Preset::from_yaml(name.clone(), &raw) {
                Ok(preset) => {
                    tracing::debug!(preset = %name, "Loaded preset");
                    presets.insert(name, preset);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Couldn't parse preset");
                }
            }
        }

        if presets.is_empty() {
            return Err(GatewayError::NoPresetsFound(dir.to_path_buf()));
        }
        tracing::info!(preset_count = presets.len(), "Presets initialized");

        Ok(Self { presets })
    }

    /// Build a registry from already parsed presets, keyed by their names.
    pub fn from_presets(presets: impl IntoIterator<Item = Preset>) -> Self {
        Self {
            presets: presets
                .into_iter()
                .map(|preset| (preset.name.clone(), preset))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Preset> {
        self.presets
            .get(name)
            .ok_or_else(|| GatewayError::PresetNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Registered preset names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn preset_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(PRESET_SUFFIX)
        .filter(|name| !name.is_empty())
}
