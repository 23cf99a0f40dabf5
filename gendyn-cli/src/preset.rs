//! Voice presets: `GendySettings` stored as TOML.

use std::path::{Path, PathBuf};

use gendyn_engine::GendySettings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("cannot read preset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write preset {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid preset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize preset: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load a preset; missing fields take their defaults, every value is clamped.
pub fn load(path: &Path) -> Result<GendySettings, PresetError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| PresetError::Read { path: path.to_path_buf(), source })?;
    let settings: GendySettings = toml::from_str(&text)
        .map_err(|source| PresetError::Parse { path: path.to_path_buf(), source })?;
    tracing::debug!(path = %path.display(), ?settings, "preset loaded");
    Ok(settings.clamped())
}

/// Write `settings` as pretty TOML.
pub fn save(path: &Path, settings: &GendySettings) -> Result<(), PresetError> {
    let text = toml::to_string_pretty(settings)?;
    std::fs::write(path, text)
        .map_err(|source| PresetError::Write { path: path.to_path_buf(), source })
}
