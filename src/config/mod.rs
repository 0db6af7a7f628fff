pub mod init;

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::scoring::{ScoringSettings, SETTINGS_VERSION};

/// Get the config directory path (~/.config/carteira-score/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("carteira-score"))
}

/// Get the default settings file path (~/.config/carteira-score/settings.yaml)
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("settings.yaml"))
}

/// Load scoring settings from a YAML file
///
/// # Errors
///
/// Returns an error if:
/// - The settings file does not exist or cannot be read
/// - The YAML cannot be parsed, has unknown keys, or is missing a key
/// - The file declares an unsupported version
pub fn load_settings(path: &Path) -> Result<ScoringSettings> {
    if !path.exists() {
        anyhow::bail!("Settings file not found at {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file at {}", path.display()))?;

    let settings: ScoringSettings = serde_saphyr::from_str(&content)
        .with_context(|| format!("Failed to parse settings: invalid YAML in {}", path.display()))?;

    if settings.version != SETTINGS_VERSION {
        anyhow::bail!(
            "Unsupported settings version {} in {} (expected {})",
            settings.version,
            path.display(),
            SETTINGS_VERSION
        );
    }

    Ok(settings)
}

/// Resolve the settings to score with.
///
/// An explicit path must exist. Without one, the default path is used when
/// present and the built-in defaults otherwise.
pub fn resolve_settings(path: Option<&Path>) -> Result<ScoringSettings> {
    match path {
        Some(path) => load_settings(path),
        None => {
            let default_path = get_settings_path()?;
            if default_path.exists() {
                debug!(path = %default_path.display(), "loading settings");
                load_settings(&default_path)
            } else {
                debug!("no settings file, using built-in defaults");
                Ok(ScoringSettings::default())
            }
        }
    }
}

/// Save settings to a YAML file atomically
///
/// The file is never left half-written. Parent directories are created.
pub fn save_settings(path: &Path, settings: &ScoringSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let yaml = serde_saphyr::to_string(settings)
        .map_err(|e| anyhow::anyhow!("Failed to serialize settings: {}", e))?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .context("Failed to write settings")?;
    file.commit().context("Failed to save settings")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(resolve_settings(Some(&path)).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.yaml");

        let settings = ScoringSettings::legacy();
        save_settings(&path, &settings).unwrap();

        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_rejects_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "version: 1\ngood_behavior_discount: 0.5\n").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse settings"));
    }

    #[test]
    fn test_load_rejects_other_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let settings = ScoringSettings {
            version: 9,
            ..Default::default()
        };
        save_settings(&path, &settings).unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported settings version 9"));
    }
}
