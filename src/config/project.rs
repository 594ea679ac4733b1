use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::TranslateOptions;
use crate::error::TranslateError;

/// Name of the per-project configuration file.
pub const CONFIG_FILE: &str = "cudacl.toml";

/// Project configuration from cudacl.toml.
#[derive(Clone, Debug)]
pub struct Project {
    /// The configuration file this was loaded from.
    pub path: PathBuf,
    pub root_dir: PathBuf,
    /// Contents of the `[translate]` table, defaults filled in.
    pub options: TranslateOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    translate: TranslateOptions,
}

impl Project {
    /// Load project configuration from a cudacl.toml file.
    pub fn load(toml_path: &Path) -> Result<Project, TranslateError> {
        let content = std::fs::read_to_string(toml_path).map_err(|source| TranslateError::Io {
            path: toml_path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&content).map_err(|e| TranslateError::Config {
            path: toml_path.to_path_buf(),
            message: e.message().to_string(),
        })?;
        if file.translate.entry_point.is_empty() {
            return Err(TranslateError::Config {
                path: toml_path.to_path_buf(),
                message: "'entry_point' must not be empty".to_string(),
            });
        }
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Ok(Project {
            path: toml_path.to_path_buf(),
            root_dir,
            options: file.translate,
        })
    }

    /// Try to find a cudacl.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }
}
