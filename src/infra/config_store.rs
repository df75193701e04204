// ============================================================
// Layer 6 — Config Store
// ============================================================
// Saves and loads ReaderConfig as JSON.
//
//   {
//     "vocab_size": 30000,
//     "embedding_dim": 300,
//     "hidden_size": 128,
//     ...
//   }
//
// Loading validates the config so a bad file fails here rather
// than halfway through building the model.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::ReaderConfig;

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write `cfg` as pretty JSON, creating parent directories.
    pub fn save(&self, cfg: &ReaderConfig) -> Result<()> {
        cfg.validate()
            .with_context(|| "Refusing to save an invalid reader config")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Cannot write config to '{}'", self.path.display()))?;

        tracing::debug!("Saved reader config to '{}'", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<ReaderConfig> {
        let json = fs::read_to_string(&self.path)
            .with_context(|| {
                format!("Cannot read config '{}'. Run `init-config` first?", self.path.display())
            })?;

        let cfg: ReaderConfig = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse config '{}'", self.path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config in '{}'", self.path.display()))?;

        tracing::debug!("Loaded reader config from '{}'", self.path.display());
        Ok(cfg)
    }
}
