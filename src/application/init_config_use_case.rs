// ============================================================
// Layer 2 — Init Config Use Case
// ============================================================
use anyhow::{bail, Result};

use crate::infra::config_store::ConfigStore;
use crate::ml::model::ReaderConfig;

pub struct InitConfigUseCase {
    store: ConfigStore,
    force: bool,
}

impl InitConfigUseCase {
    pub fn new(store: ConfigStore, force: bool) -> Self {
        Self { store, force }
    }

    pub fn execute(&self, cfg: &ReaderConfig) -> Result<()> {
        if self.store.exists() && !self.force {
            bail!(
                "'{}' already exists, pass --force to overwrite it",
                self.store.path().display()
            );
        }

        self.store.save(cfg)?;
        tracing::info!(
            "Wrote reader config to '{}' (vocab {}, hidden {}, {} cells)",
            self.store.path().display(),
            cfg.vocab_size,
            cfg.hidden_size,
            cfg.rnn_type
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fusionnet-init-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let path = temp_path("existing.json");
        fs::write(&path, "{}").unwrap();

        let result = InitConfigUseCase::new(ConfigStore::new(path.clone()), false)
            .execute(&ReaderConfig::new(100));
        let untouched = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        assert!(result.is_err());
        assert_eq!(untouched, "{}");
    }

    #[test]
    fn test_force_overwrites() {
        let path = temp_path("forced.json");
        fs::write(&path, "{}").unwrap();

        InitConfigUseCase::new(ConfigStore::new(path.clone()), true)
            .execute(&ReaderConfig::new(100))
            .unwrap();
        let loaded = ConfigStore::new(path.clone()).load().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.vocab_size, 100);
    }
}
