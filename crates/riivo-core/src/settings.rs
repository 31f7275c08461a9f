use crate::config::GlobalSettings;
use crate::error::CoreResult;
use crate::storage::JsonFile;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::info;

pub struct SettingsStore {
    settings: RwLock<GlobalSettings>,
    file: JsonFile<GlobalSettings>,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let file = JsonFile::new(path);
        let settings = file.load()?;
        Ok(Self {
            settings: RwLock::new(settings),
            file,
        })
    }

    pub fn snapshot(&self) -> GlobalSettings {
        self.settings.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn emulator_path(&self) -> String {
        self.snapshot().emulator_binary_path
    }

    /// No validation here; emptiness is checked when launching.
    pub fn set_emulator_path(&self, path: &str) -> CoreResult<()> {
        let mut guard = self.settings.write().unwrap_or_else(|e| e.into_inner());
        let mut next = guard.clone();
        next.emulator_binary_path = path.to_string();
        self.file.save(&next)?;
        *guard = next;
        info!(path, "emulator path set");
        Ok(())
    }
}
