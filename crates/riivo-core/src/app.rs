use crate::config::CoreConfig;
use crate::descriptor::write_descriptor;
use crate::error::{CoreError, CoreResult};
use crate::launch::{Invocation, LaunchOrchestrator, LaunchOutcome};
use crate::model::{GameDirectory, ParsedOption, Preset};
use crate::presets::PresetStore;
use crate::registry::{DirectoryRef, DirectoryRegistry};
use crate::resolver::{BindTarget, SelectionResolver};
use crate::settings::SettingsStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Command surface over the stores. Every method is one atomic command;
/// callers re-fetch with the `get_*` methods after mutating.
#[derive(Clone)]
pub struct Riivo {
    presets: Arc<PresetStore>,
    dirs: Arc<DirectoryRegistry>,
    settings: Arc<SettingsStore>,
    resolver: SelectionResolver,
    launcher: LaunchOrchestrator,
}

impl Riivo {
    pub fn open(cfg: &CoreConfig) -> CoreResult<Self> {
        info!(data_dir = %cfg.data_dir().display(), "opening stores");
        let presets = Arc::new(PresetStore::open(cfg.presets_path())?);
        let dirs = Arc::new(DirectoryRegistry::open(cfg.gamedirs_path())?);
        let settings = Arc::new(SettingsStore::open(cfg.settings_path())?);
        Ok(Self::from_parts(presets, dirs, settings))
    }

    pub fn from_parts(
        presets: Arc<PresetStore>,
        dirs: Arc<DirectoryRegistry>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        let resolver = SelectionResolver::new(presets.clone(), dirs.clone());
        let launcher = LaunchOrchestrator::new(presets.clone(), dirs.clone(), settings.clone());
        Self {
            presets,
            dirs,
            settings,
            resolver,
            launcher,
        }
    }

    pub fn create_preset(
        &self,
        name: &str,
        source_descriptor_path: impl AsRef<Path>,
        section_name: &str,
        options: Vec<ParsedOption>,
    ) -> CoreResult<Preset> {
        self.presets
            .create_with_section(name, source_descriptor_path, section_name, options)
    }

    pub fn get_presets(&self) -> Vec<Preset> {
        self.presets.list()
    }

    pub fn get_preset(&self, id: &str) -> CoreResult<Preset> {
        self.presets
            .get(id)
            .ok_or_else(|| CoreError::preset_not_found(id))
    }

    pub fn remove_preset(&self, id: &str) -> CoreResult<()> {
        self.presets.remove(id).map(|_| ())
    }

    pub fn set_selection(&self, id: &str, option_name: &str, value: &str) -> CoreResult<()> {
        self.resolver.set_selection(id, option_name, value)
    }

    pub fn run_game(&self, id: &str) -> CoreResult<LaunchOutcome> {
        self.launcher.launch(id)
    }

    pub fn plan_game(&self, id: &str) -> CoreResult<Invocation> {
        self.launcher.plan(id)
    }

    pub fn create_gamedir(&self, name: &str, path: impl AsRef<Path>) -> CoreResult<GameDirectory> {
        self.dirs.create(name, path)
    }

    pub fn get_gamedirs(&self) -> Vec<GameDirectory> {
        self.dirs.list()
    }

    pub fn remove_gamedir(&self, target: &DirectoryRef) -> CoreResult<()> {
        self.dirs.remove(target).map(|_| ())
    }

    pub fn set_game_path(&self, id: &str, target: BindTarget) -> CoreResult<()> {
        self.resolver.bind(id, target)
    }

    pub fn get_path_name(&self, id: &str) -> Option<String> {
        self.presets.get_bound_directory_name(id, &self.dirs)
    }

    pub fn set_dolph_path(&self, path: &str) -> CoreResult<()> {
        self.settings.set_emulator_path(path)
    }

    pub fn get_dolph_path(&self) -> String {
        self.settings.emulator_path()
    }

    pub fn export_descriptor(&self, id: &str, out_dir: &Path) -> CoreResult<PathBuf> {
        let preset = self.get_preset(id)?;
        let dir = preset
            .bound_directory
            .as_deref()
            .and_then(|dir_id| self.dirs.get(dir_id))
            .ok_or_else(|| CoreError::UnboundPath(preset.name.clone()))?;
        write_descriptor(&preset, &dir.path, out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn commands_share_state_across_reopen() {
        let tmp = tempdir().expect("temp dir");
        let cfg = CoreConfig::default().with_data_dir(tmp.path());
        let preset_id = {
            let app = Riivo::open(&cfg).unwrap();
            let preset = app
                .create_preset(
                    "Mario Kart",
                    "/mods/riivolution/mkw.xml",
                    "Main",
                    vec![ParsedOption::new("Tracks", ["Disabled", "Custom"])],
                )
                .unwrap();
            app.set_game_path(&preset.id, BindTarget::Path("/games/mkw.iso".into()))
                .unwrap();
            app.set_selection(&preset.id, "Tracks", "Custom").unwrap();
            app.set_dolph_path("/usr/bin/dolphin-emu").unwrap();
            preset.id
        };

        let app = Riivo::open(&cfg).unwrap();
        assert_eq!(app.get_dolph_path(), "/usr/bin/dolphin-emu");
        assert_eq!(app.get_path_name(&preset_id).as_deref(), Some("mkw.iso"));
        let plan = app.plan_game(&preset_id).unwrap();
        assert_eq!(plan.game_path, PathBuf::from("/games/mkw.iso"));
        assert_eq!(plan.options, vec!["Tracks=Custom".to_string()]);
    }

    #[test]
    fn run_game_without_binding_is_unbound() {
        let tmp = tempdir().expect("temp dir");
        let app = Riivo::open(&CoreConfig::default().with_data_dir(tmp.path())).unwrap();
        let preset = app.create_preset("P", "/mods/riivolution/a.xml", "", vec![]).unwrap();
        app.set_dolph_path("/usr/bin/dolphin-emu").unwrap();
        assert_eq!(app.run_game(&preset.id).unwrap_err().kind(), ErrorKind::UnboundPath);
    }

    #[test]
    fn export_descriptor_uses_bound_directory() {
        let tmp = tempdir().expect("temp dir");
        let cfg = CoreConfig::default().with_data_dir(tmp.path().join("data"));
        let app = Riivo::open(&cfg).unwrap();
        let preset = app
            .create_preset(
                "MKW",
                "/mods/riivolution/mkw.xml",
                "Main",
                vec![ParsedOption::new("Tracks", ["Disabled", "Custom"])],
            )
            .unwrap();
        let out = tmp.path().join("out");
        assert_eq!(
            app.export_descriptor(&preset.id, &out).unwrap_err().kind(),
            ErrorKind::UnboundPath
        );
        let dir = app.create_gamedir("Wii", "/games/mkw.iso").unwrap();
        app.set_game_path(&preset.id, BindTarget::Id(dir.id)).unwrap();
        let path = app.export_descriptor(&preset.id, &out).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["base-file"], "/games/mkw.iso");
    }
}
