use crate::error::CoreResult;
use crate::presets::PresetStore;
use crate::registry::{DirectoryRef, DirectoryRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindTarget {
    /// Registry id, stored as-is.
    Id(String),
    /// Raw game path; resolved to a registry entry, created if missing.
    Path(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SetSelection {
        preset_id: String,
        option: String,
        value: String,
    },
    BindDirectory {
        preset_id: String,
        target: BindTarget,
    },
}

impl Intent {
    fn preset_id(&self) -> &str {
        match self {
            Intent::SetSelection { preset_id, .. } | Intent::BindDirectory { preset_id, .. } => {
                preset_id
            }
        }
    }
}

/// Single entry point for per-preset edits. Each intent maps onto exactly
/// one store mutation, which either commits durably or leaves state as it was.
#[derive(Clone)]
pub struct SelectionResolver {
    presets: Arc<PresetStore>,
    dirs: Arc<DirectoryRegistry>,
}

impl SelectionResolver {
    pub fn new(presets: Arc<PresetStore>, dirs: Arc<DirectoryRegistry>) -> Self {
        Self { presets, dirs }
    }

    pub fn apply(&self, intent: Intent) -> CoreResult<()> {
        let preset_id = intent.preset_id().to_string();
        let result = match intent {
            Intent::SetSelection {
                preset_id,
                option,
                value,
            } => self.presets.set_selection(&preset_id, &option, &value),
            Intent::BindDirectory { preset_id, target } => self.bind(&preset_id, target),
        };
        if let Err(e) = &result {
            warn!(preset_id = %preset_id, kind = %e.kind(), error = %e, "intent rejected");
        }
        result
    }

    pub fn set_selection(&self, preset_id: &str, option: &str, value: &str) -> CoreResult<()> {
        self.apply(Intent::SetSelection {
            preset_id: preset_id.to_string(),
            option: option.to_string(),
            value: value.to_string(),
        })
    }

    pub fn bind(&self, preset_id: &str, target: BindTarget) -> CoreResult<()> {
        match target {
            BindTarget::Id(id) => self.presets.bind_directory(preset_id, &id),
            BindTarget::Path(path) => {
                // Resolved under the preset lock: a concurrent remove either
                // lands before (nothing is registered) or after the bind.
                self.presets.bind_resolved(
                    preset_id,
                    || {
                        let (dir, created) = self.dirs.ensure_for_path(&path)?;
                        Ok((dir.id, created))
                    },
                    |directory_id| {
                        let target = DirectoryRef::Id(directory_id.to_string());
                        if let Err(e) = self.dirs.remove(&target) {
                            warn!(
                                directory_id,
                                error = %e,
                                "failed to drop game dir after bind failure"
                            );
                        }
                    },
                )?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::ParsedOption;
    use tempfile::{tempdir, TempDir};

    fn setup(tmp: &TempDir) -> (SelectionResolver, Arc<PresetStore>, Arc<DirectoryRegistry>) {
        let presets = Arc::new(PresetStore::open(tmp.path().join("presets.json")).unwrap());
        let dirs = Arc::new(DirectoryRegistry::open(tmp.path().join("gamedirs.json")).unwrap());
        (
            SelectionResolver::new(presets.clone(), dirs.clone()),
            presets,
            dirs,
        )
    }

    #[test]
    fn failed_selection_changes_nothing() {
        let tmp = tempdir().expect("temp dir");
        let (resolver, presets, _) = setup(&tmp);
        let preset = presets
            .create(
                "Test",
                "/riivolution/a.xml",
                vec![ParsedOption::new("Resolution", ["720p", "1080p", "4K"])],
            )
            .unwrap();
        let on_disk_before = std::fs::read_to_string(tmp.path().join("presets.json")).unwrap();

        let err = resolver.set_selection(&preset.id, "Resolution", "8K").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidChoice);
        assert_eq!(presets.get(&preset.id).unwrap(), preset);
        let on_disk_after = std::fs::read_to_string(tmp.path().join("presets.json")).unwrap();
        assert_eq!(on_disk_before, on_disk_after);
    }

    #[test]
    fn bind_by_path_registers_directory_once() {
        let tmp = tempdir().expect("temp dir");
        let (resolver, presets, dirs) = setup(&tmp);
        let a = presets.create("A", "/riivolution/a.xml", vec![]).unwrap();
        let b = presets.create("B", "/riivolution/b.xml", vec![]).unwrap();

        resolver.bind(&a.id, BindTarget::Path("/games/mkw.iso".into())).unwrap();
        resolver.bind(&b.id, BindTarget::Path("/games/mkw.iso".into())).unwrap();

        assert_eq!(dirs.list().len(), 1);
        let dir = &dirs.list()[0];
        assert_eq!(dir.name, "mkw.iso");
        assert_eq!(presets.get(&a.id).unwrap().bound_directory.as_deref(), Some(dir.id.as_str()));
        assert_eq!(presets.get(&b.id).unwrap().bound_directory.as_deref(), Some(dir.id.as_str()));
    }

    #[test]
    fn bind_by_path_to_unknown_preset_creates_no_directory() {
        let tmp = tempdir().expect("temp dir");
        let (resolver, _, dirs) = setup(&tmp);
        let err = resolver
            .apply(Intent::BindDirectory {
                preset_id: "missing".to_string(),
                target: BindTarget::Path("/games/mkw.iso".into()),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(dirs.list().is_empty());
    }

    #[test]
    fn bind_by_path_racing_preset_removal_leaves_no_stray_directory() {
        let tmp = tempdir().expect("temp dir");
        let (resolver, presets, dirs) = setup(&tmp);

        for round in 0..25 {
            let preset = presets.create("Racing", "/riivolution/a.xml", vec![]).unwrap();
            let path = PathBuf::from(format!("/games/race-{round}.iso"));

            let remover = {
                let presets = presets.clone();
                let id = preset.id.clone();
                std::thread::spawn(move || presets.remove(&id))
            };
            let bound = resolver.bind(&preset.id, BindTarget::Path(path.clone()));
            remover.join().unwrap().unwrap();

            match bound {
                Ok(()) => assert!(dirs.find_by_path(&path).is_some()),
                Err(e) => {
                    assert_eq!(e.kind(), ErrorKind::NotFound);
                    assert!(dirs.find_by_path(&path).is_none(), "round {round}");
                }
            }
        }
    }

    #[test]
    fn bind_by_path_drops_new_directory_when_binding_cannot_be_saved() {
        let tmp = tempdir().expect("temp dir");
        let (resolver, presets, dirs) = setup(&tmp);
        let reused = dirs.create("Mario Kart", "/games/mkw.iso").unwrap();
        let preset = presets.create("A", "/riivolution/a.xml", vec![]).unwrap();

        // A directory in place of presets.json makes the next save fail.
        let presets_file = tmp.path().join("presets.json");
        std::fs::remove_file(&presets_file).unwrap();
        std::fs::create_dir(&presets_file).unwrap();

        let err = resolver
            .bind(&preset.id, BindTarget::Path("/games/nsmb.iso".into()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(dirs.find_by_path("/games/nsmb.iso").is_none());

        // Entries that already existed are left alone.
        resolver.bind(&preset.id, BindTarget::Path("/games/mkw.iso".into())).unwrap_err();
        assert_eq!(dirs.list(), vec![reused]);
        assert!(presets.get(&preset.id).unwrap().bound_directory.is_none());
    }

    #[test]
    fn bind_by_id_is_weak() {
        let tmp = tempdir().expect("temp dir");
        let (resolver, presets, dirs) = setup(&tmp);
        let p = presets.create("A", "/riivolution/a.xml", vec![]).unwrap();
        resolver.bind(&p.id, BindTarget::Id("later".to_string())).unwrap();
        assert!(presets.get_bound_directory_name(&p.id, &dirs).is_none());
    }
}
