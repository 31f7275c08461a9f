use crate::error::{CoreError, CoreResult};
use crate::model::{new_id, ParsedOption, Preset, PresetOption};
use crate::registry::DirectoryRegistry;
use crate::storage::JsonFile;
use chrono::Utc;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Durable, ordered collection of presets.
pub struct PresetStore {
    presets: RwLock<Vec<Preset>>,
    file: JsonFile<Vec<Preset>>,
}

impl PresetStore {
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let file = JsonFile::new(path);
        let presets: Vec<Preset> = file.load()?;
        debug!(count = presets.len(), path = %file.path().display(), "loaded presets");
        Ok(Self {
            presets: RwLock::new(presets),
            file,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Preset>> {
        self.presets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Preset>> {
        self.presets.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Applies `f` to a copy of the preset, persists the copy, then commits
    /// it. Any error leaves both memory and disk untouched.
    fn update<R>(&self, id: &str, f: impl FnOnce(&mut Preset) -> CoreResult<R>) -> CoreResult<R> {
        let mut guard = self.write();
        let index = guard
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::preset_not_found(id))?;
        let mut next = guard.clone();
        let out = f(&mut next[index])?;
        self.file.save(&next)?;
        *guard = next;
        Ok(out)
    }

    pub fn create(
        &self,
        name: &str,
        source_descriptor_path: impl AsRef<Path>,
        parsed_options: Vec<ParsedOption>,
    ) -> CoreResult<Preset> {
        self.create_with_section(name, source_descriptor_path, "", parsed_options)
    }

    pub fn create_with_section(
        &self,
        name: &str,
        source_descriptor_path: impl AsRef<Path>,
        section_name: &str,
        parsed_options: Vec<ParsedOption>,
    ) -> CoreResult<Preset> {
        let source = source_descriptor_path.as_ref();
        if source.as_os_str().is_empty() || source.to_string_lossy().trim().is_empty() {
            return Err(CoreError::MissingSource);
        }
        let mut seen = HashSet::new();
        for opt in &parsed_options {
            if !seen.insert(opt.name.as_str()) {
                return Err(CoreError::DuplicateName(format!("option {}", opt.name)));
            }
        }

        let mut guard = self.write();
        let preset = Preset {
            id: new_id(|id| guard.iter().any(|p| p.id == id)),
            name: name.to_string(),
            created_at: Utc::now(),
            source_descriptor_path: source.to_path_buf(),
            section_name: section_name.to_string(),
            options: parsed_options.into_iter().map(PresetOption::from_parsed).collect(),
            bound_directory: None,
        };
        let mut next = guard.clone();
        next.push(preset.clone());
        self.file.save(&next)?;
        *guard = next;
        info!(
            id = %preset.id,
            name = %preset.name,
            options = preset.options.len(),
            "preset created"
        );
        Ok(preset)
    }

    pub fn list(&self) -> Vec<Preset> {
        self.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<Preset> {
        self.read().iter().find(|p| p.id == id).cloned()
    }

    pub fn remove(&self, id: &str) -> CoreResult<Preset> {
        let mut guard = self.write();
        let index = guard
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::preset_not_found(id))?;
        let mut next = guard.clone();
        let removed = next.remove(index);
        self.file.save(&next)?;
        *guard = next;
        info!(id = %removed.id, name = %removed.name, "preset removed");
        Ok(removed)
    }

    pub fn set_selection(&self, id: &str, option_name: &str, value: &str) -> CoreResult<()> {
        self.update(id, |preset| {
            let option = preset.option_mut(option_name).ok_or_else(|| {
                CoreError::NotFound(format!("option {option_name} on preset {id}"))
            })?;
            if !option.has_choice(value) {
                return Err(CoreError::InvalidChoice {
                    option: option_name.to_string(),
                    value: value.to_string(),
                });
            }
            option.selected = value.to_string();
            Ok(())
        })?;
        info!(id, option = option_name, value, "selection changed");
        Ok(())
    }

    /// Stores `directory_id` without checking the registry; it is resolved
    /// lazily on read and launch.
    pub fn bind_directory(&self, id: &str, directory_id: &str) -> CoreResult<()> {
        self.update(id, |preset| {
            preset.bound_directory = Some(directory_id.to_string());
            Ok(())
        })?;
        info!(id, directory_id, "preset bound to game dir");
        Ok(())
    }

    /// Binds the preset to the directory id produced by `resolve`, which runs
    /// under this store's write lock once the preset is known to exist. The
    /// flag returned by `resolve` marks an entry created for this bind; when
    /// the binding cannot be persisted, `rollback` gets that id before the
    /// lock is released.
    pub(crate) fn bind_resolved(
        &self,
        id: &str,
        resolve: impl FnOnce() -> CoreResult<(String, bool)>,
        rollback: impl FnOnce(&str),
    ) -> CoreResult<String> {
        let mut guard = self.write();
        let index = guard
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| CoreError::preset_not_found(id))?;
        let (directory_id, created) = resolve()?;
        let mut next = guard.clone();
        next[index].bound_directory = Some(directory_id.clone());
        if let Err(e) = self.file.save(&next) {
            if created {
                rollback(&directory_id);
            }
            return Err(e);
        }
        *guard = next;
        info!(id, directory_id = %directory_id, "preset bound to game dir");
        Ok(directory_id)
    }

    pub fn unbind_directory(&self, id: &str) -> CoreResult<()> {
        self.update(id, |preset| {
            preset.bound_directory = None;
            Ok(())
        })?;
        info!(id, "preset unbound");
        Ok(())
    }

    pub fn get_bound_directory_name(
        &self,
        id: &str,
        registry: &DirectoryRegistry,
    ) -> Option<String> {
        let dir_id = self.read().iter().find(|p| p.id == id)?.bound_directory.clone()?;
        let name = registry.resolve_name(&dir_id);
        if name.is_none() {
            warn!(id, directory_id = %dir_id, "bound game dir no longer exists");
        }
        name
    }
}
