use crate::error::{CoreError, CoreResult};
use crate::model::{new_id, GameDirectory};
use crate::storage::JsonFile;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// How a caller points at a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryRef {
    Index(usize),
    Id(String),
}

/// Catalogue of named game paths, independent of presets.
pub struct DirectoryRegistry {
    dirs: RwLock<Vec<GameDirectory>>,
    file: JsonFile<Vec<GameDirectory>>,
}

impl DirectoryRegistry {
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let file = JsonFile::new(path);
        let dirs: Vec<GameDirectory> = file.load()?;
        debug!(count = dirs.len(), path = %file.path().display(), "loaded game dirs");
        Ok(Self {
            dirs: RwLock::new(dirs),
            file,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<GameDirectory>> {
        self.dirs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<GameDirectory>> {
        self.dirs.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Persists `next` and only then swaps it in.
    fn commit(&self, guard: &mut Vec<GameDirectory>, next: Vec<GameDirectory>) -> CoreResult<()> {
        self.file.save(&next)?;
        *guard = next;
        Ok(())
    }

    pub fn create(&self, name: &str, path: impl AsRef<Path>) -> CoreResult<GameDirectory> {
        let path = path.as_ref();
        if name.trim().is_empty() {
            return Err(CoreError::InvalidName("directory name is empty".to_string()));
        }
        if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
            return Err(CoreError::InvalidPath("path is empty".to_string()));
        }

        let mut guard = self.write();
        if guard.iter().any(|d| d.name == name) {
            return Err(CoreError::DuplicateName(name.to_string()));
        }
        if guard.iter().any(|d| d.path == path) {
            return Err(CoreError::DuplicatePath(path.display().to_string()));
        }

        let dir = GameDirectory {
            id: new_id(|id| guard.iter().any(|d| d.id == id)),
            name: name.to_string(),
            path: path.to_path_buf(),
        };
        let mut next = guard.clone();
        next.push(dir.clone());
        self.commit(&mut guard, next)?;
        info!(id = %dir.id, name = %dir.name, path = %dir.path.display(), "game dir created");
        Ok(dir)
    }

    pub fn list(&self) -> Vec<GameDirectory> {
        self.read().clone()
    }

    pub fn remove(&self, target: &DirectoryRef) -> CoreResult<GameDirectory> {
        let mut guard = self.write();
        let index = match target {
            DirectoryRef::Index(i) if *i < guard.len() => *i,
            DirectoryRef::Index(i) => {
                return Err(CoreError::NotFound(format!("game dir at index {i}")))
            }
            DirectoryRef::Id(id) => guard
                .iter()
                .position(|d| d.id == *id)
                .ok_or_else(|| CoreError::NotFound(format!("game dir {id}")))?,
        };
        let mut next = guard.clone();
        let removed = next.remove(index);
        self.commit(&mut guard, next)?;
        info!(id = %removed.id, name = %removed.name, "game dir removed");
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<GameDirectory> {
        self.read().iter().find(|d| d.id == id).cloned()
    }

    pub fn resolve_name(&self, id: &str) -> Option<String> {
        self.read().iter().find(|d| d.id == id).map(|d| d.name.clone())
    }

    pub fn find_by_path(&self, path: impl AsRef<Path>) -> Option<GameDirectory> {
        let path = path.as_ref();
        self.read().iter().find(|d| d.path == path).cloned()
    }

    /// Returns the entry registering `path`, creating one named after the
    /// path's last component when there is none. The flag is true when this
    /// call created the entry.
    pub fn ensure_for_path(&self, path: impl AsRef<Path>) -> CoreResult<(GameDirectory, bool)> {
        let path = path.as_ref();
        if let Some(existing) = self.find_by_path(path) {
            return Ok((existing, false));
        }
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| path.display().to_string());

        let mut attempt = 1;
        loop {
            let name = if attempt == 1 {
                base.clone()
            } else {
                format!("{base} ({attempt})")
            };
            match self.create(&name, path) {
                Err(CoreError::DuplicateName(_)) => attempt += 1,
                // Another caller registered the same path in between.
                Err(CoreError::DuplicatePath(_)) => {
                    return self
                        .find_by_path(path)
                        .map(|dir| (dir, false))
                        .ok_or_else(|| CoreError::NotFound(path.display().to_string()))
                }
                Err(e) => return Err(e),
                Ok(dir) => return Ok((dir, true)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    fn registry(dir: &tempfile::TempDir) -> DirectoryRegistry {
        DirectoryRegistry::open(dir.path().join("gamedirs.json")).expect("open registry")
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let tmp = tempdir().expect("temp dir");
        let reg = registry(&tmp);
        reg.create("Wii Games", "/games/wii").unwrap();
        let err = reg.create("Wii Games", "/games/other").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        let named: Vec<_> = reg.list().into_iter().filter(|d| d.name == "Wii Games").collect();
        assert_eq!(named.len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let tmp = tempdir().expect("temp dir");
        let reg = registry(&tmp);
        reg.create("wii", "/a").unwrap();
        reg.create("Wii", "/b").unwrap();
        assert_eq!(reg.list().len(), 2);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        let tmp = tempdir().expect("temp dir");
        let reg = registry(&tmp);
        assert_eq!(reg.create("Games", "").unwrap_err().kind(), ErrorKind::InvalidPath);
        assert_eq!(reg.create("  ", "/games").unwrap_err().kind(), ErrorKind::InvalidName);
        assert!(reg.list().is_empty());
    }

    #[test]
    fn duplicate_path_is_rejected() {
        let tmp = tempdir().expect("temp dir");
        let reg = registry(&tmp);
        reg.create("One", "/games/mkw.iso").unwrap();
        let err = reg.create("Two", "/games/mkw.iso").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicatePath);
    }

    #[test]
    fn remove_by_index_and_id() {
        let tmp = tempdir().expect("temp dir");
        let reg = registry(&tmp);
        let a = reg.create("A", "/a").unwrap();
        let b = reg.create("B", "/b").unwrap();
        reg.remove(&DirectoryRef::Index(0)).unwrap();
        assert_eq!(reg.list(), vec![b.clone()]);
        assert!(reg.resolve_name(&a.id).is_none());

        reg.remove(&DirectoryRef::Id(b.id.clone())).unwrap();
        assert!(reg.list().is_empty());

        assert_eq!(
            reg.remove(&DirectoryRef::Index(0)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            reg.remove(&DirectoryRef::Id(b.id)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn names_stay_unique_across_create_remove_sequences() {
        let tmp = tempdir().expect("temp dir");
        let reg = registry(&tmp);
        for round in 0..4 {
            for name in ["A", "B", "A", "C", "B"] {
                let _ = reg.create(name, format!("/{round}/{name}/{}", reg.list().len()));
            }
            let _ = reg.remove(&DirectoryRef::Index(round % 3));
            let mut names: Vec<_> = reg.list().into_iter().map(|d| d.name).collect();
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total);
        }
    }

    #[test]
    fn entries_survive_reopen() {
        let tmp = tempdir().expect("temp dir");
        let created = registry(&tmp).create("Wii Games", "/games/wii").unwrap();
        let reopened = registry(&tmp);
        assert_eq!(reopened.list(), vec![created.clone()]);
        assert_eq!(reopened.resolve_name(&created.id).as_deref(), Some("Wii Games"));
    }

    #[test]
    fn ensure_for_path_reuses_or_creates() {
        let tmp = tempdir().expect("temp dir");
        let reg = registry(&tmp);
        let existing = reg.create("Mario Kart", "/games/mkw.iso").unwrap();
        assert_eq!(reg.ensure_for_path("/games/mkw.iso").unwrap(), (existing, false));

        reg.create("nsmb.iso", "/elsewhere/nsmb.iso").unwrap();
        let (created, fresh) = reg.ensure_for_path("/games/nsmb.iso").unwrap();
        assert!(fresh);
        assert_eq!(created.name, "nsmb.iso (2)");
        assert_eq!(created.path, PathBuf::from("/games/nsmb.iso"));
        assert_eq!(reg.list().len(), 3);
    }
}
