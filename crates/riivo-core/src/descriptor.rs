//! Dolphin `dolphin-game-mod-descriptor` export.
//!
//! Dolphin can boot a base game with riivolution patches applied when given
//! a descriptor JSON via `-e`. The patch root is the folder that contains the
//! `riivolution` directory holding the preset's source XML.

use crate::error::{CoreError, CoreResult};
use crate::model::Preset;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const DESCRIPTOR_TYPE: &str = "dolphin-game-mod-descriptor";
pub const RIIVOLUTION_DIR: &str = "riivolution";

pub fn build_descriptor(preset: &Preset, game_path: &Path) -> CoreResult<Value> {
    let options = preset
        .options
        .iter()
        .map(|o| {
            if !o.is_set() {
                return Err(CoreError::InvalidDescriptor(format!("missing choice {}", o.name)));
            }
            let idx = o.selected_index().ok_or_else(|| {
                CoreError::InvalidDescriptor(format!("invalid choice for {}", o.name))
            })?;
            Ok(json!({
                "choice": idx,
                "option-name": o.name,
                "section-name": preset.section_name,
            }))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let xml = &preset.source_descriptor_path;
    let riivolution_dir = xml.parent().ok_or_else(|| {
        CoreError::InvalidDescriptor("xml path has no parent directory".to_string())
    })?;
    if riivolution_dir.file_name().map(|n| n != RIIVOLUTION_DIR).unwrap_or(true) {
        return Err(CoreError::InvalidDescriptor(format!(
            "xml must be in a {RIIVOLUTION_DIR} folder"
        )));
    }
    let root = riivolution_dir.parent().ok_or_else(|| {
        CoreError::InvalidDescriptor(format!("{RIIVOLUTION_DIR} folder must have a parent"))
    })?;

    Ok(json!({
        "base-file": game_path.to_string_lossy(),
        "display-name": preset.name,
        "riivolution": {
            "patches": [
                {
                    "options": options,
                    "root": root.to_string_lossy(),
                    "xml": xml.to_string_lossy(),
                }
            ]
        },
        "type": DESCRIPTOR_TYPE,
        "version": 1,
    }))
}

/// File name for a preset's descriptor; path separators are replaced.
pub fn descriptor_file_name(preset: &Preset) -> String {
    let stem: String = preset
        .name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let stem = if stem.trim().is_empty() { preset.id.clone() } else { stem };
    format!("{stem}.json")
}

pub fn write_descriptor(preset: &Preset, game_path: &Path, out_dir: &Path) -> CoreResult<PathBuf> {
    let value = build_descriptor(preset, game_path)?;
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(descriptor_file_name(preset));
    fs::write(&path, serde_json::to_string_pretty(&value)?)?;
    tracing::info!(preset_id = %preset.id, path = %path.display(), "descriptor written");
    Ok(path)
}
