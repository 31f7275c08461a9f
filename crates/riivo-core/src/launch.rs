//! Turns a preset into an emulator invocation and starts it.
//!
//! Argument encoding is fixed: the emulator binary is the program, the bound
//! game directory's path is the first argument, and every option with a
//! selection follows in stored order as a single `name=selected` argument.
//! Unset options are skipped. The game path is passed through as an OS
//! string, so paths that are not valid UTF-8 reach the emulator intact.

use crate::error::{CoreError, CoreResult};
use crate::model::{GameDirectory, Preset};
use crate::presets::PresetStore;
use crate::registry::DirectoryRegistry;
use crate::settings::SettingsStore;
use serde::{Serialize, Serializer};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Steps of one launch attempt. A successful launch walks
/// `Idle -> Resolving -> Spawning -> Spawned`; any error ends in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchState {
    Idle,
    Resolving,
    Spawning,
    Spawned,
    Failed,
}

// Only used for printing; the spawned command gets the raw path.
fn serialize_lossy<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    #[serde(serialize_with = "serialize_lossy")]
    pub program: PathBuf,
    #[serde(serialize_with = "serialize_lossy")]
    pub game_path: PathBuf,
    /// `name=selected` for every set option, in stored order.
    pub options: Vec<String>,
}

impl Invocation {
    pub fn build(emulator: &str, dir: &GameDirectory, preset: &Preset) -> Self {
        let options = preset
            .options
            .iter()
            .filter(|o| o.is_set())
            .map(|o| format!("{}={}", o.name, o.selected))
            .collect();
        Self {
            program: PathBuf::from(emulator),
            game_path: dir.path.clone(),
            options,
        }
    }

    /// Arguments in the order the emulator receives them.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = Vec::with_capacity(self.options.len() + 1);
        args.push(self.game_path.clone().into_os_string());
        args.extend(self.options.iter().map(OsString::from));
        args
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());
        cmd
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LaunchOutcome {
    pub pid: u32,
    pub invocation: Invocation,
    /// Every state the attempt went through, ending in `Spawned`.
    pub states: Vec<LaunchState>,
}

/// Tracks one launch attempt through its states.
struct Attempt<'a> {
    preset_id: &'a str,
    state: LaunchState,
    history: Vec<LaunchState>,
}

impl<'a> Attempt<'a> {
    fn new(preset_id: &'a str) -> Self {
        Self {
            preset_id,
            state: LaunchState::Idle,
            history: vec![LaunchState::Idle],
        }
    }

    fn advance(&mut self, next: LaunchState) {
        debug!(preset_id = self.preset_id, from = ?self.state, to = ?next, "launch state");
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: CoreError) -> CoreError {
        self.advance(LaunchState::Failed);
        match &err {
            CoreError::LaunchSpawn(_) => {
                error!(preset_id = self.preset_id, error = %err, "launch failed")
            }
            _ => warn!(
                preset_id = self.preset_id,
                kind = %err.kind(),
                error = %err,
                "launch rejected"
            ),
        }
        err
    }
}

#[derive(Clone)]
pub struct LaunchOrchestrator {
    presets: Arc<PresetStore>,
    dirs: Arc<DirectoryRegistry>,
    settings: Arc<SettingsStore>,
}

impl LaunchOrchestrator {
    pub fn new(
        presets: Arc<PresetStore>,
        dirs: Arc<DirectoryRegistry>,
        settings: Arc<SettingsStore>,
    ) -> Self {
        Self {
            presets,
            dirs,
            settings,
        }
    }

    /// Resolves everything a launch needs without spawning. Store locks are
    /// only held while each snapshot is copied out.
    pub fn plan(&self, preset_id: &str) -> CoreResult<Invocation> {
        let preset = self
            .presets
            .get(preset_id)
            .ok_or_else(|| CoreError::preset_not_found(preset_id))?;
        let dir = preset
            .bound_directory
            .as_deref()
            .and_then(|id| self.dirs.get(id))
            .ok_or_else(|| CoreError::UnboundPath(preset.name.clone()))?;
        let emulator = self.settings.emulator_path();
        if emulator.trim().is_empty() {
            return Err(CoreError::MissingEmulatorPath);
        }
        Ok(Invocation::build(&emulator, &dir, &preset))
    }

    /// Starts the emulator and returns as soon as the process exists. Output
    /// is inherited and the exit status is never reported back.
    pub fn launch(&self, preset_id: &str) -> CoreResult<LaunchOutcome> {
        let mut attempt = Attempt::new(preset_id);
        attempt.advance(LaunchState::Resolving);
        let invocation = self.plan(preset_id).map_err(|e| attempt.fail(e))?;

        attempt.advance(LaunchState::Spawning);
        let mut child = invocation
            .command()
            .spawn()
            .map_err(|e| attempt.fail(CoreError::LaunchSpawn(e)))?;
        let pid = child.id();
        attempt.advance(LaunchState::Spawned);
        info!(preset_id, pid, program = %invocation.program.display(), "emulator started");

        // Reap in the background so the exited child does not linger.
        std::thread::spawn(move || match child.wait() {
            Ok(status) => debug!(pid, %status, "emulator exited"),
            Err(e) => debug!(pid, error = %e, "failed waiting on emulator"),
        });

        Ok(LaunchOutcome {
            pid,
            invocation,
            states: attempt.history,
        })
    }
}
