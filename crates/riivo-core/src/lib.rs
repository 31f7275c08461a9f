pub mod app;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod launch;
pub mod logging;
pub mod model;
pub mod presets;
pub mod registry;
pub mod resolver;
pub mod settings;
pub mod storage;

pub use app::Riivo;
pub use config::{CoreConfig, GlobalSettings};
pub use error::{CoreError, CoreResult, ErrorKind};
pub use launch::{Invocation, LaunchOrchestrator, LaunchOutcome, LaunchState};
pub use model::{GameDirectory, ParsedOption, Preset, PresetOption};
pub use presets::PresetStore;
pub use registry::{DirectoryRef, DirectoryRegistry};
pub use resolver::{BindTarget, Intent, SelectionResolver};
pub use settings::SettingsStore;
