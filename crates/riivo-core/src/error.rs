use serde::Serialize;
use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("name already exists: {0}")]
    DuplicateName(String),
    #[error("path already registered: {0}")]
    DuplicatePath(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("invalid choice {value:?} for option {option:?}")]
    InvalidChoice { option: String, value: String },
    #[error("missing source descriptor path")]
    MissingSource,
    #[error("preset {0} has no game directory bound, please select one")]
    UnboundPath(String),
    #[error("emulator path is not set")]
    MissingEmulatorPath,
    #[error("failed to start emulator: {0}")]
    LaunchSpawn(#[source] std::io::Error),
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Stable tag for each failure class, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    DuplicateName,
    DuplicatePath,
    InvalidName,
    InvalidPath,
    InvalidChoice,
    MissingSource,
    UnboundPath,
    MissingEmulatorPath,
    LaunchSpawn,
    InvalidDescriptor,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::DuplicateName => "duplicate_name",
            ErrorKind::DuplicatePath => "duplicate_path",
            ErrorKind::InvalidName => "invalid_name",
            ErrorKind::InvalidPath => "invalid_path",
            ErrorKind::InvalidChoice => "invalid_choice",
            ErrorKind::MissingSource => "missing_source",
            ErrorKind::UnboundPath => "unbound_path",
            ErrorKind::MissingEmulatorPath => "missing_emulator_path",
            ErrorKind::LaunchSpawn => "launch_spawn",
            ErrorKind::InvalidDescriptor => "invalid_descriptor",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::DuplicateName(_) => ErrorKind::DuplicateName,
            CoreError::DuplicatePath(_) => ErrorKind::DuplicatePath,
            CoreError::InvalidName(_) => ErrorKind::InvalidName,
            CoreError::InvalidPath(_) => ErrorKind::InvalidPath,
            CoreError::InvalidChoice { .. } => ErrorKind::InvalidChoice,
            CoreError::MissingSource => ErrorKind::MissingSource,
            CoreError::UnboundPath(_) => ErrorKind::UnboundPath,
            CoreError::MissingEmulatorPath => ErrorKind::MissingEmulatorPath,
            CoreError::LaunchSpawn(_) => ErrorKind::LaunchSpawn,
            CoreError::InvalidDescriptor(_) => ErrorKind::InvalidDescriptor,
            CoreError::Io(_) | CoreError::Serde(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn preset_not_found(id: &str) -> Self {
        CoreError::NotFound(format!("preset {id}"))
    }
}
