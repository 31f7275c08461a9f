use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A named game path that presets can be bound to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameDirectory {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
}

/// Name and choice list handed over by the option schema parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedOption {
    pub name: String,
    pub choices: Vec<String>,
}

impl ParsedOption {
    pub fn new(
        name: impl Into<String>,
        choices: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PresetOption {
    pub name: String,
    pub choices: Vec<String>,
    /// Empty means unset.
    #[serde(default)]
    pub selected: String,
}

impl PresetOption {
    pub fn from_parsed(parsed: ParsedOption) -> Self {
        let selected = parsed.choices.first().cloned().unwrap_or_default();
        Self {
            name: parsed.name,
            choices: parsed.choices,
            selected,
        }
    }

    pub fn is_set(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn has_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|c| c == value)
    }

    pub fn selected_index(&self) -> Option<usize> {
        if !self.is_set() {
            return None;
        }
        self.choices.iter().position(|c| *c == self.selected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub source_descriptor_path: PathBuf,
    #[serde(default)]
    pub section_name: String,
    pub options: Vec<PresetOption>,
    /// Directory id, looked up again on every read.
    #[serde(default)]
    pub bound_directory: Option<String>,
}

impl Preset {
    pub fn option(&self, name: &str) -> Option<&PresetOption> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn option_mut(&mut self, name: &str) -> Option<&mut PresetOption> {
        self.options.iter_mut().find(|o| o.name == name)
    }
}

impl fmt::Display for PresetOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selected = if self.is_set() { self.selected.as_str() } else { "<unset>" };
        write!(f, "{} = {} [{}]", self.name, selected, self.choices.join(", "))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.id)?;
        writeln!(f, "  created: {}", self.created_at.to_rfc3339())?;
        writeln!(f, "  source:  {}", self.source_descriptor_path.display())?;
        match &self.bound_directory {
            Some(dir) => writeln!(f, "  bound:   {dir}")?,
            None => writeln!(f, "  bound:   -")?,
        }
        for opt in &self.options {
            writeln!(f, "    {opt}")?;
        }
        Ok(())
    }
}

/// 128 random bits as lowercase hex; retried while `taken` reports a clash.
pub(crate) fn new_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = format!("{:032x}", rand::random::<u128>());
        if !taken(&id) {
            return id;
        }
    }
}
