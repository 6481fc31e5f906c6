//! Session state shared by every command of one shell.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use cairn_types::error::{Result, ShellError};

use crate::context::Terminal;
use crate::registry::{CommandRegistry, WILDCARD_CATEGORY};
use crate::temp::TempFolders;

/// How the shell was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningMode {
    /// Commands came from the launch arguments; the shell exits afterwards.
    Batch,
    /// Lines are read from the user until `exit` or end of input.
    Interactive,
}

/// Session variables. Names are case-insensitive; the spelling of the last
/// assignment is kept for listings.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    map: BTreeMap<String, (String, String)>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&name.to_lowercase()).map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.map
            .insert(name.to_lowercase(), (name.to_string(), value.into()));
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.map.remove(&name.to_lowercase()).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_lowercase())
    }

    /// `(name, value)` pairs sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.values().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Mutable session state: current category, variables, exit flag, the
/// terminal and the temp folders.
pub struct Environment {
    registry: Arc<CommandRegistry>,
    category: String,
    pub variables: Variables,
    pub running_mode: RunningMode,
    /// False when standard streams are redirected; disables paging and
    /// interactive pauses.
    pub run_in_console: bool,
    pub terminal: Box<dyn Terminal>,
    exit_pending: bool,
    temp: TempFolders,
}

impl Environment {
    pub fn new(registry: Arc<CommandRegistry>, terminal: Box<dyn Terminal>) -> Self {
        Self {
            registry,
            category: String::new(),
            variables: Variables::new(),
            running_mode: RunningMode::Interactive,
            run_in_console: true,
            terminal,
            exit_pending: false,
            temp: TempFolders::default(),
        }
    }

    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp = TempFolders::new(root);
        self
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Current category; `""` is the root.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Switch to `name`, matched case-insensitively against the categories
    /// that have browsable commands (or the root). The wildcard category
    /// holds global commands and cannot be entered.
    pub fn set_category(&mut self, name: &str) -> Result<()> {
        if name == WILDCARD_CATEGORY || !self.registry.category_exists(name, false) {
            return Err(ShellError::OutOfRange(format!(
                "Command category {name} does not exist"
            )));
        }
        let display = self
            .registry
            .category_name(name)
            .unwrap_or_else(|| name.to_string());
        log::debug!("category changed to \"{display}\"");
        self.category = display;
        Ok(())
    }

    pub fn exit_pending(&self) -> bool {
        self.exit_pending
    }

    pub fn request_exit(&mut self) {
        self.exit_pending = true;
    }

    /// Create a disposable folder that lives until shutdown.
    pub fn temp_folder(&mut self) -> Result<PathBuf> {
        self.temp.create()
    }

    pub fn temp_folders(&mut self) -> &mut TempFolders {
        &mut self.temp
    }
}
