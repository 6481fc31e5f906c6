//! Command registry: category -> keyword -> descriptor.
//!
//! Libraries describe their commands with plain [`CommandDescriptor`] values
//! and hand them over through [`CommandRegistry::register`]. Lookups are
//! case-insensitive on both category and keyword. The root category `""` and
//! the wildcard category `"*"` always exist; commands in `"*"` resolve from
//! any current category.
//!
//! The tables sit behind a reader-writer lock: resolves and listings share
//! it, registrations take it exclusively.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cairn_types::error::{Result, ShellError};

use crate::interpreter::Command;
use crate::proxy::{NullProxyFactory, ProxyFactory};

/// Name of the category every shell starts in.
pub const ROOT_CATEGORY: &str = "";

/// Category whose commands resolve from every category.
pub const WILDCARD_CATEGORY: &str = "*";

/// Instantiates a fresh command for one execution.
pub type CommandFactory = fn() -> Box<dyn Command>;

/// Immutable metadata for one command keyword.
#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub category: String,
    pub keyword: String,
    pub description: String,
    pub example: String,
    pub parameters: Vec<String>,
    pub requires_connection: bool,
    /// Hidden commands resolve normally but are left out of listings.
    pub hidden: bool,
    pub factory: CommandFactory,
}

impl CommandDescriptor {
    pub fn new(category: &str, keyword: &str, factory: CommandFactory) -> Self {
        Self {
            category: category.to_string(),
            keyword: keyword.to_string(),
            description: String::new(),
            example: String::new(),
            parameters: Vec::new(),
            requires_connection: false,
            hidden: false,
            factory,
        }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    pub fn example(mut self, text: &str) -> Self {
        self.example = text.to_string();
        self
    }

    pub fn parameter(mut self, text: &str) -> Self {
        self.parameters.push(text.to_string());
        self
    }

    pub fn requires_connection(mut self) -> Self {
        self.requires_connection = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Build a new command instance.
    pub fn instantiate(&self) -> Box<dyn Command> {
        (self.factory)()
    }

    /// `category\keyword`, as shown in help and error reports.
    pub fn qualified_name(&self) -> String {
        format!("{}\\{}", self.category, self.keyword)
    }

    /// Detailed help block: header bar, description, parameters, example.
    pub fn help_lines(&self) -> Vec<String> {
        let width = 50usize.saturating_sub(self.category.len() + self.keyword.len()).max(1);
        let mut lines = vec![
            String::new(),
            format!(" _[{}]{}", self.qualified_name(), "_".repeat(width)),
            String::new(),
            format!("  Description:.. {}", self.description),
        ];
        match self.parameters.split_first() {
            None => lines.push("  Parameters:... ".to_string()),
            Some((first, rest)) => {
                lines.push(format!("  Parameters:... {first}"));
                lines.extend(rest.iter().map(|p| format!("{:17}{p}", "")));
            },
        }
        lines.push(format!("  Example:...... {}", self.example));
        lines.push(String::new());
        lines
    }

    /// One-line listing entry: keyword padded to 15 columns, then description.
    pub fn summary_line(&self) -> String {
        let pad = 15usize.saturating_sub(self.keyword.len()).max(1);
        format!("{}:{}{}", self.keyword, " ".repeat(pad), self.description)
    }
}

/// A unit of commands registered together.
pub trait CommandLibrary: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Every command the library contributes.
    fn commands(&self) -> Vec<CommandDescriptor>;

    /// Connection proxy factory, for libraries that provide one.
    fn proxy_factory(&self) -> Option<Arc<dyn ProxyFactory>> {
        None
    }
}

/// Name and version of a registered library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
}

struct Category {
    /// Spelling of the first registration, used for display.
    name: String,
    commands: BTreeMap<String, Arc<CommandDescriptor>>,
}

impl Category {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commands: BTreeMap::new(),
        }
    }

    fn browsable(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> {
        self.commands.values().filter(|d| !d.hidden)
    }
}

struct Tables {
    categories: BTreeMap<String, Category>,
    libraries: Vec<LibraryInfo>,
    proxy_factory: Option<(String, Arc<dyn ProxyFactory>)>,
}

impl Tables {
    fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(&name.to_lowercase())
    }

    fn lookup(&self, category: &str, keyword: &str) -> Option<Arc<CommandDescriptor>> {
        self.category(category)?
            .commands
            .get(&keyword.to_lowercase())
            .cloned()
    }

    fn resolve(&self, category: &str, keyword: &str) -> Option<Arc<CommandDescriptor>> {
        if let Some(d) = self.lookup(category, keyword) {
            return Some(d);
        }
        if let Some(d) = self.lookup(WILDCARD_CATEGORY, keyword) {
            return Some(d);
        }
        let parts: Vec<&str> = keyword.split('\\').collect();
        if let [cat, kw] = parts.as_slice() {
            return self.lookup(cat, kw);
        }
        None
    }

    fn category_exists(&self, name: &str, include_empty: bool) -> bool {
        match self.category(name) {
            None => false,
            Some(_) if include_empty => true,
            Some(c) => name.is_empty() || c.browsable().next().is_some(),
        }
    }
}

/// Registry of every command known to the shell.
pub struct CommandRegistry {
    tables: RwLock<Tables>,
    catalog: RwLock<BTreeMap<String, Arc<dyn CommandLibrary>>>,
}

impl CommandRegistry {
    /// Create a registry holding only the empty root and wildcard categories.
    pub fn new() -> Self {
        let mut categories = BTreeMap::new();
        categories.insert(ROOT_CATEGORY.to_string(), Category::new(ROOT_CATEGORY));
        categories.insert(
            WILDCARD_CATEGORY.to_string(),
            Category::new(WILDCARD_CATEGORY),
        );
        Self {
            tables: RwLock::new(Tables {
                categories,
                libraries: Vec::new(),
                proxy_factory: None,
            }),
            catalog: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register every command of `library`. Returns the number of commands
    /// added; conflicting keywords are logged and the earlier one is kept.
    pub fn register(&self, library: &dyn CommandLibrary) -> usize {
        log::debug!("registering commands from library {}", library.name());
        let descriptors = library.commands();
        let factory = library.proxy_factory();

        let mut tables = self.write();
        let mut added = 0;
        for desc in descriptors {
            let cat_key = desc.category.to_lowercase();
            let kw_key = desc.keyword.to_lowercase();
            let category = tables
                .categories
                .entry(cat_key)
                .or_insert_with(|| Category::new(&desc.category));
            if category.commands.contains_key(&kw_key) {
                log::warn!(
                    "A command with keyword \"{}\" is already registered for category \"{}\"",
                    desc.keyword,
                    desc.category
                );
                continue;
            }
            log::debug!("command {} registered", desc.qualified_name());
            category.commands.insert(kw_key, Arc::new(desc));
            added += 1;
        }

        let has_factory = factory.is_some();
        if let Some(factory) = factory {
            if let Some((owner, previous)) = &tables.proxy_factory {
                log::warn!(
                    "proxy factory \"{}\" from library {owner} is already registered and will be \
                     overwritten by \"{}\" from library {}",
                    previous.name(),
                    factory.name(),
                    library.name()
                );
            }
            tables.proxy_factory = Some((library.name().to_string(), factory));
        }

        if added > 0 || has_factory {
            tables.libraries.push(LibraryInfo {
                name: library.name().to_string(),
                version: library.version().to_string(),
            });
        }
        added
    }

    /// Make a linked-in library available to `load` without registering it.
    pub fn add_to_catalog(&self, library: Arc<dyn CommandLibrary>) {
        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        catalog.insert(library.name().to_lowercase(), library);
    }

    /// Names of the libraries `load` can register.
    pub fn catalog_names(&self) -> Vec<String> {
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        catalog.values().map(|l| l.name().to_string()).collect()
    }

    /// Register a catalog library by name.
    pub fn load(&self, name: &str) -> Result<usize> {
        let library = {
            let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
            catalog.get(&name.to_lowercase()).cloned()
        };
        match library {
            Some(lib) => Ok(self.register(lib.as_ref())),
            None => Err(ShellError::InvalidArgument(format!(
                "no command library named \"{name}\""
            ))),
        }
    }

    /// Resolve `keyword` from `category`: exact match, then the wildcard
    /// category, then an explicit `category\keyword` form.
    pub fn resolve(&self, category: &str, keyword: &str) -> Option<Arc<CommandDescriptor>> {
        self.read().resolve(category, keyword)
    }

    pub fn command_exists(&self, category: &str, keyword: &str) -> bool {
        self.resolve(category, keyword).is_some()
    }

    /// Whether `name` is a category. Unless `include_empty`, only the root
    /// category and categories with browsable commands count.
    pub fn category_exists(&self, name: &str, include_empty: bool) -> bool {
        self.read().category_exists(name, include_empty)
    }

    /// Registered spelling of category `name`, matched like every lookup.
    pub fn category_name(&self, name: &str) -> Option<String> {
        self.read().category(name).map(|c| c.name.clone())
    }

    /// Display names of the categories, sorted.
    pub fn list_categories(&self, include_empty: bool) -> Vec<String> {
        let tables = self.read();
        tables
            .categories
            .values()
            .filter(|c| include_empty || c.name.is_empty() || c.browsable().next().is_some())
            .map(|c| c.name.clone())
            .collect()
    }

    /// Commands of one category sorted by keyword.
    pub fn list_commands(
        &self,
        category: &str,
        include_hidden: bool,
    ) -> Result<Vec<Arc<CommandDescriptor>>> {
        let tables = self.read();
        let cat = tables.category(category).ok_or_else(|| {
            ShellError::OutOfRange(format!("Unknown command category: {category}"))
        })?;
        Ok(cat
            .commands
            .values()
            .filter(|d| include_hidden || !d.hidden)
            .cloned()
            .collect())
    }

    /// Every category that registers `keyword`.
    pub fn find_categories(&self, keyword: &str) -> Vec<String> {
        let key = keyword.to_lowercase();
        self.read()
            .categories
            .values()
            .filter(|c| c.commands.contains_key(&key))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Libraries registered so far, in registration order.
    pub fn libraries(&self) -> Vec<LibraryInfo> {
        self.read().libraries.clone()
    }

    /// The discovered proxy factory, or the null factory.
    pub fn proxy_factory(&self) -> Arc<dyn ProxyFactory> {
        match &self.read().proxy_factory {
            Some((_, f)) => Arc::clone(f),
            None => Arc::new(NullProxyFactory),
        }
    }

    /// Completion candidates for `prefix` typed in `category`: category
    /// names, local keywords and wildcard keywords. A `cat\prefix` form only
    /// completes keywords of `cat`. Script-only commands are never offered.
    pub fn completions(&self, category: &str, prefix: &str) -> Vec<String> {
        let tables = self.read();
        let starts = |s: &str, p: &str| s.to_lowercase().starts_with(&p.to_lowercase());
        let offer = |d: &Arc<CommandDescriptor>, p: &str| {
            !d.hidden && starts(&d.keyword, p) && !d.instantiate().script_only()
        };

        if let Some((cat, kw)) = prefix.split_once('\\') {
            return match tables.category(cat) {
                Some(c) => c
                    .commands
                    .values()
                    .filter(|d| offer(d, kw))
                    .map(|d| format!("{}\\{}", c.name, d.keyword))
                    .collect(),
                None => Vec::new(),
            };
        }

        let mut out: Vec<String> = tables
            .categories
            .values()
            .filter(|c| !c.name.is_empty() && c.name != WILDCARD_CATEGORY)
            .filter(|c| c.browsable().next().is_some() && starts(&c.name, prefix))
            .map(|c| c.name.clone())
            .collect();
        for cat in [category, WILDCARD_CATEGORY] {
            if let Some(c) = tables.category(cat) {
                out.extend(
                    c.commands
                        .values()
                        .filter(|d| offer(d, prefix))
                        .map(|d| d.keyword.clone()),
                );
            }
        }
        out.sort();
        out.dedup();
        out
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
