//! Writer blocks and the registry of writer types

use super::configuration::Configuration;
use super::level_configuration::{LevelConfiguration, LEVEL_SEPARATOR};
use crate::core::{InternalLogger, Level, Result, Writer};
use crate::writers::{ConsoleWriter, FileWriter, JsonWriter};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Root key prefix of writer blocks
pub const WRITER_PREFIX: &str = "writer";

pub const TYPE_KEY: &str = "type";
pub const LEVEL_KEY: &str = "level";
pub const TAG_KEY: &str = "tag";
pub const ASYNC_KEY: &str = "async";

/// Writer type used when no writer block is configured
pub const DEFAULT_WRITER: &str = "console";

/// Creates a writer from the properties of its configuration block
pub type WriterFactory =
    Arc<dyn Fn(&Configuration, &InternalLogger) -> Result<Arc<dyn Writer>> + Send + Sync>;

/// Registry of writer types by name
///
/// # Example
///
/// ```
/// use rust_log_backend::config::WriterRegistry;
///
/// let registry = WriterRegistry::default();
/// assert!(registry.contains("console"));
/// assert!(registry.contains("file"));
/// assert!(registry.contains("json"));
/// ```
#[derive(Clone)]
pub struct WriterRegistry {
    factories: HashMap<String, WriterFactory>,
}

impl WriterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a writer type, replacing any existing type with the same name
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Configuration, &InternalLogger) -> Result<Arc<dyn Writer>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register a writer type (builder style)
    #[must_use = "builder methods return a new value"]
    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Configuration, &InternalLogger) -> Result<Arc<dyn Writer>> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(
        &self,
        name: &str,
        configuration: &Configuration,
        diagnostics: &InternalLogger,
    ) -> Result<Arc<dyn Writer>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| crate::core::LoggerError::unknown_writer(name))?;
        factory(configuration, diagnostics)
    }
}

impl Default for WriterRegistry {
    fn default() -> Self {
        Self::new()
            .with("console", |config, diagnostics| {
                Ok(Arc::new(ConsoleWriter::from_configuration(config, diagnostics)?) as Arc<dyn Writer>)
            })
            .with("file", |config, diagnostics| {
                Ok(Arc::new(FileWriter::from_configuration(config, diagnostics)?) as Arc<dyn Writer>)
            })
            .with("json", |config, diagnostics| {
                Ok(Arc::new(JsonWriter::from_configuration(config, diagnostics)?) as Arc<dyn Writer>)
            })
    }
}

impl fmt::Debug for WriterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort_unstable();
        f.debug_struct("WriterRegistry").field("types", &names).finish()
    }
}

/// One `writer*` block of the configuration
///
/// The writer itself is created lazily on first use and at most once. A
/// failed creation is reported and the block contributes no writer.
pub struct WriterConfiguration {
    name: String,
    writer_type: Option<String>,
    properties: Configuration,
    level_configuration: LevelConfiguration,
    is_async: bool,
    writer: OnceLock<Option<Arc<dyn Writer>>>,
    registry: Arc<WriterRegistry>,
    diagnostics: InternalLogger,
}

impl WriterConfiguration {
    /// Create from the properties of a writer block
    ///
    /// `default_async` applies when the block has no `async` property.
    pub fn new(
        name: impl Into<String>,
        properties: Configuration,
        default_async: bool,
        registry: Arc<WriterRegistry>,
        diagnostics: InternalLogger,
    ) -> Self {
        let name = name.into();
        let level_configuration = Self::parse_levels(&name, &properties, &diagnostics);

        let is_async = match properties.get_bool(ASYNC_KEY) {
            Ok(value) => value.unwrap_or(default_async),
            Err(e) => {
                diagnostics.error(format!("Writer \"{}\": {}", name, e));
                default_async
            }
        };

        Self {
            writer_type: properties.get(TYPE_KEY).map(|t| t.trim().to_string()),
            name,
            properties,
            level_configuration,
            is_async,
            writer: OnceLock::new(),
            registry,
            diagnostics,
        }
    }

    fn parse_levels(
        name: &str,
        properties: &Configuration,
        diagnostics: &InternalLogger,
    ) -> LevelConfiguration {
        let tags = properties.get_list(TAG_KEY);
        if tags.is_empty() {
            return LevelConfiguration::new(&properties.get_list(LEVEL_KEY), false, diagnostics);
        }

        let level = match properties.get(LEVEL_KEY).map(str::trim) {
            None => Level::Trace,
            Some(value) => value.parse::<Level>().unwrap_or_else(|e| {
                diagnostics.error(format!("Writer \"{}\": {}", name, e));
                Level::Trace
            }),
        };

        let entries: Vec<String> = tags
            .iter()
            .map(|tag| format!("{}{}{}", level.to_str(), LEVEL_SEPARATOR, tag))
            .collect();
        LevelConfiguration::new(&entries, false, diagnostics)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level_configuration(&self) -> &LevelConfiguration {
        &self.level_configuration
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Get the writer, creating it on first call
    pub fn get_or_create_writer(&self) -> Option<Arc<dyn Writer>> {
        self.writer.get_or_init(|| self.create_writer()).clone()
    }

    /// The writer if it has been created successfully
    pub fn created_writer(&self) -> Option<Arc<dyn Writer>> {
        self.writer.get().cloned().flatten()
    }

    fn create_writer(&self) -> Option<Arc<dyn Writer>> {
        let Some(writer_type) = self.writer_type.as_deref() else {
            self.diagnostics
                .error(format!("Missing writer type for \"{}\"", self.name));
            return None;
        };

        match self
            .registry
            .create(writer_type, &self.properties, &self.diagnostics)
        {
            Ok(writer) => Some(writer),
            Err(e) => {
                self.diagnostics.error(format!(
                    "Failed to create writer \"{}\" of type \"{}\": {}",
                    self.name, writer_type, e
                ));
                None
            }
        }
    }
}

impl fmt::Debug for WriterConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterConfiguration")
            .field("name", &self.name)
            .field("type", &self.writer_type)
            .field("async", &self.is_async)
            .finish()
    }
}
