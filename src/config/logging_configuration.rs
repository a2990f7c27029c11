//! Resolved logging configuration: levels per location and writers per tag
//! and level

use super::configuration::Configuration;
use super::level_configuration::{
    LevelConfiguration, DEFAULT_TAGGED, LEVEL_KEY, LEVEL_SEPARATOR, UNTAGGED,
};
use super::writer_configuration::{
    WriterConfiguration, WriterRegistry, DEFAULT_WRITER, TYPE_KEY, WRITER_PREFIX,
};
use super::writer_repository::WriterRepository;
use crate::core::{InternalLogger, Level, Writer};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Configuration key for running writers asynchronously by default
pub const WRITING_THREAD_KEY: &str = "writingthread";

/// Writer repositories of one tag, indexed by level ordinal (`Trace..=Error`)
pub type LevelBuckets = [WriterRepository; 5];

/// Immutable result of parsing a [`Configuration`]
///
/// Severity levels are tightened to the levels that actually have writers,
/// so that a level check alone tells whether anything would be output.
pub struct LoggingConfiguration {
    root: LevelConfiguration,
    packages: HashMap<String, LevelConfiguration>,
    buckets: HashMap<String, LevelBuckets>,
    all_writers: Vec<Arc<dyn Writer>>,
    sync_writers: Vec<Arc<dyn Writer>>,
    async_writers: Vec<Arc<dyn Writer>>,
    empty: WriterRepository,
}

impl LoggingConfiguration {
    /// Create from parsed level configurations and writer buckets
    ///
    /// `buckets` must contain the `-` and `+` tags.
    pub fn new(
        root: LevelConfiguration,
        packages: HashMap<String, LevelConfiguration>,
        buckets: HashMap<String, LevelBuckets>,
    ) -> Self {
        let effective: HashMap<&str, Level> = buckets
            .iter()
            .map(|(tag, repositories)| (tag.as_str(), Self::least_severe_with_writers(repositories)))
            .collect();

        // Tags known only to writers get explicit entries, otherwise they
        // would resolve to the tightened `+` level
        let tighten = |configuration: &LevelConfiguration| {
            let mut levels: HashMap<String, Level> = configuration
                .entries()
                .map(|(tag, level)| (tag.to_string(), level))
                .collect();
            for tag in effective.keys() {
                levels
                    .entry(tag.to_string())
                    .or_insert_with(|| configuration.level(tag));
            }

            for (tag, level) in levels.iter_mut() {
                let writable = effective.get(tag.as_str()).copied().unwrap_or(Level::Off);
                *level = level.most_severe(writable);
            }
            LevelConfiguration::from_levels(levels)
        };

        let root = tighten(&root);
        let packages = packages
            .iter()
            .map(|(name, configuration)| (name.clone(), tighten(configuration)))
            .collect();

        let mut all_writers: Vec<Arc<dyn Writer>> = Vec::new();
        let mut sync_writers: Vec<Arc<dyn Writer>> = Vec::new();
        let mut async_writers: Vec<Arc<dyn Writer>> = Vec::new();
        for repository in buckets.values().flat_map(|repositories| repositories.iter()) {
            for writer in repository.sync_writers() {
                push_unique(&mut all_writers, writer);
                push_unique(&mut sync_writers, writer);
            }
            for writer in repository.async_writers() {
                push_unique(&mut all_writers, writer);
                push_unique(&mut async_writers, writer);
            }
        }

        Self {
            root,
            packages,
            buckets,
            all_writers,
            sync_writers,
            async_writers,
            empty: WriterRepository::empty(),
        }
    }

    fn least_severe_with_writers(repositories: &LevelBuckets) -> Level {
        Level::ENABLED
            .iter()
            .zip(repositories.iter())
            .find(|(_, repository)| !repository.is_empty())
            .map(|(level, _)| *level)
            .unwrap_or(Level::Off)
    }

    /// Level configuration of the most specific configured package, class or
    /// module for a class name
    pub fn level_configuration(&self, class_name: &str) -> &LevelConfiguration {
        if self.packages.is_empty() {
            return &self.root;
        }

        let mut name = class_name;
        while !name.is_empty() {
            if let Some(configuration) = self.packages.get(name) {
                return configuration;
            }
            name = reduce_name(name);
        }

        &self.root
    }

    /// Writers for a tag (`-` for untagged) and level
    ///
    /// Tags that were unknown at parse time use the `+` writers.
    pub fn get_writers(&self, tag: &str, level: Level) -> &WriterRepository {
        if level == Level::Off {
            return &self.empty;
        }

        self.buckets
            .get(tag)
            .or_else(|| self.buckets.get(DEFAULT_TAGGED))
            .map(|repositories| &repositories[level.ordinal()])
            .unwrap_or(&self.empty)
    }

    /// Every writer that has been created, each exactly once
    pub fn all_writers(&self) -> &[Arc<dyn Writer>] {
        &self.all_writers
    }

    pub fn sync_writers(&self) -> &[Arc<dyn Writer>] {
        &self.sync_writers
    }

    pub fn async_writers(&self) -> &[Arc<dyn Writer>] {
        &self.async_writers
    }

    pub fn has_async_writers(&self) -> bool {
        !self.async_writers.is_empty()
    }
}

fn push_unique(writers: &mut Vec<Arc<dyn Writer>>, writer: &Arc<dyn Writer>) {
    if !writers.iter().any(|existing| same_writer(existing, writer)) {
        writers.push(Arc::clone(writer));
    }
}

pub(crate) fn same_writer(a: &Arc<dyn Writer>, b: &Arc<dyn Writer>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Drop the last `.`, `$` or `::` separated segment
pub(crate) fn reduce_name(name: &str) -> &str {
    split_qualified_name(name).0
}

/// Split a qualified name at its last `.`, `$` or `::` separator into
/// prefix and last segment
pub(crate) fn split_qualified_name(name: &str) -> (&str, &str) {
    let bytes = name.as_bytes();
    let mut index = bytes.len();

    while index > 0 {
        index -= 1;
        match bytes[index] {
            b'.' | b'$' => return (&name[..index], &name[index + 1..]),
            b':' if index > 0 && bytes[index - 1] == b':' => {
                return (&name[..index - 1], &name[index + 1..])
            }
            _ => {}
        }
    }

    ("", name)
}

/// Builds a [`LoggingConfiguration`] from a flat [`Configuration`]
pub struct LoggingConfigurationParser<'a> {
    configuration: &'a Configuration,
    registry: Arc<WriterRegistry>,
    diagnostics: InternalLogger,
}

impl<'a> LoggingConfigurationParser<'a> {
    pub fn new(
        configuration: &'a Configuration,
        registry: Arc<WriterRegistry>,
        diagnostics: InternalLogger,
    ) -> Self {
        Self {
            configuration,
            registry,
            diagnostics,
        }
    }

    pub fn parse(&self) -> LoggingConfiguration {
        let mut tags: BTreeSet<String> = [UNTAGGED, DEFAULT_TAGGED]
            .into_iter()
            .map(String::from)
            .collect();

        let (root, packages) = self.level_configurations(&mut tags);
        let writer_configurations = self.writer_configurations(&mut tags);

        let buckets = tags
            .iter()
            .map(|tag| {
                let repositories = self.buckets(tag, &root, &packages, &writer_configurations);
                (tag.clone(), repositories)
            })
            .collect();

        LoggingConfiguration::new(root, packages, buckets)
    }

    fn level_configurations(
        &self,
        tags: &mut BTreeSet<String>,
    ) -> (LevelConfiguration, HashMap<String, LevelConfiguration>) {
        let root = LevelConfiguration::new(
            &self.configuration.get_list(LEVEL_KEY),
            true,
            &self.diagnostics,
        );
        tags.extend(root.tags().map(String::from));

        let sub = self
            .configuration
            .sub_configuration(LEVEL_KEY, LEVEL_SEPARATOR);
        let mut packages = HashMap::new();

        for name in sub.keys() {
            let configuration = LevelConfiguration::new(&sub.get_list(name), true, &self.diagnostics);
            tags.extend(configuration.tags().map(String::from));
            packages.insert(name.to_string(), configuration);
        }

        (root, packages)
    }

    fn writer_configurations(&self, tags: &mut BTreeSet<String>) -> Vec<WriterConfiguration> {
        let default_async = match self.configuration.get_bool(WRITING_THREAD_KEY) {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                self.diagnostics.error(e.to_string());
                false
            }
        };

        let mut configurations = Vec::new();

        for key in self.configuration.root_keys() {
            if !key.starts_with(WRITER_PREFIX) {
                continue;
            }

            let mut properties = self.configuration.sub_configuration(key, '.');
            if properties.get(TYPE_KEY).is_none() {
                if let Some(writer_type) = self.configuration.get(key) {
                    properties.set(TYPE_KEY, writer_type.trim());
                }
            }

            let configuration = WriterConfiguration::new(
                key,
                properties,
                default_async,
                Arc::clone(&self.registry),
                self.diagnostics.clone(),
            );
            tags.extend(configuration.level_configuration().tags().map(String::from));
            configurations.push(configuration);
        }

        if configurations.is_empty() {
            configurations.push(WriterConfiguration::new(
                WRITER_PREFIX,
                Configuration::new().with(TYPE_KEY, DEFAULT_WRITER),
                default_async,
                Arc::clone(&self.registry),
                self.diagnostics.clone(),
            ));
        }

        configurations
    }

    fn buckets(
        &self,
        tag: &str,
        root: &LevelConfiguration,
        packages: &HashMap<String, LevelConfiguration>,
        writer_configurations: &[WriterConfiguration],
    ) -> LevelBuckets {
        let effective = Self::effective_level(tag, root, packages, writer_configurations);

        Level::ENABLED.map(|level| {
            if !level.is_at_least_as_severe_as(effective) {
                return WriterRepository::empty();
            }

            let writers = writer_configurations
                .iter()
                .filter(|configuration| {
                    level.is_at_least_as_severe_as(configuration.level_configuration().level(tag))
                })
                .filter_map(|configuration| {
                    configuration
                        .get_or_create_writer()
                        .map(|writer| (writer, configuration.is_async()))
                })
                .collect();

            WriterRepository::new(writers)
        })
    }

    fn effective_level(
        tag: &str,
        root: &LevelConfiguration,
        packages: &HashMap<String, LevelConfiguration>,
        writer_configurations: &[WriterConfiguration],
    ) -> Level {
        let configured = std::iter::once(root)
            .chain(packages.values())
            .map(|configuration| configuration.level(tag))
            .min()
            .unwrap_or(Level::Trace);

        let writable = writer_configurations
            .iter()
            .map(|configuration| configuration.level_configuration().level(tag))
            .min()
            .unwrap_or(Level::Off);

        configured.most_severe(writable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, LogEntryValue, Result, ValueSet, INTERNAL_TAG};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NamedWriter {
        name: String,
        values: ValueSet,
    }

    impl Writer for NamedWriter {
        fn required_values(&self) -> ValueSet {
            self.values
        }
        fn write(&self, _entry: &LogEntry) -> Result<()> {
            Ok(())
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
        fn close(&self) -> Result<()> {
            Ok(())
        }
        fn name(&self) -> &str {
            &self.name
        }
    }

    fn registry(created: Arc<AtomicUsize>) -> Arc<WriterRegistry> {
        Arc::new(WriterRegistry::new().with("named", move |config, _| {
            created.fetch_add(1, Ordering::SeqCst);
            let values = if config.get("class").is_some() {
                ValueSet::of(&[LogEntryValue::Message, LogEntryValue::Class])
            } else {
                ValueSet::of(&[LogEntryValue::Message])
            };
            Ok(Arc::new(NamedWriter {
                name: config.get("name").unwrap_or("unnamed").to_string(),
                values,
            }) as Arc<dyn Writer>)
        }))
    }

    fn parse(configuration: &Configuration) -> (LoggingConfiguration, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let parsed = LoggingConfigurationParser::new(
            configuration,
            registry(Arc::clone(&created)),
            InternalLogger::capturing(),
        )
        .parse();
        (parsed, created)
    }

    fn names(repository: &WriterRepository) -> Vec<String> {
        let mut names: Vec<_> = repository.all_writers().map(|w| w.name().to_string()).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_reduce_name() {
        assert_eq!(reduce_name("com.example.Foo"), "com.example");
        assert_eq!(reduce_name("com.example.Foo$Inner"), "com.example.Foo");
        assert_eq!(reduce_name("app::db::pool"), "app::db");
        assert_eq!(reduce_name("app"), "");
        assert_eq!(reduce_name(""), "");
    }

    #[test]
    fn test_split_qualified_name() {
        assert_eq!(split_qualified_name("app::db::Pool"), ("app::db", "Pool"));
        assert_eq!(split_qualified_name("com.example.Foo"), ("com.example", "Foo"));
        assert_eq!(split_qualified_name("Main"), ("", "Main"));
    }

    #[test]
    fn test_global_level_with_package_override() {
        let config = Configuration::new()
            .with("level", "warn")
            .with("level@app::db", "debug")
            .with("writer", "named");
        let (parsed, _) = parse(&config);

        let db = parsed.level_configuration("app::db::pool");
        assert_eq!(db.level(UNTAGGED), Level::Debug);

        let other = parsed.level_configuration("app::ui");
        assert_eq!(other.level(UNTAGGED), Level::Warn);

        assert!(parsed.get_writers(UNTAGGED, Level::Trace).is_empty());
        assert_eq!(names(parsed.get_writers(UNTAGGED, Level::Debug)), vec!["unnamed"]);
        assert_eq!(names(parsed.get_writers(UNTAGGED, Level::Error)), vec!["unnamed"]);
    }

    #[test]
    fn test_single_root_configuration_is_used_for_every_location() {
        let config = Configuration::new().with("level", "info").with("writer", "named");
        let (parsed, _) = parse(&config);
        assert_eq!(parsed.level_configuration("anything::at::all").level(UNTAGGED), Level::Info);
        assert_eq!(parsed.level_configuration("").level(UNTAGGED), Level::Info);
    }

    #[test]
    fn test_writer_joins_buckets_at_or_above_its_level() {
        let config = Configuration::new()
            .with("writer1.type", "named")
            .with("writer1.name", "verbose")
            .with("writer2.type", "named")
            .with("writer2.name", "quiet")
            .with("writer2.level", "warn");
        let (parsed, created) = parse(&config);

        assert_eq!(names(parsed.get_writers(UNTAGGED, Level::Info)), vec!["verbose"]);
        assert_eq!(
            names(parsed.get_writers(UNTAGGED, Level::Warn)),
            vec!["quiet", "verbose"]
        );
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(parsed.all_writers().len(), 2);
    }

    #[test]
    fn test_levels_are_tightened_to_writer_levels() {
        let config = Configuration::new()
            .with("level", "trace")
            .with("writer.type", "named")
            .with("writer.level", "info");
        let (parsed, _) = parse(&config);

        let levels = parsed.level_configuration("");
        assert_eq!(levels.level(UNTAGGED), Level::Info);
        assert_eq!(levels.level(DEFAULT_TAGGED), Level::Info);
    }

    #[test]
    fn test_no_writer_for_tag_turns_level_off() {
        let config = Configuration::new()
            .with("level", "info")
            .with("writer.type", "named")
            .with("writer.tag", "db");
        let (parsed, _) = parse(&config);

        let levels = parsed.level_configuration("");
        assert_eq!(levels.level(UNTAGGED), Level::Off);
        assert_eq!(levels.level(DEFAULT_TAGGED), Level::Off);
        assert!(parsed.get_writers("db", Level::Info).all_writers().count() == 1);
    }

    #[test]
    fn test_tag_known_only_to_a_writer_stays_enabled() {
        let config = Configuration::new()
            .with("level", "info")
            .with("writer.type", "named")
            .with("writer.tag", "db");
        let (parsed, _) = parse(&config);

        let levels = parsed.level_configuration("app::db");
        assert_eq!(levels.level("db"), Level::Info);
        assert_eq!(levels.level("net"), Level::Off);
    }

    #[test]
    fn test_unknown_tag_falls_back_to_default_tagged_writers() {
        let config = Configuration::new()
            .with("writer1.type", "named")
            .with("writer1.name", "tagged")
            .with("writer1.tag", "+")
            .with("writer2.type", "named")
            .with("writer2.name", "untagged")
            .with("writer2.tag", "-");
        let (parsed, _) = parse(&config);

        assert_eq!(names(parsed.get_writers("never-seen", Level::Info)), vec!["tagged"]);
        assert_eq!(names(parsed.get_writers(UNTAGGED, Level::Info)), vec!["untagged"]);
    }

    #[test]
    fn test_default_writer_when_no_block_is_configured() {
        let parsed = LoggingConfigurationParser::new(
            &Configuration::new(),
            Arc::new(WriterRegistry::default()),
            InternalLogger::capturing(),
        )
        .parse();

        assert_eq!(parsed.all_writers().len(), 1);
        assert_eq!(parsed.all_writers()[0].name(), "console");
    }

    #[test]
    fn test_nothing_is_created_for_disabled_levels() {
        let config = Configuration::new()
            .with("level", "off")
            .with("writer", "named");
        let (parsed, created) = parse(&config);

        assert_eq!(created.load(Ordering::SeqCst), 0);
        assert!(parsed.all_writers().is_empty());
        assert!(parsed.get_writers(UNTAGGED, Level::Error).is_empty());
    }

    #[test]
    fn test_internal_tag_is_enabled_for_warnings() {
        let config = Configuration::new()
            .with("level", "error@-")
            .with("writer", "named");
        let (parsed, _) = parse(&config);

        let levels = parsed.level_configuration("");
        assert_eq!(levels.level(INTERNAL_TAG), Level::Warn);
        assert!(parsed.get_writers(INTERNAL_TAG, Level::Info).is_empty());
        assert!(!parsed.get_writers(INTERNAL_TAG, Level::Warn).is_empty());
    }

    #[test]
    fn test_required_values_are_merged_per_bucket() {
        let config = Configuration::new()
            .with("writer1.type", "named")
            .with("writer2.type", "named")
            .with("writer2.class", "yes")
            .with("writer2.level", "error");
        let (parsed, _) = parse(&config);

        let info = parsed.get_writers(UNTAGGED, Level::Info).required_values();
        assert!(!info.contains(LogEntryValue::Class));

        let error = parsed.get_writers(UNTAGGED, Level::Error).required_values();
        assert!(error.contains(LogEntryValue::Class));
        assert!(error.contains(LogEntryValue::Message));
    }

    #[test]
    fn test_async_writers_are_collected() {
        let config = Configuration::new()
            .with("writingthread", "true")
            .with("writer1.type", "named")
            .with("writer2.type", "named")
            .with("writer2.async", "false");
        let (parsed, _) = parse(&config);

        assert!(parsed.has_async_writers());
        assert_eq!(parsed.async_writers().len(), 1);
        assert_eq!(parsed.sync_writers().len(), 1);
        assert_eq!(parsed.all_writers().len(), 2);

        let repository = parsed.get_writers(UNTAGGED, Level::Info);
        assert_eq!(repository.sync_writers().len(), 1);
        assert_eq!(repository.async_writers().len(), 1);
    }
}
