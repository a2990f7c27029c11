//! Severity levels per tag

use crate::core::{InternalLogger, Level, INTERNAL_TAG};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Configuration key for severity levels
pub const LEVEL_KEY: &str = "level";

/// Separator between the level key and a package, class or module
pub const LEVEL_SEPARATOR: char = '@';

/// Placeholder for log entries without tag
pub const UNTAGGED: &str = "-";

/// Placeholder for tagged log entries whose tag is not configured explicitly
pub const DEFAULT_TAGGED: &str = "+";

/// Placeholder for both untagged and default tagged log entries
pub const ALL_TAGS: &str = "*";

/// Maximum number of unknown tags whose resolved level is memoized
pub const MEMO_CAPACITY: usize = 1024;

/// Immutable mapping from tags to severity levels
///
/// Levels of tags that are not configured explicitly are resolved to the
/// default tagged level and memoized, up to [`MEMO_CAPACITY`] tags.
#[derive(Debug)]
pub struct LevelConfiguration {
    levels: HashMap<String, Level>,
    memo: RwLock<HashMap<String, Level>>,
}

impl LevelConfiguration {
    /// Parse entries in the form `level` or `level@tag`
    ///
    /// With `implicit_internal_tag`, the internal tag is enabled for warnings
    /// and errors unless configured otherwise.
    pub fn new(entries: &[String], implicit_internal_tag: bool, diagnostics: &InternalLogger) -> Self {
        let mut plain: Option<Level> = None;
        let mut untagged: Option<Level> = None;
        let mut default_tagged: Option<Level> = None;
        let mut tagged: HashMap<String, Level> = HashMap::new();

        for entry in entries {
            let (level_name, tag) = match entry.split_once(LEVEL_SEPARATOR) {
                Some((level, tag)) => (level.trim(), Some(tag.trim())),
                None => (entry.trim(), None),
            };

            let level = match level_name.parse::<Level>() {
                Ok(level) => level,
                Err(_) => {
                    diagnostics.error(format!(
                        "Invalid severity level \"{}\" in \"{}\"",
                        level_name, entry
                    ));
                    continue;
                }
            };

            match tag {
                None | Some(ALL_TAGS) => plain = Some(level),
                Some(UNTAGGED) => untagged = Some(level),
                Some(DEFAULT_TAGGED) => default_tagged = Some(level),
                Some(tag) => {
                    tagged.insert(tag.to_string(), level);
                }
            }
        }

        let configured =
            plain.is_some() || untagged.is_some() || default_tagged.is_some() || !tagged.is_empty();
        let fallback = if configured { Level::Off } else { Level::Trace };

        let untagged = untagged.or(plain);
        let default_tagged = default_tagged.or(plain);

        if implicit_internal_tag
            && !tagged.contains_key(INTERNAL_TAG)
            && default_tagged.map_or(true, |level| !level.is_at_least_as_severe_as(Level::Warn))
        {
            tagged.insert(INTERNAL_TAG.to_string(), Level::Warn);
        }

        let mut levels = tagged;
        levels.insert(UNTAGGED.to_string(), untagged.unwrap_or(fallback));
        levels.insert(DEFAULT_TAGGED.to_string(), default_tagged.unwrap_or(fallback));

        Self::from_levels(levels)
    }

    /// Create from already resolved levels
    ///
    /// Missing placeholders resolve to `Off`.
    pub fn from_levels(mut levels: HashMap<String, Level>) -> Self {
        levels.entry(UNTAGGED.to_string()).or_insert(Level::Off);
        levels.entry(DEFAULT_TAGGED.to_string()).or_insert(Level::Off);

        Self {
            levels,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Severity level for a tag, `-` for untagged log entries
    pub fn level(&self, tag: &str) -> Level {
        if let Some(level) = self.levels.get(tag) {
            return *level;
        }

        if let Some(level) = self.memo.read().get(tag) {
            return *level;
        }

        let level = self.default_tagged_level();
        let mut memo = self.memo.write();
        if memo.len() < MEMO_CAPACITY {
            memo.insert(tag.to_string(), level);
        }
        level
    }

    pub fn untagged_level(&self) -> Level {
        self.levels.get(UNTAGGED).copied().unwrap_or(Level::Off)
    }

    pub fn default_tagged_level(&self) -> Level {
        self.levels.get(DEFAULT_TAGGED).copied().unwrap_or(Level::Off)
    }

    /// Explicitly configured tags, without placeholders
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.levels
            .keys()
            .map(String::as_str)
            .filter(|tag| *tag != UNTAGGED && *tag != DEFAULT_TAGGED)
    }

    /// Explicitly configured levels including both placeholders
    pub fn entries(&self) -> impl Iterator<Item = (&str, Level)> {
        self.levels.iter().map(|(tag, level)| (tag.as_str(), *level))
    }

    pub fn least_severe_level(&self) -> Level {
        self.levels.values().copied().min().unwrap_or(Level::Off)
    }
}
