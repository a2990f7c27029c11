//! Flat key-value configuration

use crate::core::{LoggerError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Ordered string map holding the backend configuration
///
/// Keys use `.` to address properties of a block (`writer.type`) and `@` to
/// address a package, class or module (`level@app::db`).
///
/// # Example
///
/// ```
/// use rust_log_backend::config::Configuration;
///
/// let config = Configuration::new()
///     .with("level", "info")
///     .with("writer", "console")
///     .with("writer.pattern", "{level}: {message}");
///
/// assert_eq!(config.get("level"), Some("info"));
/// assert_eq!(config.sub_configuration("writer", '.').get("pattern"), Some("{level}: {message}"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    properties: BTreeMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            properties: BTreeMap::new(),
        }
    }

    /// Set a property (builder style)
    #[must_use = "builder methods return a new value"]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Comma separated values of a property, trimmed, without empty elements
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|element| !element.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Boolean property, `Ok(None)` if absent
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key).map(str::trim) {
            None => Ok(None),
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(value) => Err(LoggerError::config(
                key,
                format!("'{}' is not a boolean value", value),
            )),
        }
    }

    /// All properties below `prefix`, with `prefix` and `separator` stripped
    /// from their keys
    pub fn sub_configuration(&self, prefix: &str, separator: char) -> Configuration {
        let properties = self
            .properties
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix(separator))
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect();

        Configuration { properties }
    }

    /// Distinct key segments before the first `.`
    pub fn root_keys(&self) -> BTreeSet<&str> {
        self.properties
            .keys()
            .map(|key| key.split('.').next().unwrap_or(key.as_str()))
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let properties = iter
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Configuration { properties }
    }
}
