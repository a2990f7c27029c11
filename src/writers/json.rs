//! JSON writer for structured logging

use super::file::FileOutput;
use super::{file_path, flag, APPEND_KEY, BUFFERED_KEY};
use crate::config::Configuration;
use crate::core::{InternalLogger, LogEntry, Result, ValueSet, Writer};
use crate::pattern::{FormatPatternParser, Token, NEW_LINE};
use std::collections::BTreeMap;
use std::path::Path;

/// Prefix of properties that define output fields
pub const FIELD_PREFIX: &str = "field";

const DEFAULT_FIELDS: [(&str, &str); 3] = [
    ("date", "date"),
    ("level", "level"),
    ("message", "message"),
];

/// Writes each log entry as a single-line JSON object (JSONL format)
///
/// Every `field.<name>` property defines one string field. Its value is a
/// placeholder such as `level` or `date: %H:%M:%S`, or a complete format
/// pattern if it contains curly brackets. Without field properties, `date`,
/// `level` and `message` are output.
///
/// Compatible with log aggregation tools like ELK, Loki, etc.
pub struct JsonWriter {
    fields: Vec<(String, Box<dyn Token>)>,
    output: FileOutput,
}

impl JsonWriter {
    pub fn from_configuration(configuration: &Configuration, diagnostics: &InternalLogger) -> Result<Self> {
        let path = file_path(configuration, "json writer")?;
        let append = flag(configuration, APPEND_KEY, "json", diagnostics);
        let buffered = flag(configuration, BUFFERED_KEY, "json", diagnostics);

        let parser = FormatPatternParser::new(diagnostics.clone());
        let properties = configuration.sub_configuration(FIELD_PREFIX, '.');

        let mut definitions: Vec<(String, String)> = properties
            .keys()
            .filter_map(|name| {
                properties
                    .get(name)
                    .map(|value| (name.to_string(), value.trim().to_string()))
            })
            .collect();
        if definitions.is_empty() {
            definitions = DEFAULT_FIELDS
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
        }

        let fields = definitions
            .into_iter()
            .map(|(name, value)| {
                let token = if value.contains('{') {
                    parser.parse(&value)
                } else {
                    parser.parse(&format!("{{{}}}", value))
                };
                (name, token)
            })
            .collect();

        Ok(Self {
            fields,
            output: FileOutput::open(path, append, buffered)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.output.path()
    }

    fn to_json(&self, entry: &LogEntry) -> Result<String> {
        let object: BTreeMap<&str, String> = self
            .fields
            .iter()
            .map(|(name, token)| {
                let mut value = String::new();
                token.render(entry, &mut value);
                (name.as_str(), value)
            })
            .collect();

        Ok(serde_json::to_string(&object)?)
    }
}

impl Writer for JsonWriter {
    fn required_values(&self) -> ValueSet {
        self.fields
            .iter()
            .fold(ValueSet::empty(), |values, (_, token)| values | token.required_values())
    }

    fn write(&self, entry: &LogEntry) -> Result<()> {
        let mut line = self.to_json(entry)?;
        line.push_str(NEW_LINE);
        self.output.write(line.as_bytes())
    }

    fn flush(&self) -> Result<()> {
        self.output.flush()
    }

    fn close(&self) -> Result<()> {
        self.output.close()
    }

    fn name(&self) -> &str {
        "json"
    }
}
