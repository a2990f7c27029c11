//! Writers that are active for one tag and severity level

use crate::core::{ValueSet, Writer};
use std::fmt;
use std::sync::Arc;

/// Synchronous and asynchronous writers of one (tag, level) bucket
///
/// Immutable after construction. The required values are the union of the
/// required values of all contained writers.
#[derive(Clone, Default)]
pub struct WriterRepository {
    sync_writers: Vec<Arc<dyn Writer>>,
    async_writers: Vec<Arc<dyn Writer>>,
    required_values: ValueSet,
}

impl WriterRepository {
    /// Create from writers paired with their async flag
    pub fn new(writers: Vec<(Arc<dyn Writer>, bool)>) -> Self {
        let mut repository = WriterRepository::default();

        for (writer, is_async) in writers {
            repository.required_values.extend_from(writer.required_values());
            if is_async {
                repository.async_writers.push(writer);
            } else {
                repository.sync_writers.push(writer);
            }
        }

        repository
    }

    pub fn empty() -> Self {
        WriterRepository::default()
    }

    pub fn sync_writers(&self) -> &[Arc<dyn Writer>] {
        &self.sync_writers
    }

    pub fn async_writers(&self) -> &[Arc<dyn Writer>] {
        &self.async_writers
    }

    pub fn all_writers(&self) -> impl Iterator<Item = &Arc<dyn Writer>> {
        self.sync_writers.iter().chain(self.async_writers.iter())
    }

    pub fn required_values(&self) -> ValueSet {
        self.required_values
    }

    pub fn is_empty(&self) -> bool {
        self.sync_writers.is_empty() && self.async_writers.is_empty()
    }
}

impl fmt::Debug for WriterRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |writers: &[Arc<dyn Writer>]| -> Vec<String> {
            writers.iter().map(|w| w.name().to_string()).collect()
        };
        f.debug_struct("WriterRepository")
            .field("sync_writers", &names(&self.sync_writers))
            .field("async_writers", &names(&self.async_writers))
            .field("required_values", &self.required_values)
            .finish()
    }
}
