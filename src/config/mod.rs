//! Configuration: severity levels, writer blocks and their resolution

pub mod configuration;
pub mod level_configuration;
pub mod logging_configuration;
pub mod writer_configuration;
pub mod writer_repository;

pub use configuration::Configuration;
pub use level_configuration::{LevelConfiguration, ALL_TAGS, DEFAULT_TAGGED, UNTAGGED};
pub use logging_configuration::{
    LevelBuckets, LoggingConfiguration, LoggingConfigurationParser, WRITING_THREAD_KEY,
};
pub use writer_configuration::{WriterConfiguration, WriterFactory, WriterRegistry};
pub use writer_repository::WriterRepository;
