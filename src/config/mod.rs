//! Command-line configuration shared by the subcommands.

pub mod duration;
pub mod tls;

use clap::{Args, ValueEnum};
use schema_codec::{HttpSchemaRegistry, SchemaCodec, SerializePolicy, SubjectNameStrategy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use vehicle_stats_kafka_producer::Partitioner;

pub use duration::parse_duration;
pub use tls::TlsOpts;

/// Settings that parse individually but cannot be used as given.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("--ssl-certificate-location and --ssl-key-location must be given together")]
    IncompleteClientCert,

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid schema registry settings: {0}")]
    Registry(#[from] schema_codec::RegistryError),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PartitionerArg {
    /// 32-bit FNV-1a of the key
    #[default]
    Fnv1a,
    /// Kafka Java client's murmur2
    Murmur2,
}

impl From<PartitionerArg> for Partitioner {
    fn from(arg: PartitionerArg) -> Self {
        match arg {
            PartitionerArg::Fnv1a => Partitioner::Fnv1a,
            PartitionerArg::Murmur2 => Partitioner::Murmur2,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SchemaPolicyArg {
    /// Register the event schema when the subject does not exist yet
    #[default]
    AutoRegister,
    /// Require the subject to be registered already
    UseLatest,
}

impl From<SchemaPolicyArg> for SerializePolicy {
    fn from(arg: SchemaPolicyArg) -> Self {
        match arg {
            SchemaPolicyArg::AutoRegister => SerializePolicy::AutoRegister,
            SchemaPolicyArg::UseLatest => SerializePolicy::UseLatest,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubjectStrategyArg {
    /// Subject is the topic name
    #[default]
    Topic,
    /// Subject is `<topic>-value`
    TopicValue,
}

impl From<SubjectStrategyArg> for SubjectNameStrategy {
    fn from(arg: SubjectStrategyArg) -> Self {
        match arg {
            SubjectStrategyArg::Topic => SubjectNameStrategy::Topic,
            SubjectStrategyArg::TopicValue => SubjectNameStrategy::TopicValue,
        }
    }
}

/// Schema registry connection options
#[derive(Args, Clone, Debug)]
pub struct RegistryOpts {
    /// Schema registry URL (`http://` is assumed without a scheme)
    #[arg(long, env = "SCHEMA_REGISTRY_URL", default_value = "http://localhost:8081")]
    pub schema_registry_url: String,

    /// Timeout for a single registry request
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub registry_timeout: Duration,

    /// Registry subject naming
    #[arg(long, value_enum, default_value_t = SubjectStrategyArg::Topic)]
    pub subject_strategy: SubjectStrategyArg,
}

impl RegistryOpts {
    /// Build a codec talking to the configured registry.
    ///
    /// TLS material from `tls` is applied when the registry URL is `https`.
    pub fn codec(&self, tls: &TlsOpts) -> Result<SchemaCodec, ConfigError> {
        let config = tls.registry_config(&self.schema_registry_url, self.registry_timeout)?;
        let registry = HttpSchemaRegistry::new(&config)?;
        Ok(SchemaCodec::new(Arc::new(registry))
            .with_subject_strategy(self.subject_strategy.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_enums_map_to_library_types() {
        assert_eq!(Partitioner::from(PartitionerArg::Murmur2), Partitioner::Murmur2);
        assert_eq!(
            SerializePolicy::from(SchemaPolicyArg::UseLatest),
            SerializePolicy::UseLatest
        );
        assert_eq!(
            SubjectNameStrategy::from(SubjectStrategyArg::TopicValue).subject("cars"),
            "cars-value"
        );
    }
}
