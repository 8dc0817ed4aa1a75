//! Schema registry abstraction.
//!
//! The codec only needs a handful of lookups, so the trait mirrors the
//! subset of the registry REST API it uses. [`http::HttpSchemaRegistry`]
//! talks to a real registry; [`memory::MemorySchemaRegistry`] backs tests
//! and local runs without one.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};

pub mod http;
pub mod memory;

/// Schema language of a registered schema.
///
/// The registry omits `schemaType` for Avro schemas, hence the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    #[default]
    Avro,
    Protobuf,
    Json,
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Avro => write!(f, "AVRO"),
            Self::Protobuf => write!(f, "PROTOBUF"),
            Self::Json => write!(f, "JSON"),
        }
    }
}

/// Schema text as returned by an id lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDefinition {
    #[serde(default)]
    pub schema_type: SchemaType,
    pub schema: String,
}

/// A schema registered under a subject.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredSchema {
    pub subject: String,
    pub version: u32,
    pub id: u32,
    #[serde(default)]
    pub schema_type: SchemaType,
    pub schema: String,
}

/// Read and register operations against a schema registry.
#[async_trait::async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// List all subjects. Used as a reachability probe at startup.
    async fn list_subjects(&self) -> Result<Vec<String>, RegistryError>;

    /// Latest registered version of `subject`.
    ///
    /// Returns [`RegistryError::NotFound`] when the subject does not exist.
    async fn latest(&self, subject: &str) -> Result<RegisteredSchema, RegistryError>;

    /// Register `schema` under `subject`, returning its global id.
    ///
    /// Registering a schema identical to an existing version returns the
    /// existing id.
    async fn register(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
    ) -> Result<u32, RegistryError>;

    /// Schema text for a global id.
    async fn schema_by_id(&self, id: u32) -> Result<SchemaDefinition, RegistryError>;

    /// Subjects that reference the schema with this id.
    async fn subjects_for_id(&self, id: u32) -> Result<Vec<String>, RegistryError>;
}
