//! Schema-governed serialization of [`Event`](stats_types::Event)s across the
//! log boundary.
//!
//! Values on the log carry the registry's wire convention: a zero magic byte,
//! the schema id as a big-endian 32-bit integer, then the JSON-encoded event.
//! The codec resolves schemas through a [`SchemaRegistry`] and validates every
//! value against the resolved JSON Schema in both directions.
//!
//! # Architecture
//!
//! ```text
//! Event ──serialize──► validate ──► Envelope{id, json} ──► bytes
//!                         ▲
//!                 SchemaRegistry (HTTP / in-memory), cached by id and subject
//!                         ▼
//! bytes ──► Envelope ──► subject check ──► validate ──► Event
//! ```
//!
//! The registry and its transport (plain HTTP, HTTPS with a custom CA and
//! client identity, or in-memory for tests) sit behind the trait, so the
//! pipeline code never changes when the registry does.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod json_schema;
pub mod registry;

pub use codec::{SchemaCodec, SerializePolicy, SubjectNameStrategy, EVENT_JSON_SCHEMA};
pub use envelope::{Envelope, MAGIC_BYTE};
pub use error::{CodecError, RegistryError, Result};
pub use json_schema::{JsonSchema, ValidationError};
pub use registry::http::{HttpRegistryConfig, HttpSchemaRegistry};
pub use registry::memory::MemorySchemaRegistry;
pub use registry::{RegisteredSchema, SchemaDefinition, SchemaRegistry, SchemaType};
