//! The schema codec: [`Event`] to schema-tagged bytes and back.

use crate::envelope::Envelope;
use crate::error::{CodecError, RegistryError, Result};
use crate::json_schema::JsonSchema;
use crate::registry::{SchemaRegistry, SchemaType};
use stats_types::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Canonical JSON Schema for [`Event`], registered when the subject is empty.
pub const EVENT_JSON_SCHEMA: &str = r#"{"$schema":"http://json-schema.org/draft-07/schema#","title":"Event","type":"object","properties":{"user":{"type":"string"},"car":{"type":"string"},"color":{"type":"string"}},"required":["user","car","color"],"additionalProperties":false}"#;

/// What serialize does when the topic's subject has no schema yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerializePolicy {
    /// Register [`EVENT_JSON_SCHEMA`] under the subject.
    #[default]
    AutoRegister,
    /// Require a schema to be registered out of band.
    UseLatest,
}

/// How a topic name maps to a registry subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubjectNameStrategy {
    /// The subject is the topic name.
    #[default]
    Topic,
    /// `<topic>-value`, the naming other registry clients default to.
    TopicValue,
}

impl SubjectNameStrategy {
    pub fn subject(&self, topic: &str) -> String {
        match self {
            Self::Topic => topic.to_string(),
            Self::TopicValue => format!("{topic}-value"),
        }
    }
}

/// A resolved schema, compiled for validation.
#[derive(Debug)]
struct CachedSchema {
    id: u32,
    validator: JsonSchema,
}

/// Serializes and deserializes events through a schema registry.
///
/// Schemas are cached by id, subject registrations by subject, and the
/// subjects of an id, all for the lifetime of the codec. Registry schemas are
/// append-only, so nothing is ever invalidated.
pub struct SchemaCodec {
    registry: Arc<dyn SchemaRegistry>,
    policy: SerializePolicy,
    subjects: SubjectNameStrategy,
    by_id: RwLock<HashMap<u32, Arc<CachedSchema>>>,
    by_subject: RwLock<HashMap<String, Arc<CachedSchema>>>,
    subjects_by_id: RwLock<HashMap<u32, Arc<Vec<String>>>>,
}

impl SchemaCodec {
    pub fn new(registry: Arc<dyn SchemaRegistry>) -> Self {
        Self {
            registry,
            policy: SerializePolicy::default(),
            subjects: SubjectNameStrategy::default(),
            by_id: RwLock::new(HashMap::new()),
            by_subject: RwLock::new(HashMap::new()),
            subjects_by_id: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_policy(mut self, policy: SerializePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_subject_strategy(mut self, strategy: SubjectNameStrategy) -> Self {
        self.subjects = strategy;
        self
    }

    pub fn subject_for(&self, topic: &str) -> String {
        self.subjects.subject(topic)
    }

    /// Check that the registry answers at all.
    pub async fn preflight(&self) -> Result<()> {
        self.registry
            .list_subjects()
            .await
            .map(|subjects| {
                tracing::debug!("Schema registry reachable, {} subjects", subjects.len());
            })
            .map_err(|source| CodecError::SchemaUnavailable {
                subject: "*".to_string(),
                source,
            })
    }

    /// Resolve (registering if the policy allows) the schema id that
    /// [`serialize`](Self::serialize) will use for `topic`.
    pub async fn schema_id_for(&self, topic: &str) -> Result<u32> {
        let subject = self.subject_for(topic);
        Ok(self.resolve_subject(&subject).await?.id)
    }

    /// Validate `event` against the topic's schema and wrap it in an envelope.
    pub async fn serialize(&self, topic: &str, event: &Event) -> Result<Envelope> {
        let subject = self.subject_for(topic);
        let schema = self.resolve_subject(&subject).await?;

        let value = serde_json::to_value(event)?;
        schema.validator.validate(&value)?;
        let payload = serde_json::to_vec(&value)?;

        Ok(Envelope::new(schema.id, payload))
    }

    /// Decode a raw log value for `topic`.
    pub async fn deserialize(&self, topic: &str, bytes: &[u8]) -> Result<Event> {
        let envelope = Envelope::from_bytes(bytes)?;
        self.deserialize_into(topic, &envelope).await
    }

    /// Decode an envelope, checking that its schema belongs to `topic`'s
    /// subject and that the payload conforms to it.
    pub async fn deserialize_into(&self, topic: &str, envelope: &Envelope) -> Result<Event> {
        let subject = self.subject_for(topic);
        let schema = self.resolve_id(envelope.schema_id, &subject).await?;

        let subjects = self.subjects_of(envelope.schema_id, &subject).await?;
        if !subjects.iter().any(|s| s == &subject) {
            return Err(CodecError::SchemaMismatch(format!(
                "schema {} is registered under {:?}, not '{subject}'",
                envelope.schema_id, subjects
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&envelope.payload)
            .map_err(|e| CodecError::Decode(format!("payload is not JSON: {e}")))?;
        schema.validator.validate(&value)?;

        serde_json::from_value(value).map_err(|e| {
            CodecError::Decode(format!(
                "payload conforms to schema {} but is not an event: {e}",
                envelope.schema_id
            ))
        })
    }

    async fn resolve_subject(&self, subject: &str) -> Result<Arc<CachedSchema>> {
        if let Some(cached) = self.by_subject.read().await.get(subject) {
            return Ok(Arc::clone(cached));
        }

        let unavailable = |source: RegistryError| CodecError::SchemaUnavailable {
            subject: subject.to_string(),
            source,
        };

        let (id, schema_type, schema_text) = match self.registry.latest(subject).await {
            Ok(registered) => (registered.id, registered.schema_type, registered.schema),
            Err(RegistryError::NotFound(_)) if self.policy == SerializePolicy::AutoRegister => {
                let id = self
                    .registry
                    .register(subject, SchemaType::Json, EVENT_JSON_SCHEMA)
                    .await
                    .map_err(unavailable)?;
                tracing::info!("Registered event schema under subject '{subject}' with id {id}");
                (id, SchemaType::Json, EVENT_JSON_SCHEMA.to_string())
            }
            Err(e) => return Err(unavailable(e)),
        };

        let compiled = Arc::new(compile(id, schema_type, &schema_text)?);
        self.by_id
            .write()
            .await
            .insert(id, Arc::clone(&compiled));
        self.by_subject
            .write()
            .await
            .insert(subject.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    async fn resolve_id(&self, id: u32, subject: &str) -> Result<Arc<CachedSchema>> {
        if let Some(cached) = self.by_id.read().await.get(&id) {
            return Ok(Arc::clone(cached));
        }

        let definition = self.registry.schema_by_id(id).await.map_err(|source| {
            CodecError::SchemaUnavailable {
                subject: subject.to_string(),
                source,
            }
        })?;
        let compiled = Arc::new(compile(id, definition.schema_type, &definition.schema)?);
        self.by_id.write().await.insert(id, Arc::clone(&compiled));
        Ok(compiled)
    }

    async fn subjects_of(&self, id: u32, subject: &str) -> Result<Arc<Vec<String>>> {
        if let Some(cached) = self.subjects_by_id.read().await.get(&id) {
            if cached.iter().any(|s| s == subject) {
                return Ok(Arc::clone(cached));
            }
        }

        // A schema id can gain subjects later, so a cached list that lacks the
        // wanted subject is refreshed once before reporting a mismatch.
        let subjects = Arc::new(self.registry.subjects_for_id(id).await.map_err(|source| {
            CodecError::SchemaUnavailable {
                subject: subject.to_string(),
                source,
            }
        })?);
        self.subjects_by_id
            .write()
            .await
            .insert(id, Arc::clone(&subjects));
        Ok(subjects)
    }
}

fn compile(id: u32, schema_type: SchemaType, schema: &str) -> Result<CachedSchema> {
    if schema_type != SchemaType::Json {
        return Err(CodecError::SchemaMismatch(format!(
            "schema {id} is {schema_type}, only JSON schemas are supported"
        )));
    }
    let validator = JsonSchema::parse(schema)
        .map_err(|message| CodecError::InvalidSchema { id, message })?;
    Ok(CachedSchema { id, validator })
}
