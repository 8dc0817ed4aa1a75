//! In-process schema registry.

use super::{RegisteredSchema, SchemaDefinition, SchemaRegistry, SchemaType};
use crate::error::RegistryError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    /// Global schemas, indexed by `id - 1`.
    schemas: Vec<SchemaDefinition>,
    /// Subject name to schema ids, one per version.
    subjects: BTreeMap<String, Vec<u32>>,
}

/// Registry kept in memory, with the same id and versioning rules as the
/// real one: ids are global and start at 1, re-registering identical schema
/// text reuses the id, and each new schema under a subject adds a version.
///
/// It can be switched offline to exercise the unreachable-registry paths.
#[derive(Default)]
pub struct MemorySchemaRegistry {
    inner: Mutex<Inner>,
    offline: AtomicBool,
    requests: AtomicU64,
}

impl MemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`RegistryError::Unreachable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls served so far, including failed ones.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), RegistryError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(RegistryError::Unreachable(
                "in-memory registry is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SchemaRegistry for MemorySchemaRegistry {
    async fn list_subjects(&self) -> Result<Vec<String>, RegistryError> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        Ok(inner.subjects.keys().cloned().collect())
    }

    async fn latest(&self, subject: &str) -> Result<RegisteredSchema, RegistryError> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        let versions = inner
            .subjects
            .get(subject)
            .ok_or_else(|| RegistryError::NotFound(format!("Subject '{subject}' not found.")))?;
        let id = *versions.last().ok_or_else(|| {
            RegistryError::NotFound(format!("Subject '{subject}' has no versions."))
        })?;
        let definition = &inner.schemas[(id - 1) as usize];
        Ok(RegisteredSchema {
            subject: subject.to_string(),
            version: versions.len() as u32,
            id,
            schema_type: definition.schema_type,
            schema: definition.schema.clone(),
        })
    }

    async fn register(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
    ) -> Result<u32, RegistryError> {
        self.check_online()?;
        let mut inner = self.inner.lock().await;

        let existing = inner
            .schemas
            .iter()
            .position(|d| d.schema_type == schema_type && d.schema == schema);
        let id = match existing {
            Some(index) => index as u32 + 1,
            None => {
                inner.schemas.push(SchemaDefinition {
                    schema_type,
                    schema: schema.to_string(),
                });
                inner.schemas.len() as u32
            }
        };

        let versions = inner.subjects.entry(subject.to_string()).or_default();
        if !versions.contains(&id) {
            versions.push(id);
        }
        Ok(id)
    }

    async fn schema_by_id(&self, id: u32) -> Result<SchemaDefinition, RegistryError> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        id.checked_sub(1)
            .and_then(|index| inner.schemas.get(index as usize))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("Schema {id} not found")))
    }

    async fn subjects_for_id(&self, id: u32) -> Result<Vec<String>, RegistryError> {
        self.check_online()?;
        let inner = self.inner.lock().await;
        let subjects: Vec<String> = inner
            .subjects
            .iter()
            .filter(|(_, ids)| ids.contains(&id))
            .map(|(subject, _)| subject.clone())
            .collect();
        if subjects.is_empty() {
            return Err(RegistryError::NotFound(format!("Schema {id} not found")));
        }
        Ok(subjects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_assigns_global_ids_and_versions() {
        let registry = MemorySchemaRegistry::new();

        let first = registry.register("cars", SchemaType::Json, "{}").await.unwrap();
        let again = registry.register("cars", SchemaType::Json, "{}").await.unwrap();
        let other = registry
            .register("bikes", SchemaType::Json, r#"{"type":"object"}"#)
            .await
            .unwrap();
        let evolved = registry
            .register("cars", SchemaType::Json, r#"{"type":"object"}"#)
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(again, 1);
        assert_eq!(other, 2);
        assert_eq!(evolved, 2);

        let latest = registry.latest("cars").await.unwrap();
        assert_eq!(latest.version, 2);
        assert_eq!(latest.id, 2);
        assert_eq!(
            registry.subjects_for_id(2).await.unwrap(),
            vec!["bikes".to_string(), "cars".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_subject_and_id() {
        let registry = MemorySchemaRegistry::new();
        assert!(matches!(
            registry.latest("missing").await,
            Err(RegistryError::NotFound(_))
        ));
        assert!(matches!(
            registry.schema_by_id(0).await,
            Err(RegistryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_offline_registry() {
        let registry = MemorySchemaRegistry::new();
        registry.set_offline(true);
        assert!(matches!(
            registry.list_subjects().await,
            Err(RegistryError::Unreachable(_))
        ));
        assert_eq!(registry.request_count(), 1);
    }
}
