//! Schema registry client over the registry's REST API.

use super::{RegisteredSchema, SchemaDefinition, SchemaRegistry, SchemaType};
use crate::error::RegistryError;
use reqwest::{Certificate, Client, Identity, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// Connection settings for [`HttpSchemaRegistry`].
#[derive(Debug, Clone)]
pub struct HttpRegistryConfig {
    /// Registry address; `http://` is assumed when no scheme is given.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// PEM encoded CA certificate to trust in addition to the system roots.
    pub ca_pem: Option<Vec<u8>>,
    /// PEM encoded client certificate followed by its private key.
    pub identity_pem: Option<Vec<u8>>,
}

impl HttpRegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(10),
            ca_pem: None,
            identity_pem: None,
        }
    }
}

pub struct HttpSchemaRegistry {
    client: Client,
    base: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    schema_type: SchemaType,
    schema: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    id: u32,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpSchemaRegistry {
    pub fn new(config: &HttpRegistryConfig) -> Result<Self, RegistryError> {
        let base = parse_base_url(&config.url)?;

        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(ca_pem) = &config.ca_pem {
            let ca = Certificate::from_pem(ca_pem)
                .map_err(|e| RegistryError::InvalidConfig(format!("CA certificate: {e}")))?;
            builder = builder.add_root_certificate(ca);
        }
        if let Some(identity_pem) = &config.identity_pem {
            let identity = Identity::from_pem(identity_pem)
                .map_err(|e| RegistryError::InvalidConfig(format!("client identity: {e}")))?;
            builder = builder.identity(identity);
        }
        let client = builder
            .build()
            .map_err(|e| RegistryError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RegistryError::InvalidConfig("registry URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, RegistryError> {
        let url = self.url(segments)?;
        tracing::debug!("Schema registry GET {url}");
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(format!("GET {url}: {e}")))?;
        decode_response(response, &url).await
    }
}

fn parse_base_url(raw: &str) -> Result<Url, RegistryError> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    Url::parse(&with_scheme)
        .map_err(|e| RegistryError::InvalidConfig(format!("registry URL '{raw}': {e}")))
}

async fn decode_response<T: DeserializeOwned>(
    response: Response,
    url: &Url,
) -> Result<T, RegistryError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| RegistryError::InvalidResponse(format!("{url}: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => Err(RegistryError::NotFound(message)),
        _ if status.is_server_error() => Err(RegistryError::Unreachable(format!(
            "{url} returned {status}: {message}"
        ))),
        _ => Err(RegistryError::Rejected {
            status: status.as_u16(),
            message,
        }),
    }
}

#[async_trait::async_trait]
impl SchemaRegistry for HttpSchemaRegistry {
    async fn list_subjects(&self) -> Result<Vec<String>, RegistryError> {
        self.get(&["subjects"]).await
    }

    async fn latest(&self, subject: &str) -> Result<RegisteredSchema, RegistryError> {
        self.get(&["subjects", subject, "versions", "latest"]).await
    }

    async fn register(
        &self,
        subject: &str,
        schema_type: SchemaType,
        schema: &str,
    ) -> Result<u32, RegistryError> {
        let url = self.url(&["subjects", subject, "versions"])?;
        tracing::debug!("Schema registry POST {url}");
        let response = self
            .client
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .json(&RegisterRequest {
                schema_type,
                schema,
            })
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(format!("POST {url}: {e}")))?;
        let registered: RegisterResponse = decode_response(response, &url).await?;
        Ok(registered.id)
    }

    async fn schema_by_id(&self, id: u32) -> Result<SchemaDefinition, RegistryError> {
        self.get(&["schemas", "ids", &id.to_string()]).await
    }

    async fn subjects_for_id(&self, id: u32) -> Result<Vec<String>, RegistryError> {
        self.get(&["schemas", "ids", &id.to_string(), "subjects"])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_defaults_to_http() {
        let config = HttpRegistryConfig::new("registry:8081");
        let registry = HttpSchemaRegistry::new(&config).unwrap();
        assert_eq!(registry.base_url().as_str(), "http://registry:8081/");
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let config = HttpRegistryConfig::new("http://");
        assert!(matches!(
            HttpSchemaRegistry::new(&config),
            Err(RegistryError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_url_segments_are_joined_and_escaped() {
        let config = HttpRegistryConfig::new("https://registry:8081/api/");
        let registry = HttpSchemaRegistry::new(&config).unwrap();
        let url = registry.url(&["subjects", "cars value", "versions"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://registry:8081/api/subjects/cars%20value/versions"
        );
    }
}
