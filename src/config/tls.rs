//! TLS options for the brokers and the schema registry.
//!
//! The same PEM files serve both transports: librdkafka reads them by path,
//! while the registry client gets their contents.

use super::ConfigError;
use clap::Args;
use schema_codec::HttpRegistryConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Clone, Debug, Default)]
pub struct TlsOpts {
    /// CA certificate (PEM) used to verify brokers and an https registry
    #[arg(long, env = "SSL_CA_LOCATION")]
    pub ssl_ca_location: Option<PathBuf>,

    /// Client certificate (PEM)
    #[arg(long, env = "SSL_CERTIFICATE_LOCATION")]
    pub ssl_certificate_location: Option<PathBuf>,

    /// Client private key (PEM)
    #[arg(long, env = "SSL_KEY_LOCATION")]
    pub ssl_key_location: Option<PathBuf>,
}

impl TlsOpts {
    pub fn enabled(&self) -> bool {
        self.ssl_ca_location.is_some() || self.ssl_certificate_location.is_some()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.ssl_certificate_location, &self.ssl_key_location) {
            (Some(_), None) | (None, Some(_)) => Err(ConfigError::IncompleteClientCert),
            _ => Ok(()),
        }
    }

    /// librdkafka properties selecting TLS; empty when no TLS option is set.
    pub fn kafka_properties(&self) -> Result<Vec<(String, String)>, ConfigError> {
        self.validate()?;
        if !self.enabled() {
            return Ok(Vec::new());
        }

        let mut props = vec![("security.protocol".to_string(), "ssl".to_string())];
        let paths = [
            ("ssl.ca.location", &self.ssl_ca_location),
            ("ssl.certificate.location", &self.ssl_certificate_location),
            ("ssl.key.location", &self.ssl_key_location),
        ];
        for (key, path) in paths {
            if let Some(path) = path {
                props.push((key.to_string(), path.display().to_string()));
            }
        }
        Ok(props)
    }

    /// Registry client settings; TLS files are only read for `https` URLs.
    pub fn registry_config(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpRegistryConfig, ConfigError> {
        self.validate()?;
        let mut config = HttpRegistryConfig::new(url);
        config.timeout = timeout;

        if !url.trim_start().to_ascii_lowercase().starts_with("https://") {
            return Ok(config);
        }

        if let Some(ca) = &self.ssl_ca_location {
            config.ca_pem = Some(read_pem(ca)?);
        }
        if let (Some(cert), Some(key)) = (&self.ssl_certificate_location, &self.ssl_key_location) {
            let mut identity = read_pem(cert)?;
            identity.push(b'\n');
            identity.extend(read_pem(key)?);
            config.identity_pem = Some(identity);
        }
        Ok(config)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}
