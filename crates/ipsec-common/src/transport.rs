//! Transport to the control-plane endpoint.
//!
//! A channel is a plain HTTP/2 connection, or mutual TLS when a
//! `client_cert:client_key:ca_cert` file spec is supplied. Every
//! configuration problem (malformed spec, unreadable file, bad address) is
//! reported before a socket is opened.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};
use tracing::{debug, info};

use crate::error::{IpsecError, IpsecResult};

/// Default control-plane address.
pub const DEFAULT_ENDPOINT: &str = "localhost:50151";

/// Default budget for establishing the channel.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client certificate, client key and CA certificate paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
    pub ca_cert: PathBuf,
}

impl FromStr for TlsFiles {
    type Err = IpsecError;

    /// Parses `"client_cert:client_key:ca_cert"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(IpsecError::tls_spec(format!(
                "expected 'client_cert:client_key:ca_cert', got {} component(s) in '{}'",
                parts.len(),
                s
            )));
        }

        for (name, value) in ["client_cert", "client_key", "ca_cert"].iter().zip(&parts) {
            if value.trim().is_empty() {
                return Err(IpsecError::tls_spec(format!("{} is empty", name)));
            }
        }

        Ok(Self {
            client_cert: PathBuf::from(parts[0]),
            client_key: PathBuf::from(parts[1]),
            ca_cert: PathBuf::from(parts[2]),
        })
    }
}

impl fmt::Display for TlsFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.client_cert.display(),
            self.client_key.display(),
            self.ca_cert.display()
        )
    }
}

impl TlsFiles {
    /// Reads the three PEM files and builds the client TLS configuration.
    pub async fn load(&self) -> IpsecResult<ClientTlsConfig> {
        let cert = read_pem(&self.client_cert).await?;
        let key = read_pem(&self.client_key).await?;
        let ca = read_pem(&self.ca_cert).await?;

        info!(
            cert = %self.client_cert.display(),
            ca = %self.ca_cert.display(),
            "Loaded mTLS client credentials"
        );

        Ok(ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(ca))
            .identity(Identity::from_pem(cert, key)))
    }
}

async fn read_pem(path: &Path) -> IpsecResult<Vec<u8>> {
    let data = tokio::fs::read(path).await.map_err(|e| IpsecError::TlsFile {
        path: path.display().to_string(),
        source: e,
    })?;
    if data.is_empty() {
        return Err(IpsecError::tls_spec(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(data)
}

/// Where and how to reach the control plane.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// `host:port`, or a full URI.
    pub endpoint: String,
    /// Mutual TLS credentials; plaintext when `None`.
    pub tls: Option<TlsFiles>,
    /// Budget for establishing the channel.
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            tls: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the TLS credentials (builder pattern)
    pub fn with_tls(mut self, tls: Option<TlsFiles>) -> Self {
        self.tls = tls;
        self
    }

    /// Set the connect timeout (builder pattern)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns the endpoint as a URI, adding a scheme when none was given.
    pub fn uri(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.tls.is_some() {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }

    /// Validates the address and loads TLS material without touching the network.
    pub async fn endpoint(&self) -> IpsecResult<Endpoint> {
        let uri = self.uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| IpsecError::invalid_config("endpoint", format!("{}: {}", uri, e)))?
            .connect_timeout(self.connect_timeout);

        if let Some(tls) = &self.tls {
            let tls_config = tls.load().await?;
            endpoint = endpoint
                .tls_config(tls_config)
                .map_err(|e| IpsecError::invalid_config("tls", e.to_string()))?;
        }

        Ok(endpoint)
    }

    /// Opens a channel to the control plane.
    pub async fn connect(&self) -> IpsecResult<Channel> {
        let endpoint = self.endpoint().await?;
        debug!(endpoint = %self.endpoint, tls = self.tls.is_some(), "Connecting");

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| IpsecError::transport(&self.endpoint, e.to_string()))?;

        info!(endpoint = %self.endpoint, "Connected to control plane");
        Ok(channel)
    }
}
