//! Common infrastructure for the DPU IPsec manager.
//!
//! - [`error`]: error taxonomy (configuration, transport, remote rejection)
//! - [`transport`]: control-plane channel, plaintext or mutual TLS
//! - [`service`]: capability traits and the gRPC connector
//! - [`probe`]: data-plane reachability probes
//! - [`shell`]: host command execution with proper quoting
//! - [`logging`]: `tracing` subscriber setup
//!
//! # Example
//!
//! ```ignore
//! use ipsec_common::{IpsecResult, TransportConfig};
//!
//! async fn open() -> IpsecResult<tonic::transport::Channel> {
//!     let config = TransportConfig::new("localhost:50151")
//!         .with_tls(Some("client.crt:client.key:ca.crt".parse()?));
//!     config.connect().await
//! }
//! ```

pub mod error;
pub mod logging;
pub mod probe;
pub mod service;
pub mod shell;
pub mod transport;

// Re-export commonly used items at crate root
pub use error::{IpsecError, IpsecResult};
pub use probe::{PingProber, PingStatistics, Prober};
pub use service::{Connector, GrpcConnector, IkeService, StaticSaService};
pub use transport::{TlsFiles, TransportConfig, DEFAULT_ENDPOINT};
