//! Wire messages and gRPC client for the IPsec control-plane service.
//!
//! The messages are declared by hand with `prost` derives instead of being
//! generated at build time, so the crate builds without `protoc`. Field tags
//! and enumeration values are part of the wire contract and must not be
//! renumbered.
//!
//! # Architecture
//!
//! - [`messages`]: request/response messages and protocol enumerations
//! - [`client`]: unary gRPC client over a tonic [`Channel`](tonic::transport::Channel)
//!
//! # Example
//!
//! ```ignore
//! use ipsec_proto::{IpsecClient, IPsecVersionRequest};
//!
//! let client = IpsecClient::new(channel);
//! let version = client.ipsec_version(IPsecVersionRequest {}).await?;
//! println!("{} {}", version.daemon, version.version);
//! ```

pub mod client;
pub mod messages;

pub use client::{paths, IpsecClient};
pub use messages::*;
