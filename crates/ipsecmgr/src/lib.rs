//! IPsec Manager - SA installation and IKE tunnel lifecycle for DPUs
//!
//! ipsecmgr drives the IPsec control plane of a programmable network device:
//! - Static (manually keyed) SA install and removal
//! - IKE connection load, initiate, introspection, rekey and teardown
//! - Data-plane reachability checks across an established tunnel
//! - Name tables translating algorithm names to IKEv2 transform codes
//!
//! All state lives on the remote daemon; this crate holds requests and
//! responses only for the duration of a call.

pub mod algorithms;
pub mod cli;
pub mod static_sa;
pub mod tunnel;
pub mod types;
pub mod verifier;

pub use static_sa::StaticSaManager;
pub use tunnel::{LifecycleConfig, LifecycleError, LifecycleReport, TunnelOrchestrator};
pub use types::{ConnectionSpec, LifecycleStep, SaIdentifier, SaParams, TunnelState};
pub use verifier::ConnectivityVerifier;
