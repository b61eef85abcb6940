//! Test infrastructure for the DPU IPsec manager
//!
//! Provides:
//! - A recording control-plane double implementing both capability traits
//! - Scripted rejections, transport failures and delays per RPC
//! - A connector that counts opens and closes
//! - A canned-result prober
//! - Call-sequence verification helpers and message fixtures

pub mod fixtures;
mod recording;
mod verification;

pub use fixtures::*;
pub use recording::{Behavior, Call, RecordingConnector, RecordingService, StaticProber};
pub use verification::*;
