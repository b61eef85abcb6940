//! Data-plane reachability check across an established tunnel.

use ipsec_common::error::{IpsecError, IpsecResult};
use ipsec_common::probe::{PingStatistics, Prober};
use tracing::{info, warn};

/// Echo requests per verification run.
pub const PROBE_COUNT: u32 = 5;

/// Runs a fixed-count probe and fails when nothing comes back.
///
/// Only gates the reported outcome of a run; never touches SA state.
#[derive(Debug, Clone)]
pub struct ConnectivityVerifier<P> {
    prober: P,
}

impl<P: Prober> ConnectivityVerifier<P> {
    pub fn new(prober: P) -> Self {
        Self { prober }
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub async fn verify(&self, target: &str) -> IpsecResult<PingStatistics> {
        let stats = self.prober.probe(target, PROBE_COUNT).await?;
        if !stats.reachable() {
            warn!(target = %target, sent = stats.transmitted, "No echo replies");
            return Err(IpsecError::ProbeFailed {
                target: target.to_string(),
                sent: stats.transmitted,
                received: stats.received,
            });
        }
        info!(target = %target, stats = %stats, "Data plane reachable");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipsec_test::StaticProber;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_verify_reachable() {
        let verifier = ConnectivityVerifier::new(StaticProber::reachable());
        let stats = verifier.verify("10.1.0.2").await.unwrap();
        assert_eq!(stats.transmitted, PROBE_COUNT);
        assert_eq!(stats.received, PROBE_COUNT);
        assert_eq!(
            verifier.prober().probes(),
            vec![("10.1.0.2".to_string(), PROBE_COUNT)]
        );
    }

    #[tokio::test]
    async fn test_verify_partial_loss_passes() {
        let verifier = ConnectivityVerifier::new(StaticProber::with_received(1));
        let stats = verifier.verify("10.1.0.2").await.unwrap();
        assert_eq!(stats.received, 1);
    }

    #[tokio::test]
    async fn test_verify_unreachable() {
        let verifier = ConnectivityVerifier::new(StaticProber::unreachable());
        match verifier.verify("10.1.0.2").await {
            Err(IpsecError::ProbeFailed {
                target,
                sent,
                received,
            }) => {
                assert_eq!(target, "10.1.0.2");
                assert_eq!(sent, PROBE_COUNT);
                assert_eq!(received, 0);
            }
            other => panic!("Expected ProbeFailed, got {:?}", other),
        }
    }
}
