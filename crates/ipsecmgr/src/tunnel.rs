//! IKE tunnel lifecycle orchestration.
//!
//! A run drives the daemon through a fixed sequence of RPCs:
//!
//! | Step | RPCs | On failure |
//! |------|------|------------|
//! | 1 | `IPsecVersion`, `IPsecStats` | logged, run continues |
//! | 2 | `IPsecLoadConn` | run ends, nothing else is called |
//! | 3 | `IPsecInitiate` | terminate, then unload |
//! | 4 | `IPsecListSas`, `IPsecListConns`, `IPsecListCerts` | terminate, then unload |
//! | 5 | connectivity probe | terminate, then unload |
//! | 6 | `IPsecRekey` | terminate, then unload |
//! | 7 | `IPsecTerminate`, `IPsecUnloadConn` | reported; unload is skipped if terminate failed |
//!
//! Steps 1 to 6 share one deadline. Each cleanup call gets its own budget so
//! a run that ran out of time still tears down what it set up.
//!
//! Cancellation aborts the in-flight call and issues no cleanup at all. The
//! daemon is left in whatever state [`LifecycleReport::state`] shows and has
//! to be cleaned up externally.

use std::future::Future;
use std::time::Duration;

use ipsec_common::error::{IpsecError, IpsecResult};
use ipsec_common::probe::{PingStatistics, Prober};
use ipsec_common::service::{Connector, IkeService};
use ipsec_proto::{
    IPsecInitiateRequest, IPsecListCertsRequest, IPsecListConnsRequest, IPsecListSasRequest,
    IPsecLoadConnRequest, IPsecRekeyRequest, IPsecTerminateRequest, IPsecUnloadConnRequest,
    IPsecVersionResponse, ListConnResp, ListIkeSa,
};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::types::{AuthSpec, ChildSpec, ConnectionSpec, LifecycleStep, ProposalSpec, TunnelState};
use crate::verifier::ConnectivityVerifier;

/// Defaults of the reference tunnel scenario.
pub mod defaults {
    use std::time::Duration;

    pub const CONN: &str = "opi-test";
    pub const CHILD: &str = "opi-child";
    pub const LOCAL_ADDR: &str = "192.168.200.200";
    pub const REMOTE_ADDR: &str = "192.168.200.210";
    pub const LOCAL_ID: &str = "hacker@strongswan.org";
    pub const REMOTE_ID: &str = "server.strongswan.org";
    pub const AUTH: &str = "psk";
    pub const IKE_CRYPTO: &str = "aes_cbc";
    pub const IKE_INTEG: &str = "sha2_256_128";
    pub const ESP_CRYPTO: &str = "aes_gcm_icv_16";
    pub const DH_GROUP: &str = "curve25519";
    pub const LOCAL_TS: &str = "10.3.0.0/16";
    pub const REMOTE_TS: &str = "10.1.0.0/16";
    pub const PROBE_TARGET: &str = "10.1.0.2";
    pub const CERT_TYPE: &str = "X509";

    /// Budget for a full lifecycle run.
    pub const LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Budget for a version and statistics query.
    pub const STATS_TIMEOUT: Duration = Duration::from_secs(1);

    /// Budget for each cleanup call.
    pub const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);
}

/// The `opi-test` connection with its single `opi-child` child.
pub fn reference_connection() -> ConnectionSpec {
    ConnectionSpec {
        name: defaults::CONN.to_string(),
        version: "2".to_string(),
        virtual_ips: Vec::new(),
        local_addresses: vec![defaults::LOCAL_ADDR.to_string()],
        remote_addresses: vec![defaults::REMOTE_ADDR.to_string()],
        local_auth: AuthSpec::new(defaults::AUTH, defaults::LOCAL_ID),
        remote_auth: AuthSpec::new(defaults::AUTH, defaults::REMOTE_ID),
        proposals: Some(ProposalSpec {
            crypto_algorithms: vec![defaults::IKE_CRYPTO.to_string()],
            integrity_algorithms: vec![defaults::IKE_INTEG.to_string()],
            dh_groups: vec![defaults::DH_GROUP.to_string()],
        }),
        children: vec![ChildSpec {
            name: defaults::CHILD.to_string(),
            esp_proposals: ProposalSpec {
                crypto_algorithms: vec![defaults::ESP_CRYPTO.to_string()],
                integrity_algorithms: Vec::new(),
                dh_groups: vec![defaults::DH_GROUP.to_string()],
            },
            local_traffic_selectors: vec![defaults::LOCAL_TS.to_string()],
            remote_traffic_selectors: vec![defaults::REMOTE_TS.to_string()],
        }],
    }
}

/// What one lifecycle run exercises.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub connection: ConnectionSpec,
    /// Child SA to initiate; must be one of the connection's children.
    pub child: String,
    /// Address probed across the tunnel.
    pub probe_target: String,
    /// Deadline for steps 1 to 6.
    pub timeout: Duration,
    /// Budget for each cleanup call.
    pub cleanup_timeout: Duration,
    /// Certificate type passed to `IPsecListCerts`.
    pub cert_type: String,
    /// Log introspection failures instead of aborting. At least one of the
    /// three listings must still succeed.
    pub advisory_introspection: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self::new(
            reference_connection(),
            defaults::CHILD,
            defaults::PROBE_TARGET,
        )
    }
}

impl LifecycleConfig {
    pub fn new(
        connection: ConnectionSpec,
        child: impl Into<String>,
        probe_target: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            child: child.into(),
            probe_target: probe_target.into(),
            timeout: defaults::LIFECYCLE_TIMEOUT,
            cleanup_timeout: defaults::CLEANUP_TIMEOUT,
            cert_type: defaults::CERT_TYPE.to_string(),
            advisory_introspection: false,
        }
    }

    /// Set the overall deadline (builder pattern)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-call cleanup budget (builder pattern)
    pub fn with_cleanup_timeout(mut self, timeout: Duration) -> Self {
        self.cleanup_timeout = timeout;
        self
    }

    /// Set the certificate type to list (builder pattern)
    pub fn with_cert_type(mut self, cert_type: impl Into<String>) -> Self {
        self.cert_type = cert_type.into();
        self
    }

    /// Downgrade introspection failures to warnings (builder pattern)
    pub fn with_advisory_introspection(mut self, advisory: bool) -> Self {
        self.advisory_introspection = advisory;
        self
    }

    pub fn conn_name(&self) -> &str {
        &self.connection.name
    }

    /// Builds the `IPsecLoadConn` request, validating every name in it.
    pub fn load_request(&self) -> IpsecResult<IPsecLoadConnRequest> {
        if self.connection.child(&self.child).is_none() {
            return Err(IpsecError::invalid_config(
                "child",
                format!(
                    "connection '{}' has no child '{}'",
                    self.connection.name, self.child
                ),
            ));
        }
        Ok(IPsecLoadConnRequest {
            connection: Some(self.connection.to_proto()?),
        })
    }
}

/// A failure that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepWarning {
    pub step: LifecycleStep,
    pub message: String,
}

impl StepWarning {
    fn new(step: LifecycleStep, error: &IpsecError) -> Self {
        Self {
            step,
            message: error.to_string(),
        }
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, Default)]
pub struct LifecycleReport {
    pub connection: String,
    pub child: String,
    pub state: TunnelState,
    /// Steps that succeeded, in order.
    pub completed: Vec<LifecycleStep>,
    /// Advisory failures.
    pub warnings: Vec<StepWarning>,
    pub cleanup_failures: Vec<StepWarning>,
    pub daemon: Option<IPsecVersionResponse>,
    pub daemon_status: Option<String>,
    pub ike_sas: Vec<ListIkeSa>,
    pub connections: Vec<ListConnResp>,
    pub certificates: usize,
    pub probe: Option<PingStatistics>,
}

impl LifecycleReport {
    fn new(config: &LifecycleConfig) -> Self {
        Self {
            connection: config.connection.name.clone(),
            child: config.child.clone(),
            ..Default::default()
        }
    }

    fn advance(&mut self, step: LifecycleStep, state: TunnelState) {
        self.completed.push(step);
        self.state = state;
    }
}

/// A fatal lifecycle failure.
#[derive(Debug, Error)]
#[error("{step} failed: {source}")]
pub struct LifecycleError {
    pub step: LifecycleStep,
    #[source]
    pub source: IpsecError,
    pub report: Box<LifecycleReport>,
}

impl LifecycleError {
    fn new(step: LifecycleStep, source: IpsecError, report: LifecycleReport) -> Self {
        Self {
            step,
            source,
            report: Box::new(report),
        }
    }

    /// State the daemon was left in.
    pub fn state(&self) -> TunnelState {
        self.report.state
    }
}

type Failure = (LifecycleStep, IpsecError);

/// Bounds one call by a deadline and a cancellation token.
struct Guard<'a> {
    deadline: Instant,
    budget: Duration,
    cancel: &'a CancellationToken,
}

impl<'a> Guard<'a> {
    fn new(budget: Duration, cancel: &'a CancellationToken) -> Self {
        Self {
            deadline: Instant::now() + budget,
            budget,
            cancel,
        }
    }

    async fn run<T>(
        &self,
        step: LifecycleStep,
        call: impl Future<Output = IpsecResult<T>>,
    ) -> IpsecResult<T> {
        debug!(step = %step, "Issuing");
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(IpsecError::Cancelled {
                operation: step.to_string(),
            }),
            result = tokio::time::timeout_at(self.deadline, call) => {
                result.unwrap_or_else(|_| {
                    Err(IpsecError::Timeout {
                        operation: step.to_string(),
                        after: self.budget,
                    })
                })
            }
        }
    }
}

/// Records a failure of an advisory step, or escalates it when the step is
/// not advisory or the run was cancelled.
fn advisory(report: &mut LifecycleReport, step: LifecycleStep, err: IpsecError) -> Result<(), Failure> {
    if !step.is_advisory() || matches!(err, IpsecError::Cancelled { .. }) {
        return Err((step, err));
    }
    warn!(step = %step, error = %err, "Advisory step failed, continuing");
    report.warnings.push(StepWarning::new(step, &err));
    Ok(())
}

/// Daemon identity and live status.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonInfo {
    pub version: IPsecVersionResponse,
    pub status: String,
}

/// Queries version and statistics on a client of its own.
pub async fn query_daemon<C: Connector>(connector: &C, timeout: Duration) -> IpsecResult<DaemonInfo> {
    let client = connector.open().await?;
    let cancel = CancellationToken::new();
    let guard = Guard::new(timeout, &cancel);

    let result = async {
        let version = guard.run(LifecycleStep::Version, client.version()).await?;
        let stats = guard.run(LifecycleStep::Stats, client.stats()).await?;
        Ok::<_, IpsecError>(DaemonInfo {
            version,
            status: stats.status,
        })
    }
    .await;

    connector.close(client).await;
    result
}

/// Drives one connection through the full IKE lifecycle.
///
/// Each run opens its own client, so independent connections can be
/// exercised concurrently from separate orchestrators.
#[derive(Debug)]
pub struct TunnelOrchestrator<C, P> {
    connector: C,
    verifier: ConnectivityVerifier<P>,
    config: LifecycleConfig,
}

impl<C: Connector, P: Prober> TunnelOrchestrator<C, P> {
    pub fn new(connector: C, prober: P, config: LifecycleConfig) -> Self {
        Self {
            connector,
            verifier: ConnectivityVerifier::new(prober),
            config,
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn verifier(&self) -> &ConnectivityVerifier<P> {
        &self.verifier
    }

    pub async fn run(&self) -> Result<LifecycleReport, LifecycleError> {
        self.run_with_cancel(&CancellationToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<LifecycleReport, LifecycleError> {
        let mut report = LifecycleReport::new(&self.config);
        let conn = self.config.conn_name();

        let load = match self.config.load_request() {
            Ok(request) => request,
            Err(e) => return Err(LifecycleError::new(LifecycleStep::LoadConn, e, report)),
        };

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(IpsecError::Cancelled {
                operation: LifecycleStep::Connect.to_string(),
            }),
            client = self.connector.open() => client,
        };
        let client = match opened {
            Ok(client) => client,
            Err(e) => {
                error!(conn = %conn, error = %e, "Could not open control-plane client");
                return Err(LifecycleError::new(LifecycleStep::Connect, e, report));
            }
        };

        info!(conn = %conn, child = %self.config.child, "Starting tunnel lifecycle");
        let outcome = self.drive(&client, load, cancel, &mut report).await;
        self.connector.close(client).await;

        match outcome {
            Ok(()) => {
                info!(conn = %conn, state = %report.state, "Tunnel lifecycle complete");
                Ok(report)
            }
            Err((step, source)) => {
                error!(
                    conn = %conn,
                    step = %step,
                    state = %report.state,
                    error = %source,
                    "Tunnel lifecycle failed"
                );
                Err(LifecycleError::new(step, source, report))
            }
        }
    }

    async fn drive(
        &self,
        client: &C::Client,
        load: IPsecLoadConnRequest,
        cancel: &CancellationToken,
        report: &mut LifecycleReport,
    ) -> Result<(), Failure> {
        let conn = self.config.conn_name();
        let guard = Guard::new(self.config.timeout, cancel);

        match guard.run(LifecycleStep::Version, client.version()).await {
            Ok(version) => {
                info!(daemon = %version.daemon, version = %version.version, "Daemon version");
                report.daemon = Some(version);
                report.completed.push(LifecycleStep::Version);
            }
            Err(e) => advisory(report, LifecycleStep::Version, e)?,
        }
        match guard.run(LifecycleStep::Stats, client.stats()).await {
            Ok(stats) => {
                debug!(status = %stats.status, "Daemon statistics");
                report.daemon_status = Some(stats.status);
                report.completed.push(LifecycleStep::Stats);
            }
            Err(e) => advisory(report, LifecycleStep::Stats, e)?,
        }

        guard
            .run(LifecycleStep::LoadConn, client.load_conn(load))
            .await
            .map_err(|e| (LifecycleStep::LoadConn, e))?;
        report.advance(LifecycleStep::LoadConn, TunnelState::Loaded);
        info!(conn = %conn, "Connection loaded");

        report.state = TunnelState::Negotiating;
        let initiate = IPsecInitiateRequest {
            child: self.config.child.clone(),
            ike: conn.to_string(),
            ..Default::default()
        };
        // A failed or timed-out initiate may still leave a half-open IKE SA.
        if let Err(e) = guard.run(LifecycleStep::Initiate, client.initiate(initiate)).await {
            self.cleanup(client, cancel, report).await;
            return Err((LifecycleStep::Initiate, e));
        }
        report.completed.push(LifecycleStep::Initiate);
        info!(conn = %conn, child = %self.config.child, "Negotiation initiated");

        if let Err(failure) = self.exercise(client, &guard, report).await {
            self.cleanup(client, cancel, report).await;
            return Err(failure);
        }

        match self.cleanup(client, cancel, report).await {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Introspection, probe and rekey on an initiated connection.
    async fn exercise(
        &self,
        client: &C::Client,
        guard: &Guard<'_>,
        report: &mut LifecycleReport,
    ) -> Result<(), Failure> {
        let conn = self.config.conn_name();
        let mut introspected = false;
        let mut first_failure = None;

        let list_sas = IPsecListSasRequest {
            ike: conn.to_string(),
            ..Default::default()
        };
        match guard.run(LifecycleStep::ListSas, client.list_sas(list_sas)).await {
            Ok(resp) => {
                if !resp.ikesas.iter().any(|sa| sa.name == conn) {
                    warn!(conn = %conn, "Daemon reports no IKE SA for the connection");
                    report.warnings.push(StepWarning {
                        step: LifecycleStep::ListSas,
                        message: format!("no IKE SA listed for '{}'", conn),
                    });
                }
                info!(conn = %conn, ike_sas = resp.ikesas.len(), "Listed SAs");
                report.ike_sas = resp.ikesas;
                report.completed.push(LifecycleStep::ListSas);
                introspected = true;
            }
            Err(e) => self.introspection_failed(report, LifecycleStep::ListSas, e, &mut first_failure)?,
        }

        let list_conns = IPsecListConnsRequest {
            ike: conn.to_string(),
        };
        match guard.run(LifecycleStep::ListConns, client.list_conns(list_conns)).await {
            Ok(resp) => {
                info!(conn = %conn, connections = resp.connection.len(), "Listed connections");
                report.connections = resp.connection;
                report.completed.push(LifecycleStep::ListConns);
                introspected = true;
            }
            Err(e) => {
                self.introspection_failed(report, LifecycleStep::ListConns, e, &mut first_failure)?
            }
        }

        let list_certs = IPsecListCertsRequest {
            r#type: self.config.cert_type.clone(),
            ..Default::default()
        };
        match guard.run(LifecycleStep::ListCerts, client.list_certs(list_certs)).await {
            Ok(resp) => {
                info!(cert_type = %self.config.cert_type, certs = resp.certs.len(), "Listed certificates");
                report.certificates = resp.certs.len();
                report.completed.push(LifecycleStep::ListCerts);
                introspected = true;
            }
            Err(e) => {
                self.introspection_failed(report, LifecycleStep::ListCerts, e, &mut first_failure)?
            }
        }

        if !introspected {
            if let Some(failure) = first_failure {
                return Err(failure);
            }
        }
        report.state = TunnelState::Established;
        info!(conn = %conn, "Tunnel established");

        let stats = guard
            .run(LifecycleStep::Probe, self.verifier.verify(&self.config.probe_target))
            .await
            .map_err(|e| (LifecycleStep::Probe, e))?;
        report.probe = Some(stats);
        report.completed.push(LifecycleStep::Probe);

        let rekey = IPsecRekeyRequest {
            ike: conn.to_string(),
            ..Default::default()
        };
        let resp = guard
            .run(LifecycleStep::Rekey, client.rekey(rekey))
            .await
            .map_err(|e| (LifecycleStep::Rekey, e))?;
        report.advance(LifecycleStep::Rekey, TunnelState::Rekeyed);
        info!(conn = %conn, matches = resp.matches, "IKE SA rekeyed");

        Ok(())
    }

    fn introspection_failed(
        &self,
        report: &mut LifecycleReport,
        step: LifecycleStep,
        err: IpsecError,
        first_failure: &mut Option<Failure>,
    ) -> Result<(), Failure> {
        if !self.config.advisory_introspection || matches!(err, IpsecError::Cancelled { .. }) {
            return Err((step, err));
        }
        warn!(step = %step, error = %err, "Introspection failed, continuing");
        report.warnings.push(StepWarning::new(step, &err));
        if first_failure.is_none() {
            *first_failure = Some((step, err));
        }
        Ok(())
    }

    /// Terminates and then unloads the connection.
    ///
    /// Returns the first cleanup failure. Unload is not attempted after a
    /// failed terminate.
    async fn cleanup(
        &self,
        client: &C::Client,
        cancel: &CancellationToken,
        report: &mut LifecycleReport,
    ) -> Option<Failure> {
        let conn = self.config.conn_name();
        if cancel.is_cancelled() {
            warn!(
                conn = %conn,
                state = %report.state,
                "Cancelled, connection left on daemon"
            );
            return None;
        }

        let guard = Guard::new(self.config.cleanup_timeout, cancel);
        let terminate = IPsecTerminateRequest {
            ike: conn.to_string(),
            ..Default::default()
        };
        match guard.run(LifecycleStep::Terminate, client.terminate(terminate)).await {
            Ok(resp) => {
                info!(conn = %conn, terminated = resp.terminated, "IKE SA terminated");
                report.advance(LifecycleStep::Terminate, TunnelState::Terminated);
            }
            Err(e) => {
                error!(conn = %conn, error = %e, "Terminate failed, connection left loaded");
                report
                    .cleanup_failures
                    .push(StepWarning::new(LifecycleStep::Terminate, &e));
                return Some((LifecycleStep::Terminate, e));
            }
        }

        let guard = Guard::new(self.config.cleanup_timeout, cancel);
        let unload = IPsecUnloadConnRequest {
            name: conn.to_string(),
        };
        match guard.run(LifecycleStep::UnloadConn, client.unload_conn(unload)).await {
            Ok(_) => {
                info!(conn = %conn, "Connection unloaded");
                report.advance(LifecycleStep::UnloadConn, TunnelState::Unloaded);
                None
            }
            Err(e) => {
                error!(conn = %conn, error = %e, "Unload failed");
                report
                    .cleanup_failures
                    .push(StepWarning::new(LifecycleStep::UnloadConn, &e));
                Some((LifecycleStep::UnloadConn, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipsec_common::service::ops;
    use ipsec_test::{established_ike_sa, RecordingConnector, RecordingService, StaticProber};
    use pretty_assertions::assert_eq;

    fn orchestrator(
        service: RecordingService,
        config: LifecycleConfig,
    ) -> TunnelOrchestrator<RecordingConnector, StaticProber> {
        TunnelOrchestrator::new(
            RecordingConnector::new(service),
            StaticProber::reachable(),
            config,
        )
    }

    #[test]
    fn test_reference_config_is_valid() {
        let config = LifecycleConfig::default();
        assert_eq!(config.conn_name(), "opi-test");
        assert_eq!(config.child, "opi-child");
        assert_eq!(config.timeout, Duration::from_secs(30));

        let request = config.load_request().unwrap();
        let conn = request.connection.unwrap();
        assert_eq!(conn.children.len(), 1);
        assert_eq!(conn.children[0].name, "opi-child");
        assert!(conn.proposals.is_some());
    }

    #[test]
    fn test_unknown_child_is_config_error() {
        let config = LifecycleConfig::new(reference_connection(), "other-child", "10.1.0.2");
        let err = config.load_request().unwrap_err();
        assert!(err.is_config_error());
    }

    #[tokio::test]
    async fn test_invalid_config_never_connects() {
        let mut connection = reference_connection();
        connection.children[0].esp_proposals.crypto_algorithms = vec!["rot13".to_string()];
        let orch = orchestrator(
            RecordingService::new(),
            LifecycleConfig::new(connection, defaults::CHILD, defaults::PROBE_TARGET),
        );

        let err = orch.run().await.unwrap_err();
        assert_eq!(err.step, LifecycleStep::LoadConn);
        assert!(err.source.is_config_error());
        assert_eq!(orch.connector().opens(), 0);
    }

    #[tokio::test]
    async fn test_advisory_failures_continue() {
        let service = RecordingService::new()
            .with_ike_sas(vec![established_ike_sa(defaults::CONN, defaults::CHILD)])
            .reject(ops::VERSION, tonic::Code::Unimplemented, "no version")
            .unavailable(ops::STATS, "stats backend down");
        let orch = orchestrator(service, LifecycleConfig::default());

        let report = orch.run().await.unwrap();
        assert_eq!(report.state, TunnelState::Unloaded);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.warnings[0].step, LifecycleStep::Version);
        assert_eq!(report.warnings[1].step, LifecycleStep::Stats);
        assert!(report.daemon.is_none());
    }

    #[tokio::test]
    async fn test_advisory_introspection() {
        let service = RecordingService::new()
            .with_ike_sas(vec![established_ike_sa(defaults::CONN, defaults::CHILD)])
            .reject(ops::LIST_CERTS, tonic::Code::Internal, "no credential backend")
            .reject(ops::LIST_CONNS, tonic::Code::Internal, "busy");
        let orch = orchestrator(
            service,
            LifecycleConfig::default().with_advisory_introspection(true),
        );

        let report = orch.run().await.unwrap();
        assert_eq!(report.warnings.len(), 2);
        assert!(report.completed.contains(&LifecycleStep::Rekey));
    }

    #[test]
    fn test_only_version_and_stats_are_advisory() {
        let mut report = LifecycleReport::default();
        let err = || IpsecError::transport("IPsecListSas", "reset");

        assert!(advisory(&mut report, LifecycleStep::Stats, err()).is_ok());
        assert_eq!(report.warnings.len(), 1);

        let (step, _) = advisory(&mut report, LifecycleStep::ListSas, err()).unwrap_err();
        assert_eq!(step, LifecycleStep::ListSas);

        let cancelled = IpsecError::Cancelled {
            operation: "IPsecVersion".to_string(),
        };
        assert!(advisory(&mut report, LifecycleStep::Version, cancelled).is_err());
        assert_eq!(report.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_ike_sa_is_reported() {
        let service = RecordingService::new()
            .with_ike_sas(vec![established_ike_sa("someone-else", defaults::CHILD)]);
        let orch = orchestrator(service, LifecycleConfig::default());

        let report = orch.run().await.unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].step, LifecycleStep::ListSas);
        assert!(report.warnings[0].message.contains(defaults::CONN));
    }

    #[tokio::test]
    async fn test_advisory_introspection_needs_one_success() {
        let service = RecordingService::new()
            .reject(ops::LIST_SAS, tonic::Code::Internal, "a")
            .reject(ops::LIST_CONNS, tonic::Code::Internal, "b")
            .reject(ops::LIST_CERTS, tonic::Code::Internal, "c");
        let orch = orchestrator(
            service,
            LifecycleConfig::default().with_advisory_introspection(true),
        );

        let err = orch.run().await.unwrap_err();
        assert_eq!(err.step, LifecycleStep::ListSas);
        assert_eq!(err.state(), TunnelState::Unloaded);
        assert!(!err.report.completed.contains(&LifecycleStep::Probe));
    }

    #[tokio::test]
    async fn test_query_daemon() {
        let connector = RecordingConnector::new(RecordingService::new());
        let info = query_daemon(&connector, defaults::STATS_TIMEOUT).await.unwrap();
        assert_eq!(info.version.daemon, "charon-systemd");
        assert!(info.status.starts_with("uptime"));
        assert_eq!(
            connector.service().operations(),
            vec![ops::VERSION, ops::STATS]
        );
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_query_daemon_failure_closes() {
        let service =
            RecordingService::new().reject(ops::VERSION, tonic::Code::Internal, "vici down");
        let connector = RecordingConnector::new(service);
        let err = query_daemon(&connector, defaults::STATS_TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.is_remote_rejection());
        assert_eq!(connector.service().operations(), vec![ops::VERSION]);
        assert_eq!(connector.closes(), 1);
    }
}
