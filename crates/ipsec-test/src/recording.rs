//! Recording doubles for the control plane and the prober.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use ipsec_common::error::{IpsecError, IpsecResult};
use ipsec_common::probe::{PingStatistics, Prober, RttSummary};
use ipsec_common::service::{ops, Connector, IkeService, StaticSaService};
use ipsec_proto::*;

/// One RPC as seen by the double, with its request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddSa(AddSaRequest),
    DeleteSa(DeleteSaRequest),
    Version,
    Stats,
    LoadConn(IPsecLoadConnRequest),
    Initiate(IPsecInitiateRequest),
    ListSas(IPsecListSasRequest),
    ListConns(IPsecListConnsRequest),
    ListCerts(IPsecListCertsRequest),
    Rekey(IPsecRekeyRequest),
    Terminate(IPsecTerminateRequest),
    UnloadConn(IPsecUnloadConnRequest),
}

impl Call {
    /// RPC name, as used in [`ops`].
    pub fn operation(&self) -> &'static str {
        match self {
            Call::AddSa(_) => ops::ADD_SA,
            Call::DeleteSa(_) => ops::DELETE_SA,
            Call::Version => ops::VERSION,
            Call::Stats => ops::STATS,
            Call::LoadConn(_) => ops::LOAD_CONN,
            Call::Initiate(_) => ops::INITIATE,
            Call::ListSas(_) => ops::LIST_SAS,
            Call::ListConns(_) => ops::LIST_CONNS,
            Call::ListCerts(_) => ops::LIST_CERTS,
            Call::Rekey(_) => ops::REKEY,
            Call::Terminate(_) => ops::TERMINATE,
            Call::UnloadConn(_) => ops::UNLOAD_CONN,
        }
    }
}

/// Scripted outcome for one RPC name.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Daemon answers with a failure status.
    Reject { code: tonic::Code, message: String },
    /// Channel fails during the call.
    Unavailable(String),
    /// Call succeeds after sleeping.
    Delay(Duration),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    behaviors: HashMap<&'static str, Behavior>,
    ike_sas: Vec<ListIkeSa>,
}

/// In-memory control plane that records every call in order.
///
/// Clones share the same log, so a test can keep one handle while the code
/// under test owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingService {
    state: Arc<Mutex<State>>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("recording state poisoned")
    }

    /// Answer `operation` with a remote rejection.
    pub fn reject(self, operation: &'static str, code: tonic::Code, message: &str) -> Self {
        self.with_behavior(
            operation,
            Behavior::Reject {
                code,
                message: message.to_string(),
            },
        )
    }

    /// Fail `operation` as if the channel dropped.
    pub fn unavailable(self, operation: &'static str, message: &str) -> Self {
        self.with_behavior(operation, Behavior::Unavailable(message.to_string()))
    }

    /// Delay `operation` before answering.
    pub fn delay(self, operation: &'static str, by: Duration) -> Self {
        self.with_behavior(operation, Behavior::Delay(by))
    }

    pub fn with_behavior(self, operation: &'static str, behavior: Behavior) -> Self {
        self.lock().behaviors.insert(operation, behavior);
        self
    }

    /// IKE SAs returned by `IPsecListSas`.
    pub fn with_ike_sas(self, ike_sas: Vec<ListIkeSa>) -> Self {
        self.lock().ike_sas = ike_sas;
        self
    }

    /// Every call recorded so far.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// RPC names recorded so far, in call order.
    pub fn operations(&self) -> Vec<&'static str> {
        self.lock().calls.iter().map(Call::operation).collect()
    }

    async fn respond(&self, call: Call) -> IpsecResult<()> {
        let operation = call.operation();
        let behavior = {
            let mut state = self.lock();
            state.calls.push(call);
            state.behaviors.get(operation).cloned()
        };
        tracing::debug!(operation, "Recorded call");

        match behavior {
            None => Ok(()),
            Some(Behavior::Delay(by)) => {
                tokio::time::sleep(by).await;
                Ok(())
            }
            Some(Behavior::Reject { code, message }) => Err(IpsecError::Remote {
                operation: operation.to_string(),
                code,
                message,
            }),
            Some(Behavior::Unavailable(message)) => Err(IpsecError::transport(operation, message)),
        }
    }
}

#[async_trait]
impl StaticSaService for RecordingService {
    async fn add_sa(&self, request: AddSaRequest) -> IpsecResult<AddSaResponse> {
        self.respond(Call::AddSa(request)).await?;
        Ok(AddSaResponse {})
    }

    async fn delete_sa(&self, request: DeleteSaRequest) -> IpsecResult<DeleteSaResponse> {
        self.respond(Call::DeleteSa(request)).await?;
        Ok(DeleteSaResponse {})
    }
}

#[async_trait]
impl IkeService for RecordingService {
    async fn version(&self) -> IpsecResult<IPsecVersionResponse> {
        self.respond(Call::Version).await?;
        Ok(crate::fixtures::version_response())
    }

    async fn stats(&self) -> IpsecResult<IPsecStatsResponse> {
        self.respond(Call::Stats).await?;
        Ok(IPsecStatsResponse {
            status: "uptime: 1 minute, since Oct 19 10:00:00 2026".to_string(),
        })
    }

    async fn load_conn(&self, request: IPsecLoadConnRequest) -> IpsecResult<IPsecLoadConnResponse> {
        self.respond(Call::LoadConn(request)).await?;
        Ok(IPsecLoadConnResponse {
            success: "Yes".to_string(),
        })
    }

    async fn initiate(&self, request: IPsecInitiateRequest) -> IpsecResult<IPsecInitiateResponse> {
        self.respond(Call::Initiate(request)).await?;
        Ok(IPsecInitiateResponse {})
    }

    async fn list_sas(&self, request: IPsecListSasRequest) -> IpsecResult<IPsecListSasResponse> {
        self.respond(Call::ListSas(request)).await?;
        Ok(IPsecListSasResponse {
            ikesas: self.lock().ike_sas.clone(),
        })
    }

    async fn list_conns(
        &self,
        request: IPsecListConnsRequest,
    ) -> IpsecResult<IPsecListConnsResponse> {
        let name = request.ike.clone();
        self.respond(Call::ListConns(request)).await?;
        Ok(IPsecListConnsResponse {
            connection: vec![ListConnResp {
                name,
                version: "IKEv2".to_string(),
                ..Default::default()
            }],
        })
    }

    async fn list_certs(
        &self,
        request: IPsecListCertsRequest,
    ) -> IpsecResult<IPsecListCertsResponse> {
        self.respond(Call::ListCerts(request)).await?;
        Ok(IPsecListCertsResponse { certs: Vec::new() })
    }

    async fn rekey(&self, request: IPsecRekeyRequest) -> IpsecResult<IPsecRekeyResponse> {
        self.respond(Call::Rekey(request)).await?;
        Ok(IPsecRekeyResponse {
            success: "Yes".to_string(),
            matches: 1,
        })
    }

    async fn terminate(
        &self,
        request: IPsecTerminateRequest,
    ) -> IpsecResult<IPsecTerminateResponse> {
        self.respond(Call::Terminate(request)).await?;
        Ok(IPsecTerminateResponse {
            success: "Yes".to_string(),
            matches: 1,
            terminated: 1,
        })
    }

    async fn unload_conn(
        &self,
        request: IPsecUnloadConnRequest,
    ) -> IpsecResult<IPsecUnloadConnResponse> {
        self.respond(Call::UnloadConn(request)).await?;
        Ok(IPsecUnloadConnResponse {
            success: "Yes".to_string(),
        })
    }
}

/// Connector handing out clones of one [`RecordingService`].
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    service: RecordingService,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    open_error: Option<String>,
}

impl RecordingConnector {
    pub fn new(service: RecordingService) -> Self {
        Self {
            service,
            ..Default::default()
        }
    }

    /// Connector whose `open` always fails with a transport error.
    pub fn refusing(message: &str) -> Self {
        Self {
            open_error: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn service(&self) -> &RecordingService {
        &self.service
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    type Client = RecordingService;

    async fn open(&self) -> IpsecResult<RecordingService> {
        if let Some(message) = &self.open_error {
            return Err(IpsecError::transport("recording", message.clone()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.service.clone())
    }

    async fn close(&self, _client: RecordingService) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Prober returning canned statistics and recording each target.
#[derive(Debug, Clone)]
pub struct StaticProber {
    received: u32,
    targets: Arc<Mutex<Vec<(String, u32)>>>,
}

impl StaticProber {
    /// Every echo request is answered.
    pub fn reachable() -> Self {
        Self::with_received(u32::MAX)
    }

    /// No echo request is answered.
    pub fn unreachable() -> Self {
        Self::with_received(0)
    }

    /// At most `received` replies per run.
    pub fn with_received(received: u32) -> Self {
        Self {
            received,
            targets: Arc::default(),
        }
    }

    /// `(target, count)` of every probe run so far.
    pub fn probes(&self) -> Vec<(String, u32)> {
        self.targets.lock().expect("prober state poisoned").clone()
    }
}

#[async_trait]
impl Prober for StaticProber {
    async fn probe(&self, target: &str, count: u32) -> IpsecResult<PingStatistics> {
        self.targets
            .lock()
            .expect("prober state poisoned")
            .push((target.to_string(), count));

        let received = self.received.min(count);
        let loss_percent = if count == 0 {
            0.0
        } else {
            f64::from(count - received) * 100.0 / f64::from(count)
        };
        Ok(PingStatistics {
            transmitted: count,
            received,
            duplicates: 0,
            loss_percent,
            rtt: (received > 0).then_some(RttSummary {
                min_ms: 0.1,
                avg_ms: 0.2,
                max_ms: 0.3,
                mdev_ms: Some(0.05),
            }),
        })
    }
}
