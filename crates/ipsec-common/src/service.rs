//! Capability traits for the control-plane service.
//!
//! The static SA manager only needs [`StaticSaService`]; the tunnel
//! orchestrator only needs [`IkeService`]. Both are implemented for the gRPC
//! [`IpsecClient`], and test doubles implement them without a network.
//!
//! A [`Connector`] hands out a client for one run and takes it back when the
//! run is over. `close` consumes the client, so a channel cannot be used or
//! closed again once returned.

use async_trait::async_trait;
use ipsec_proto::*;
use tracing::debug;

use crate::error::{IpsecError, IpsecResult};
use crate::transport::TransportConfig;

/// RPC names used in diagnostics and error values.
pub mod ops {
    pub const ADD_SA: &str = "AddSA";
    pub const DELETE_SA: &str = "DeleteSA";
    pub const VERSION: &str = "IPsecVersion";
    pub const STATS: &str = "IPsecStats";
    pub const LOAD_CONN: &str = "IPsecLoadConn";
    pub const INITIATE: &str = "IPsecInitiate";
    pub const LIST_SAS: &str = "IPsecListSas";
    pub const LIST_CONNS: &str = "IPsecListConns";
    pub const LIST_CERTS: &str = "IPsecListCerts";
    pub const REKEY: &str = "IPsecRekey";
    pub const TERMINATE: &str = "IPsecTerminate";
    pub const UNLOAD_CONN: &str = "IPsecUnloadConn";
}

/// Install and remove statically keyed SAs.
#[async_trait]
pub trait StaticSaService: Send + Sync {
    async fn add_sa(&self, request: AddSaRequest) -> IpsecResult<AddSaResponse>;

    async fn delete_sa(&self, request: DeleteSaRequest) -> IpsecResult<DeleteSaResponse>;
}

/// IKE daemon control: connection definitions, negotiation and introspection.
#[async_trait]
pub trait IkeService: Send + Sync {
    async fn version(&self) -> IpsecResult<IPsecVersionResponse>;

    async fn stats(&self) -> IpsecResult<IPsecStatsResponse>;

    async fn load_conn(&self, request: IPsecLoadConnRequest) -> IpsecResult<IPsecLoadConnResponse>;

    async fn initiate(&self, request: IPsecInitiateRequest) -> IpsecResult<IPsecInitiateResponse>;

    async fn list_sas(&self, request: IPsecListSasRequest) -> IpsecResult<IPsecListSasResponse>;

    async fn list_conns(
        &self,
        request: IPsecListConnsRequest,
    ) -> IpsecResult<IPsecListConnsResponse>;

    async fn list_certs(
        &self,
        request: IPsecListCertsRequest,
    ) -> IpsecResult<IPsecListCertsResponse>;

    async fn rekey(&self, request: IPsecRekeyRequest) -> IpsecResult<IPsecRekeyResponse>;

    async fn terminate(&self, request: IPsecTerminateRequest)
        -> IpsecResult<IPsecTerminateResponse>;

    async fn unload_conn(
        &self,
        request: IPsecUnloadConnRequest,
    ) -> IpsecResult<IPsecUnloadConnResponse>;
}

/// Opens and closes clients for the control plane.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: StaticSaService + IkeService + 'static;

    /// Opens a client. Nothing needs closing if this fails.
    async fn open(&self) -> IpsecResult<Self::Client>;

    /// Releases a client returned by [`Connector::open`].
    async fn close(&self, client: Self::Client);
}

/// Connector backed by a tonic channel.
#[derive(Debug, Clone, Default)]
pub struct GrpcConnector {
    config: TransportConfig,
}

impl GrpcConnector {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for GrpcConnector {
    type Client = IpsecClient;

    async fn open(&self) -> IpsecResult<IpsecClient> {
        let channel = self.config.connect().await?;
        Ok(IpsecClient::new(channel))
    }

    async fn close(&self, client: IpsecClient) {
        drop(client);
        debug!(endpoint = %self.config.endpoint, "Closed control-plane channel");
    }
}

#[async_trait]
impl StaticSaService for IpsecClient {
    async fn add_sa(&self, request: AddSaRequest) -> IpsecResult<AddSaResponse> {
        IpsecClient::add_sa(self, request)
            .await
            .map_err(|s| IpsecError::from_status(ops::ADD_SA, s))
    }

    async fn delete_sa(&self, request: DeleteSaRequest) -> IpsecResult<DeleteSaResponse> {
        IpsecClient::delete_sa(self, request)
            .await
            .map_err(|s| IpsecError::from_status(ops::DELETE_SA, s))
    }
}

#[async_trait]
impl IkeService for IpsecClient {
    async fn version(&self) -> IpsecResult<IPsecVersionResponse> {
        self.ipsec_version(IPsecVersionRequest {})
            .await
            .map_err(|s| IpsecError::from_status(ops::VERSION, s))
    }

    async fn stats(&self) -> IpsecResult<IPsecStatsResponse> {
        self.ipsec_stats(IPsecStatsRequest {})
            .await
            .map_err(|s| IpsecError::from_status(ops::STATS, s))
    }

    async fn load_conn(&self, request: IPsecLoadConnRequest) -> IpsecResult<IPsecLoadConnResponse> {
        self.ipsec_load_conn(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::LOAD_CONN, s))
    }

    async fn initiate(&self, request: IPsecInitiateRequest) -> IpsecResult<IPsecInitiateResponse> {
        self.ipsec_initiate(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::INITIATE, s))
    }

    async fn list_sas(&self, request: IPsecListSasRequest) -> IpsecResult<IPsecListSasResponse> {
        self.ipsec_list_sas(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::LIST_SAS, s))
    }

    async fn list_conns(
        &self,
        request: IPsecListConnsRequest,
    ) -> IpsecResult<IPsecListConnsResponse> {
        self.ipsec_list_conns(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::LIST_CONNS, s))
    }

    async fn list_certs(
        &self,
        request: IPsecListCertsRequest,
    ) -> IpsecResult<IPsecListCertsResponse> {
        self.ipsec_list_certs(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::LIST_CERTS, s))
    }

    async fn rekey(&self, request: IPsecRekeyRequest) -> IpsecResult<IPsecRekeyResponse> {
        self.ipsec_rekey(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::REKEY, s))
    }

    async fn terminate(
        &self,
        request: IPsecTerminateRequest,
    ) -> IpsecResult<IPsecTerminateResponse> {
        self.ipsec_terminate(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::TERMINATE, s))
    }

    async fn unload_conn(
        &self,
        request: IPsecUnloadConnRequest,
    ) -> IpsecResult<IPsecUnloadConnResponse> {
        self.ipsec_unload_conn(request)
            .await
            .map_err(|s| IpsecError::from_status(ops::UNLOAD_CONN, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_grpc_connector_refused() {
        let connector = GrpcConnector::new(
            TransportConfig::new("127.0.0.1:1").with_connect_timeout(Duration::from_millis(500)),
        );
        match connector.open().await {
            Err(err) => assert!(err.is_transport_error()),
            Ok(_) => panic!("Expected connection to be refused"),
        }
    }

    #[tokio::test]
    async fn test_grpc_connector_bad_endpoint() {
        let connector = GrpcConnector::new(TransportConfig::new("not a uri"));
        match connector.open().await {
            Err(err) => assert!(err.is_config_error()),
            Ok(_) => panic!("Expected endpoint to be rejected"),
        }
    }

    #[tokio::test]
    async fn test_lazy_channel_maps_status() {
        let channel = tonic::transport::Channel::from_static("http://127.0.0.1:1").connect_lazy();
        let client = IpsecClient::new(channel);
        let err = IkeService::version(&client).await.unwrap_err();
        assert!(err.is_transport_error() || err.is_remote_rejection());
    }
}
