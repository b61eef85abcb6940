//! Unary gRPC client for the IPsec control-plane service.

use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::Channel;
use tonic::Status;

use crate::messages::*;

/// Fully qualified RPC paths of the `opi_api.security.v1.IPsec` service.
pub mod paths {
    pub const ADD_SA: &str = "/opi_api.security.v1.IPsec/AddSA";
    pub const DELETE_SA: &str = "/opi_api.security.v1.IPsec/DeleteSA";
    pub const VERSION: &str = "/opi_api.security.v1.IPsec/IPsecVersion";
    pub const STATS: &str = "/opi_api.security.v1.IPsec/IPsecStats";
    pub const INITIATE: &str = "/opi_api.security.v1.IPsec/IPsecInitiate";
    pub const TERMINATE: &str = "/opi_api.security.v1.IPsec/IPsecTerminate";
    pub const REKEY: &str = "/opi_api.security.v1.IPsec/IPsecRekey";
    pub const LIST_SAS: &str = "/opi_api.security.v1.IPsec/IPsecListSas";
    pub const LIST_CONNS: &str = "/opi_api.security.v1.IPsec/IPsecListConns";
    pub const LIST_CERTS: &str = "/opi_api.security.v1.IPsec/IPsecListCerts";
    pub const LOAD_CONN: &str = "/opi_api.security.v1.IPsec/IPsecLoadConn";
    pub const UNLOAD_CONN: &str = "/opi_api.security.v1.IPsec/IPsecUnloadConn";
}

/// Client for the IPsec service.
///
/// Cloning is cheap; every call works on its own clone of the underlying
/// [`tonic::client::Grpc`] so the client can be shared behind `&self`.
#[derive(Debug, Clone)]
pub struct IpsecClient {
    inner: tonic::client::Grpc<Channel>,
}

impl IpsecClient {
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn unary<Req, Resp>(&self, request: Req, path: &'static str) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {}", e)))?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let path = PathAndQuery::from_static(path);
        grpc.unary(tonic::Request::new(request), path, codec)
            .await
            .map(tonic::Response::into_inner)
    }

    pub async fn add_sa(&self, request: AddSaRequest) -> Result<AddSaResponse, Status> {
        self.unary(request, paths::ADD_SA).await
    }

    pub async fn delete_sa(&self, request: DeleteSaRequest) -> Result<DeleteSaResponse, Status> {
        self.unary(request, paths::DELETE_SA).await
    }

    pub async fn ipsec_version(
        &self,
        request: IPsecVersionRequest,
    ) -> Result<IPsecVersionResponse, Status> {
        self.unary(request, paths::VERSION).await
    }

    pub async fn ipsec_stats(
        &self,
        request: IPsecStatsRequest,
    ) -> Result<IPsecStatsResponse, Status> {
        self.unary(request, paths::STATS).await
    }

    pub async fn ipsec_load_conn(
        &self,
        request: IPsecLoadConnRequest,
    ) -> Result<IPsecLoadConnResponse, Status> {
        self.unary(request, paths::LOAD_CONN).await
    }

    pub async fn ipsec_unload_conn(
        &self,
        request: IPsecUnloadConnRequest,
    ) -> Result<IPsecUnloadConnResponse, Status> {
        self.unary(request, paths::UNLOAD_CONN).await
    }

    pub async fn ipsec_initiate(
        &self,
        request: IPsecInitiateRequest,
    ) -> Result<IPsecInitiateResponse, Status> {
        self.unary(request, paths::INITIATE).await
    }

    pub async fn ipsec_terminate(
        &self,
        request: IPsecTerminateRequest,
    ) -> Result<IPsecTerminateResponse, Status> {
        self.unary(request, paths::TERMINATE).await
    }

    pub async fn ipsec_rekey(
        &self,
        request: IPsecRekeyRequest,
    ) -> Result<IPsecRekeyResponse, Status> {
        self.unary(request, paths::REKEY).await
    }

    pub async fn ipsec_list_sas(
        &self,
        request: IPsecListSasRequest,
    ) -> Result<IPsecListSasResponse, Status> {
        self.unary(request, paths::LIST_SAS).await
    }

    pub async fn ipsec_list_conns(
        &self,
        request: IPsecListConnsRequest,
    ) -> Result<IPsecListConnsResponse, Status> {
        self.unary(request, paths::LIST_CONNS).await
    }

    pub async fn ipsec_list_certs(
        &self,
        request: IPsecListCertsRequest,
    ) -> Result<IPsecListCertsResponse, Status> {
        self.unary(request, paths::LIST_CERTS).await
    }
}
