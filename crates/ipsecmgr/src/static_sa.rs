//! Manually keyed SA installation and removal.
//!
//! Each call validates and translates its input first, then opens a client,
//! issues exactly one RPC and closes the client again. The daemon is the
//! only holder of SA state; nothing is cached or retried here.

use std::time::Duration;

use ipsec_common::error::{IpsecError, IpsecResult};
use ipsec_common::service::{ops, Connector, StaticSaService};
use ipsec_proto::{AddSaRequest, AddSaResponse, DeleteSaRequest, DeleteSaResponse};
use tracing::{debug, error, info};

use crate::types::{SaIdentifier, SaParams};

/// Default per-RPC budget for static SA calls.
pub const DEFAULT_SA_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an AddSA request, rejecting unknown names and missing keys.
pub fn add_sa_request(id: &SaIdentifier, params: &SaParams) -> IpsecResult<AddSaRequest> {
    id.validate()?;
    Ok(AddSaRequest {
        sa_id: Some(id.to_proto()),
        sa_data: Some(params.to_proto()?),
    })
}

/// Builds a DeleteSA request. Carries the identifier only.
pub fn delete_sa_request(id: &SaIdentifier) -> IpsecResult<DeleteSaRequest> {
    id.validate()?;
    Ok(DeleteSaRequest {
        sa_id: Some(id.to_proto()),
    })
}

/// Installs and removes static SAs through a [`Connector`].
#[derive(Debug, Clone)]
pub struct StaticSaManager<C> {
    connector: C,
    timeout: Duration,
}

impl<C: Connector> StaticSaManager<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            timeout: DEFAULT_SA_TIMEOUT,
        }
    }

    /// Set the per-RPC timeout (builder pattern)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn add_sa(&self, id: &SaIdentifier, params: &SaParams) -> IpsecResult<AddSaResponse> {
        let request = add_sa_request(id, params)?;
        info!(
            sa = %id,
            mode = %params.mode,
            enc = %params.enc_alg,
            int = %params.int_alg,
            update = params.flags.update,
            "Adding SA"
        );

        let client = self.connector.open().await?;
        let result = self.bounded(ops::ADD_SA, client.add_sa(request)).await;
        self.connector.close(client).await;

        match &result {
            Ok(_) => info!(sa = %id, "SA added"),
            Err(e) => error!(sa = %id, error = %e, "AddSA failed"),
        }
        result
    }

    /// Removes an SA. Whether a missing SA is an error is up to the daemon.
    pub async fn delete_sa(&self, id: &SaIdentifier) -> IpsecResult<DeleteSaResponse> {
        let request = delete_sa_request(id)?;
        info!(sa = %id, "Deleting SA");

        let client = self.connector.open().await?;
        let result = self.bounded(ops::DELETE_SA, client.delete_sa(request)).await;
        self.connector.close(client).await;

        match &result {
            Ok(_) => info!(sa = %id, "SA deleted"),
            Err(e) => error!(sa = %id, error = %e, "DeleteSA failed"),
        }
        result
    }

    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl std::future::Future<Output = IpsecResult<T>>,
    ) -> IpsecResult<T> {
        debug!(operation, timeout = ?self.timeout, "Issuing RPC");
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(IpsecError::Timeout {
                    operation: operation.to_string(),
                    after: self.timeout,
                })
            })
    }
}
