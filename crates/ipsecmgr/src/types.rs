//! Domain types for static SAs and IKE connections.
//!
//! These carry human-readable names; conversion to wire messages goes
//! through the tables in [`crate::algorithms`] and fails on any unknown name.

use std::fmt;
use std::net::IpAddr;
use std::path::Path;

use ipsec_common::error::{IpsecError, IpsecResult};
use ipsec_common::service::ops;
use ipsec_proto::{
    Addrs, Child, Connection, IpsecProtocol, LocalAuth, Proposals, RemoteAuth, SaData, SaId,
    TrafficSelector, TrafficSelectors,
};
use serde::{Deserialize, Serialize};

use crate::algorithms::{
    encryption_needs_key, integrity_needs_key, AUTH_METHODS, DH_GROUPS, ENCRYPTION, INTEGRITY,
    MODES,
};

/// Addresses one directional SA on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaIdentifier {
    pub src: IpAddr,
    pub dst: IpAddr,
    pub spi: u32,
    pub protocol: IpsecProtocol,
    pub if_id: u32,
}

impl SaIdentifier {
    pub fn new(src: IpAddr, dst: IpAddr, spi: u32, protocol: IpsecProtocol, if_id: u32) -> Self {
        Self {
            src,
            dst,
            spi,
            protocol,
            if_id,
        }
    }

    pub fn validate(&self) -> IpsecResult<()> {
        if self.spi == 0 {
            return Err(IpsecError::invalid_config("spi", "must be non-zero"));
        }
        if self.protocol == IpsecProtocol::Unspecified {
            return Err(IpsecError::invalid_config("proto", "must be esp or ah"));
        }
        if self.src.is_ipv4() != self.dst.is_ipv4() {
            return Err(IpsecError::invalid_config(
                "dst",
                format!("{} and {} are different address families", self.src, self.dst),
            ));
        }
        Ok(())
    }

    pub fn to_proto(&self) -> SaId {
        let mut sa_id = SaId {
            src: self.src.to_string(),
            dst: self.dst.to_string(),
            spi: self.spi,
            if_id: self.if_id,
            ..Default::default()
        };
        sa_id.set_proto(self.protocol);
        sa_id
    }
}

impl fmt::Display for SaIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let proto = match self.protocol {
            IpsecProtocol::Esp => "esp",
            IpsecProtocol::Ah => "ah",
            IpsecProtocol::Unspecified => "?",
        };
        write!(
            f,
            "{} {}->{} spi 0x{:08x} if_id {}",
            proto, self.src, self.dst, self.spi, self.if_id
        )
    }
}

/// Boolean SA attributes, mapped 1:1 onto the wire flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaFlags {
    /// UDP encapsulation for NAT traversal.
    pub encap: bool,
    /// Extended sequence numbers.
    pub esn: bool,
    pub copy_df: bool,
    pub copy_ecn: bool,
    pub copy_dscp: bool,
    pub initiator: bool,
    pub inbound: bool,
    /// Replace an existing SA with the same identifier.
    pub update: bool,
}

/// Keys, algorithms and attributes of a static SA.
#[derive(Clone, PartialEq, Eq)]
pub struct SaParams {
    pub reqid: u32,
    pub mode: String,
    pub interface: String,
    pub enc_alg: String,
    pub enc_key: Vec<u8>,
    pub int_alg: String,
    pub int_key: Vec<u8>,
    pub replay_window: u32,
    pub tfc: u32,
    pub flags: SaFlags,
}

impl Default for SaParams {
    fn default() -> Self {
        Self {
            reqid: 0,
            mode: "tunnel".to_string(),
            interface: String::new(),
            enc_alg: "null".to_string(),
            enc_key: Vec::new(),
            int_alg: "none".to_string(),
            int_key: Vec::new(),
            replay_window: 32,
            tfc: 0,
            flags: SaFlags::default(),
        }
    }
}

// Keys never reach logs.
impl fmt::Debug for SaParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaParams")
            .field("reqid", &self.reqid)
            .field("mode", &self.mode)
            .field("interface", &self.interface)
            .field("enc_alg", &self.enc_alg)
            .field("enc_key", &format_args!("<{} bytes>", self.enc_key.len()))
            .field("int_alg", &self.int_alg)
            .field("int_key", &format_args!("<{} bytes>", self.int_key.len()))
            .field("replay_window", &self.replay_window)
            .field("tfc", &self.tfc)
            .field("flags", &self.flags)
            .finish()
    }
}

impl SaParams {
    pub fn new(
        enc_alg: impl Into<String>,
        enc_key: Vec<u8>,
        int_alg: impl Into<String>,
        int_key: Vec<u8>,
    ) -> Self {
        Self {
            enc_alg: enc_alg.into(),
            enc_key,
            int_alg: int_alg.into(),
            int_key,
            ..Default::default()
        }
    }

    /// Set the request id (builder pattern)
    pub fn with_reqid(mut self, reqid: u32) -> Self {
        self.reqid = reqid;
        self
    }

    /// Set the mode name (builder pattern)
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set the interface name (builder pattern)
    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Set the replay window (builder pattern)
    pub fn with_replay_window(mut self, replay_window: u32) -> Self {
        self.replay_window = replay_window;
        self
    }

    /// Set the TFC padding (builder pattern)
    pub fn with_tfc(mut self, tfc: u32) -> Self {
        self.tfc = tfc;
        self
    }

    /// Set the flags (builder pattern)
    pub fn with_flags(mut self, flags: SaFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Translates names to codes and checks key presence.
    pub fn to_proto(&self) -> IpsecResult<SaData> {
        let mode = MODES.lookup(&self.mode)?;
        let enc_alg = ENCRYPTION.lookup(&self.enc_alg)?;
        let int_alg = INTEGRITY.lookup(&self.int_alg)?;

        if encryption_needs_key(enc_alg) && self.enc_key.is_empty() {
            return Err(IpsecError::invalid_config(
                "enc_key",
                format!("{} requires a key", self.enc_alg),
            ));
        }
        if integrity_needs_key(int_alg) && self.int_key.is_empty() {
            return Err(IpsecError::invalid_config(
                "int_key",
                format!("{} requires a key", self.int_alg),
            ));
        }

        let mut data = SaData {
            reqid: self.reqid,
            interface: self.interface.clone(),
            enc_key: self.enc_key.clone(),
            int_key: self.int_key.clone(),
            replay_window: self.replay_window,
            tfc: self.tfc,
            encap: self.flags.encap,
            esn: self.flags.esn,
            copy_df: self.flags.copy_df,
            copy_ecn: self.flags.copy_ecn,
            copy_dscp: self.flags.copy_dscp,
            initiator: self.flags.initiator,
            inbound: self.flags.inbound,
            update: self.flags.update,
            ..Default::default()
        };
        data.set_mode(mode);
        data.set_enc_alg(enc_alg);
        data.set_int_alg(int_alg);
        Ok(data)
    }
}

/// IKE identity and authentication method of one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSpec {
    pub method: String,
    pub id: String,
}

impl AuthSpec {
    pub fn new(method: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            id: id.into(),
        }
    }
}

/// Algorithm proposal, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposalSpec {
    pub crypto_algorithms: Vec<String>,
    pub integrity_algorithms: Vec<String>,
    pub dh_groups: Vec<String>,
}

impl ProposalSpec {
    pub fn to_proto(&self) -> IpsecResult<Proposals> {
        let mut proposals = Proposals::default();
        for alg in ENCRYPTION.lookup_all(&self.crypto_algorithms)? {
            proposals.push_crypto_alg(alg);
        }
        for alg in INTEGRITY.lookup_all(&self.integrity_algorithms)? {
            proposals.push_integ_alg(alg);
        }
        for group in DH_GROUPS.lookup_all(&self.dh_groups)? {
            proposals.push_dhgroups(group);
        }
        Ok(proposals)
    }
}

/// A child SA of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildSpec {
    pub name: String,
    pub esp_proposals: ProposalSpec,
    #[serde(default)]
    pub local_traffic_selectors: Vec<String>,
    #[serde(default)]
    pub remote_traffic_selectors: Vec<String>,
}

impl ChildSpec {
    pub fn to_proto(&self) -> IpsecResult<Child> {
        if self.name.is_empty() {
            return Err(IpsecError::invalid_config("child", "name is empty"));
        }
        Ok(Child {
            name: self.name.clone(),
            esp_proposals: Some(self.esp_proposals.to_proto()?),
            local_ts: selectors(&self.local_traffic_selectors),
            remote_ts: selectors(&self.remote_traffic_selectors),
        })
    }
}

// Selectors go out as given; the daemon validates them.
fn selectors(cidrs: &[String]) -> Option<TrafficSelectors> {
    if cidrs.is_empty() {
        return None;
    }
    Some(TrafficSelectors {
        ts: cidrs
            .iter()
            .map(|cidr| TrafficSelector {
                cidr: cidr.clone(),
                ..Default::default()
            })
            .collect(),
    })
}

fn default_ike_version() -> String {
    "2".to_string()
}

/// A named IKE connection definition.
///
/// Loading a definition with an existing name replaces it on the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub name: String,
    #[serde(default = "default_ike_version")]
    pub version: String,
    #[serde(default)]
    pub virtual_ips: Vec<String>,
    pub local_addresses: Vec<String>,
    pub remote_addresses: Vec<String>,
    pub local_auth: AuthSpec,
    pub remote_auth: AuthSpec,
    /// IKE SA proposal; the daemon default applies when absent.
    #[serde(default)]
    pub proposals: Option<ProposalSpec>,
    pub children: Vec<ChildSpec>,
}

impl ConnectionSpec {
    pub fn from_json(json: &str) -> IpsecResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| IpsecError::invalid_config("connection", e.to_string()))
    }

    /// Reads a JSON connection definition.
    pub async fn load(path: &Path) -> IpsecResult<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            IpsecError::invalid_config("conn-file", format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn child(&self, name: &str) -> Option<&ChildSpec> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn to_proto(&self) -> IpsecResult<Connection> {
        if self.name.is_empty() {
            return Err(IpsecError::invalid_config("conn", "name is empty"));
        }
        if self.version != "1" && self.version != "2" {
            return Err(IpsecError::invalid_config(
                "version",
                format!("IKE version must be 1 or 2, got '{}'", self.version),
            ));
        }
        if self.children.is_empty() {
            return Err(IpsecError::invalid_config(
                "children",
                format!("connection '{}' has no child", self.name),
            ));
        }

        let mut local_auth = LocalAuth {
            id: self.local_auth.id.clone(),
            ..Default::default()
        };
        local_auth.set_auth(AUTH_METHODS.lookup(&self.local_auth.method)?);
        let mut remote_auth = RemoteAuth {
            id: self.remote_auth.id.clone(),
            ..Default::default()
        };
        remote_auth.set_auth(AUTH_METHODS.lookup(&self.remote_auth.method)?);

        Ok(Connection {
            name: self.name.clone(),
            version: self.version.clone(),
            vips: addrs(&self.virtual_ips),
            local_addrs: addrs(&self.local_addresses),
            remote_addrs: addrs(&self.remote_addresses),
            local_auth: Some(local_auth),
            remote_auth: Some(remote_auth),
            children: self
                .children
                .iter()
                .map(ChildSpec::to_proto)
                .collect::<IpsecResult<_>>()?,
            proposals: self.proposals.as_ref().map(|p| p.to_proto()).transpose()?,
        })
    }
}

fn addrs(values: &[String]) -> Vec<Addrs> {
    values.iter().map(|addr| Addrs { addr: addr.clone() }).collect()
}

/// Where one tunnel lifecycle run stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TunnelState {
    #[default]
    Unloaded,
    Loaded,
    Negotiating,
    Established,
    Rekeyed,
    Terminated,
}

impl TunnelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TunnelState::Unloaded => "unloaded",
            TunnelState::Loaded => "loaded",
            TunnelState::Negotiating => "negotiating",
            TunnelState::Established => "established",
            TunnelState::Rekeyed => "rekeyed",
            TunnelState::Terminated => "terminated",
        }
    }
}

impl fmt::Display for TunnelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the tunnel lifecycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStep {
    Connect,
    Version,
    Stats,
    LoadConn,
    Initiate,
    ListSas,
    ListConns,
    ListCerts,
    Probe,
    Rekey,
    Terminate,
    UnloadConn,
}

impl LifecycleStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStep::Connect => "Connect",
            LifecycleStep::Version => ops::VERSION,
            LifecycleStep::Stats => ops::STATS,
            LifecycleStep::LoadConn => ops::LOAD_CONN,
            LifecycleStep::Initiate => ops::INITIATE,
            LifecycleStep::ListSas => ops::LIST_SAS,
            LifecycleStep::ListConns => ops::LIST_CONNS,
            LifecycleStep::ListCerts => ops::LIST_CERTS,
            LifecycleStep::Probe => "Probe",
            LifecycleStep::Rekey => ops::REKEY,
            LifecycleStep::Terminate => ops::TERMINATE,
            LifecycleStep::UnloadConn => ops::UNLOAD_CONN,
        }
    }

    /// Failures of these steps are logged and the run continues.
    pub fn is_advisory(&self) -> bool {
        matches!(self, LifecycleStep::Version | LifecycleStep::Stats)
    }
}

impl fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipsec_proto::{AuthType, CryptoAlgorithm, DiffieHellmanGroup, IntegAlgorithm, IpsecMode};
    use pretty_assertions::assert_eq;

    fn esp(spi: u32) -> SaIdentifier {
        SaIdentifier::new(
            "10.0.0.1".parse().unwrap(),
            "10.0.0.2".parse().unwrap(),
            spi,
            IpsecProtocol::Esp,
            1,
        )
    }

    #[test]
    fn test_identifier_to_proto() {
        let sa_id = esp(256).to_proto();
        assert_eq!(sa_id.src, "10.0.0.1");
        assert_eq!(sa_id.dst, "10.0.0.2");
        assert_eq!(sa_id.spi, 256);
        assert_eq!(sa_id.proto(), IpsecProtocol::Esp);
        assert_eq!(sa_id.if_id, 1);
    }

    #[test]
    fn test_identifier_validation() {
        assert!(esp(256).validate().is_ok());
        assert!(esp(0).validate().unwrap_err().is_config_error());

        let mut mixed = esp(256);
        mixed.dst = "fd00::2".parse().unwrap();
        assert!(mixed.validate().is_err());

        let mut unspecified = esp(256);
        unspecified.protocol = IpsecProtocol::Unspecified;
        assert!(unspecified.validate().is_err());
    }

    #[test]
    fn test_identifier_display() {
        assert_eq!(
            esp(256).to_string(),
            "esp 10.0.0.1->10.0.0.2 spi 0x00000100 if_id 1"
        );
    }

    #[test]
    fn test_params_to_proto() {
        let params = SaParams::new("aes_cbc", vec![0x11; 16], "sha1_96", vec![0x22; 20])
            .with_reqid(7)
            .with_mode("transport")
            .with_flags(SaFlags {
                esn: true,
                inbound: true,
                ..Default::default()
            });
        let data = params.to_proto().unwrap();
        assert_eq!(data.enc_alg(), CryptoAlgorithm::AesCbc);
        assert_eq!(data.int_alg(), IntegAlgorithm::HmacSha1_96);
        assert_eq!(data.mode(), IpsecMode::Transport);
        assert_eq!(data.reqid, 7);
        assert!(data.esn);
        assert!(data.inbound);
        assert!(!data.update);
    }

    #[test]
    fn test_params_reject_unknown_names() {
        let params = SaParams::new("aes_foo", vec![1], "none", vec![]);
        assert!(matches!(
            params.to_proto(),
            Err(IpsecError::UnknownAlgorithm {
                kind: "encryption",
                ..
            })
        ));

        let params = SaParams::new("aes_cbc", vec![1], "sha1_96", vec![1]).with_mode("tunel");
        assert!(params.to_proto().is_err());
    }

    #[test]
    fn test_params_require_keys() {
        let params = SaParams::new("aes_cbc", vec![], "none", vec![]);
        assert!(params.to_proto().unwrap_err().to_string().contains("enc_key"));

        let params = SaParams::new("aes_gcm_icv_16", vec![1; 20], "sha2_256", vec![]);
        assert!(params.to_proto().unwrap_err().to_string().contains("int_key"));

        assert!(SaParams::default().to_proto().is_ok());
    }

    #[test]
    fn test_params_debug_hides_keys() {
        let params = SaParams::new("aes_cbc", vec![0xde, 0xad], "none", vec![]);
        let debug = format!("{:?}", params);
        assert!(debug.contains("<2 bytes>"));
        assert!(!debug.contains("222"));
        assert!(!debug.contains("0xde"));
    }

    const CONN_JSON: &str = r#"{
        "name": "opi-test",
        "local_addresses": ["192.168.200.200"],
        "remote_addresses": ["192.168.200.210"],
        "local_auth": { "method": "psk", "id": "hacker@strongswan.org" },
        "remote_auth": { "method": "psk", "id": "server.strongswan.org" },
        "children": [{
            "name": "opi-child",
            "esp_proposals": {
                "crypto_algorithms": ["aes_gcm_icv_16"],
                "dh_groups": ["curve25519"]
            },
            "remote_traffic_selectors": ["10.1.0.0/16"]
        }]
    }"#;

    #[test]
    fn test_connection_from_json() {
        let spec = ConnectionSpec::from_json(CONN_JSON).unwrap();
        assert_eq!(spec.version, "2");
        assert_eq!(spec.proposals, None);
        assert!(spec.child("opi-child").is_some());
        assert!(spec.child("other").is_none());

        let conn = spec.to_proto().unwrap();
        assert_eq!(conn.name, "opi-test");
        assert_eq!(conn.local_addrs[0].addr, "192.168.200.200");
        assert_eq!(
            conn.local_auth.as_ref().map(|a| a.auth()),
            Some(AuthType::Psk)
        );

        let child = &conn.children[0];
        let esp = child.esp_proposals.as_ref().unwrap();
        assert_eq!(
            esp.crypto_alg().collect::<Vec<_>>(),
            vec![CryptoAlgorithm::AesGcm16]
        );
        assert_eq!(
            esp.dhgroups().collect::<Vec<_>>(),
            vec![DiffieHellmanGroup::Curve25519]
        );
        assert_eq!(child.local_ts, None);
        assert_eq!(child.remote_ts.as_ref().unwrap().ts[0].cidr, "10.1.0.0/16");
    }

    #[test]
    fn test_connection_json_errors() {
        assert!(ConnectionSpec::from_json("{").unwrap_err().is_config_error());
        assert!(ConnectionSpec::from_json(r#"{"name": "x"}"#).is_err());
    }

    #[test]
    fn test_connection_validation() {
        let mut spec = ConnectionSpec::from_json(CONN_JSON).unwrap();
        spec.version = "3".to_string();
        assert!(spec.to_proto().is_err());

        let mut spec = ConnectionSpec::from_json(CONN_JSON).unwrap();
        spec.children.clear();
        assert!(spec.to_proto().is_err());

        let mut spec = ConnectionSpec::from_json(CONN_JSON).unwrap();
        spec.local_auth.method = "password".to_string();
        assert!(matches!(
            spec.to_proto(),
            Err(IpsecError::UnknownAlgorithm {
                kind: "authentication",
                ..
            })
        ));

        let mut spec = ConnectionSpec::from_json(CONN_JSON).unwrap();
        spec.children[0].esp_proposals.dh_groups = vec!["modp999".to_string()];
        assert!(spec.to_proto().is_err());
    }

    #[tokio::test]
    async fn test_connection_load_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), CONN_JSON).unwrap();
        let spec = ConnectionSpec::load(file.path()).await.unwrap();
        assert_eq!(spec.name, "opi-test");

        let err = ConnectionSpec::load(Path::new("/nonexistent/conn.json"))
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_step_names() {
        assert_eq!(LifecycleStep::LoadConn.to_string(), "IPsecLoadConn");
        assert_eq!(LifecycleStep::Probe.to_string(), "Probe");
        assert!(LifecycleStep::Version.is_advisory());
        assert!(!LifecycleStep::ListSas.is_advisory());
        assert_eq!(TunnelState::default(), TunnelState::Unloaded);
    }
}
