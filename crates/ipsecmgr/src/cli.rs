//! Command line interface.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use ipsec_common::error::IpsecResult;
use ipsec_common::transport::{TlsFiles, TransportConfig, DEFAULT_ENDPOINT};

use crate::algorithms::PROTOCOLS;
use crate::static_sa::DEFAULT_SA_TIMEOUT;
use crate::tunnel::{defaults, LifecycleConfig};
use crate::types::{AuthSpec, ChildSpec, ConnectionSpec, ProposalSpec, SaFlags, SaIdentifier, SaParams};

/// IPsec SA manager and tunnel exerciser for DPUs
#[derive(Parser, Debug)]
#[command(name = "ipsecmgr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Control-plane address (host:port or URI)
    #[arg(long, default_value = DEFAULT_ENDPOINT, global = true)]
    pub addr: String,

    /// Mutual TLS files as client_cert:client_key:ca_cert
    #[arg(long, global = true)]
    pub tls: Option<String>,

    /// Timeout in seconds [default: 10 for SA calls, 1 for stats, 30 for tunnel-test]
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install a manually keyed SA
    AddSa(AddSaArgs),
    /// Remove a manually keyed SA
    DelSa(SaIdArgs),
    /// Show IKE daemon version and statistics
    Stats,
    /// Load, initiate, probe, rekey and tear down one IKE connection
    TunnelTest(TunnelArgs),
}

/// SA identifier flags.
#[derive(Args, Debug, Clone)]
pub struct SaIdArgs {
    /// Source address
    #[arg(long)]
    pub src: IpAddr,

    /// Destination address
    #[arg(long)]
    pub dst: IpAddr,

    /// Security parameter index (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_spi)]
    pub spi: u32,

    /// Security protocol (esp, ah)
    #[arg(long, default_value = "esp")]
    pub proto: String,

    /// XFRM interface id
    #[arg(long = "if_id")]
    pub if_id: u32,
}

impl SaIdArgs {
    pub fn identifier(&self) -> IpsecResult<SaIdentifier> {
        Ok(SaIdentifier::new(
            self.src,
            self.dst,
            self.spi,
            PROTOCOLS.lookup(&self.proto)?,
            self.if_id,
        ))
    }
}

/// SA data flags.
#[derive(Args, Debug, Clone)]
pub struct AddSaArgs {
    #[command(flatten)]
    pub id: SaIdArgs,

    /// Request id binding the SA to a policy
    #[arg(long, default_value_t = 0)]
    pub reqid: u32,

    /// Mode (tunnel, transport, beet, pass, drop)
    #[arg(long, default_value = "tunnel")]
    pub mode: String,

    /// Interface name
    #[arg(long, default_value = "")]
    pub interface: String,

    /// Encryption algorithm name (e.g. aes_gcm_icv_16)
    #[arg(long = "enc_alg")]
    pub enc_alg: String,

    /// Encryption key, hex encoded
    #[arg(long = "enc_key", value_parser = parse_hex, default_value = "")]
    pub enc_key: HexBytes,

    /// Integrity algorithm name (e.g. sha2_256, none)
    #[arg(long = "int_alg", default_value = "none")]
    pub int_alg: String,

    /// Integrity key, hex encoded
    #[arg(long = "int_key", value_parser = parse_hex, default_value = "")]
    pub int_key: HexBytes,

    /// Anti-replay window size
    #[arg(long = "replay_window", default_value_t = 32)]
    pub replay_window: u32,

    /// Traffic flow confidentiality padding
    #[arg(long, default_value_t = 0)]
    pub tfc: u32,

    /// UDP-encapsulate for NAT traversal
    #[arg(long)]
    pub encap: bool,

    /// Extended sequence numbers
    #[arg(long)]
    pub esn: bool,

    /// Copy the DF bit to the outer header
    #[arg(long = "copy_df")]
    pub copy_df: bool,

    /// Copy ECN bits to the outer header
    #[arg(long = "copy_ecn")]
    pub copy_ecn: bool,

    /// Copy DSCP to the outer header
    #[arg(long = "copy_dscp")]
    pub copy_dscp: bool,

    /// This side initiated the SA
    #[arg(long)]
    pub initiator: bool,

    /// Inbound SA
    #[arg(long)]
    pub inbound: bool,

    /// Replace an existing SA with the same identifier
    #[arg(long)]
    pub update: bool,
}

/// Decoded key bytes. Debug output shows the length only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl std::fmt::Debug for HexBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} bytes>", self.0.len())
    }
}

impl AddSaArgs {
    pub fn params(&self) -> SaParams {
        SaParams::new(
            self.enc_alg.clone(),
            self.enc_key.0.clone(),
            self.int_alg.clone(),
            self.int_key.0.clone(),
        )
        .with_reqid(self.reqid)
        .with_mode(self.mode.clone())
        .with_interface(self.interface.clone())
        .with_replay_window(self.replay_window)
        .with_tfc(self.tfc)
        .with_flags(SaFlags {
            encap: self.encap,
            esn: self.esn,
            copy_df: self.copy_df,
            copy_ecn: self.copy_ecn,
            copy_dscp: self.copy_dscp,
            initiator: self.initiator,
            inbound: self.inbound,
            update: self.update,
        })
    }
}

/// Connection flags for the tunnel lifecycle.
#[derive(Args, Debug, Clone)]
pub struct TunnelArgs {
    /// Connection name
    #[arg(long, default_value = defaults::CONN)]
    pub conn: String,

    /// Child SA name
    #[arg(long, default_value = defaults::CHILD)]
    pub child: String,

    /// Local IKE address
    #[arg(long, default_value = defaults::LOCAL_ADDR)]
    pub local: String,

    /// Remote IKE address
    #[arg(long, default_value = defaults::REMOTE_ADDR)]
    pub remote: String,

    /// Local IKE identity
    #[arg(long, default_value = defaults::LOCAL_ID)]
    pub local_id: String,

    /// Remote IKE identity
    #[arg(long, default_value = defaults::REMOTE_ID)]
    pub remote_id: String,

    /// Authentication method for both sides (psk, pubkey, xauth, eap)
    #[arg(long, default_value = defaults::AUTH)]
    pub auth: String,

    /// ESP encryption proposal, comma separated
    #[arg(long, value_delimiter = ',', default_value = defaults::ESP_CRYPTO)]
    pub proposal: Vec<String>,

    /// ESP integrity proposal, comma separated
    #[arg(long, value_delimiter = ',')]
    pub integ: Vec<String>,

    /// DH groups, comma separated
    #[arg(long, value_delimiter = ',', default_value = defaults::DH_GROUP)]
    pub dh: Vec<String>,

    /// Local traffic selector
    #[arg(long, default_value = defaults::LOCAL_TS)]
    pub local_ts: String,

    /// Remote traffic selector
    #[arg(long, default_value = defaults::REMOTE_TS)]
    pub remote_ts: String,

    /// Address to ping across the tunnel
    #[arg(long, default_value = defaults::PROBE_TARGET)]
    pub ping_addr: String,

    /// Certificate type to list
    #[arg(long, default_value = defaults::CERT_TYPE)]
    pub cert_type: String,

    /// JSON connection definition; cannot be combined with the connection flags
    #[arg(long, conflicts_with_all = [
        "conn", "local", "remote", "local_id", "remote_id", "auth",
        "proposal", "integ", "dh", "local_ts", "remote_ts",
    ])]
    pub conn_file: Option<PathBuf>,

    /// Per-call cleanup timeout in seconds
    #[arg(long, default_value_t = defaults::CLEANUP_TIMEOUT.as_secs())]
    pub cleanup_timeout: u64,

    /// Log introspection failures instead of aborting
    #[arg(long)]
    pub advisory_introspection: bool,
}

impl TunnelArgs {
    /// Connection built from flags.
    pub fn connection(&self) -> ConnectionSpec {
        ConnectionSpec {
            name: self.conn.clone(),
            version: "2".to_string(),
            virtual_ips: Vec::new(),
            local_addresses: vec![self.local.clone()],
            remote_addresses: vec![self.remote.clone()],
            local_auth: AuthSpec::new(self.auth.clone(), self.local_id.clone()),
            remote_auth: AuthSpec::new(self.auth.clone(), self.remote_id.clone()),
            proposals: None,
            children: vec![ChildSpec {
                name: self.child.clone(),
                esp_proposals: ProposalSpec {
                    crypto_algorithms: self.proposal.clone(),
                    integrity_algorithms: self.integ.clone(),
                    dh_groups: self.dh.clone(),
                },
                local_traffic_selectors: vec![self.local_ts.clone()],
                remote_traffic_selectors: vec![self.remote_ts.clone()],
            }],
        }
    }

    pub async fn lifecycle_config(&self, timeout: Duration) -> IpsecResult<LifecycleConfig> {
        let connection = match &self.conn_file {
            Some(path) => ConnectionSpec::load(path).await?,
            None => self.connection(),
        };
        Ok(LifecycleConfig::new(connection, self.child.clone(), self.ping_addr.clone())
            .with_timeout(timeout)
            .with_cleanup_timeout(Duration::from_secs(self.cleanup_timeout))
            .with_cert_type(self.cert_type.clone())
            .with_advisory_introspection(self.advisory_introspection))
    }
}

impl Cli {
    /// Timeout for the selected command.
    pub fn timeout(&self) -> Duration {
        if let Some(secs) = self.timeout {
            return Duration::from_secs(secs);
        }
        match self.command {
            Command::AddSa(_) | Command::DelSa(_) => DEFAULT_SA_TIMEOUT,
            Command::Stats => defaults::STATS_TIMEOUT,
            Command::TunnelTest(_) => defaults::LIFECYCLE_TIMEOUT,
        }
    }

    /// Parses `--tls` before any socket is opened.
    pub fn transport(&self) -> IpsecResult<TransportConfig> {
        let tls = self.tls.as_deref().map(str::parse::<TlsFiles>).transpose()?;
        Ok(TransportConfig::new(self.addr.clone()).with_tls(tls))
    }
}

fn parse_spi(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid SPI '{}': {}", s, e))
}

fn parse_hex(s: &str) -> Result<HexBytes, String> {
    let digits: String = s
        .trim_start_matches("0x")
        .chars()
        .filter(|c| *c != ':')
        .collect();
    hex::decode(&digits)
        .map(HexBytes)
        .map_err(|e| format!("invalid hex key: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ipsec_proto::{CryptoAlgorithm, IntegAlgorithm, IpsecProtocol};
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ipsecmgr").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_add_sa_flags() {
        let cli = parse(&[
            "add-sa", "--src", "10.0.0.1", "--dst", "10.0.0.2", "--spi", "0x100", "--if_id",
            "1", "--enc_alg", "aes_cbc", "--enc_key", "00112233445566778899aabbccddeeff",
            "--int_alg", "sha1_96", "--int_key", "0x0102030405060708090a0b0c0d0e0f1011121314",
            "--esn", "--update",
        ]);
        let Command::AddSa(args) = &cli.command else {
            panic!("Expected add-sa, got {:?}", cli.command);
        };

        let id = args.id.identifier().unwrap();
        assert_eq!(id.spi, 256);
        assert_eq!(id.protocol, IpsecProtocol::Esp);

        let params = args.params();
        assert_eq!(params.enc_key.len(), 16);
        assert_eq!(params.int_key.len(), 20);
        assert!(params.flags.esn);
        assert!(params.flags.update);
        assert!(!params.flags.encap);

        let data = params.to_proto().unwrap();
        assert_eq!(data.enc_alg(), CryptoAlgorithm::AesCbc);
        assert_eq!(data.int_alg(), IntegAlgorithm::HmacSha1_96);
        assert_eq!(cli.timeout(), DEFAULT_SA_TIMEOUT);
    }

    #[test]
    fn test_del_sa_requires_identifier() {
        assert!(Cli::try_parse_from(["ipsecmgr", "del-sa", "--src", "10.0.0.1"]).is_err());

        let cli = parse(&[
            "del-sa", "--src", "10.0.0.1", "--dst", "10.0.0.2", "--spi", "256", "--proto", "ah",
            "--if_id", "7",
        ]);
        let Command::DelSa(args) = &cli.command else {
            panic!("Expected del-sa");
        };
        assert_eq!(args.identifier().unwrap().protocol, IpsecProtocol::Ah);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(parse_spi("0xzz").is_err());
        assert!(parse_hex("abc").is_err());
        assert_eq!(parse_hex("de:ad:be:ef").unwrap(), HexBytes(vec![0xde, 0xad, 0xbe, 0xef]));

        let cli = parse(&[
            "del-sa", "--src", "10.0.0.1", "--dst", "10.0.0.2", "--spi", "1", "--proto", "gre",
            "--if_id", "1",
        ]);
        let Command::DelSa(args) = &cli.command else {
            panic!("Expected del-sa");
        };
        assert!(args.identifier().unwrap_err().is_config_error());
    }

    #[test]
    fn test_timeouts_per_command() {
        assert_eq!(parse(&["stats"]).timeout(), Duration::from_secs(1));
        assert_eq!(parse(&["tunnel-test"]).timeout(), Duration::from_secs(30));
        assert_eq!(
            parse(&["--timeout", "5", "stats"]).timeout(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_tls_spec_checked_before_connect() {
        let cli = parse(&["--tls", "client.crt:client.key", "stats"]);
        assert!(cli.transport().unwrap_err().is_config_error());

        let cli = parse(&["--addr", "dpu:50151", "stats"]);
        let transport = cli.transport().unwrap();
        assert_eq!(transport.endpoint, "dpu:50151");
        assert!(transport.tls.is_none());
    }

    #[tokio::test]
    async fn test_tunnel_flags_match_reference() {
        let cli = parse(&["tunnel-test"]);
        let Command::TunnelTest(args) = &cli.command else {
            panic!("Expected tunnel-test");
        };
        let config = args.lifecycle_config(cli.timeout()).await.unwrap();
        assert_eq!(config.conn_name(), "opi-test");
        assert_eq!(config.child, "opi-child");
        assert_eq!(config.probe_target, "10.1.0.2");
        assert!(config.load_request().is_ok());
    }

    #[tokio::test]
    async fn test_tunnel_conn_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut connection = crate::tunnel::reference_connection();
        connection.name = "from-file".to_string();
        std::fs::write(file.path(), serde_json::to_string(&connection).unwrap()).unwrap();

        let path = file.path().to_str().unwrap();
        let cli = parse(&["tunnel-test", "--conn-file", path, "--child", "opi-child"]);
        let Command::TunnelTest(args) = &cli.command else {
            panic!("Expected tunnel-test");
        };
        let config = args.lifecycle_config(cli.timeout()).await.unwrap();
        assert_eq!(config.connection, connection);
        assert_eq!(config.child, "opi-child");
    }

    #[test]
    fn test_conn_file_rejects_connection_flags() {
        for flag in [["--integ", "sha2_256_128"], ["--proposal", "aes_cbc"], ["--dh", "modp2048"]] {
            let err = Cli::try_parse_from(
                ["ipsecmgr", "tunnel-test", "--conn-file", "conn.json"]
                    .into_iter()
                    .chain(flag),
            )
            .unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict, "{}", flag[0]);
        }
    }
}
