//! IPsec control-plane messages.
//!
//! Enumeration values for algorithms and DH groups are the IANA IKEv2
//! transform identifiers (RFC 7296 section 3.3.2), which is what the device
//! datapath and the IKE daemon both consume.

/// IPsec security protocol. Values are IP protocol numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IpsecProtocol {
    Unspecified = 0,
    Esp = 50,
    Ah = 51,
}

/// IPsec encapsulation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IpsecMode {
    Unspecified = 0,
    Transport = 1,
    Tunnel = 2,
    Beet = 3,
    Pass = 4,
    Drop = 5,
}

/// Encryption transform identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CryptoAlgorithm {
    Unspecified = 0,
    Des = 2,
    TripleDes = 3,
    Cast = 6,
    Blowfish = 7,
    Null = 11,
    AesCbc = 12,
    AesCtr = 13,
    AesCcm8 = 14,
    AesCcm12 = 15,
    AesCcm16 = 16,
    AesGcm8 = 18,
    AesGcm12 = 19,
    AesGcm16 = 20,
    NullAuthAesGmac = 21,
    CamelliaCbc = 23,
    CamelliaCtr = 24,
    CamelliaCcm8 = 25,
    CamelliaCcm12 = 26,
    CamelliaCcm16 = 27,
    Chacha20Poly1305 = 28,
}

/// Integrity transform identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IntegAlgorithm {
    None = 0,
    HmacMd5_96 = 1,
    HmacSha1_96 = 2,
    AesXcbc96 = 5,
    HmacMd5_128 = 6,
    HmacSha1_160 = 7,
    AesCmac96 = 8,
    Aes128Gmac = 9,
    Aes192Gmac = 10,
    Aes256Gmac = 11,
    HmacSha2_256_128 = 12,
    HmacSha2_384_192 = 13,
    HmacSha2_512_256 = 14,
}

/// Diffie-Hellman group transform identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DiffieHellmanGroup {
    None = 0,
    Modp768 = 1,
    Modp1024 = 2,
    Modp1536 = 5,
    Modp2048 = 14,
    Modp3072 = 15,
    Modp4096 = 16,
    Modp6144 = 17,
    Modp8192 = 18,
    Ecp256 = 19,
    Ecp384 = 20,
    Ecp521 = 21,
    Curve25519 = 31,
    Curve448 = 32,
}

/// IKE authentication method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AuthType {
    Unspecified = 0,
    Pubkey = 1,
    Psk = 2,
    Xauth = 3,
    Eap = 4,
}

// ---------------------------------------------------------------------------
// Static (manually keyed) SAs
// ---------------------------------------------------------------------------

/// Identifies one directional SA on the device.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SaId {
    #[prost(string, tag = "1")]
    pub src: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub dst: ::prost::alloc::string::String,
    #[prost(uint32, tag = "3")]
    pub spi: u32,
    #[prost(enumeration = "IpsecProtocol", tag = "4")]
    pub proto: i32,
    #[prost(uint32, tag = "5")]
    pub if_id: u32,
}

/// Keys, algorithms and flags of a static SA.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SaData {
    #[prost(uint32, tag = "1")]
    pub reqid: u32,
    #[prost(enumeration = "IpsecMode", tag = "2")]
    pub mode: i32,
    #[prost(string, tag = "3")]
    pub interface: ::prost::alloc::string::String,
    #[prost(enumeration = "CryptoAlgorithm", tag = "4")]
    pub enc_alg: i32,
    #[prost(bytes = "vec", tag = "5")]
    pub enc_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(enumeration = "IntegAlgorithm", tag = "6")]
    pub int_alg: i32,
    #[prost(bytes = "vec", tag = "7")]
    pub int_key: ::prost::alloc::vec::Vec<u8>,
    #[prost(uint32, tag = "8")]
    pub replay_window: u32,
    #[prost(uint32, tag = "9")]
    pub tfc: u32,
    #[prost(bool, tag = "10")]
    pub encap: bool,
    #[prost(bool, tag = "11")]
    pub esn: bool,
    #[prost(bool, tag = "12")]
    pub copy_df: bool,
    #[prost(bool, tag = "13")]
    pub copy_ecn: bool,
    #[prost(bool, tag = "14")]
    pub copy_dscp: bool,
    #[prost(bool, tag = "15")]
    pub initiator: bool,
    #[prost(bool, tag = "16")]
    pub inbound: bool,
    #[prost(bool, tag = "17")]
    pub update: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddSaRequest {
    #[prost(message, optional, tag = "1")]
    pub sa_id: ::core::option::Option<SaId>,
    #[prost(message, optional, tag = "2")]
    pub sa_data: ::core::option::Option<SaData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AddSaResponse {}

/// Deletion carries the identifier only.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteSaRequest {
    #[prost(message, optional, tag = "1")]
    pub sa_id: ::core::option::Option<SaId>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteSaResponse {}

// ---------------------------------------------------------------------------
// IKE daemon
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecVersionRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecVersionResponse {
    #[prost(string, tag = "1")]
    pub daemon: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub version: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub sysname: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub release: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub machine: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecStatsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecStatsResponse {
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Addrs {
    #[prost(string, tag = "1")]
    pub addr: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocalAuth {
    #[prost(enumeration = "AuthType", tag = "1")]
    pub auth: i32,
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RemoteAuth {
    #[prost(enumeration = "AuthType", tag = "1")]
    pub auth: i32,
    #[prost(string, tag = "2")]
    pub id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Proposals {
    #[prost(enumeration = "CryptoAlgorithm", repeated, tag = "1")]
    pub crypto_alg: ::prost::alloc::vec::Vec<i32>,
    #[prost(enumeration = "IntegAlgorithm", repeated, tag = "2")]
    pub integ_alg: ::prost::alloc::vec::Vec<i32>,
    #[prost(enumeration = "DiffieHellmanGroup", repeated, tag = "3")]
    pub dhgroups: ::prost::alloc::vec::Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrafficSelector {
    #[prost(string, tag = "1")]
    pub cidr: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub proto: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub port: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrafficSelectors {
    #[prost(message, repeated, tag = "1")]
    pub ts: ::prost::alloc::vec::Vec<TrafficSelector>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Child {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub esp_proposals: ::core::option::Option<Proposals>,
    #[prost(message, optional, tag = "3")]
    pub local_ts: ::core::option::Option<TrafficSelectors>,
    #[prost(message, optional, tag = "4")]
    pub remote_ts: ::core::option::Option<TrafficSelectors>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Connection {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub version: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "3")]
    pub vips: ::prost::alloc::vec::Vec<Addrs>,
    #[prost(message, repeated, tag = "4")]
    pub local_addrs: ::prost::alloc::vec::Vec<Addrs>,
    #[prost(message, repeated, tag = "5")]
    pub remote_addrs: ::prost::alloc::vec::Vec<Addrs>,
    #[prost(message, optional, tag = "6")]
    pub local_auth: ::core::option::Option<LocalAuth>,
    #[prost(message, optional, tag = "7")]
    pub remote_auth: ::core::option::Option<RemoteAuth>,
    #[prost(message, repeated, tag = "8")]
    pub children: ::prost::alloc::vec::Vec<Child>,
    #[prost(message, optional, tag = "9")]
    pub proposals: ::core::option::Option<Proposals>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecLoadConnRequest {
    #[prost(message, optional, tag = "1")]
    pub connection: ::core::option::Option<Connection>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecLoadConnResponse {
    #[prost(string, tag = "1")]
    pub success: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecUnloadConnRequest {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecUnloadConnResponse {
    #[prost(string, tag = "1")]
    pub success: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecInitiateRequest {
    #[prost(string, tag = "1")]
    pub child: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub ike: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub timeout: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub loglevel: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecInitiateResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecTerminateRequest {
    #[prost(string, tag = "1")]
    pub child: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub ike: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub child_id: u64,
    #[prost(uint64, tag = "4")]
    pub ike_id: u64,
    #[prost(string, tag = "5")]
    pub force: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub timeout: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub loglevel: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecTerminateResponse {
    #[prost(string, tag = "1")]
    pub success: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub matches: u64,
    #[prost(uint64, tag = "3")]
    pub terminated: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecRekeyRequest {
    #[prost(string, tag = "1")]
    pub child: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub ike: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub child_id: u64,
    #[prost(uint64, tag = "4")]
    pub ike_id: u64,
    #[prost(string, tag = "5")]
    pub reauth: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecRekeyResponse {
    #[prost(string, tag = "1")]
    pub success: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub matches: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecListSasRequest {
    #[prost(string, tag = "1")]
    pub noblock: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub ike: ::prost::alloc::string::String,
    #[prost(uint64, tag = "3")]
    pub ike_id: u64,
    #[prost(string, tag = "4")]
    pub child: ::prost::alloc::string::String,
    #[prost(uint64, tag = "5")]
    pub child_id: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListChildSa {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub protocol: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub encap: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub spi_in: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub spi_out: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub mode: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub state: ::prost::alloc::string::String,
    #[prost(string, tag = "8")]
    pub encr_alg: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub integ_alg: ::prost::alloc::string::String,
    #[prost(string, tag = "10")]
    pub bytes_in: ::prost::alloc::string::String,
    #[prost(string, tag = "11")]
    pub bytes_out: ::prost::alloc::string::String,
    #[prost(string, tag = "12")]
    pub packets_in: ::prost::alloc::string::String,
    #[prost(string, tag = "13")]
    pub packets_out: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "14")]
    pub local_ts: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "15")]
    pub remote_ts: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListIkeSa {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub uniqueid: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub version: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub ikestate: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub local_host: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub local_id: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub remote_host: ::prost::alloc::string::String,
    #[prost(string, tag = "8")]
    pub remote_id: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub encr_alg: ::prost::alloc::string::String,
    #[prost(string, tag = "10")]
    pub integ_alg: ::prost::alloc::string::String,
    #[prost(string, tag = "11")]
    pub dh_group: ::prost::alloc::string::String,
    #[prost(string, tag = "12")]
    pub established: ::prost::alloc::string::String,
    #[prost(string, tag = "13")]
    pub rekey_time: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "14")]
    pub childsas: ::prost::alloc::vec::Vec<ListChildSa>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecListSasResponse {
    #[prost(message, repeated, tag = "1")]
    pub ikesas: ::prost::alloc::vec::Vec<ListIkeSa>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecListConnsRequest {
    #[prost(string, tag = "1")]
    pub ike: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListChild {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub mode: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "3")]
    pub local_ts: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "4")]
    pub remote_ts: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListConnResp {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "2")]
    pub local_addrs: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "3")]
    pub remote_addrs: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag = "4")]
    pub version: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "5")]
    pub children: ::prost::alloc::vec::Vec<ListChild>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecListConnsResponse {
    #[prost(message, repeated, tag = "1")]
    pub connection: ::prost::alloc::vec::Vec<ListConnResp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecListCertsRequest {
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub flag: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub subject: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListCert {
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub flag: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub has_privkey: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub data: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub subject: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub not_before: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub not_after: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IPsecListCertsResponse {
    #[prost(message, repeated, tag = "1")]
    pub certs: ::prost::alloc::vec::Vec<ListCert>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_enum_wire_values() {
        assert_eq!(i32::from(IpsecProtocol::Esp), 50);
        assert_eq!(i32::from(CryptoAlgorithm::AesGcm16), 20);
        assert_eq!(i32::from(IntegAlgorithm::HmacSha1_96), 2);
        assert_eq!(i32::from(IntegAlgorithm::HmacSha2_512_256), 14);
        assert_eq!(i32::from(DiffieHellmanGroup::Curve25519), 31);
    }

    #[test]
    fn test_enum_from_wire() {
        assert_eq!(CryptoAlgorithm::try_from(12).ok(), Some(CryptoAlgorithm::AesCbc));
        assert!(CryptoAlgorithm::try_from(17).is_err());
    }

    #[test]
    fn test_sa_data_enum_accessors() {
        let data = SaData {
            enc_alg: CryptoAlgorithm::AesCbc as i32,
            int_alg: IntegAlgorithm::HmacSha1_96 as i32,
            ..Default::default()
        };
        assert_eq!(data.enc_alg(), CryptoAlgorithm::AesCbc);
        assert_eq!(data.int_alg(), IntegAlgorithm::HmacSha1_96);
    }

    #[test]
    fn test_delete_request_carries_identifier_only() {
        let req = DeleteSaRequest {
            sa_id: Some(SaId {
                src: "10.0.0.1".to_string(),
                dst: "10.0.0.2".to_string(),
                spi: 256,
                proto: IpsecProtocol::Esp as i32,
                if_id: 1,
            }),
        };
        let bytes = req.encode_to_vec();
        let decoded = AddSaRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded.sa_id, req.sa_id);
        assert!(decoded.sa_data.is_none());
    }
}
