//! Message fixtures for IPsec manager tests

use ipsec_proto::{IPsecVersionResponse, ListChildSa, ListIkeSa};

/// Connection name used by the reference tunnel scenario.
pub const TEST_CONN: &str = "opi-test";

/// Child name used by the reference tunnel scenario.
pub const TEST_CHILD: &str = "opi-child";

/// Version answer of a strongSwan-backed daemon.
pub fn version_response() -> IPsecVersionResponse {
    IPsecVersionResponse {
        daemon: "charon-systemd".to_string(),
        version: "5.9.14".to_string(),
        sysname: "Linux".to_string(),
        release: "6.1.0".to_string(),
        machine: "x86_64".to_string(),
    }
}

/// An established IKE SA carrying one installed child SA.
pub fn established_ike_sa(conn: &str, child: &str) -> ListIkeSa {
    ListIkeSa {
        name: conn.to_string(),
        uniqueid: "1".to_string(),
        version: "2".to_string(),
        ikestate: "ESTABLISHED".to_string(),
        local_host: "192.168.200.200".to_string(),
        local_id: "hacker@strongswan.org".to_string(),
        remote_host: "192.168.200.210".to_string(),
        remote_id: "server.strongswan.org".to_string(),
        encr_alg: "AES_CBC".to_string(),
        integ_alg: "HMAC_SHA2_256_128".to_string(),
        dh_group: "CURVE_25519".to_string(),
        established: "1".to_string(),
        rekey_time: "13565".to_string(),
        childsas: vec![ListChildSa {
            name: child.to_string(),
            protocol: "ESP".to_string(),
            spi_in: "c5a9d7a0".to_string(),
            spi_out: "c1f0a3b2".to_string(),
            mode: "TUNNEL".to_string(),
            state: "INSTALLED".to_string(),
            encr_alg: "AES_GCM_16".to_string(),
            local_ts: vec!["10.3.0.0/16".to_string()],
            remote_ts: vec!["10.1.0.0/16".to_string()],
            ..Default::default()
        }],
    }
}
