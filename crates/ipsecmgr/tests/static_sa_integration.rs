//! Static SA manager against the recording control plane.

use ipsec_common::service::ops;
use ipsec_proto::{CryptoAlgorithm, IntegAlgorithm, IpsecMode, IpsecProtocol};
use ipsec_test::{Call, CallVerifier, RecordingConnector, RecordingService};
use ipsecmgr::types::SaFlags;
use ipsecmgr::{SaIdentifier, SaParams, StaticSaManager};
use pretty_assertions::assert_eq;

fn identifier() -> SaIdentifier {
    SaIdentifier::new(
        "10.0.0.1".parse().unwrap(),
        "10.0.0.2".parse().unwrap(),
        256,
        IpsecProtocol::Esp,
        1,
    )
}

fn manager() -> (StaticSaManager<RecordingConnector>, RecordingConnector) {
    let connector = RecordingConnector::new(RecordingService::new());
    (StaticSaManager::new(connector.clone()), connector)
}

#[tokio::test]
async fn test_add_sa_reference_scenario() {
    let (mgr, connector) = manager();
    let params = SaParams::new("aes_cbc", vec![0x01; 16], "sha1_96", vec![0x02; 20]);

    mgr.add_sa(&identifier(), &params).await.unwrap();

    let calls = connector.service().calls();
    CallVerifier::new(calls.clone())
        .assert_sequence(&[ops::ADD_SA])
        .unwrap();
    let Call::AddSa(request) = &calls[0] else {
        panic!("Expected AddSA, got {:?}", calls[0]);
    };

    let sa_id = request.sa_id.as_ref().unwrap();
    assert_eq!(sa_id.src, "10.0.0.1");
    assert_eq!(sa_id.dst, "10.0.0.2");
    assert_eq!(sa_id.spi, 256);
    assert_eq!(sa_id.proto(), IpsecProtocol::Esp);
    assert_eq!(sa_id.if_id, 1);

    let data = request.sa_data.as_ref().unwrap();
    assert_eq!(data.enc_alg(), CryptoAlgorithm::AesCbc);
    assert_eq!(data.int_alg(), IntegAlgorithm::HmacSha1_96);
    assert_eq!(data.mode(), IpsecMode::Tunnel);
    assert_eq!(data.enc_key, vec![0x01; 16]);
}

#[tokio::test]
async fn test_add_sa_table_codes() {
    let (mgr, connector) = manager();
    let params = SaParams::new("aes_gcm_icv_16", vec![0x0a; 36], "sha2_256", vec![0x0b; 64]);

    mgr.add_sa(&identifier(), &params).await.unwrap();

    let calls = connector.service().calls();
    let Call::AddSa(request) = &calls[0] else {
        panic!("Expected AddSA");
    };
    let data = request.sa_data.as_ref().unwrap();
    assert_eq!(data.enc_alg(), CryptoAlgorithm::AesGcm16);
    assert_eq!(data.int_alg(), IntegAlgorithm::HmacSha2_512_256);
}

#[tokio::test]
async fn test_unknown_algorithms_issue_no_rpc() {
    let (mgr, connector) = manager();

    for (enc, int) in [("aes_cbc", "sha3_512"), ("twofish", "sha1_96"), ("", "none")] {
        let params = SaParams::new(enc, vec![1; 16], int, vec![2; 20]);
        let err = mgr.add_sa(&identifier(), &params).await.unwrap_err();
        assert!(err.is_config_error(), "{} / {}: {}", enc, int, err);
    }

    assert!(connector.service().calls().is_empty());
    assert_eq!(connector.opens(), 0);
}

#[tokio::test]
async fn test_update_is_a_repeated_add() {
    let (mgr, connector) = manager();
    let params = SaParams::new("aes_cbc", vec![1; 16], "sha1_96", vec![2; 20]);

    mgr.add_sa(&identifier(), &params).await.unwrap();
    let update = params.clone().with_flags(SaFlags {
        update: true,
        ..Default::default()
    });
    mgr.add_sa(&identifier(), &update).await.unwrap();

    let calls = connector.service().calls();
    CallVerifier::new(calls.clone())
        .assert_sequence(&[ops::ADD_SA, ops::ADD_SA])
        .unwrap();
    let Call::AddSa(second) = &calls[1] else {
        panic!("Expected AddSA");
    };
    assert!(second.sa_data.as_ref().unwrap().update);
    assert_eq!(connector.opens(), 2);
    assert_eq!(connector.closes(), 2);
}

#[tokio::test]
async fn test_delete_sa_carries_no_key_material() {
    let (mgr, connector) = manager();

    mgr.delete_sa(&identifier()).await.unwrap();

    let calls = connector.service().calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Call::DeleteSa(request) => {
            assert_eq!(request.sa_id, Some(identifier().to_proto()));
        }
        other => panic!("Expected DeleteSA, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_missing_sa_propagates_daemon_answer() {
    let service = RecordingService::new().reject(
        ops::DELETE_SA,
        tonic::Code::NotFound,
        "no SA with SPI 0x00000100",
    );
    let connector = RecordingConnector::new(service);
    let mgr = StaticSaManager::new(connector.clone());

    let err = mgr.delete_sa(&identifier()).await.unwrap_err();
    assert!(err.is_remote_rejection());
    assert!(err.to_string().contains("no SA with SPI 0x00000100"));
    assert_eq!(connector.closes(), 1);
}

#[tokio::test]
async fn test_transport_failure_mid_call() {
    let service = RecordingService::new().unavailable(ops::ADD_SA, "connection reset");
    let connector = RecordingConnector::new(service);
    let mgr = StaticSaManager::new(connector.clone());
    let params = SaParams::new("aes_cbc", vec![1; 16], "sha1_96", vec![2; 20]);

    let err = mgr.add_sa(&identifier(), &params).await.unwrap_err();
    assert!(err.is_transport_error());
    assert_eq!(connector.service().operations(), vec![ops::ADD_SA]);
    assert_eq!(connector.closes(), 1);
}
