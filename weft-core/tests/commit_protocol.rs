//! Failure paths of the propose, order, confirm protocol.

mod harness;

use harness::{package, two_org_network, wait_until, ORG1_PEER, ORG2_PEER};
use std::time::Duration;
use weft_core::domain::lifecycle::LifecycleVariant;
use weft_core::domain::proposal::{BroadcastStatus, ValidationCode};
use weft_core::foundation::{PeerName, WeftError};

#[tokio::test]
async fn an_endorsement_failure_aborts_before_ordering() {
    let net = two_org_network(LifecycleVariant::V2);
    net.network.set_endorse_failure(&PeerName::new(ORG2_PEER), 500, "chaincode simulation failed");
    let connection = net.connect();
    let lifecycle = connection.lifecycle();

    lifecycle.install(&package("assets", "1.0"), &PeerName::new(ORG1_PEER)).await.unwrap();
    let err = lifecycle.approve("assets", "1.0", &net.peers(), &net.channel()).await.unwrap_err();

    assert!(matches!(err, WeftError::EndorsementFailed { .. }), "got {err}");
    assert!(err.to_string().contains("chaincode simulation failed"));
    assert_eq!(net.network.broadcast_count(), 0, "nothing may reach the orderer");
    assert_eq!(net.network.open_subscriptions(), 0);
}

#[tokio::test]
async fn an_unreachable_target_aborts_before_ordering() {
    let net = two_org_network(LifecycleVariant::V2);
    let connection = net.connect();
    let lifecycle = connection.lifecycle();

    lifecycle.install(&package("assets", "1.0"), &PeerName::new(ORG1_PEER)).await.unwrap();
    net.network.set_peer_unreachable(&PeerName::new(ORG2_PEER), true);

    let err = lifecycle.approve("assets", "1.0", &net.peers(), &net.channel()).await.unwrap_err();
    assert!(matches!(err, WeftError::EndorsementFailed { .. }), "got {err}");
    assert_eq!(net.network.broadcast_count(), 0);
}

#[tokio::test]
async fn divergent_payloads_fail_closed() {
    let net = two_org_network(LifecycleVariant::V2);
    net.network.set_payload_override(&PeerName::new(ORG2_PEER), b"tampered".to_vec());
    let connection = net.connect();
    let lifecycle = connection.lifecycle();

    lifecycle.install(&package("assets", "1.0"), &PeerName::new(ORG1_PEER)).await.unwrap();
    let err = lifecycle.approve("assets", "1.0", &net.peers(), &net.channel()).await.unwrap_err();

    assert!(matches!(err, WeftError::EndorsementMismatch { .. }), "got {err}");
    assert_eq!(net.network.broadcast_count(), 0);
}

#[tokio::test]
async fn a_failed_broadcast_tears_down_the_subscription() {
    let net = two_org_network(LifecycleVariant::V2);
    let connection = net.connect();
    let lifecycle = connection.lifecycle();

    lifecycle.install(&package("assets", "1.0"), &PeerName::new(ORG1_PEER)).await.unwrap();
    net.network.set_broadcast_status(Some(BroadcastStatus::ServiceUnavailable));

    let err = lifecycle.approve("assets", "1.0", &net.peers(), &net.channel()).await.unwrap_err();
    assert!(matches!(err, WeftError::OrderingFailed { .. }), "got {err}");
    assert!(err.to_string().contains("SERVICE_UNAVAILABLE"));
    assert_eq!(net.network.broadcast_count(), 1);
    assert!(
        wait_until(Duration::from_secs(1), || async { net.network.open_subscriptions() == 0 }).await,
        "subscription should be torn down after the broadcast failure"
    );
}

#[tokio::test]
async fn a_rejected_transaction_reports_code_and_block() {
    let net = two_org_network(LifecycleVariant::V2);
    let connection = net.connect();
    let lifecycle = connection.lifecycle();
    let peers = net.peers();
    let channel = net.channel();

    lifecycle.install(&package("assets", "1.0"), &PeerName::new(ORG1_PEER)).await.unwrap();
    lifecycle.approve("assets", "1.0", &peers, &channel).await.unwrap();

    net.network.set_reject_code(Some(ValidationCode::MvccReadConflict));
    connection.set_identity(&weft_core::foundation::IdentityLabel::new("org2-admin")).unwrap();
    let err = lifecycle.approve("assets", "1.0", &peers, &channel).await.unwrap_err();

    match err {
        WeftError::CommitRejected { block_number, code, .. } => {
            assert_eq!(code, "MVCC_READ_CONFLICT");
            assert_eq!(block_number, 2);
        }
        other => panic!("expected CommitRejected, got {other}"),
    }
    assert_eq!(net.network.open_subscriptions(), 0);
}

#[tokio::test]
async fn a_missing_commit_event_times_out() {
    let mut net = two_org_network(LifecycleVariant::V2);
    net.config.timeouts.commit_secs = 1;
    let connection = net.connect();
    let lifecycle = connection.lifecycle();

    lifecycle.install(&package("assets", "1.0"), &PeerName::new(ORG1_PEER)).await.unwrap();
    // Orderer accepts the envelope but never sequences it.
    net.network.set_broadcast_status(Some(BroadcastStatus::Success));

    let err = lifecycle.approve("assets", "1.0", &net.peers(), &net.channel()).await.unwrap_err();
    assert!(matches!(err, WeftError::CommitTimeout { waited_secs: 1, .. }), "got {err}");
    assert_eq!(net.network.open_subscriptions(), 0);
}

#[tokio::test]
async fn an_empty_target_set_is_rejected() {
    let net = two_org_network(LifecycleVariant::V2);
    let connection = net.connect();
    let lifecycle = connection.lifecycle();

    let err = lifecycle.invoke("assets", None, Vec::new(), &[], &net.channel()).await.unwrap_err();
    assert!(err.to_string().contains("no target peers"), "got {err}");
}
