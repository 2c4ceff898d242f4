//! # Discovery Flows
//!
//! Publish and subscribe sessions from submission to stop, with matches and
//! follow-up messages injected through the simulator.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::integration::fixtures::{peer_address, EngineHarness};
    use aware_core::{
        AwareError, CommandKind, CompletionDetail, CompletionPayload, FirmwareEvent,
        FirmwareStatus, MessageRequest, Notification, PeerInstanceId, PublishConfig, SessionId,
        SessionRole, TerminationReason,
    };

    fn message(session_id: SessionId, peer: PeerInstanceId) -> MessageRequest {
        MessageRequest {
            session_id,
            peer,
            payload: b"hello".to_vec(),
        }
    }

    // =========================================================================
    // SCENARIO
    // =========================================================================

    #[tokio::test]
    async fn test_publish_match_message_stop_leaves_registry_empty() {
        let mut harness = EngineHarness::enabled().await;
        let peer = PeerInstanceId::new(0x4d);

        // Firmware numbers this session 3
        harness.firmware.silence_kind(CommandKind::Publish);
        let txn = harness
            .handle
            .publish(SessionId::UNASSIGNED, PublishConfig::new("aware.chat"))
            .await
            .unwrap();
        harness
            .firmware
            .inject(FirmwareEvent::CommandCompleted {
                transaction_id: txn,
                outcome: Ok(CompletionPayload::SessionId(SessionId::new(3))),
            })
            .unwrap();
        assert_eq!(
            harness.expect_success(txn).await,
            CompletionDetail::SessionStarted {
                session_id: SessionId::new(3),
                role: SessionRole::Publisher,
            }
        );
        harness.firmware.restore(CommandKind::Publish);

        harness.match_peer(SessionId::new(3), peer).await;
        let sent = harness
            .handle
            .send_message(message(SessionId::new(3), peer))
            .await
            .unwrap();
        assert_eq!(harness.expect_success(sent).await, CompletionDetail::MessageSent);

        let stop = harness.handle.stop_publish(SessionId::new(3)).await.unwrap();
        assert_eq!(
            harness.expect_success(stop).await,
            CompletionDetail::SessionStopped {
                session_id: SessionId::new(3)
            }
        );

        let err = harness
            .handle
            .stop_publish(SessionId::new(3))
            .await
            .unwrap_err();
        assert_eq!(err, AwareError::UnknownSession(SessionId::new(3)));
        harness.stop().await;
    }

    // =========================================================================
    // UPDATES
    // =========================================================================

    #[tokio::test]
    async fn test_updates_keep_the_session_id() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_publish("aware.svc").await;

        for info in [b"v2".to_vec(), b"v3".to_vec()] {
            let mut config = PublishConfig::new("aware.svc");
            config.service_specific_info = info;
            let txn = harness.handle.publish(session_id, config).await.unwrap();
            assert_eq!(
                harness.expect_success(txn).await,
                CompletionDetail::SessionUpdated { session_id }
            );
        }

        let publishes = harness
            .firmware
            .issued()
            .iter()
            .filter(|(_, kind)| *kind == CommandKind::Publish)
            .count();
        assert_eq!(publishes, 3);
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_second_update_while_first_pending_is_rejected() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_publish("aware.svc").await;

        harness.firmware.silence_kind(CommandKind::Publish);
        harness
            .handle
            .publish(session_id, PublishConfig::new("aware.svc"))
            .await
            .unwrap();
        let err = harness
            .handle
            .publish(session_id, PublishConfig::new("aware.svc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AwareError::InvalidState { .. }));
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_stop_with_wrong_role_is_rejected() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_subscribe("aware.svc").await;

        let err = harness.handle.stop_publish(session_id).await.unwrap_err();
        assert!(matches!(err, AwareError::RoleMismatch { .. }));

        let stop = harness.handle.stop_subscribe(session_id).await.unwrap();
        harness.expect_success(stop).await;
        harness.stop().await;
    }

    // =========================================================================
    // PEERS AND MESSAGES
    // =========================================================================

    #[tokio::test]
    async fn test_message_to_unmatched_peer_issues_nothing() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_publish("aware.svc").await;
        let issued_before = harness.firmware.issued().len();

        let err = harness
            .handle
            .send_message(message(session_id, PeerInstanceId::new(77)))
            .await
            .unwrap_err();
        assert!(matches!(err, AwareError::UnknownPeer { .. }));
        assert_eq!(harness.firmware.issued().len(), issued_before);
        harness.expect_quiet(Duration::from_millis(100)).await;
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_received_message_is_forwarded() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_subscribe("aware.svc").await;
        let peer = PeerInstanceId::new(5);
        harness.match_peer(session_id, peer).await;

        harness
            .firmware
            .inject(FirmwareEvent::MessageReceived {
                session_id,
                peer,
                peer_address: peer_address(peer),
                payload: b"ping".to_vec(),
            })
            .unwrap();
        assert_eq!(
            harness.next().await,
            Notification::MessageReceived {
                session_id,
                peer,
                payload: b"ping".to_vec(),
            }
        );
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_firmware_termination_removes_session() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_publish("aware.svc").await;

        harness
            .firmware
            .inject(FirmwareEvent::SessionTerminated {
                session_id,
                status: FirmwareStatus::new(2),
            })
            .unwrap();
        assert_eq!(
            harness.next().await,
            Notification::SessionTerminated {
                session_id,
                role: SessionRole::Publisher,
                reason: TerminationReason::Firmware(FirmwareStatus::new(2)),
            }
        );

        let err = harness.handle.stop_publish(session_id).await.unwrap_err();
        assert_eq!(err, AwareError::UnknownSession(session_id));
        harness.stop().await;
    }
}
