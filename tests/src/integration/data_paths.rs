//! # Data Path Flows
//!
//! Local initiation, peer requests and the response grace period, with the
//! simulator confirming paths on its own.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::integration::fixtures::{peer_address, EngineHarness, DATA_IFACE};
    use aware_core::{
        AwareError, CipherSuite, CommandKind, CompletionDetail, CompletionPayload,
        DataPathSecurityConfig, FirmwareEvent, FirmwareStatus, InitiateRequest, MacAddress,
        NdpId, Notification, PeerInstanceId, RespondRequest, TerminationReason,
    };

    fn peer_request(ndp_id: NdpId) -> FirmwareEvent {
        FirmwareEvent::DataPathRequested {
            ndp_id,
            peer_id: PeerInstanceId::UNASSOCIATED,
            peer_address: MacAddress::new([0x02, 0, 0, 0, 0x0d, 0x01]),
            app_info: b"peer".to_vec(),
        }
    }

    async fn requested(harness: &mut EngineHarness, ndp_id: NdpId) {
        harness.firmware.inject(peer_request(ndp_id)).unwrap();
        match harness.next().await {
            Notification::DataPathRequested { ndp_id: id, .. } if id == ndp_id => {}
            other => panic!("expected a data path request, got {other:?}"),
        }
    }

    // =========================================================================
    // SYNCHRONOUS REJECTION
    // =========================================================================

    #[tokio::test]
    async fn test_pmk_and_passphrase_together_rejected_without_allocation() {
        let mut harness = EngineHarness::with_interface().await;
        let issued_before = harness.firmware.issued().len();

        let mut request =
            InitiateRequest::out_of_band(MacAddress::new([0x02, 0, 0, 0, 0, 9]), DATA_IFACE);
        request.security = DataPathSecurityConfig {
            cipher_suite: CipherSuite::SharedKey128,
            pmk: Some(vec![0x11; 32]),
            passphrase: Some("correct horse".to_string()),
            pmkid: None,
        };

        let err = harness.handle.initiate_data_path(request).await.unwrap_err();
        assert!(matches!(err, AwareError::InvalidSecurityConfig(_)));
        assert_eq!(harness.firmware.issued().len(), issued_before);
        harness.expect_quiet(Duration::from_millis(100)).await;
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_initiate_to_unmatched_peer_rejected() {
        let mut harness = EngineHarness::with_interface().await;
        let peer = PeerInstanceId::new(8);

        let mut request = InitiateRequest::out_of_band(peer_address(peer), DATA_IFACE);
        request.peer_id = peer;
        let err = harness.handle.initiate_data_path(request).await.unwrap_err();
        assert!(matches!(err, AwareError::UnknownPeer { .. }));
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_initiate_requires_created_interface() {
        let mut harness = EngineHarness::enabled().await;
        let request =
            InitiateRequest::out_of_band(MacAddress::new([0x02, 0, 0, 0, 0, 9]), DATA_IFACE);

        let err = harness.handle.initiate_data_path(request).await.unwrap_err();
        assert_eq!(err, AwareError::UnknownInterface(DATA_IFACE.to_string()));
        harness.stop().await;
    }

    // =========================================================================
    // NEGOTIATION
    // =========================================================================

    #[tokio::test]
    async fn test_matched_peer_initiate_confirms() {
        let mut harness = EngineHarness::with_interface().await;
        let session_id = harness.start_subscribe("aware.file").await;
        let peer = PeerInstanceId::new(3);
        harness.match_peer(session_id, peer).await;

        let mut request = InitiateRequest::out_of_band(peer_address(peer), DATA_IFACE);
        request.peer_id = peer;
        let txn = harness.handle.initiate_data_path(request).await.unwrap();

        let ndp_id = match harness.expect_success(txn).await {
            CompletionDetail::DataPathInitiated { ndp_id } => ndp_id,
            other => panic!("unexpected result: {other:?}"),
        };
        match harness.next().await {
            Notification::DataPathConfirmed { ndp_id: id, peer_ndi, .. } => {
                assert_eq!(id, ndp_id);
                assert_eq!(peer_ndi, peer_address(peer));
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_peer_request_accepted_and_ended() {
        let mut harness = EngineHarness::with_interface().await;
        let ndp_id = NdpId::new(40);
        requested(&mut harness, ndp_id).await;

        let txn = harness
            .handle
            .respond_to_data_path_request(RespondRequest::accept(ndp_id, DATA_IFACE))
            .await
            .unwrap();
        assert_eq!(
            harness.expect_success(txn).await,
            CompletionDetail::DataPathResponded {
                ndp_id,
                accepted: true
            }
        );
        assert!(matches!(
            harness.next().await,
            Notification::DataPathConfirmed { ndp_id: id, .. } if id == ndp_id
        ));

        let end = harness.handle.end_data_path(ndp_id).await.unwrap();
        assert_eq!(
            harness.expect_success(end).await,
            CompletionDetail::DataPathEnded { ndp_id }
        );
        // The firmware's own termination report for an ended path stays silent
        harness.expect_quiet(Duration::from_millis(100)).await;

        let err = harness.handle.end_data_path(ndp_id).await.unwrap_err();
        assert_eq!(err, AwareError::UnknownDataPath(ndp_id));
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_peer_rejection_reported_as_terminated() {
        let mut harness = EngineHarness::with_interface().await;
        let session_id = harness.start_publish("aware.file").await;
        let peer = PeerInstanceId::new(6);
        harness.match_peer(session_id, peer).await;

        harness.firmware.silence_kind(CommandKind::InitiateDataPath);
        let mut request = InitiateRequest::out_of_band(peer_address(peer), DATA_IFACE);
        request.peer_id = peer;
        let txn = harness.handle.initiate_data_path(request).await.unwrap();
        let ndp_id = NdpId::new(77);
        harness
            .firmware
            .inject(FirmwareEvent::CommandCompleted {
                transaction_id: txn,
                outcome: Ok(CompletionPayload::NdpId(ndp_id)),
            })
            .unwrap();
        harness.expect_success(txn).await;

        harness
            .firmware
            .inject(FirmwareEvent::DataPathConfirmed {
                ndp_id,
                accepted: false,
                peer_ndi: peer_address(peer),
                app_info: Vec::new(),
                status: FirmwareStatus::new(4),
            })
            .unwrap();
        assert_eq!(
            harness.next().await,
            Notification::DataPathTerminated {
                ndp_id,
                reason: TerminationReason::Rejected(FirmwareStatus::new(4)),
            }
        );
        harness.stop().await;
    }

    // =========================================================================
    // RESPONSE GRACE
    // =========================================================================

    #[tokio::test]
    async fn test_unanswered_request_terminates_exactly_once() {
        let mut harness = EngineHarness::with_interface().await;
        let ndp_id = NdpId::new(12);
        requested(&mut harness, ndp_id).await;

        assert_eq!(
            harness.next().await,
            Notification::DataPathTerminated {
                ndp_id,
                reason: TerminationReason::ResponseTimeout,
            }
        );

        // A confirm racing the expiry is dropped
        harness
            .firmware
            .inject(FirmwareEvent::DataPathConfirmed {
                ndp_id,
                accepted: true,
                peer_ndi: MacAddress::new([0x02, 0, 0, 0, 0x0d, 0x02]),
                app_info: Vec::new(),
                status: FirmwareStatus::SUCCESS,
            })
            .unwrap();
        harness.expect_quiet(Duration::from_millis(400)).await;

        let err = harness
            .handle
            .respond_to_data_path_request(RespondRequest::accept(ndp_id, DATA_IFACE))
            .await
            .unwrap_err();
        assert_eq!(err, AwareError::UnknownDataPath(ndp_id));
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_request_while_disabled_is_ignored() {
        let mut harness = EngineHarness::start();
        harness.firmware.inject(peer_request(NdpId::new(5))).unwrap();
        harness.expect_quiet(Duration::from_millis(100)).await;
        harness.stop().await;
    }
}
