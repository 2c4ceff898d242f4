//! # Interface Lifecycle Flows
//!
//! Reconfiguration, disable cascades, firmware-initiated teardown and data
//! interface bookkeeping.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::integration::fixtures::{peer_address, EngineHarness, DATA_IFACE};
    use aware_core::{
        AwareError, CommandKind, CompletionDetail, EnableRequest, FailureReason, FirmwareEvent,
        FirmwareStatus, InitiateRequest, MacAddress, Notification, PeerInstanceId,
        TerminationReason,
    };

    // =========================================================================
    // DISABLE CASCADE
    // =========================================================================

    #[tokio::test]
    async fn test_disable_terminates_everything_before_completing() {
        let mut harness = EngineHarness::with_interface().await;
        let publish = harness.start_publish("aware.a").await;
        let subscribe = harness.start_subscribe("aware.b").await;

        let peer = PeerInstanceId::new(2);
        harness.match_peer(subscribe, peer).await;
        let mut request = InitiateRequest::out_of_band(peer_address(peer), DATA_IFACE);
        request.peer_id = peer;
        let txn = harness.handle.initiate_data_path(request).await.unwrap();
        let ndp_id = match harness.expect_success(txn).await {
            CompletionDetail::DataPathInitiated { ndp_id } => ndp_id,
            other => panic!("unexpected result: {other:?}"),
        };
        assert!(matches!(
            harness.next().await,
            Notification::DataPathConfirmed { .. }
        ));

        let disable = harness.handle.disable().await.unwrap();
        let seen = harness.until_completion(disable).await;
        assert_eq!(seen.len(), 4, "{seen:?}");

        let mut terminated_sessions: Vec<_> = seen[..2]
            .iter()
            .map(|n| match n {
                Notification::SessionTerminated {
                    session_id, reason, ..
                } => {
                    assert_eq!(*reason, TerminationReason::InterfaceDisabled);
                    *session_id
                }
                other => panic!("expected a session termination, got {other:?}"),
            })
            .collect();
        terminated_sessions.sort();
        let mut expected = vec![publish, subscribe];
        expected.sort();
        assert_eq!(terminated_sessions, expected);

        assert_eq!(
            seen[2],
            Notification::DataPathTerminated {
                ndp_id,
                reason: TerminationReason::InterfaceDisabled,
            }
        );
        assert_eq!(
            seen[3].as_completion().map(|c| c.result.clone()),
            Some(Ok(CompletionDetail::Disabled))
        );

        // Nothing survives into the next enable
        harness.enable().await;
        assert_eq!(
            harness.handle.stop_publish(publish).await.unwrap_err(),
            AwareError::UnknownSession(publish)
        );
        assert_eq!(
            harness.handle.end_data_path(ndp_id).await.unwrap_err(),
            AwareError::UnknownDataPath(ndp_id)
        );
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_failed_disable_keeps_sessions() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_publish("aware.a").await;
        harness
            .firmware
            .fail_kind(CommandKind::Disable, FirmwareStatus::new(5));

        let disable = harness.handle.disable().await.unwrap();
        let seen = harness.until_completion(disable).await;
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].as_completion().map(|c| c.result.clone()),
            Some(Err(FailureReason::FirmwareError(FirmwareStatus::new(5))))
        );

        let stop = harness.handle.stop_publish(session_id).await.unwrap();
        harness.expect_success(stop).await;
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_interface_down_cascades_and_notifies() {
        let mut harness = EngineHarness::enabled().await;
        let session_id = harness.start_subscribe("aware.a").await;

        harness
            .firmware
            .inject(FirmwareEvent::InterfaceDown {
                status: FirmwareStatus::new(11),
            })
            .unwrap();
        assert!(matches!(
            harness.next().await,
            Notification::SessionTerminated {
                session_id: s,
                reason: TerminationReason::InterfaceDown,
                ..
            } if s == session_id
        ));
        assert_eq!(
            harness.next().await,
            Notification::InterfaceDown {
                status: FirmwareStatus::new(11)
            }
        );

        let err = harness.handle.disable().await.unwrap_err();
        assert!(matches!(err, AwareError::InvalidState { .. }));
        harness.stop().await;
    }

    // =========================================================================
    // RECONFIGURATION
    // =========================================================================

    #[tokio::test]
    async fn test_reconfigure_and_identity_gating() {
        let mut harness = EngineHarness::enabled().await;
        let address = MacAddress::new([0x02, 0xaa, 0, 0, 0, 1]);

        harness
            .firmware
            .inject(FirmwareEvent::IdentityChanged { address })
            .unwrap();
        harness.expect_quiet(Duration::from_millis(100)).await;

        let request = EnableRequest {
            notify_identity_change: true,
            ..EnableRequest::default()
        };
        let txn = harness.handle.enable_and_configure(request).await.unwrap();
        assert_eq!(
            harness.expect_success(txn).await,
            CompletionDetail::Enabled { initial: false }
        );

        harness
            .firmware
            .inject(FirmwareEvent::IdentityChanged { address })
            .unwrap();
        assert_eq!(
            harness.next().await,
            Notification::IdentityChanged { address }
        );
        harness.stop().await;
    }

    // =========================================================================
    // DATA INTERFACES
    // =========================================================================

    #[tokio::test]
    async fn test_data_interface_bookkeeping() {
        let mut harness = EngineHarness::with_interface().await;

        let err = harness
            .handle
            .create_interface(DATA_IFACE)
            .await
            .unwrap_err();
        assert_eq!(err, AwareError::InterfaceExists(DATA_IFACE.to_string()));

        let delete = harness.handle.delete_interface(DATA_IFACE).await.unwrap();
        assert_eq!(
            harness.expect_success(delete).await,
            CompletionDetail::InterfaceDeleted {
                name: DATA_IFACE.to_string()
            }
        );

        let err = harness
            .handle
            .delete_interface(DATA_IFACE)
            .await
            .unwrap_err();
        assert_eq!(err, AwareError::UnknownInterface(DATA_IFACE.to_string()));
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_interface_in_use_cannot_be_deleted() {
        let mut harness = EngineHarness::with_interface().await;
        let txn = harness
            .handle
            .initiate_data_path(InitiateRequest::out_of_band(
                MacAddress::new([0x02, 0, 0, 0, 0, 0x21]),
                DATA_IFACE,
            ))
            .await
            .unwrap();
        harness.expect_success(txn).await;

        let err = harness
            .handle
            .delete_interface(DATA_IFACE)
            .await
            .unwrap_err();
        assert!(matches!(err, AwareError::InvalidState { .. }));
        harness.stop().await;
    }
}
