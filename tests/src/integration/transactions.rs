//! # Transaction Flows
//!
//! Every accepted request resolves exactly once, through the owner task,
//! whether the firmware answers, stays silent or the engine shuts down.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use crate::integration::fixtures::EngineHarness;
    use aware_core::{
        AwareError, CommandKind, CompletionDetail, EnableRequest, EngineConfig, FailureReason,
        FirmwareEvent, FirmwareStatus, Notification,
    };

    // =========================================================================
    // EXACTLY-ONCE RESOLUTION
    // =========================================================================

    #[tokio::test]
    async fn test_silent_firmware_resolves_by_timeout_once() {
        let mut harness = EngineHarness::start();
        harness.firmware.silence_kind(CommandKind::Capabilities);

        let txn = harness.handle.get_capabilities().await.unwrap();
        let completion = harness.completion(txn).await;
        assert_eq!(completion.result, Err(FailureReason::Timeout));
        assert_eq!(completion.kind, CommandKind::Capabilities);

        // A late answer for the expired id changes nothing
        harness
            .firmware
            .inject(FirmwareEvent::CommandCompleted {
                transaction_id: txn,
                outcome: Err(FirmwareStatus::new(1)),
            })
            .unwrap();
        harness.expect_quiet(Duration::from_millis(150)).await;
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_concurrent_pending_ids_are_distinct_and_each_resolves_once() {
        let mut harness = EngineHarness::start();
        harness.firmware.silence_kind(CommandKind::Capabilities);

        let mut submitted = HashSet::new();
        for _ in 0..20 {
            let txn = harness.handle.get_capabilities().await.unwrap();
            assert!(submitted.insert(txn), "{txn} handed out twice while pending");
        }

        let mut resolved = HashSet::new();
        while resolved.len() < submitted.len() {
            if let Notification::Completed(completion) = harness.next().await {
                assert_eq!(completion.result, Err(FailureReason::Timeout));
                assert!(resolved.insert(completion.transaction_id));
            }
        }
        assert_eq!(resolved, submitted);
        harness.expect_quiet(Duration::from_millis(150)).await;
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_firmware_failure_is_reported_not_raised() {
        let mut harness = EngineHarness::start();
        harness
            .firmware
            .fail_kind(CommandKind::Configure, FirmwareStatus::new(9));

        let txn = harness
            .handle
            .enable_and_configure(EnableRequest::default())
            .await
            .unwrap();
        let completion = harness.completion(txn).await;
        assert_eq!(
            completion.result,
            Err(FailureReason::FirmwareError(FirmwareStatus::new(9)))
        );

        // Interface went back to disabled: a publish is refused synchronously
        let err = harness
            .handle
            .publish(
                aware_core::SessionId::UNASSIGNED,
                aware_core::PublishConfig::new("svc"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AwareError::InvalidState { .. }));
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_transport_refusal_allocates_nothing() {
        // A one-slot event queue makes the simulator report itself unavailable
        let config = EngineConfig {
            event_queue_capacity: 1,
            ..EngineConfig::for_testing()
        };
        let mut harness = EngineHarness::start_with(config, |firmware| firmware);

        let err = harness.handle.get_capabilities().await.unwrap_err();
        assert!(matches!(err, AwareError::TransportRejected { .. }));
        harness.expect_quiet(Duration::from_millis(150)).await;
        harness.stop().await;
    }

    #[tokio::test]
    async fn test_capability_snapshot_visible_without_round_trip() {
        let mut harness = EngineHarness::start();
        assert!(harness.handle.capabilities().is_none());

        let txn = harness.handle.get_capabilities().await.unwrap();
        match harness.expect_success(txn).await {
            CompletionDetail::Capabilities(caps) => {
                assert_eq!(harness.handle.capabilities(), Some(caps));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        harness.stop().await;
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_shutdown_aborts_pending_and_stops_accepting() {
        let mut harness = EngineHarness::start();
        harness.firmware.silence_kind(CommandKind::Capabilities);
        let txn = harness.handle.get_capabilities().await.unwrap();

        harness.handle.shutdown().await;
        let completion = harness.completion(txn).await;
        assert_eq!(completion.result, Err(FailureReason::Aborted));

        let err = harness.handle.get_capabilities().await.unwrap_err();
        assert_eq!(err, AwareError::EngineStopped);
        harness.stop().await;
    }
}
