/*!
 * Integration tests for range transfers driven through the controller
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use topic_relay::app_controller::ReferenceAccepted;
use topic_relay::errors::TransportError;
use topic_relay::progress::{ABORT_NOTICE, ProgressReporter, ProgressSnapshot};
use topic_relay::range_processor::{OperatorChat, RangeJob, RangeOutcome, RangeProcessor};
use topic_relay::session::{PositionRange, SessionSlot};
use topic_relay::transfer::{RateLimiter, StrategyChain};
use topic_relay::transport::mock::{MockTransport, TransportCall};
use topic_relay::transport::{Destination, StatusMessage, ThreadId, Transport};
use topic_relay::{Controller, TransferMode};

use crate::common::{self, OPERATOR_ID};

const CHAT: OperatorChat = OperatorChat { chat_id: OPERATOR_ID, reply_to: None };

/// Run a whole conversation and wait for the range task
async fn transfer_range(controller: &Controller, start: i64, end: i64) -> Result<RangeOutcome> {
    controller.begin_session(OPERATOR_ID, CHAT, "Course").await?;
    controller.submit_reference(OPERATOR_ID, CHAT, &common::link(start)).await?;
    match controller.submit_reference(OPERATOR_ID, CHAT, &common::link(end)).await? {
        ReferenceAccepted::Launched(handle) => Ok(handle.join().await?),
        ReferenceAccepted::Start(_) => anyhow::bail!("end reference was taken as a start"),
    }
}

#[tokio::test]
async fn test_range_twelvePositionsWithTwoFailures_shouldCountAndReport() -> Result<()> {
    let mock = MockTransport::new().failing_positions([3, 7]);
    let controller = common::controller_with(&mock);

    let outcome = transfer_range(&controller, 1, 12).await?;

    assert_eq!(
        outcome,
        RangeOutcome::Completed(ProgressSnapshot { total: 12, succeeded: 10, failed: 2 })
    );
    let progress: Vec<String> = mock.edits();
    assert_eq!(progress.len(), 3);
    assert!(progress[0].starts_with("⏳ Progress: 5/12"));
    assert!(progress[1].starts_with("⏳ Progress: 10/12"));
    assert!(progress[2].starts_with("⏳ Progress: 12/12"));

    let summary = mock.replies().pop().unwrap_or_default();
    assert_eq!(summary, "✅ Done!\n\nTopic: Course\nTotal: 12\nSuccess: 10\nFailed: 2");
    assert!(controller.session().snapshot().is_idle());
    Ok(())
}

#[tokio::test]
async fn test_range_singlePosition_shouldSummarizeTotalOne() -> Result<()> {
    let mock = MockTransport::new();
    let controller = common::controller_with(&mock);

    let outcome = transfer_range(&controller, 10, 10).await?;

    assert_eq!(outcome.snapshot().total, 1);
    let relayed: Vec<i64> = mock
        .calls()
        .iter()
        .filter(|call| call.is_delivery())
        .filter_map(|call| call.position())
        .collect();
    assert_eq!(relayed, vec![10]);
    assert!(mock.replies().last().is_some_and(|summary| summary.contains("Total: 1")));
    Ok(())
}

#[tokio::test]
async fn test_range_withLatency_shouldTransferStrictlyInOrder() -> Result<()> {
    let mock = MockTransport::new().with_latency(Duration::from_millis(5));
    let controller = common::controller_with(&mock);

    transfer_range(&controller, 20, 29).await?;

    let positions: Vec<i64> = mock.calls().iter().filter_map(|call| call.position()).collect();
    assert_eq!(positions, (20..=29).collect::<Vec<_>>());
    assert_eq!(mock.max_concurrent_transfers(), 1);
    Ok(())
}

#[tokio::test]
async fn test_range_relayUnavailable_shouldRebuildEveryMessage() -> Result<()> {
    let mock = MockTransport::new().relay_unavailable();
    let controller = common::controller_with(&mock);

    let outcome = transfer_range(&controller, 1, 3).await?;

    assert_eq!(outcome.snapshot().succeeded, 3);
    let rebuilt = mock
        .calls()
        .iter()
        .filter(|call| matches!(call, TransportCall::SendText { .. }))
        .count();
    assert_eq!(rebuilt, 3);
    Ok(())
}

#[tokio::test]
async fn test_range_fatalTransportError_shouldAbortAndAllowNewSession() -> Result<()> {
    let mock = MockTransport::new().failing_edits(TransportError::AuthenticationError("Unauthorized".to_string()));
    let controller = common::controller_with(&mock);

    let outcome = transfer_range(&controller, 1, 30).await?;

    assert!(matches!(outcome, RangeOutcome::Aborted { .. }));
    assert_eq!(mock.replies().last().map(String::as_str), Some(ABORT_NOTICE));
    assert!(controller.session().snapshot().is_idle());
    assert!(controller.begin_session(OPERATOR_ID, CHAT, "Retry").await.is_ok());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rangeProcessor_delay_shouldApplyBetweenAttemptsRegardlessOfOutcome() {
    let mock = MockTransport::new().failing_positions([2]);
    let transport: Arc<dyn Transport> = Arc::new(mock.clone());
    let chain = StrategyChain::for_mode(TransferMode::Direct, transport.clone(), common::SOURCE_CHANNEL_ID, true);
    let processor = RangeProcessor::new(transport.clone(), Arc::new(chain), RateLimiter::from_millis(1000), 5);

    let job = RangeJob {
        topic_name: "Paced".to_string(),
        destination: Destination::new(common::DESTINATION_GROUP_ID, ThreadId(4)),
        range: PositionRange::new(1, 3).unwrap(),
        operator: CHAT,
        progress: ProgressReporter::new(transport, StatusMessage { chat_id: OPERATOR_ID, message_id: 1 }),
    };

    let started = tokio::time::Instant::now();
    let outcome = processor.run(job, SessionSlot::new()).await;

    assert_eq!(outcome.snapshot().failed, 1);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2000));
    assert!(elapsed < Duration::from_millis(3000));
}
