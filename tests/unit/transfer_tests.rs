/*!
 * Tests for transfer strategies and the rate limiter
 */

use std::sync::Arc;
use std::time::Duration;

use topic_relay::app_config::TransferMode;
use topic_relay::errors::TransferError;
use topic_relay::message::{Caption, MessageContent};
use topic_relay::transfer::{
    DirectRelay, ManualReconstruct, RateLimiter, StrategyChain, TransferOutcome, TransferStrategy,
};
use topic_relay::transport::mock::{MockTransport, TransportCall};
use topic_relay::transport::types::{FileAttachment, Message, MessageEntity};
use topic_relay::transport::{Destination, ThreadId};

use crate::common::{DESTINATION_GROUP_ID, SOURCE_CHANNEL_ID};

fn destination() -> Destination {
    Destination::new(DESTINATION_GROUP_ID, ThreadId(31))
}

#[test]
fn test_messageContent_textWithEntities_shouldKeepFormatting() {
    let message = Message {
        message_id: 1,
        text: Some("Read the docs".to_string()),
        entities: vec![MessageEntity::new("bold", 0, 4)],
        ..Default::default()
    };
    assert_eq!(
        MessageContent::from(&message),
        MessageContent::Text {
            text: "Read the docs".to_string(),
            entities: vec![MessageEntity::new("bold", 0, 4)],
        }
    );
}

#[tokio::test]
async fn test_directRelay_failure_shouldBecomeFailedOutcome() {
    let mock = MockTransport::new().relay_unavailable();
    let strategy = DirectRelay::new(Arc::new(mock.clone()), SOURCE_CHANNEL_ID, true);

    assert_eq!(strategy.transfer(&destination(), 4).await, TransferOutcome::Failed);
    assert!(matches!(
        strategy.try_transfer(&destination(), 4).await,
        Err(TransferError::Transport(_))
    ));
}

#[tokio::test]
async fn test_manualReconstruct_document_shouldCarryCaption() {
    let document = Message {
        message_id: 6,
        document: Some(FileAttachment { file_id: "doc-6".to_string() }),
        caption: Some("Slides".to_string()),
        ..Default::default()
    };
    let mock = MockTransport::new().with_source_message(6, document);
    let strategy = ManualReconstruct::new(Arc::new(mock.clone()), SOURCE_CHANNEL_ID);

    assert!(strategy.transfer(&destination(), 6).await.is_success());
    assert_eq!(
        mock.calls().last(),
        Some(&TransportCall::SendDocument {
            thread_id: ThreadId(31),
            file_id: "doc-6".to_string(),
            caption: Caption::new(Some("Slides".to_string()), Vec::new()),
        })
    );
}

#[tokio::test]
async fn test_manualReconstruct_video_shouldUseVideoCall() {
    let video = Message {
        message_id: 8,
        video: Some(FileAttachment { file_id: "vid-8".to_string() }),
        ..Default::default()
    };
    let mock = MockTransport::new().with_source_message(8, video);
    let strategy = ManualReconstruct::new(Arc::new(mock.clone()), SOURCE_CHANNEL_ID);

    assert!(strategy.transfer(&destination(), 8).await.is_success());
    assert!(matches!(mock.calls().last(), Some(TransportCall::SendVideo { .. })));
}

#[tokio::test]
async fn test_strategyChain_manualOnly_shouldNeverRelay() {
    let mock = MockTransport::new();
    let chain = StrategyChain::for_mode(TransferMode::Manual, Arc::new(mock.clone()), SOURCE_CHANNEL_ID, true);

    assert!(chain.transfer(&destination(), 2).await.is_success());
    assert!(!mock.calls().iter().any(|call| matches!(call, TransportCall::Relay { .. })));
}

#[tokio::test]
async fn test_strategyChain_withProvenance_shouldPassFlagThrough() {
    let mock = MockTransport::new();
    let chain = StrategyChain::for_mode(TransferMode::Direct, Arc::new(mock.clone()), SOURCE_CHANNEL_ID, false);

    chain.transfer(&destination(), 2).await;
    assert_eq!(
        mock.calls(),
        vec![TransportCall::Relay {
            position: 2,
            thread_id: ThreadId(31),
            suppress_provenance: false,
        }]
    );
}

#[tokio::test]
async fn test_strategyChain_empty_shouldFail() {
    let chain = StrategyChain::new(Vec::new());
    assert_eq!(chain.transfer(&destination(), 1).await, TransferOutcome::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_rateLimiter_wait_shouldSleepConfiguredDelay() {
    let limiter = RateLimiter::new(Duration::from_secs(2));
    let started = tokio::time::Instant::now();
    limiter.wait().await;
    assert!(started.elapsed() >= Duration::from_secs(2));
}
