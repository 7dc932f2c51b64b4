/*!
 * Tests for error types and conversions
 */

use topic_relay::errors::{AppError, SessionError, TransferError, TransportError};

#[test]
fn test_transportError_apiError_shouldDisplayStatusAndMessage() {
    let error = TransportError::ApiError {
        status_code: 400,
        message: "Bad Request: message to copy not found".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("400"));
    assert!(display.contains("message to copy not found"));
}

#[test]
fn test_transportError_isFatal_shouldOnlyFlagAuthentication() {
    assert!(TransportError::AuthenticationError("Unauthorized".to_string()).is_fatal());
    assert!(!TransportError::NotFound("42".to_string()).is_fatal());
    assert!(
        !TransportError::RateLimitExceeded {
            message: "Too Many Requests".to_string(),
            retry_after_secs: Some(3),
        }
        .is_fatal()
    );
}

#[test]
fn test_transferError_fromTransportError_shouldWrap() {
    let error: TransferError = TransportError::RequestFailed("connection reset".to_string()).into();
    assert!(matches!(error, TransferError::Transport(TransportError::RequestFailed(_))));
    assert!(error.to_string().contains("connection reset"));
}

#[test]
fn test_sessionError_operatorNotice_shouldMatchConversationTexts() {
    assert_eq!(SessionError::Unauthorized(1).operator_notice(), "❌ Unauthorized");
    assert_eq!(SessionError::EmptyTopicName.operator_notice(), "Usage: /create_topic TOPIC_NAME");
    assert_eq!(
        SessionError::NoThread.operator_notice(),
        "⚠️ First create a topic with /create_topic"
    );
    assert_eq!(
        SessionError::InvalidReference("hello".to_string()).operator_notice(),
        "❌ Invalid link. Send proper Telegram message link."
    );
    assert_eq!(
        SessionError::EndBeforeStart { start: 100, end: 90 }.operator_notice(),
        "❌ END link must come after START link!"
    );
    assert_eq!(
        SessionError::ThreadCreation(TransportError::NotFound("chat".to_string())).operator_notice(),
        "⚠️ Failed to create topic"
    );
}

#[test]
fn test_appError_fromSessionError_shouldKeepMessage() {
    let error: AppError = SessionError::EndBeforeStart { start: 5, end: 4 }.into();
    let display = format!("{}", error);
    assert!(display.contains("Session error"));
    assert!(display.contains("End position 4 is before start position 5"));
}

#[test]
fn test_appError_fromAnyhow_shouldBecomeUnknown() {
    let error: AppError = anyhow::anyhow!("something odd").into();
    assert!(matches!(error, AppError::Unknown(ref message) if message == "something odd"));
}
