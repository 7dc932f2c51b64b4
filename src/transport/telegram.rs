use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use url::Url;

use crate::errors::TransportError;
use crate::message::Caption;

use super::types::{ApiResponse, ForumTopic, Message, MessageEntity, MessageIdResult, Update, User};
use super::{Destination, StatusMessage, ThreadId, Transport};

/// Extra time granted to a long-poll request on top of the server-side wait
const LONG_POLL_GRACE_SECS: u64 = 10;

/// Telegram Bot API client
#[derive(Debug)]
pub struct TelegramClient {
    /// HTTP client for API requests
    client: Client,
    /// `{endpoint}/bot{token}/`, every method is joined onto it
    base_url: Url,
    /// Retries granted to a call hit by flood control
    max_retries: u32,
    /// Scratch chat used to read source messages
    staging_chat_id: Option<i64>,
}

/// `sendMessage` request
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "no_entities")]
    entities: &'a [MessageEntity],
}

fn no_entities(entities: &&[MessageEntity]) -> bool {
    entities.is_empty()
}

/// `copyMessage` and `forwardMessage` request
#[derive(Debug, Serialize)]
pub struct RelayRequest {
    chat_id: i64,
    from_chat_id: i64,
    message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    disable_notification: Option<bool>,
}

/// `editMessageText` request
#[derive(Debug, Serialize)]
pub struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
}

/// `getUpdates` request
#[derive(Debug, Serialize)]
pub struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

impl TelegramClient {
    /// Create a new client for the given bot token
    pub fn new(token: &str, endpoint: &str, timeout_secs: u64) -> Result<Self, TransportError> {
        let endpoint = if endpoint.is_empty() {
            "https://api.telegram.org"
        } else {
            endpoint.trim_end_matches('/')
        };
        let base_url = Url::parse(&format!("{}/bot{}/", endpoint, token))
            .map_err(|e| TransportError::RequestFailed(format!("Invalid API endpoint '{}': {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TransportError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            max_retries: 3,
            staging_chat_id: None,
        })
    }

    /// Set how many times a flood-controlled call is repeated
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the chat used to read source messages
    pub fn with_staging_chat(mut self, staging_chat_id: Option<i64>) -> Self {
        self.staging_chat_id = staging_chat_id;
        self
    }

    fn method_url(&self, method: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(method)
            .map_err(|e| TransportError::RequestFailed(format!("Invalid method '{}': {}", method, e)))
    }

    /// Call a Bot API method, honouring flood control
    async fn call<P, T>(&self, method: &str, params: &P, timeout: Option<Duration>) -> Result<T, TransportError>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Send,
    {
        let url = self.method_url(method)?;
        let mut attempt = 0;

        loop {
            match self.call_once(&url, method, params, timeout).await {
                Err(e) => match retry_delay(&e, attempt, self.max_retries) {
                    Some(wait) => {
                        warn!("{} hit flood control ({}), retrying in {}s", method, e, wait.as_secs());
                        tokio::time::sleep(wait).await;
                        attempt += 1;
                    }
                    None => return Err(e),
                },
                ok => return ok,
            }
        }
    }

    async fn call_once<P, T>(&self, url: &Url, method: &str, params: &P, timeout: Option<Duration>) -> Result<T, TransportError>
    where
        P: Serialize + ?Sized + Sync,
        T: DeserializeOwned + Send,
    {
        let mut request = self.client.post(url.clone()).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await
            .map_err(|e| TransportError::RequestFailed(format!("{} failed: {}", method, e.without_url())))?;

        let status = response.status();
        let body = response.text().await
            .map_err(|e| TransportError::RequestFailed(format!("{} failed to read body: {}", method, e.without_url())))?;

        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            TransportError::ParseError(format!("{} returned HTTP {} with unreadable body: {}", method, status, e))
        })?;

        if parsed.ok {
            return parsed.result.ok_or_else(|| {
                TransportError::ParseError(format!("{} succeeded without a result", method))
            });
        }

        Err(classify_failure(status, parsed))
    }

    fn thread_param(destination: &Destination) -> Option<i64> {
        Some(destination.thread_id.0)
    }

    /// Shared body of the `send{Photo,Video,Document}` calls
    async fn send_media(&self, method: &str, field: &str, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError> {
        let mut params = Map::new();
        params.insert("chat_id".to_string(), json!(destination.chat_id));
        params.insert("message_thread_id".to_string(), json!(destination.thread_id.0));
        params.insert(field.to_string(), json!(file_id));
        if let Some(text) = &caption.text {
            params.insert("caption".to_string(), json!(text));
        }
        if !caption.entities.is_empty() {
            params.insert("caption_entities".to_string(), json!(caption.entities));
        }

        let _: Value = self.call(method, &params, None).await?;
        Ok(())
    }
}

/// How long to wait before repeating a call that failed with `error`.
///
/// Only flood control is retried, and only while `attempt` is below
/// `max_retries`. A missing `retry_after` waits one second.
fn retry_delay(error: &TransportError, attempt: u32, max_retries: u32) -> Option<Duration> {
    match error {
        TransportError::RateLimitExceeded { retry_after_secs, .. } if attempt < max_retries => {
            Some(Duration::from_secs(retry_after_secs.unwrap_or(1)))
        }
        _ => None,
    }
}

/// Turn a failed Bot API envelope into a transport error
fn classify_failure<T>(status: StatusCode, response: ApiResponse<T>) -> TransportError {
    let code = response.error_code.unwrap_or(status.as_u16());
    let message = response.description.unwrap_or_else(|| "no description".to_string());
    let retry_after = response.parameters.and_then(|p| p.retry_after);

    match code {
        401 | 403 if message.contains("Unauthorized") => TransportError::AuthenticationError(message),
        429 => TransportError::RateLimitExceeded { message, retry_after_secs: retry_after },
        400 if message.contains("not found") || message.contains("MESSAGE_ID_INVALID") => {
            TransportError::NotFound(message)
        }
        _ => TransportError::ApiError { status_code: code, message },
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn test_connection(&self) -> Result<User, TransportError> {
        self.call("getMe", &json!({}), None).await
    }

    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message"],
        };
        let timeout = Duration::from_secs(timeout_secs + LONG_POLL_GRACE_SECS);
        self.call("getUpdates", &request, Some(timeout)).await
    }

    async fn reply(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<StatusMessage, TransportError> {
        let request = SendMessageRequest {
            chat_id,
            text,
            message_thread_id: None,
            reply_to_message_id: reply_to,
            entities: &[],
        };
        let sent: Message = self.call("sendMessage", &request, None).await?;
        Ok(StatusMessage { chat_id, message_id: sent.message_id })
    }

    async fn edit_text(&self, status: &StatusMessage, text: &str) -> Result<(), TransportError> {
        let request = EditMessageTextRequest {
            chat_id: status.chat_id,
            message_id: status.message_id,
            text,
        };
        let _: Value = self.call("editMessageText", &request, None).await?;
        Ok(())
    }

    async fn create_thread(&self, chat_id: i64, name: &str) -> Result<ThreadId, TransportError> {
        let topic: ForumTopic = self
            .call("createForumTopic", &json!({ "chat_id": chat_id, "name": name }), None)
            .await?;
        debug!("Created forum topic '{}' ({})", topic.name, topic.message_thread_id);
        Ok(ThreadId(topic.message_thread_id))
    }

    /// The Bot API cannot read a message by id, so the message is forwarded
    /// into the staging chat, read from the response and deleted again.
    async fn fetch_message(&self, source_chat_id: i64, position: i64) -> Result<Message, TransportError> {
        let staging_chat_id = self.staging_chat_id.ok_or_else(|| {
            TransportError::RequestFailed("no staging chat configured for reading source messages".to_string())
        })?;

        let request = RelayRequest {
            chat_id: staging_chat_id,
            from_chat_id: source_chat_id,
            message_id: position,
            message_thread_id: None,
            disable_notification: Some(true),
        };
        let staged: Message = self.call("forwardMessage", &request, None).await?;

        let cleanup = json!({ "chat_id": staging_chat_id, "message_id": staged.message_id });
        if let Err(e) = self.call::<_, Value>("deleteMessage", &cleanup, None).await {
            warn!("Failed to delete staged copy of message {}: {}", position, e);
        }

        Ok(staged)
    }

    async fn relay_message(&self, destination: &Destination, source_chat_id: i64, position: i64, suppress_provenance: bool) -> Result<(), TransportError> {
        let request = RelayRequest {
            chat_id: destination.chat_id,
            from_chat_id: source_chat_id,
            message_id: position,
            message_thread_id: Self::thread_param(destination),
            disable_notification: None,
        };

        if suppress_provenance {
            let _: MessageIdResult = self.call("copyMessage", &request, None).await?;
        } else {
            let _: Message = self.call("forwardMessage", &request, None).await?;
        }
        Ok(())
    }

    async fn send_text(&self, destination: &Destination, text: &str, entities: &[MessageEntity]) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            chat_id: destination.chat_id,
            text,
            message_thread_id: Self::thread_param(destination),
            reply_to_message_id: None,
            entities,
        };
        let _: Message = self.call("sendMessage", &request, None).await?;
        Ok(())
    }

    async fn send_photo(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError> {
        self.send_media("sendPhoto", "photo", destination, file_id, caption).await
    }

    async fn send_video(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError> {
        self.send_media("sendVideo", "video", destination, file_id, caption).await
    }

    async fn send_document(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError> {
        self.send_media("sendDocument", "document", destination, file_id, caption).await
    }

    async fn send_sticker(&self, destination: &Destination, file_id: &str) -> Result<(), TransportError> {
        let params = json!({
            "chat_id": destination.chat_id,
            "message_thread_id": destination.thread_id.0,
            "sticker": file_id,
        });
        let _: Value = self.call("sendSticker", &params, None).await?;
        Ok(())
    }
}
