/*!
 * Bot API wire types.
 *
 * Only the fields the relay reads are modelled; everything else in the
 * API payloads is ignored by serde.
 */

use serde::{Deserialize, Serialize};

/// Envelope every Bot API method answers with
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub ok: bool,
    /// Payload on success
    pub result: Option<T>,
    /// Human readable error on failure
    pub description: Option<String>,
    /// Bot API error code on failure
    pub error_code: Option<u16>,
    /// Extra error information (flood control)
    pub parameters: Option<ResponseParameters>,
}

/// Additional information attached to some failures
#[derive(Debug, Deserialize)]
pub struct ResponseParameters {
    /// Seconds to wait before repeating the request
    pub retry_after: Option<u64>,
}

/// An incoming update from long polling
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update identifier
    pub update_id: i64,
    /// New incoming message, if this update carries one
    pub message: Option<Message>,
}

/// Sender of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
}

/// Chat a message belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chat {
    pub id: i64,
    /// "private", "group", "supergroup" or "channel"
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
}

impl Chat {
    /// Whether this is a one-to-one conversation with the bot
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }
}

/// A single formatting span over text or caption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageEntity {
    /// Entity kind: "bold", "italic", "text_link", "custom_emoji", ...
    #[serde(rename = "type")]
    pub kind: String,
    /// Offset in UTF-16 code units
    pub offset: u32,
    /// Length in UTF-16 code units
    pub length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_emoji_id: Option<String>,
}

impl MessageEntity {
    /// Create an entity of the given kind
    pub fn new(kind: impl Into<String>, offset: u32, length: u32) -> Self {
        Self {
            kind: kind.into(),
            offset,
            length,
            url: None,
            user: None,
            language: None,
            custom_emoji_id: None,
        }
    }
}

/// One resolution of a photo
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// Any file-backed attachment (video, document, sticker)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileAttachment {
    pub file_id: String,
}

/// Incoming or fetched message
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Message {
    pub message_id: i64,
    pub message_thread_id: Option<i64>,
    pub from: Option<User>,
    pub chat: Option<Chat>,
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    pub caption: Option<String>,
    #[serde(default)]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
    pub video: Option<FileAttachment>,
    pub document: Option<FileAttachment>,
    pub sticker: Option<FileAttachment>,
}

/// Result of `createForumTopic`
#[derive(Debug, Clone, Deserialize)]
pub struct ForumTopic {
    pub message_thread_id: i64,
    pub name: String,
}

/// Result of `copyMessage`
#[derive(Debug, Clone, Deserialize)]
pub struct MessageIdResult {
    pub message_id: i64,
}
