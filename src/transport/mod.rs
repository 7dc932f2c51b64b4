/*!
 * Messaging transport abstraction.
 *
 * This module contains the seam between the relay and the messaging platform:
 * - `telegram`: Bot API client over HTTP
 * - `mock`: In-memory transport used by the test suite
 * - `types`: Wire types shared by both
 */

use async_trait::async_trait;
use std::fmt::{self, Debug};

use crate::errors::TransportError;
use crate::message::Caption;
use self::types::{Message, MessageEntity, Update, User};

pub mod mock;
pub mod telegram;
pub mod types;

/// Identity of a sub-thread (forum topic) inside the destination group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub i64);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where transferred messages land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub chat_id: i64,
    pub thread_id: ThreadId,
}

impl Destination {
    pub fn new(chat_id: i64, thread_id: ThreadId) -> Self {
        Self { chat_id, thread_id }
    }
}

/// A message the bot sent and may later edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Common interface to the messaging platform
///
/// Every call is a suspension point; implementations must be shareable
/// between the command handler and the background range task.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Check the credentials and return the bot's own account
    async fn test_connection(&self) -> Result<User, TransportError>;

    /// Long-poll for updates with an identifier of at least `offset`
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TransportError>;

    /// Send a plain notice to a chat, optionally as a reply
    async fn reply(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<StatusMessage, TransportError>;

    /// Replace the text of a message previously sent by the bot
    async fn edit_text(&self, status: &StatusMessage, text: &str) -> Result<(), TransportError>;

    /// Create a forum topic in `chat_id` and return its thread identity
    async fn create_thread(&self, chat_id: i64, name: &str) -> Result<ThreadId, TransportError>;

    /// Read the message at `position` in the source chat
    async fn fetch_message(&self, source_chat_id: i64, position: i64) -> Result<Message, TransportError>;

    /// Re-emit a source message natively, optionally without its provenance header
    async fn relay_message(
        &self,
        destination: &Destination,
        source_chat_id: i64,
        position: i64,
        suppress_provenance: bool,
    ) -> Result<(), TransportError>;

    async fn send_text(&self, destination: &Destination, text: &str, entities: &[MessageEntity]) -> Result<(), TransportError>;

    async fn send_photo(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError>;

    async fn send_video(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError>;

    async fn send_document(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError>;

    async fn send_sticker(&self, destination: &Destination, file_id: &str) -> Result<(), TransportError>;
}
