/*!
 * In-memory transport for testing.
 *
 * `MockTransport` answers every platform call from local state and records
 * the calls in order, so tests can assert on what reached the destination:
 * - `MockTransport::new()` - every source position holds a text message
 * - `.failing_positions(..)` - chosen positions fail both relay and fetch
 * - `.relay_unavailable()` - native relay always fails (protected content)
 * - `.failing_thread_creation()` - forum topic creation is refused
 * - `.failing_edits(err)` - status edits return the given error
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TransportError;
use crate::message::Caption;

use super::types::{Message, MessageEntity, Update, User};
use super::{Destination, StatusMessage, ThreadId, Transport};

/// One recorded platform call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    CreateThread { chat_id: i64, name: String },
    Fetch { position: i64 },
    Relay { position: i64, thread_id: ThreadId, suppress_provenance: bool },
    SendText { thread_id: ThreadId, text: String, entities: Vec<MessageEntity> },
    SendPhoto { thread_id: ThreadId, file_id: String, caption: Caption },
    SendVideo { thread_id: ThreadId, file_id: String, caption: Caption },
    SendDocument { thread_id: ThreadId, file_id: String, caption: Caption },
    SendSticker { thread_id: ThreadId, file_id: String },
    Reply { chat_id: i64, reply_to: Option<i64>, text: String },
    Edit { message_id: i64, text: String },
}

impl TransportCall {
    /// Source position a transfer call is about, if any
    pub fn position(&self) -> Option<i64> {
        match self {
            Self::Fetch { position } | Self::Relay { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Whether this call put content into the destination thread
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            Self::Relay { .. }
                | Self::SendText { .. }
                | Self::SendPhoto { .. }
                | Self::SendVideo { .. }
                | Self::SendDocument { .. }
                | Self::SendSticker { .. }
        )
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<TransportCall>,
    source_messages: HashMap<i64, Message>,
    failing_positions: HashSet<i64>,
    relay_unavailable: bool,
    fail_thread_creation: bool,
    edit_error: Option<TransportError>,
    pending_updates: VecDeque<Update>,
    next_message_id: i64,
    next_thread_id: i64,
    in_flight: usize,
    max_in_flight: usize,
}

/// Mock transport for exercising the relay without a network
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    /// Simulated latency of every transfer call
    latency: Duration,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a transport where every position holds a text message
    pub fn new() -> Self {
        let state = MockState {
            next_message_id: 1000,
            next_thread_id: 1,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            latency: Duration::ZERO,
        }
    }

    /// Make the given positions fail for every strategy
    pub fn failing_positions(self, positions: impl IntoIterator<Item = i64>) -> Self {
        self.state.lock().failing_positions.extend(positions);
        self
    }

    /// Make native relay fail for every position
    pub fn relay_unavailable(self) -> Self {
        self.state.lock().relay_unavailable = true;
        self
    }

    /// Refuse forum topic creation
    pub fn failing_thread_creation(self) -> Self {
        self.state.lock().fail_thread_creation = true;
        self
    }

    /// Fail every status edit with `error`
    pub fn failing_edits(self, error: TransportError) -> Self {
        self.state.lock().edit_error = Some(error);
        self
    }

    /// Delay every fetch and relay call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Put a specific message at a source position
    pub fn with_source_message(self, position: i64, message: Message) -> Self {
        self.state.lock().source_messages.insert(position, message);
        self
    }

    /// Queue an update for the next `get_updates` call
    pub fn push_update(&self, update: Update) {
        self.state.lock().pending_updates.push_back(update);
    }

    /// All calls recorded so far, in order
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    /// Texts of all replies sent to operators
    pub fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Texts of all status edits
    pub fn edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Highest number of transfer calls that were in flight at once
    pub fn max_concurrent_transfers(&self) -> usize {
        self.state.lock().max_in_flight
    }

    fn record(&self, call: TransportCall) {
        self.state.lock().calls.push(call);
    }

    fn is_failing(&self, position: i64) -> bool {
        self.state.lock().failing_positions.contains(&position)
    }

    /// Track one transfer call around its simulated latency
    async fn transfer_call(&self, call: TransportCall) {
        {
            let mut state = self.state.lock();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
            state.calls.push(call);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.state.lock().in_flight -= 1;
    }

    fn default_message(position: i64) -> Message {
        Message {
            message_id: position,
            text: Some(format!("message #{}", position)),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn test_connection(&self) -> Result<User, TransportError> {
        Ok(User {
            id: 1,
            is_bot: true,
            first_name: "Relay".to_string(),
            username: Some("relay_bot".to_string()),
        })
    }

    async fn get_updates(&self, offset: i64, _timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        let mut state = self.state.lock();
        let updates = state
            .pending_updates
            .drain(..)
            .filter(|update| update.update_id >= offset)
            .collect();
        Ok(updates)
    }

    async fn reply(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<StatusMessage, TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::Reply {
            chat_id,
            reply_to,
            text: text.to_string(),
        });
        state.next_message_id += 1;
        Ok(StatusMessage {
            chat_id,
            message_id: state.next_message_id,
        })
    }

    async fn edit_text(&self, status: &StatusMessage, text: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if let Some(error) = state.edit_error.clone() {
            return Err(error);
        }
        state.calls.push(TransportCall::Edit {
            message_id: status.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn create_thread(&self, chat_id: i64, name: &str) -> Result<ThreadId, TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::CreateThread {
            chat_id,
            name: name.to_string(),
        });
        if state.fail_thread_creation {
            return Err(TransportError::ApiError {
                status_code: 400,
                message: "Bad Request: not enough rights to create a topic".to_string(),
            });
        }
        let thread_id = ThreadId(state.next_thread_id);
        state.next_thread_id += 1;
        Ok(thread_id)
    }

    async fn fetch_message(&self, _source_chat_id: i64, position: i64) -> Result<Message, TransportError> {
        self.transfer_call(TransportCall::Fetch { position }).await;
        if self.is_failing(position) {
            return Err(TransportError::NotFound(format!("message {} not found", position)));
        }
        let stored = self.state.lock().source_messages.get(&position).cloned();
        Ok(stored.unwrap_or_else(|| Self::default_message(position)))
    }

    async fn relay_message(&self, destination: &Destination, _source_chat_id: i64, position: i64, suppress_provenance: bool) -> Result<(), TransportError> {
        self.transfer_call(TransportCall::Relay {
            position,
            thread_id: destination.thread_id,
            suppress_provenance,
        })
        .await;
        let relay_unavailable = self.state.lock().relay_unavailable;
        if relay_unavailable || self.is_failing(position) {
            return Err(TransportError::ApiError {
                status_code: 400,
                message: format!("Bad Request: message {} can't be copied", position),
            });
        }
        Ok(())
    }

    async fn send_text(&self, destination: &Destination, text: &str, entities: &[MessageEntity]) -> Result<(), TransportError> {
        self.record(TransportCall::SendText {
            thread_id: destination.thread_id,
            text: text.to_string(),
            entities: entities.to_vec(),
        });
        Ok(())
    }

    async fn send_photo(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError> {
        self.record(TransportCall::SendPhoto {
            thread_id: destination.thread_id,
            file_id: file_id.to_string(),
            caption: caption.clone(),
        });
        Ok(())
    }

    async fn send_video(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError> {
        self.record(TransportCall::SendVideo {
            thread_id: destination.thread_id,
            file_id: file_id.to_string(),
            caption: caption.clone(),
        });
        Ok(())
    }

    async fn send_document(&self, destination: &Destination, file_id: &str, caption: &Caption) -> Result<(), TransportError> {
        self.record(TransportCall::SendDocument {
            thread_id: destination.thread_id,
            file_id: file_id.to_string(),
            caption: caption.clone(),
        });
        Ok(())
    }

    async fn send_sticker(&self, destination: &Destination, file_id: &str) -> Result<(), TransportError> {
        self.record(TransportCall::SendSticker {
            thread_id: destination.thread_id,
            file_id: file_id.to_string(),
        });
        Ok(())
    }
}
