use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::{AppError, SessionError, TransportError};
use crate::progress::{self, ProgressReporter};
use crate::range_processor::{OperatorChat, RangeJob, RangeProcessor, TransferHandle};
use crate::reference::parse_reference;
use crate::session::{ReferenceStep, SessionSlot};
use crate::transfer::{RateLimiter, StrategyChain};
use crate::transport::telegram::TelegramClient;
use crate::transport::types::Update;
use crate::transport::{Destination, ThreadId, Transport};

// @module: Application controller for operator-driven range transfers

/// Reply to `/start`
pub const HELP_TEXT: &str = "🚀 Topic Relay Bot\n\n\
    1. /create_topic TOPIC_NAME\n\
    2. Send START link\n\
    3. Send END link\n\
    4. Bot copies ALL messages (NO FORWARD TAGS)";

/// Longest pause between failed polls
const MAX_POLL_BACKOFF: Duration = Duration::from_secs(30);

/// Operator input recognised in a text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorInput {
    /// `/start`
    Help,
    /// `/create_topic NAME` or `/createtopic NAME`, arguments joined by single spaces
    CreateTopic(String),
    /// Any other slash command
    UnknownCommand(String),
    /// Plain text, expected to be a message link
    Reference(String),
}

impl OperatorInput {
    /// Classify the text of an incoming message
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if !text.starts_with('/') {
            return Self::Reference(text.to_string());
        }

        let mut words = text.split_whitespace();
        let head = words.next().unwrap_or_default();
        let command = head[1..].split('@').next().unwrap_or_default().to_lowercase();
        let args = words.collect::<Vec<_>>().join(" ");

        match command.as_str() {
            "start" => Self::Help,
            "create_topic" | "createtopic" => Self::CreateTopic(args),
            _ => Self::UnknownCommand(command),
        }
    }
}

/// What an accepted reference did
#[derive(Debug)]
pub enum ReferenceAccepted {
    /// The start position was recorded
    Start(i64),
    /// The range is complete and its transfer task is running
    Launched(TransferHandle),
}

/// Main application controller for the relay bot
#[derive(Debug)]
pub struct Controller {
    // @field: App configuration
    config: Config,
    transport: Arc<dyn Transport>,
    session: SessionSlot,
    processor: Arc<RangeProcessor>,
}

impl Controller {
    // @method: Create a controller talking to the Bot API
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let client = TelegramClient::new(
            &config.telegram.token,
            &config.telegram.api_endpoint,
            config.telegram.timeout_secs,
        )?
        .with_max_retries(config.telegram.max_retries)
        .with_staging_chat(config.staging_chat_id);

        Ok(Self::with_transport(config, Arc::new(client)))
    }

    /// Create a controller over any transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        let mode = config.effective_mode();
        if mode != config.transfer.mode {
            warn!(
                "No staging chat configured, using {} instead of {}",
                mode.display_name(),
                config.transfer.mode.display_name()
            );
        }

        let chain = StrategyChain::for_mode(
            mode,
            transport.clone(),
            config.source_channel_id,
            config.transfer.suppress_provenance,
        );
        debug!("Transfer strategies: {}", chain.names().join(" -> "));

        let processor = RangeProcessor::new(
            transport.clone(),
            Arc::new(chain),
            RateLimiter::from_millis(config.transfer.delay_ms),
            config.transfer.progress_every,
        );

        Self {
            config,
            transport,
            session: SessionSlot::new(),
            processor: Arc::new(processor),
        }
    }

    /// Shared handle on the session
    pub fn session(&self) -> &SessionSlot {
        &self.session
    }

    /// Discard the current session
    pub fn reset(&self) {
        self.session.reset();
    }

    fn authorize(&self, caller: i64) -> Result<(), SessionError> {
        if self.config.is_authorized(caller) {
            Ok(())
        } else {
            warn!("Rejected input from unauthorized user {}", caller);
            Err(SessionError::Unauthorized(caller))
        }
    }

    /// Start a session named `name` and create its destination thread
    pub async fn begin_session(&self, caller: i64, operator: OperatorChat, name: &str) -> Result<ThreadId, SessionError> {
        self.authorize(caller)?;
        let name = name.trim();
        self.session.with(|session| session.begin(name))?;

        info!("Creating topic '{}' in {}", name, self.config.destination_group_id);
        let thread_id = match self.transport.create_thread(self.config.destination_group_id, name).await {
            Ok(thread_id) => thread_id,
            Err(e) => {
                error!("Topic creation failed: {}", e);
                self.session.reset();
                return Err(SessionError::ThreadCreation(e));
            }
        };

        self.session.with(|session| session.attach_thread(thread_id));
        info!("Topic '{}' created with thread {}", name, thread_id);
        self.notify(operator, &format!("✅ Topic '{}' created!\nNow send STARTING message link:", name))
            .await;
        Ok(thread_id)
    }

    /// Apply a start or end reference; the end launches the range transfer
    pub async fn submit_reference(&self, caller: i64, operator: OperatorChat, text: &str) -> Result<ReferenceAccepted, SessionError> {
        self.authorize(caller)?;

        if self.session.with(|session| session.thread_id().is_none()) {
            return Err(SessionError::NoThread);
        }
        if self.session.with(|session| session.is_transfer_active()) {
            return Err(SessionError::TransferInProgress);
        }
        let position = parse_reference(text).ok_or_else(|| SessionError::InvalidReference(text.to_string()))?;

        let step = self.session.with(|session| session.record_reference(position));
        let range = match step {
            Ok(ReferenceStep::StartRecorded(start)) => {
                debug!("Start position {} recorded", start);
                self.notify(operator, "🔗 Got START link! Now send END link:").await;
                return Ok(ReferenceAccepted::Start(start));
            }
            Ok(ReferenceStep::RangeComplete(range)) => range,
            Err(e) => {
                if let SessionError::EndBeforeStart { start, end } = &e {
                    warn!("End position {} precedes start {}, session reset", end, start);
                }
                return Err(e);
            }
        };

        let session = self.session.snapshot();
        let (Some(topic_name), Some(thread_id)) = (session.topic_name(), session.thread_id()) else {
            self.session.reset();
            return Err(SessionError::NoThread);
        };
        let topic_name = topic_name.to_string();

        let status = match self
            .transport
            .reply(operator.chat_id, operator.reply_to, &progress::starting_text(range.total()))
            .await
        {
            Ok(status) => status,
            Err(e) => {
                error!("Failed to post progress message: {}", e);
                self.session.reset();
                return Err(SessionError::ProgressUnavailable(e));
            }
        };
        self.session.with(|session| session.attach_progress(status));

        let job = RangeJob {
            topic_name,
            destination: Destination::new(self.config.destination_group_id, thread_id),
            range,
            operator,
            progress: ProgressReporter::new(self.transport.clone(), status),
        };
        Ok(ReferenceAccepted::Launched(self.processor.spawn(job, self.session.clone())))
    }

    /// Dispatch one incoming update
    pub async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        let (Some(text), Some(sender), Some(chat)) = (message.text.as_deref(), message.from.as_ref(), message.chat.as_ref())
        else {
            return;
        };
        let caller = sender.id;
        let operator = OperatorChat {
            chat_id: chat.id,
            reply_to: Some(message.message_id),
        };

        match OperatorInput::parse(text) {
            OperatorInput::Help => {
                if self.config.is_authorized(caller) {
                    self.notify(operator, HELP_TEXT).await;
                }
            }
            OperatorInput::CreateTopic(name) => {
                if let Err(e) = self.begin_session(caller, operator, &name).await {
                    self.notify(operator, &e.operator_notice()).await;
                }
            }
            OperatorInput::UnknownCommand(command) => {
                debug!("Ignoring unknown command /{}", command);
            }
            OperatorInput::Reference(text) => {
                if !chat.is_private() {
                    return;
                }
                match self.submit_reference(caller, operator, &text).await {
                    Ok(_) | Err(SessionError::Unauthorized(_)) => {}
                    Err(e) => self.notify(operator, &e.operator_notice()).await,
                }
            }
        }
    }

    /// Fetch and handle one batch of updates, returning the next offset
    pub async fn poll_once(&self, offset: i64) -> Result<i64, TransportError> {
        let updates = self
            .transport
            .get_updates(offset, self.config.telegram.poll_timeout_secs)
            .await?;

        let mut next_offset = offset;
        for update in updates {
            next_offset = next_offset.max(update.update_id + 1);
            self.handle_update(update).await;
        }
        Ok(next_offset)
    }

    /// Long-poll for updates until the transport fails fatally
    pub async fn run(&self) -> Result<(), AppError> {
        let me = self.transport.test_connection().await?;
        info!(
            "Connected as @{} ({} -> {})",
            me.username.as_deref().unwrap_or(&me.first_name),
            self.config.source_channel_id,
            self.config.destination_group_id
        );

        let mut offset = 0;
        let mut backoff = Duration::from_secs(1);
        loop {
            match self.poll_once(offset).await {
                Ok(next) => {
                    offset = next;
                    backoff = Duration::from_secs(1);
                }
                Err(e) if e.is_fatal() => {
                    error!("Stopping: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    warn!("Polling failed, retrying in {:?}: {}", backoff, e);
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_POLL_BACKOFF);
                }
            }
        }
    }

    async fn notify(&self, operator: OperatorChat, text: &str) {
        if let Err(e) = self.transport.reply(operator.chat_id, operator.reply_to, text).await {
            error!("Failed to reply in chat {}: {}", operator.chat_id, e);
        }
    }
}
