/*!
 * Per-message transfer strategies.
 *
 * A strategy moves the source message at one position into the destination
 * thread and reports a plain success/failure outcome:
 * - `DirectRelay`: native re-emission without the provenance header
 * - `ManualReconstruct`: fetch the content and rebuild it as a new message
 * - `StrategyChain`: an ordered list of strategies tried in turn
 */

use async_trait::async_trait;
use log::{debug, warn};
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::TransferMode;
use crate::errors::TransferError;
use crate::message::MessageContent;
use crate::transport::{Destination, Transport};

pub mod rate_limiter;

pub use rate_limiter::RateLimiter;

/// Result of one transfer attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Succeeded,
    Failed,
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Common trait for all transfer strategies
#[async_trait]
pub trait TransferStrategy: Send + Sync + Debug {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Try to transfer the message at `position` into `destination`
    async fn try_transfer(&self, destination: &Destination, position: i64) -> Result<(), TransferError>;

    /// Transfer the message at `position`, converting any failure into an outcome
    async fn transfer(&self, destination: &Destination, position: i64) -> TransferOutcome {
        match self.try_transfer(destination, position).await {
            Ok(()) => {
                debug!("{} transferred message {}", self.name(), position);
                TransferOutcome::Succeeded
            }
            Err(e) => {
                warn!("{} failed for message {}: {}", self.name(), position, e);
                TransferOutcome::Failed
            }
        }
    }
}

/// Re-emit the source message through the transport's native relay
#[derive(Debug)]
pub struct DirectRelay {
    transport: Arc<dyn Transport>,
    source_chat_id: i64,
    suppress_provenance: bool,
}

impl DirectRelay {
    pub fn new(transport: Arc<dyn Transport>, source_chat_id: i64, suppress_provenance: bool) -> Self {
        Self {
            transport,
            source_chat_id,
            suppress_provenance,
        }
    }
}

#[async_trait]
impl TransferStrategy for DirectRelay {
    fn name(&self) -> &'static str {
        "Direct relay"
    }

    async fn try_transfer(&self, destination: &Destination, position: i64) -> Result<(), TransferError> {
        self.transport
            .relay_message(destination, self.source_chat_id, position, self.suppress_provenance)
            .await?;
        Ok(())
    }
}

/// Fetch the source message and send a new message of the same kind
#[derive(Debug)]
pub struct ManualReconstruct {
    transport: Arc<dyn Transport>,
    source_chat_id: i64,
}

impl ManualReconstruct {
    pub fn new(transport: Arc<dyn Transport>, source_chat_id: i64) -> Self {
        Self {
            transport,
            source_chat_id,
        }
    }
}

#[async_trait]
impl TransferStrategy for ManualReconstruct {
    fn name(&self) -> &'static str {
        "Manual reconstruct"
    }

    async fn try_transfer(&self, destination: &Destination, position: i64) -> Result<(), TransferError> {
        let message = self.transport.fetch_message(self.source_chat_id, position).await?;
        let content = MessageContent::from(&message);
        debug!("Message {} classified as {}", position, content.kind());

        match &content {
            MessageContent::Text { text, entities } => {
                self.transport.send_text(destination, text, entities).await?
            }
            MessageContent::Photo { file_id, caption } => {
                self.transport.send_photo(destination, file_id, caption).await?
            }
            MessageContent::Video { file_id, caption } => {
                self.transport.send_video(destination, file_id, caption).await?
            }
            MessageContent::Document { file_id, caption } => {
                self.transport.send_document(destination, file_id, caption).await?
            }
            MessageContent::Sticker { file_id } => {
                self.transport.send_sticker(destination, file_id).await?
            }
            MessageContent::Unsupported => return Err(TransferError::UnsupportedContent(position)),
        }
        Ok(())
    }
}

/// Ordered strategies, stopping at the first success
#[derive(Debug)]
pub struct StrategyChain {
    strategies: Vec<Box<dyn TransferStrategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn TransferStrategy>>) -> Self {
        Self { strategies }
    }

    /// Build the chain a transfer mode stands for
    pub fn for_mode(mode: TransferMode, transport: Arc<dyn Transport>, source_chat_id: i64, suppress_provenance: bool) -> Self {
        let direct = || -> Box<dyn TransferStrategy> {
            Box::new(DirectRelay::new(transport.clone(), source_chat_id, suppress_provenance))
        };
        let manual = || -> Box<dyn TransferStrategy> {
            Box::new(ManualReconstruct::new(transport.clone(), source_chat_id))
        };

        match mode {
            TransferMode::Direct => Self::new(vec![direct()]),
            TransferMode::Manual => Self::new(vec![manual()]),
            TransferMode::DirectThenManual => Self::new(vec![direct(), manual()]),
        }
    }

    /// Names of the strategies in the order they are tried
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl TransferStrategy for StrategyChain {
    fn name(&self) -> &'static str {
        "Strategy chain"
    }

    async fn try_transfer(&self, destination: &Destination, position: i64) -> Result<(), TransferError> {
        let mut last_error = TransferError::Aborted("no transfer strategy configured".to_string());
        for strategy in &self.strategies {
            match strategy.try_transfer(destination, position).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("{} failed for message {}: {}", strategy.name(), position, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}
