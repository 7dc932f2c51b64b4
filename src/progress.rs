/*!
 * Progress reporting for range transfers.
 *
 * A range transfer owns one status message in the operator's chat and keeps
 * editing it instead of posting a message per position. This module also
 * holds the operator-facing texts of the transfer lifecycle.
 */

use std::sync::Arc;

use crate::errors::TransportError;
use crate::transport::{StatusMessage, Transport};

/// Notice posted when a range transfer aborts
pub const ABORT_NOTICE: &str = "⚠️ Process failed";

/// Counters of a range transfer at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl ProgressSnapshot {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn processed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Whether the status message should be refreshed now
    ///
    /// True after every `every`-th processed position and always once the
    /// last position has been processed.
    pub fn is_report_due(&self, every: u64) -> bool {
        let processed = self.processed();
        processed == self.total || (every > 0 && processed % every == 0)
    }
}

/// Text of the status message before the first position
pub fn starting_text(total: u64) -> String {
    format!("⏳ Copying {} messages...", total)
}

/// Text of the status message while the range runs
pub fn progress_text(snapshot: &ProgressSnapshot) -> String {
    format!(
        "⏳ Progress: {}/{}\n✅ Copied: {}\n❌ Failed: {}",
        snapshot.processed(),
        snapshot.total,
        snapshot.succeeded,
        snapshot.failed
    )
}

/// Final summary of a finished range
pub fn summary_text(topic_name: &str, snapshot: &ProgressSnapshot) -> String {
    format!(
        "✅ Done!\n\nTopic: {}\nTotal: {}\nSuccess: {}\nFailed: {}",
        topic_name, snapshot.total, snapshot.succeeded, snapshot.failed
    )
}

/// Handle on the single mutable status message of a transfer
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    transport: Arc<dyn Transport>,
    status: StatusMessage,
}

impl ProgressReporter {
    pub fn new(transport: Arc<dyn Transport>, status: StatusMessage) -> Self {
        Self { transport, status }
    }

    /// Replace the displayed text of the status message
    pub async fn update_text(&self, text: &str) -> Result<(), TransportError> {
        self.transport.edit_text(&self.status, text).await
    }

    /// Show the counters of `snapshot`
    pub async fn report(&self, snapshot: &ProgressSnapshot) -> Result<(), TransportError> {
        self.update_text(&progress_text(snapshot)).await
    }
}
