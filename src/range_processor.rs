/*!
 * Background processing of a position range.
 *
 * The range processor walks the closed interval of source positions strictly
 * in order, one transfer at a time, metered by the rate limiter. A failing
 * position is only counted; anything that breaks the loop itself aborts the
 * range. Either way the operator gets exactly one closing message and the
 * session is reset.
 */

use futures::FutureExt;
use log::{error, info, warn};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

use crate::errors::TransferError;
use crate::progress::{self, ProgressReporter, ProgressSnapshot, ABORT_NOTICE};
use crate::session::{PositionRange, SessionSlot};
use crate::transfer::{RateLimiter, TransferOutcome, TransferStrategy};
use crate::transport::{Destination, Transport};

/// Chat and message the operator drove the session from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorChat {
    pub chat_id: i64,
    pub reply_to: Option<i64>,
}

/// Everything a range task needs, moved into the task at launch
#[derive(Debug)]
pub struct RangeJob {
    pub topic_name: String,
    pub destination: Destination,
    pub range: PositionRange,
    pub operator: OperatorChat,
    pub progress: ProgressReporter,
}

/// How a range task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOutcome {
    /// Every position was attempted
    Completed(ProgressSnapshot),
    /// The loop broke before the end of the range
    Aborted {
        snapshot: ProgressSnapshot,
        reason: String,
    },
}

impl RangeOutcome {
    pub fn snapshot(&self) -> &ProgressSnapshot {
        match self {
            Self::Completed(snapshot) | Self::Aborted { snapshot, .. } => snapshot,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Detached handle on a running range task
#[derive(Debug)]
pub struct TransferHandle {
    handle: JoinHandle<RangeOutcome>,
}

impl TransferHandle {
    /// Wait for the task to finish
    pub async fn join(self) -> Result<RangeOutcome, JoinError> {
        self.handle.await
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Sequential driver of a range transfer
#[derive(Debug)]
pub struct RangeProcessor {
    transport: Arc<dyn Transport>,
    strategy: Arc<dyn TransferStrategy>,
    limiter: RateLimiter,
    progress_every: u64,
}

impl RangeProcessor {
    pub fn new(transport: Arc<dyn Transport>, strategy: Arc<dyn TransferStrategy>, limiter: RateLimiter, progress_every: u64) -> Self {
        Self {
            transport,
            strategy,
            limiter,
            progress_every,
        }
    }

    /// Launch `job` as an independent task that owns it until the end
    pub fn spawn(self: &Arc<Self>, job: RangeJob, session: SessionSlot) -> TransferHandle {
        let processor = Arc::clone(self);
        let handle = tokio::spawn(async move { processor.run(job, session).await });
        TransferHandle { handle }
    }

    /// Process the whole job, post the closing message and reset the session
    pub async fn run(&self, job: RangeJob, session: SessionSlot) -> RangeOutcome {
        info!(
            "Transferring {} messages ({}..={}) into '{}', {}ms apart",
            job.range.total(),
            job.range.start(),
            job.range.end(),
            job.topic_name,
            self.limiter.delay().as_millis()
        );

        let mut snapshot = ProgressSnapshot::new(job.range.total());
        let result = AssertUnwindSafe(self.process(&job, &mut snapshot))
            .catch_unwind()
            .await;

        let outcome = match result {
            Ok(Ok(())) => RangeOutcome::Completed(snapshot),
            Ok(Err(e)) => RangeOutcome::Aborted { snapshot, reason: e.to_string() },
            Err(panic) => RangeOutcome::Aborted { snapshot, reason: panic_reason(panic.as_ref()) },
        };

        let notice = match &outcome {
            RangeOutcome::Completed(snapshot) => {
                info!(
                    "Range for '{}' finished: {} total, {} copied, {} failed",
                    job.topic_name, snapshot.total, snapshot.succeeded, snapshot.failed
                );
                progress::summary_text(&job.topic_name, snapshot)
            }
            RangeOutcome::Aborted { snapshot, reason } => {
                error!(
                    "Range for '{}' aborted after {} of {} messages: {}",
                    job.topic_name,
                    snapshot.processed(),
                    snapshot.total,
                    reason
                );
                ABORT_NOTICE.to_string()
            }
        };

        if let Err(e) = self.transport.reply(job.operator.chat_id, job.operator.reply_to, &notice).await {
            error!("Failed to post range summary: {}", e);
        }

        session.reset();
        outcome
    }

    /// Walk the range, counting outcomes into `snapshot`
    async fn process(&self, job: &RangeJob, snapshot: &mut ProgressSnapshot) -> Result<(), TransferError> {
        for position in job.range.positions() {
            let attempt = AssertUnwindSafe(self.strategy.transfer(&job.destination, position))
                .catch_unwind()
                .await;
            match attempt {
                Ok(TransferOutcome::Succeeded) => snapshot.succeeded += 1,
                Ok(TransferOutcome::Failed) => snapshot.failed += 1,
                Err(panic) => {
                    error!(
                        "{} {} on message {}",
                        self.strategy.name(),
                        panic_reason(panic.as_ref()),
                        position
                    );
                    snapshot.failed += 1;
                }
            }

            if snapshot.is_report_due(self.progress_every) {
                if let Err(e) = job.progress.report(snapshot).await {
                    if e.is_fatal() {
                        return Err(TransferError::Aborted(format!("progress update failed: {}", e)));
                    }
                    warn!("Failed to update progress message: {}", e);
                }
            }

            if position < job.range.end() {
                self.limiter.wait().await;
            }
        }
        Ok(())
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
