use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use atlas_model::BuildConfig;

use crate::error::{Result, SummarizeError};
use crate::item::{WorkItem, WorkState};

/// External summarizer contract: input text in, summary text out, with
/// failures classified by [`SummarizeError`]. The scheduler owns timeout
/// enforcement, so implementations just make the call.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, input: &str) -> Result<String>;
}

/// Tunables for one batch run.
#[derive(Debug, Clone)]
pub struct SummarizeOptions {
    /// Max concurrently in-flight provider calls.
    pub concurrency: usize,
    /// Per-call deadline; an elapsed deadline counts as a retryable failure.
    pub timeout: Duration,
    /// Retries after the first attempt, so an item sees `retries + 1` calls
    /// at most.
    pub retries: u32,
    /// Base delay before a retry; attempt N waits `N * backoff`.
    pub backoff: Duration,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        Self {
            concurrency: 50,
            timeout: Duration::from_secs(30),
            retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl From<&BuildConfig> for SummarizeOptions {
    fn from(config: &BuildConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            timeout: config.timeout,
            retries: config.retries,
            ..Self::default()
        }
    }
}

/// Every input item after the batch, plus tallies. `done + failed + skipped`
/// always equals the input count.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub items: Vec<WorkItem>,
    pub done: usize,
    pub failed: usize,
    /// Items never dispatched because the batch was cancelled; these stay
    /// pending.
    pub skipped: usize,
}

/// Drives a batch of work items to terminal state against one provider.
///
/// Dispatch acquires a semaphore permit per item, so at most
/// `options.concurrency` provider calls are in flight; each spawned task
/// retries its own item to completion and releases the permit. Tasks never
/// share state, which is what guarantees one failing item cannot stall or
/// cancel the rest.
pub struct Scheduler {
    provider: Arc<dyn Summarizer>,
    options: SummarizeOptions,
}

impl Scheduler {
    #[must_use]
    pub fn new(provider: Arc<dyn Summarizer>, options: SummarizeOptions) -> Self {
        Self { provider, options }
    }

    /// Run `items` to completion. Checking `cancel` happens only at dispatch:
    /// a set flag stops new work while in-flight calls finish or time out.
    pub async fn run(&self, items: Vec<WorkItem>, cancel: &AtomicBool) -> BatchOutcome {
        let total = items.len();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut handles = Vec::with_capacity(total);
        let mut leftover = Vec::new();

        log::debug!(
            "summarizing {} items with concurrency={} timeout={:?} retries={}",
            total,
            self.options.concurrency,
            self.options.timeout,
            self.options.retries
        );

        for item in items {
            if cancel.load(Ordering::Relaxed) {
                leftover.push(item);
                continue;
            }
            // Waiting here throttles dispatch to the pool size.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    // The semaphore is never closed while we hold it.
                    leftover.push(item);
                    continue;
                }
            };
            if cancel.load(Ordering::Relaxed) {
                drop(permit);
                leftover.push(item);
                continue;
            }
            let provider = Arc::clone(&self.provider);
            let options = self.options.clone();
            let fallback_id = item.id.clone();
            let handle = tokio::spawn(async move {
                let item = run_to_terminal(provider.as_ref(), item, &options).await;
                drop(permit);
                item
            });
            handles.push((fallback_id, handle));
        }

        let mut outcome = BatchOutcome::default();
        for (fallback_id, handle) in handles {
            let item = match handle.await {
                Ok(item) => item,
                Err(err) => {
                    log::error!("summary task for node {} panicked: {}", fallback_id, err);
                    let mut lost = WorkItem::new(fallback_id, String::new());
                    lost.state = WorkState::Failed;
                    lost
                }
            };
            match item.state {
                WorkState::Done => outcome.done += 1,
                _ => outcome.failed += 1,
            }
            outcome.items.push(item);
        }
        outcome.skipped = leftover.len();
        if outcome.skipped > 0 {
            log::info!(
                "summary batch cancelled: {} done, {} failed, {} skipped",
                outcome.done,
                outcome.failed,
                outcome.skipped
            );
        }
        outcome.items.extend(leftover);
        debug_assert_eq!(outcome.items.len(), total);
        outcome
    }
}

/// Drive one item until done or failed, counting attempts. Timeouts and
/// transport errors retry with linearly increasing backoff; invalid input
/// fails on the first attempt.
async fn run_to_terminal(
    provider: &dyn Summarizer,
    mut item: WorkItem,
    options: &SummarizeOptions,
) -> WorkItem {
    item.state = WorkState::InFlight;
    loop {
        item.attempts += 1;
        let error = match tokio::time::timeout(options.timeout, provider.summarize(&item.input))
            .await
        {
            Ok(Ok(text)) => {
                item.result = Some(text);
                item.state = WorkState::Done;
                return item;
            }
            Ok(Err(error)) => error,
            Err(_) => SummarizeError::Timeout(options.timeout),
        };

        if error.is_retryable() && item.attempts <= options.retries {
            let wait = options.backoff * item.attempts;
            log::debug!(
                "summary attempt {} for node {} failed ({}), retrying in {:?}",
                item.attempts,
                item.id,
                error,
                wait
            );
            tokio::time::sleep(wait).await;
            continue;
        }

        log::warn!(
            "summary for node {} failed after {} attempt(s): {}",
            item.id,
            item.attempts,
            error
        );
        item.state = WorkState::Failed;
        return item;
    }
}
