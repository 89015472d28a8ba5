//! Bounded-concurrency batch dispatch over item URLs.
//!
//! Each item runs in its own Tokio task: gate slot → launch pacing →
//! resolution on a private session → agent invocation → slot release (RAII
//! permit). A counting semaphore caps concurrent tasks; the dispatch call is
//! a full barrier and returns only after every item has been attempted.
//! A task's failure is recorded for that item alone and never cancels
//! siblings.

use std::path::Path;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::agent::{AgentError, DownloadAgent};
use crate::pacing::Pacer;
use crate::resolver::{ResolveError, TargetResolver};

/// Error type for dispatcher construction and batch runs.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Invalid concurrency value provided.
    #[error("invalid concurrency value {value}: must be at least 1")]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// The concurrency gate was closed unexpectedly.
    #[error("concurrency gate closed unexpectedly")]
    GateClosed,
}

/// Why one item's task ended without a completed download.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The resolution pipeline failed for this item.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The transfer agent failed for this item.
    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// Outcome for one input URL.
#[derive(Debug)]
pub struct ItemOutcome {
    /// The item URL this outcome belongs to.
    pub url: String,
    /// Success, or the error that ended the task.
    pub result: Result<(), TaskError>,
}

/// Structured result of one dispatch: exactly one outcome per input URL,
/// in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Per-item outcomes.
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Number of items downloaded successfully.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of items that failed to resolve or transfer.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.completed()
    }

    /// Total items attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Runs the resolution pipeline over many items under a counting gate and
/// hands each resolved target to the transfer agent.
pub struct DownloadDispatcher {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    resolver: Arc<dyn TargetResolver>,
    agent: Arc<dyn DownloadAgent>,
    launch_pacer: Pacer,
}

impl DownloadDispatcher {
    /// Creates a dispatcher admitting at most `concurrency` tasks at once.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidConcurrency`] when `concurrency` is
    /// zero.
    pub fn new(
        concurrency: usize,
        resolver: Arc<dyn TargetResolver>,
        agent: Arc<dyn DownloadAgent>,
        launch_pacer: Pacer,
    ) -> Result<Self, DispatchError> {
        if concurrency == 0 {
            return Err(DispatchError::InvalidConcurrency { value: concurrency });
        }
        debug!(
            concurrency,
            launch_delay_ms = launch_pacer.delay().as_millis(),
            "creating dispatcher"
        );
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            resolver,
            agent,
            launch_pacer,
        })
    }

    /// The configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Attempts every URL exactly once and returns after all tasks finish.
    ///
    /// Task launch follows input order; completion order is unconstrained.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::GateClosed`] if the semaphore is closed.
    /// Individual item failures do NOT error this method; they are recorded
    /// in the report.
    #[instrument(skip(self, item_urls), fields(items = item_urls.len(), dest = %dest_dir.display()))]
    pub async fn dispatch(
        &self,
        item_urls: &[String],
        dest_dir: &Path,
    ) -> Result<BatchReport, DispatchError> {
        let outcomes = Arc::new(Mutex::new(Vec::with_capacity(item_urls.len())));
        let mut handles = Vec::with_capacity(item_urls.len());

        info!("starting batch");

        for url in item_urls {
            // Acquiring here, before the spawn, keeps launch order aligned
            // with input order.
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DispatchError::GateClosed)?;

            let resolver = Arc::clone(&self.resolver);
            let agent = Arc::clone(&self.agent);
            let outcomes = Arc::clone(&outcomes);
            let launch_pacer = self.launch_pacer;
            let url = url.clone();
            let dest_dir = dest_dir.to_path_buf();

            handles.push(tokio::spawn(async move {
                // Slot is held until this task's block exits (RAII).
                let _permit = permit;

                launch_pacer.wait().await;
                let result = run_item(resolver.as_ref(), agent.as_ref(), &url, &dest_dir).await;
                match &result {
                    Ok(()) => info!(%url, "item complete"),
                    Err(error) => warn!(%url, %error, "item failed"),
                }
                if let Ok(mut guard) = outcomes.lock() {
                    guard.push(ItemOutcome { url, result });
                }
            }));
        }

        debug!(task_count = handles.len(), "waiting for batch barrier");
        for handle in handles {
            // Task panics are logged but don't break the barrier.
            if let Err(error) = handle.await {
                warn!(%error, "dispatch task panicked");
            }
        }

        let outcomes = outcomes
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default();
        let report = BatchReport { outcomes };
        info!(
            completed = report.completed(),
            failed = report.failed(),
            total = report.total(),
            "batch finished"
        );
        Ok(report)
    }
}

/// One item end to end: resolve, then hand off to the agent.
async fn run_item(
    resolver: &dyn TargetResolver,
    agent: &dyn DownloadAgent,
    url: &str,
    dest_dir: &Path,
) -> Result<(), TaskError> {
    let target = resolver.resolve(url).await?;
    agent.fetch(&target, dest_dir).await?;
    Ok(())
}
