//! Bounded worker pool over independent search-URL jobs.
//!
//! Fixed pool size; each job gets its own browser session owned
//! end-to-end by one worker, with no cross-worker interleaving inside a
//! pipeline and no mid-pipeline cancellation. The snapshot
//! read-diff-write sequence and the run counters are the only shared
//! state, each behind its own async Mutex.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::error::SessionResult;
use crate::pipeline::scrape::run_query;
use crate::traits::browser::Browser;
use crate::traits::notifier::Notifier;
use crate::traits::store::SnapshotStore;
use crate::types::config::EngineConfig;
use crate::types::report::RunTotals;

/// Default worker-pool size.
pub const DEFAULT_WORKERS: usize = 5;

/// Process a batch of search URLs with a fixed pool of workers.
///
/// `connect` opens a fresh browser session; it is called once per job so
/// a wedged session never leaks into the next query. A job failure is
/// counted and logged, never propagated to sibling jobs.
pub async fn run_batch<B, F, Fut>(
    urls: Vec<String>,
    workers: usize,
    connect: F,
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
) -> RunTotals
where
    B: Browser + 'static,
    F: Fn(usize) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = SessionResult<B>> + Send,
{
    let workers = workers.max(1).min(urls.len().max(1));
    info!(urls = urls.len(), workers, "Starting batch run");

    let queue = Arc::new(Mutex::new(VecDeque::from(urls)));
    let totals = Arc::new(Mutex::new(RunTotals::new()));
    let snapshot_lock = Arc::new(Mutex::new(()));
    let config = Arc::new(config);

    let mut pool = JoinSet::new();
    for worker_id in 0..workers {
        let queue = Arc::clone(&queue);
        let totals = Arc::clone(&totals);
        let snapshot_lock = Arc::clone(&snapshot_lock);
        let store = Arc::clone(&store);
        let notifier = Arc::clone(&notifier);
        let config = Arc::clone(&config);
        let connect = connect.clone();

        pool.spawn(async move {
            loop {
                let Some(url) = queue.lock().await.pop_front() else {
                    break;
                };

                // Reject off-provider URLs before opening a session; the
                // guard must run ahead of any network activity.
                if let Err(e) =
                    crate::pipeline::scrape::ensure_provider_url(&url, &config.provider_domain)
                {
                    error!(worker_id, %url, error = %e, "URL rejected");
                    totals.lock().await.record_failure();
                    continue;
                }

                let browser = match connect(worker_id).await {
                    Ok(browser) => browser,
                    Err(e) => {
                        error!(worker_id, %url, error = %e, "Browser session open failed");
                        totals.lock().await.record_failure();
                        continue;
                    }
                };

                match run_query(
                    &browser,
                    store.as_ref(),
                    notifier.as_ref(),
                    &url,
                    &config,
                    &snapshot_lock,
                )
                .await
                {
                    Ok(outcome) => {
                        info!(
                            worker_id,
                            %url,
                            flights_saved = outcome.flights_saved,
                            alerts_sent = outcome.alerts_sent,
                            "Query complete"
                        );
                        totals.lock().await.record_outcome(&outcome);
                    }
                    Err(e) => {
                        error!(worker_id, %url, error = %e, "Query failed");
                        totals.lock().await.record_failure();
                    }
                }

                if let Err(e) = browser.close().await {
                    error!(worker_id, error = %e, "Browser session close failed");
                }
            }
        });
    }

    while pool.join_next().await.is_some() {}

    let totals = totals.lock().await.clone();
    info!(
        urls_processed = totals.urls_processed,
        queries_failed = totals.queries_failed,
        flights_saved = totals.flights_saved,
        alerts_sent = totals.alerts_sent,
        "Batch run finished"
    );
    totals
}
