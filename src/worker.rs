use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::records::{EnrichedCustomerRecord, RawCustomerRecord};
use crate::scoring::{enrich, ScoringSettings};
use crate::summary::{summarize, PortfolioSummary};

/// Caches the last enrichment keyed on the identity of its inputs.
///
/// Passing the same `Arc`s again returns the cached result without scoring;
/// any new dataset or settings allocation triggers a recompute.
#[derive(Default)]
pub struct MemoizedAnalysis {
    last: Option<CachedRun>,
    computations: usize,
}

struct CachedRun {
    records: Arc<Vec<RawCustomerRecord>>,
    settings: Arc<ScoringSettings>,
    output: Arc<Vec<EnrichedCustomerRecord>>,
}

impl MemoizedAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        records: &Arc<Vec<RawCustomerRecord>>,
        settings: &Arc<ScoringSettings>,
    ) -> Arc<Vec<EnrichedCustomerRecord>> {
        if let Some(run) = &self.last {
            if Arc::ptr_eq(&run.records, records) && Arc::ptr_eq(&run.settings, settings) {
                return Arc::clone(&run.output);
            }
        }

        let output = Arc::new(enrich(records, settings));
        self.computations += 1;
        self.last = Some(CachedRun {
            records: Arc::clone(records),
            settings: Arc::clone(settings),
            output: Arc::clone(&output),
        });
        output
    }

    /// Number of times the engine actually ran.
    pub fn computations(&self) -> usize {
        self.computations
    }
}

#[derive(Clone)]
struct Request {
    generation: u64,
    records: Arc<Vec<RawCustomerRecord>>,
    settings: Arc<ScoringSettings>,
}

/// Result of one analysis run.
#[derive(Debug)]
pub struct AnalysisSnapshot {
    pub generation: u64,
    pub records: Arc<Vec<EnrichedCustomerRecord>>,
    pub summary: PortfolioSummary,
}

/// Runs the engine off the async executor.
///
/// Only the newest submission matters: a request superseded while it was being
/// computed is dropped instead of published, so the last settings win.
pub struct AnalysisWorker {
    requests: watch::Sender<Option<Request>>,
    results: watch::Receiver<Option<Arc<AnalysisSnapshot>>>,
    generation: u64,
    handle: JoinHandle<()>,
}

impl AnalysisWorker {
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (requests, request_rx) = watch::channel(None);
        let (result_tx, results) = watch::channel(None);
        let handle = tokio::spawn(run(request_rx, result_tx));
        Self {
            requests,
            results,
            generation: 0,
            handle,
        }
    }

    /// Queue an analysis, replacing any request not yet started. Returns the
    /// generation number of this submission.
    pub fn submit(
        &mut self,
        records: Arc<Vec<RawCustomerRecord>>,
        settings: Arc<ScoringSettings>,
    ) -> u64 {
        self.generation += 1;
        self.requests.send_replace(Some(Request {
            generation: self.generation,
            records,
            settings,
        }));
        self.generation
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<AnalysisSnapshot>>> {
        self.results.clone()
    }

    /// Wait for the result of the most recent submission.
    /// Returns `None` if nothing was submitted or the worker stopped.
    pub async fn latest(&mut self) -> Option<Arc<AnalysisSnapshot>> {
        if self.generation == 0 {
            return None;
        }
        let wanted = self.generation;
        self.results
            .wait_for(|snapshot| snapshot.as_ref().is_some_and(|s| s.generation >= wanted))
            .await
            .ok()
            .and_then(|snapshot| snapshot.clone())
    }

    /// Stop accepting requests and wait for the worker task to finish.
    pub async fn shutdown(self) {
        let Self {
            requests, handle, ..
        } = self;
        drop(requests);
        if let Err(e) = handle.await {
            warn!(error = %e, "analysis worker ended abnormally");
        }
    }
}

async fn run(
    mut requests: watch::Receiver<Option<Request>>,
    results: watch::Sender<Option<Arc<AnalysisSnapshot>>>,
) {
    let mut memo = MemoizedAnalysis::new();

    while requests.changed().await.is_ok() {
        let Some(request) = requests.borrow_and_update().clone() else {
            continue;
        };
        let generation = request.generation;

        let job = tokio::task::spawn_blocking(move || {
            let records = memo.get(&request.records, &request.settings);
            let summary = summarize(&records);
            (memo, records, summary)
        });
        let (returned, records, summary) = match job.await {
            Ok(output) => output,
            Err(e) => {
                warn!(generation, error = %e, "analysis job failed");
                return;
            }
        };
        memo = returned;

        if matches!(requests.has_changed(), Ok(true)) {
            debug!(generation, "dropping stale analysis");
            continue;
        }

        debug!(generation, records = records.len(), "analysis published");
        results.send_replace(Some(Arc::new(AnalysisSnapshot {
            generation,
            records,
            summary,
        })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Arc<Vec<RawCustomerRecord>> {
        Arc::new(vec![
            RawCustomerRecord {
                customer_id: 1,
                credit_status: "LI".to_string(),
                credit_limit: 1000.0,
                outstanding_balance: 500.0,
                purchases_90d: 5,
                average_ticket_90d: 1000.0,
                ..Default::default()
            },
            RawCustomerRecord {
                customer_id: 2,
                credit_status: "LI".to_string(),
                credit_limit: 1000.0,
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_memo_reuses_same_inputs() {
        let mut memo = MemoizedAnalysis::new();
        let data = records();
        let settings = Arc::new(ScoringSettings::default());

        let first = memo.get(&data, &settings);
        let second = memo.get(&data, &settings);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(memo.computations(), 1);
    }

    #[test]
    fn test_memo_recomputes_on_new_settings() {
        let mut memo = MemoizedAnalysis::new();
        let data = records();

        let first = memo.get(&data, &Arc::new(ScoringSettings::default()));
        let second = memo.get(&data, &Arc::new(ScoringSettings::legacy()));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(memo.computations(), 2);
    }

    #[tokio::test]
    async fn test_worker_publishes_result() {
        let mut worker = AnalysisWorker::spawn();
        let generation = worker.submit(records(), Arc::new(ScoringSettings::default()));

        let snapshot = worker.latest().await.unwrap();
        assert_eq!(snapshot.generation, generation);
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.summary.total_customers, 2);
        assert_eq!(snapshot.summary.count(0), 1);

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_worker_last_settings_win() {
        let mut worker = AnalysisWorker::spawn();
        let data = records();
        worker.submit(Arc::clone(&data), Arc::new(ScoringSettings::default()));
        worker.submit(Arc::clone(&data), Arc::new(ScoringSettings::default()));
        let last = worker.submit(data, Arc::new(ScoringSettings::legacy()));

        let snapshot = worker.latest().await.unwrap();
        assert_eq!(snapshot.generation, last);
        // legacy tier names prove the newest settings were used
        assert_eq!(snapshot.records[0].tier_name, "Bom Potencial");

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_latest_without_submission() {
        let mut worker = AnalysisWorker::spawn();
        assert!(worker.latest().await.is_none());
        worker.shutdown().await;
    }
}
