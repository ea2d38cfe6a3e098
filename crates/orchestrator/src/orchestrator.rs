// crates/orchestrator/src/orchestrator.rs
//! Orchestrator - probe job scheduling and worker coordination

use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::{error, info, instrument};
use uuid::Uuid;

use defcred_common::{Fetcher, LoginAttempt};
use defcred_fingerprint::{dedup_probes, Probe, ReqwestFetcher};
use crate::progress::ProgressTracker;

/// A batch of probes submitted together.
#[derive(Debug, Clone)]
pub struct ProbeJob {
    pub id: Uuid,
    pub probes: Vec<Probe>,
    pub created_at: SystemTime,
}

impl ProbeJob {
    /// Create a job from built probes, coalescing duplicate probe identities.
    #[must_use]
    pub fn new(probes: Vec<Probe>) -> Self {
        Self {
            id: Uuid::new_v4(),
            probes: dedup_probes(probes),
            created_at: SystemTime::now(),
        }
    }

    #[inline]
    #[must_use]
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }
}

/// Orchestrator runs probe jobs on a fixed pool of workers and collects the
/// login attempts they produce. Probes are independent, so attempts arrive
/// in completion order.
pub struct Orchestrator {
    job_queue: Arc<Mutex<VecDeque<ProbeJob>>>,
    progress: Arc<ProgressTracker>,
    fetcher: Arc<dyn Fetcher>,
    concurrency: usize,
    results: Arc<Mutex<Vec<LoginAttempt>>>,
}

impl Orchestrator {
    /// Create a new orchestrator with a worker count.
    pub fn new(concurrency: usize) -> Self {
        Self {
            job_queue: Arc::new(Mutex::new(VecDeque::new())),
            progress: Arc::new(ProgressTracker::new()),
            fetcher: Arc::new(ReqwestFetcher::new()),
            concurrency: concurrency.max(1),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replace the HTTP fetcher used by every probe.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Submit a probe job to the queue.
    pub async fn submit_job(&self, job: ProbeJob) -> Result<()> {
        self.progress.set_total(job.probe_count()).await;
        self.job_queue.lock().await.push_back(job);
        Ok(())
    }

    /// Main run loop for a single job: pops one job, schedules workers and waits.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<()> {
        let mut queue = self.job_queue.lock().await;
        let job = match queue.pop_front() {
            Some(j) => j,
            None => return Ok(()),
        };
        drop(queue);

        info!("Starting job {} probes={} fetcher={}", job.id, job.probes.len(), self.fetcher.name());

        // Shared queue pattern: workers pop probes until it is empty
        let queue = Arc::new(Mutex::new(VecDeque::from(job.probes)));

        let mut workers = Vec::new();
        for _ in 0..self.concurrency {
            let queue = queue.clone();
            let fetcher = self.fetcher.clone();
            let progress = self.progress.clone();
            let results = self.results.clone();

            let worker = tokio::spawn(async move {
                loop {
                    let maybe_probe = {
                        let mut q = queue.lock().await;
                        q.pop_front()
                    };

                    let probe = match maybe_probe {
                        Some(p) => p,
                        None => break,
                    };

                    let attempts = probe.execute_with(fetcher.as_ref()).await;
                    if attempts.is_empty() {
                        progress.increment_empty().await;
                    } else {
                        progress.increment_matched().await;
                        results.lock().await.extend(attempts);
                    }
                }
            });
            workers.push(worker);
        }

        let mut first_error = None;
        for w in workers {
            if let Err(e) = w.await {
                error!("Worker failed: {}", e);
                first_error.get_or_insert(e);
            }
        }

        self.progress.print_summary().await;
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Current results (clone) for external consumption.
    pub async fn get_results(&self) -> Vec<LoginAttempt> {
        self.results.lock().await.clone()
    }
}
