use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, info, warn};

use crate::modules::media::events::TranscodeJob;
use crate::modules::media::hls::{self, HlsOptions};
use crate::modules::media::storage::MediaStore;
use crate::state::AppState;

/// Accepts transcode submissions from the upload path and hands them to the
/// worker pool. Submission never blocks and never errors back into the
/// caller: a duplicate, an already-finished id, or a full queue all just log.
#[derive(Clone)]
pub struct TranscodeScheduler {
    tx: async_channel::Sender<TranscodeJob>,
    rx: async_channel::Receiver<TranscodeJob>,
    store: MediaStore,
    /// Ids with a job queued or running. Checked-and-set before enqueue so
    /// two rapid triggers for the same id cannot race on the artifact dir.
    inflight: Arc<Mutex<HashSet<i64>>>,
}

impl TranscodeScheduler {
    pub fn new(store: MediaStore, queue_cap: usize) -> Self {
        let (tx, rx) = async_channel::bounded(queue_cap.max(1));
        Self { tx, rx, store, inflight: Arc::new(Mutex::new(HashSet::new())) }
    }

    /// Fire-and-forget. The manifest-existence check keeps finished content
    /// from re-encoding; the in-flight claim keeps concurrent triggers from
    /// duplicating work.
    pub fn submit(&self, job: TranscodeJob) {
        let id = job.content_id;
        if self.store.master_exists(id) {
            debug!("hls already built for content {}, skipping", id);
            return;
        }
        if !self.claim(id) {
            warn!("transcode for content {} already in flight, skipping", id);
            return;
        }
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(async_channel::TrySendError::Full(_)) => {
                self.release(id);
                warn!("transcode queue full, dropping job for content {}", id);
            }
            Err(async_channel::TrySendError::Closed(_)) => {
                self.release(id);
                error!("transcode queue closed, dropping job for content {}", id);
            }
        }
    }

    pub fn queued(&self) -> usize {
        self.tx.len()
    }

    pub(crate) fn receiver(&self) -> async_channel::Receiver<TranscodeJob> {
        self.rx.clone()
    }

    fn claim(&self, id: i64) -> bool {
        self.inflight.lock().expect("inflight lock poisoned").insert(id)
    }

    pub(crate) fn release(&self, id: i64) {
        self.inflight.lock().expect("inflight lock poisoned").remove(&id);
    }
}

/// Spawns the worker pool. Each worker pulls jobs off the shared queue and
/// runs the encode pipeline on the blocking pool, so multi-minute ffmpeg runs
/// never stall request handling.
pub fn start_transcode_workers(state: &AppState) {
    let workers = state.config.transcode_workers.max(1);
    info!("🎥 starting {} transcode worker(s)", workers);
    for worker in 0..workers {
        tokio::spawn(worker_loop(state.clone(), worker));
    }
}

async fn worker_loop(state: AppState, worker: usize) {
    let rx = state.transcoder.receiver();
    while let Ok(job) = rx.recv().await {
        info!(
            "📦 worker {} transcoding content {} ({})",
            worker, job.content_id, job.src_rel
        );
        let result = run_job(&state, &job).await;
        state.transcoder.release(job.content_id);
        match result {
            Ok(()) => info!("✅ hls ready for content {}", job.content_id),
            // Terminal for this trigger: log and move on, the original file
            // keeps serving as fallback.
            Err(e) => error!("❌ transcode failed for content {}: {:#}", job.content_id, e),
        }
    }
}

async fn run_job(state: &AppState, job: &TranscodeJob) -> anyhow::Result<()> {
    // The queue may have sat on this job; re-check before doing work.
    if state.store.master_exists(job.content_id) {
        return Ok(());
    }
    let src = state.store.abs_path(&job.src_rel);
    let store = state.store.clone();
    let encoder = state.encoder.clone();
    let opts = HlsOptions::from_config(&state.config);
    let content_id = job.content_id;
    tokio::task::spawn_blocking(move || {
        hls::generate_hls(encoder.as_ref(), &store, &opts, &src, content_id)
    })
    .await??;
    Ok(())
}
