//! Hash worker pool.
//!
//! Each worker pulls paths from the shared path stream, hashes them, and
//! pushes the result onto the shared pair stream. A worker exits once the
//! path stream is closed and drained, then signals completion exactly once.
//!
//! Workers share nothing mutable with each other: the hasher is read-only
//! and the only synchronization points are the two channels.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use super::groups::{HashedEntry, PairMessage};
use super::ErrorPolicy;
use crate::progress::ProgressCallback;
use crate::scanner::{HashError, Hasher};

/// State shared read-only by every worker of one run.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub hasher: Arc<Hasher>,
    /// Raised by a worker on a fatal error under [`ErrorPolicy::Abort`].
    pub abort_flag: Arc<AtomicBool>,
    pub error_policy: ErrorPolicy,
    pub progress: Option<Arc<dyn ProgressCallback>>,
    /// Files hashed so far, across all workers
    pub processed: Arc<AtomicUsize>,
}

/// Sends the completion signal when dropped, including on unwind.
struct CompletionGuard {
    id: usize,
    done: Sender<usize>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        log::debug!("Worker {} exiting", self.id);
        // The receiver outlives every worker; a failed send means the
        // coordinator itself is gone and nobody is counting.
        let _ = self.done.send(self.id);
    }
}

/// Spawn one hash worker thread.
pub(crate) fn spawn_worker(
    id: usize,
    paths: Receiver<PathBuf>,
    pairs: Sender<PairMessage>,
    done: Sender<usize>,
    ctx: WorkerContext,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("dupehash-hash-{id}"))
        .spawn(move || {
            let _guard = CompletionGuard { id, done };
            run_worker(id, &paths, pairs, &ctx);
        })
}

fn run_worker(
    id: usize,
    paths: &Receiver<PathBuf>,
    pairs: Sender<PairMessage>,
    ctx: &WorkerContext,
) {
    log::debug!("Worker {} started", id);

    for path in paths.iter() {
        // Keep draining after a stop so the walker never blocks on a full queue.
        if ctx.hasher.is_shutdown_requested() {
            continue;
        }

        let message = match ctx.hasher.full_hash_with_len(&path) {
            Ok((digest, size)) => {
                log::trace!("Hashed {} -> {}", path.display(), digest.short_id());
                if let Some(progress) = &ctx.progress {
                    let current = ctx.processed.fetch_add(1, Ordering::Relaxed) + 1;
                    progress.on_progress(current, &path.to_string_lossy());
                    progress.on_item_completed(size);
                }
                PairMessage::Hashed(HashedEntry::new(digest, path, size))
            }
            Err(error) => {
                match (&error, ctx.error_policy) {
                    (HashError::Interrupted(_), _) => log::debug!("Worker {}: {}", id, error),
                    (_, ErrorPolicy::Abort) => {
                        log::debug!("Worker {} aborting run: {}", id, error);
                        ctx.abort_flag.store(true, Ordering::SeqCst);
                    }
                    (_, ErrorPolicy::Collect) => log::warn!("{}", error),
                }
                PairMessage::Failed(error)
            }
        };

        if pairs.send(message).is_err() {
            log::debug!("Worker {}: pair stream closed early", id);
            break;
        }
    }

    // Release the pair stream before signaling completion.
    drop(pairs);
}
