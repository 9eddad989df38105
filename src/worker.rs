//! Background conversion worker.
//!
//! Encoding a large image takes long enough that an interactive front-end
//! should not wait on it. The worker owns a backend on its own thread:
//! [`ConversionRequest`]s go in over one channel, [`Completion`]s come back
//! over another, and the session decides which completion still matters.
//!
//! When several requests pile up while an encode is running, only the newest
//! is encoded next. The skipped ones could never win anyway.

use crate::imaging::{BackendError, EncodedImage, ImageBackend};
use crate::session::{CompletionOutcome, ConversionRequest, Session};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of one request, tagged with its sequence number.
#[derive(Debug)]
pub struct Completion {
    pub seq: u64,
    pub result: Result<EncodedImage, BackendError>,
}

pub struct ConversionWorker {
    requests: Option<Sender<ConversionRequest>>,
    completions: Receiver<Completion>,
    thread: Option<JoinHandle<()>>,
}

impl ConversionWorker {
    pub fn spawn(backend: Arc<dyn ImageBackend + Send>) -> std::io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<ConversionRequest>();
        let (completion_tx, completion_rx) = mpsc::channel::<Completion>();

        let thread = std::thread::Builder::new()
            .name("webpify-encoder".into())
            .spawn(move || worker_loop(backend, request_rx, completion_tx))?;

        Ok(Self {
            requests: Some(request_tx),
            completions: completion_rx,
            thread: Some(thread),
        })
    }

    /// Queue a request. Returns `false` if the worker thread has gone away.
    pub fn submit(&self, request: ConversionRequest) -> bool {
        self.requests
            .as_ref()
            .is_some_and(|tx| tx.send(request).is_ok())
    }

    pub fn try_recv(&self) -> Option<Completion> {
        self.completions.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Completion, RecvTimeoutError> {
        self.completions.recv_timeout(timeout)
    }
}

impl Drop for ConversionWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the loop after the current encode.
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop(
    backend: Arc<dyn ImageBackend + Send>,
    requests: Receiver<ConversionRequest>,
    completions: Sender<Completion>,
) {
    while let Ok(mut request) = requests.recv() {
        while let Ok(newer) = requests.try_recv() {
            debug!(skipped = request.seq, next = newer.seq, "coalescing queued request");
            request = newer;
        }
        let result = request.run(&*backend);
        let completion = Completion {
            seq: request.seq,
            result,
        };
        if completions.send(completion).is_err() {
            break;
        }
    }
    debug!("encoder thread exiting");
}

// =============================================================================
// Session glue
// =============================================================================

/// Send a request to the worker if the session's output is stale.
///
/// Returns the sequence number submitted. If the worker is gone the request
/// is failed on the spot so the session does not stay processing forever.
pub fn dispatch(session: &mut Session, worker: &ConversionWorker) -> Option<u64> {
    if !session.is_stale() {
        return None;
    }
    let request = session.request_conversion()?;
    let seq = request.seq;
    if !worker.submit(request) {
        session.complete(
            seq,
            Err(BackendError::Encode("encoder thread stopped".to_string())),
        );
    }
    Some(seq)
}

/// Apply every completion that is already available.
pub fn drain(session: &mut Session, worker: &ConversionWorker) -> Vec<CompletionOutcome> {
    std::iter::from_fn(|| worker.try_recv())
        .map(|c| session.complete(c.seq, c.result))
        .collect()
}

/// Block until the session stops processing or `timeout` passes.
///
/// Returns `true` if the session settled.
pub fn settle(session: &mut Session, worker: &ConversionWorker, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while session.is_processing() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match worker.recv_timeout(remaining) {
            Ok(completion) => {
                session.complete(completion.seq, completion.result);
            }
            Err(_) => return false,
        }
    }
    true
}
