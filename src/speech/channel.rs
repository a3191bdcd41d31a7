//! Ordered, non-overlapping speech output queue
//!
//! All spoken output in the process goes through one `SpeechChannel`.
//! Utterances play strictly in enqueue order with a short gap between
//! them, and `enqueue_speak` resolves only when its own utterance has
//! finished (done, stopped, or errored).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::speech::engine::{SpeechEngine, SpeechOptions, SpeechOutcome};

/// A queued utterance with its completion signal
struct Utterance {
    text: String,
    options: SpeechOptions,
    done: oneshot::Sender<SpeechOutcome>,
}

struct Inner {
    engine: Arc<dyn SpeechEngine>,
    queue: Mutex<VecDeque<Utterance>>,
    /// True while a drain task owns the queue (including inter-utterance gaps)
    draining: AtomicBool,
    /// True only while the engine is actively speaking one utterance
    speaking: AtomicBool,
    gap: Duration,
}

/// Shared speech output channel
///
/// Cheap to clone; all clones feed the same queue.
#[derive(Clone)]
pub struct SpeechChannel {
    inner: Arc<Inner>,
}

impl SpeechChannel {
    /// Create a channel draining into the given engine
    #[must_use]
    pub fn new(engine: Arc<dyn SpeechEngine>, gap: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                speaking: AtomicBool::new(false),
                gap,
            }),
        }
    }

    /// Queue an utterance and wait until it has finished playing
    ///
    /// Resolves with how the utterance ended. A stop request or engine
    /// failure still resolves - callers never see an error from speaking.
    pub async fn enqueue_speak(&self, text: &str, options: &SpeechOptions) -> SpeechOutcome {
        let (tx, rx) = oneshot::channel();

        if let Ok(mut queue) = self.inner.queue.lock() {
            queue.push_back(Utterance {
                text: text.to_string(),
                options: options.clone(),
                done: tx,
            });
        } else {
            return SpeechOutcome::Error;
        }

        self.kick_drain();

        // A dropped sender means the queue was torn down; treat as stopped
        rx.await.unwrap_or(SpeechOutcome::Stopped)
    }

    /// Stop pending speech: clear the queue and resolve every waiter
    ///
    /// The utterance currently at the engine finishes on its own; nothing
    /// queued behind it will play.
    pub fn stop(&self) {
        let drained: Vec<Utterance> = self
            .inner
            .queue
            .lock()
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default();

        let count = drained.len();
        for utterance in drained {
            let _ = utterance.done.send(SpeechOutcome::Stopped);
        }

        if count > 0 {
            tracing::debug!(cleared = count, "speech queue stopped");
        }
    }

    /// Whether the channel is currently producing audio or draining a queue
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.inner.draining.load(Ordering::SeqCst) || self.inner.speaking.load(Ordering::SeqCst)
    }

    /// Spawn the drain task if one isn't already running
    fn kick_drain(&self) {
        if self.inner.draining.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            drain(inner).await;
        });
    }
}

/// Pop and play utterances until the queue is empty
async fn drain(inner: Arc<Inner>) {
    loop {
        let next = inner
            .queue
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());

        let Some(utterance) = next else {
            inner.draining.store(false, Ordering::SeqCst);

            // An enqueue may have landed between the empty pop and the flag
            // clear; reclaim the drain if so, otherwise we're done.
            let queue_empty = inner.queue.lock().is_ok_and(|queue| queue.is_empty());
            if queue_empty || inner.draining.swap(true, Ordering::SeqCst) {
                return;
            }
            continue;
        };

        inner.speaking.store(true, Ordering::SeqCst);
        let outcome = inner.engine.speak(&utterance.text, &utterance.options).await;
        inner.speaking.store(false, Ordering::SeqCst);

        // Receiver may have given up waiting; that's fine
        let _ = utterance.done.send(outcome);

        tokio::time::sleep(inner.gap).await;
    }
}
