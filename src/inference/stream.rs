//! Streaming delivery of synthesized chunks
//!
//! A bounded channel carries chunks from a producer thread to the caller:
//! the producer synthesizes at most `queue_depth` chunks ahead of the
//! consumer, then blocks. Every stream ends with exactly one terminal
//! event, either `Done` with the request's stats or `Error`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::audio::{AudioChunk, RtfStats};
use crate::core::error::TtsError;
use crate::inference::{SynthesisCore, SynthesisOptions};
use crate::style::StyleVector;

/// One streamed event.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The next audio chunk, in request order.
    Chunk(AudioChunk),
    /// The stream finished; `cancelled` marks an early stop.
    Done(RtfStats),
    /// Synthesis failed; no further events follow.
    Error(TtsError),
}

/// Cooperative cancellation flag shared with the producer thread.
///
/// Cancellation takes effect between chunks; a chunk already in flight
/// finishes and is delivered.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Consumer side of one streaming request
pub struct StreamHandle {
    receiver: Receiver<StreamEvent>,
    token: CancellationToken,
    finished: bool,
}

impl StreamHandle {
    /// Block for the next event; `None` after the terminal event (or if
    /// the producer thread died without one).
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }
        match self.receiver.recv() {
            Ok(event) => {
                if matches!(event, StreamEvent::Done(_) | StreamEvent::Error(_)) {
                    self.finished = true;
                }
                Some(event)
            }
            Err(_) => {
                self.finished = true;
                None
            }
        }
    }

    /// Ask the producer to stop after the chunk it is working on.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A clone of the stream's cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Iterator for StreamHandle {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<StreamEvent> {
        self.next_event()
    }
}

/// Spawn the producer thread for a prepared chunk list.
pub(crate) fn spawn_stream(
    core: Arc<SynthesisCore>,
    style: Arc<StyleVector>,
    chunks: Vec<String>,
    opts: SynthesisOptions,
) -> StreamHandle {
    let (sender, receiver) = mpsc::sync_channel(opts.queue_depth);
    let token = CancellationToken::default();
    let producer_token = token.clone();

    thread::spawn(move || {
        produce(core, style, chunks, opts, sender, producer_token);
    });

    StreamHandle {
        receiver,
        token,
        finished: false,
    }
}

fn produce(
    core: Arc<SynthesisCore>,
    style: Arc<StyleVector>,
    chunks: Vec<String>,
    opts: SynthesisOptions,
    sender: SyncSender<StreamEvent>,
    token: CancellationToken,
) {
    let sample_rate = core.sample_rate();
    let mut stats = RtfStats::default();

    for (index, chunk) in chunks.iter().enumerate() {
        if token.is_cancelled() {
            debug!(index, "stream cancelled");
            stats.cancelled = true;
            break;
        }
        // Timing covers synthesis only, not back-pressure waits on the
        // channel send.
        let started = Instant::now();
        let outcome = core.synthesize_chunk(chunk, index, &style, &opts);
        stats.elapsed += started.elapsed();
        match outcome {
            Ok((samples, _)) => {
                stats.chunks += 1;
                stats.audio_secs += samples.len() as f64 / sample_rate as f64;
                let audio = AudioChunk {
                    samples,
                    sample_rate,
                    index,
                };
                // A closed channel means the consumer is gone; stop quietly.
                if sender.send(StreamEvent::Chunk(audio)).is_err() {
                    return;
                }
            }
            Err(err) => {
                warn!(index, error = %err, "stream chunk failed");
                let _ = sender.send(StreamEvent::Error(err));
                return;
            }
        }
    }

    let _ = sender.send(StreamEvent::Done(stats));
}
