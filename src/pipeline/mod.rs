// src/pipeline/mod.rs
//! Producer/consumer handoff between the generator thread and the UI thread.
//!
//! Two independent channels:
//! - the frame queue: FIFO of [`Frame`]s, unbounded by default. The producer
//!   `put`s, the display loop `try_take`s without ever blocking.
//! - the completion channel: single-shot. The producer posts exactly one
//!   [`Completion`] when its thread finishes, the shutdown coordinator takes
//!   it at most once.
//!
//! Only fully converted [`Image`]s cross the thread boundary.

pub mod producer;
pub mod timing;

pub use producer::{FrameProducer, ProducerState};

use crate::raster::Image;
use log::warn;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError};

/// One generated frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the generated sequence, starting at 0.
    pub sequence: u64,
    pub image: Image,
}

/// Returned by [`FrameSender::put`] when the consumer side is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed;

enum FrameTx {
    Unbounded(Sender<Frame>),
    Bounded(SyncSender<Frame>),
}

/// Producer end of the frame queue.
pub struct FrameSender {
    tx: FrameTx,
}

impl FrameSender {
    /// Enqueues a frame. Never blocks on an unbounded queue; blocks while a
    /// bounded queue is full.
    pub fn put(&self, frame: Frame) -> Result<(), QueueClosed> {
        match &self.tx {
            FrameTx::Unbounded(tx) => tx.send(frame).map_err(|_| QueueClosed),
            FrameTx::Bounded(tx) => tx.send(frame).map_err(|_| QueueClosed),
        }
    }
}

/// Consumer end of the frame queue.
pub struct FrameReceiver {
    rx: Receiver<Frame>,
}

impl FrameReceiver {
    /// Takes the oldest queued frame, if any.
    pub fn try_take(&self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }

    /// Discards every queued frame and returns how many were dropped.
    pub fn drain(&self) -> usize {
        self.rx.try_iter().count()
    }
}

/// Creates the frame queue. `bound` of `None` makes it unbounded.
pub fn frame_queue(bound: Option<usize>) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = match bound {
        None => {
            let (tx, rx) = mpsc::channel();
            (FrameTx::Unbounded(tx), rx)
        }
        Some(n) => {
            let (tx, rx) = mpsc::sync_channel(n.max(1));
            (FrameTx::Bounded(tx), rx)
        }
    };
    (FrameSender { tx }, FrameReceiver { rx })
}

/// How the producer thread ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The loop observed a stop request (or the frame queue closed).
    Stopped,
    /// Kernel invocation or image conversion failed, or the thread panicked.
    Faulted(String),
}

/// Completion sentinel posted once by the producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Frames pushed onto the queue.
    pub frames: u64,
    pub outcome: Outcome,
}

/// Producer end of the completion channel. Posting consumes it.
pub struct CompletionSender {
    tx: SyncSender<Completion>,
}

impl CompletionSender {
    pub fn post(self, completion: Completion) {
        // The slot holds one item and this is the only send, so it never blocks.
        if self.tx.try_send(completion).is_err() {
            warn!("Completion channel: receiver gone before completion was posted");
        }
    }
}

/// Consumer end of the completion channel.
pub struct CompletionReceiver {
    rx: Receiver<Completion>,
    consumed: bool,
}

impl CompletionReceiver {
    /// Takes the completion if it has been posted.
    ///
    /// Returns `Some` at most once. If the sender was dropped without
    /// posting, a `Faulted` completion is synthesized so the caller never
    /// waits forever.
    pub fn try_take(&mut self) -> Option<Completion> {
        if self.consumed {
            return None;
        }
        let completion = match self.rx.try_recv() {
            Ok(completion) => completion,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                warn!("Completion channel: sender dropped without posting");
                Completion {
                    frames: 0,
                    outcome: Outcome::Faulted("producer exited without completion".to_string()),
                }
            }
        };
        self.consumed = true;
        Some(completion)
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

/// Creates the single-shot completion channel.
pub fn completion_channel() -> (CompletionSender, CompletionReceiver) {
    let (tx, rx) = mpsc::sync_channel(1);
    (
        CompletionSender { tx },
        CompletionReceiver {
            rx,
            consumed: false,
        },
    )
}
