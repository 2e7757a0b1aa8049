// src/pipeline/producer.rs
//! FrameProducer - background worker that runs a kernel as fast as it can.
//!
//! State machine: `Created → PreLoop → Looping → Stopping → Done`.
//!
//! - `PreLoop`: allocate the raster (and the kernel's auxiliary state), run
//!   the initialization pass if the kernel wants one.
//! - `Looping`: advance kernel, snapshot raster into an image, enqueue,
//!   bump the sequence counter. The stop flag is checked once per iteration,
//!   so cancellation latency is one kernel pass.
//! - `Stopping`: the loop saw the stop flag or the frame queue closed.
//! - `Done`: the completion sentinel is posted. This runs from a drop guard,
//!   so it also happens when the loop errors or panics; those paths pass
//!   through `Stopping` there.

use super::timing::{FrameTimer, RunStats};
use super::{Completion, CompletionSender, Frame, FrameSender, Outcome};
use crate::kernel::Kernel;
use crate::raster::{Image, Raster};
use anyhow::{anyhow, Context, Result};
use log::*;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Lifecycle of the producer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProducerState {
    Created = 0,
    PreLoop = 1,
    Looping = 2,
    Stopping = 3,
    Done = 4,
}

impl ProducerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ProducerState::Created,
            1 => ProducerState::PreLoop,
            2 => ProducerState::Looping,
            3 => ProducerState::Stopping,
            _ => ProducerState::Done,
        }
    }
}

/// Flags shared between the handle and the worker thread.
struct Shared {
    stop_requested: AtomicBool,
    state: AtomicU8,
    #[cfg(test)]
    history: std::sync::Mutex<Vec<ProducerState>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            state: AtomicU8::new(ProducerState::Created as u8),
            #[cfg(test)]
            history: std::sync::Mutex::new(vec![ProducerState::Created]),
        }
    }

    fn state(&self) -> ProducerState {
        ProducerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: ProducerState) {
        debug!("FrameProducer: -> {:?}", state);
        self.state.store(state as u8, Ordering::Release);
        #[cfg(test)]
        if let Ok(mut history) = self.history.lock() {
            history.push(state);
        }
    }
}

/// Handle to the producer thread.
pub struct FrameProducer {
    shared: Arc<Shared>,
    thread_handle: Option<JoinHandle<Result<u64>>>,
}

impl FrameProducer {
    /// Spawns the producer thread.
    ///
    /// # Arguments
    ///
    /// * `kernel` - The kernel to run (takes ownership)
    /// * `width`, `height` - Raster dimensions, fixed for the run
    /// * `frames` - Producer end of the frame queue
    /// * `completion` - Producer end of the completion channel
    pub fn spawn(
        kernel: Box<dyn Kernel>,
        width: usize,
        height: usize,
        frames: FrameSender,
        completion: CompletionSender,
    ) -> Result<Self> {
        let shared = Arc::new(Shared::new());

        info!(
            "FrameProducer: Spawning {} kernel at {}x{}",
            kernel.name(),
            width,
            height
        );

        let thread_shared = Arc::clone(&shared);
        let thread_handle = thread::Builder::new()
            .name("producer".to_string())
            .spawn(move || {
                producer_thread_main(kernel, width, height, frames, completion, thread_shared)
            })
            .context("Failed to spawn producer thread")?;

        Ok(Self {
            shared,
            thread_handle: Some(thread_handle),
        })
    }

    /// Requests a cooperative stop. Observed at the top of the next iteration.
    pub fn stop(&self) {
        if !self.shared.stop_requested.swap(true, Ordering::AcqRel) {
            info!("FrameProducer: Stop requested");
        }
    }

    pub fn state(&self) -> ProducerState {
        self.shared.state()
    }

    /// Every state the thread has entered, in order.
    #[cfg(test)]
    pub(crate) fn history(&self) -> Vec<ProducerState> {
        self.shared
            .history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Whether the thread has fully exited.
    pub fn is_finished(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Waits for the thread to exit and returns the number of frames produced.
    ///
    /// Errors if the loop faulted or the thread panicked. Joining twice is an
    /// error.
    pub fn join(&mut self) -> Result<u64> {
        let handle = self
            .thread_handle
            .take()
            .ok_or_else(|| anyhow!("producer thread already joined"))?;
        match handle.join() {
            Ok(result) => result,
            Err(panic) => Err(anyhow!("producer thread panicked: {}", panic_message(&*panic))),
        }
    }
}

impl Drop for FrameProducer {
    fn drop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!("FrameProducer dropped while running, stopping");
            self.shared.stop_requested.store(true, Ordering::Release);
            if handle.join().is_err() {
                error!("FrameProducer thread panicked");
            }
        }
    }
}

/// Posts the completion sentinel when dropped, whichever way the thread ends.
struct CompletionGuard {
    completion: Option<CompletionSender>,
    shared: Arc<Shared>,
    stats: RunStats,
    fault: Option<String>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let outcome = if thread::panicking() {
            Outcome::Faulted("producer thread panicked".to_string())
        } else if let Some(fault) = self.fault.take() {
            Outcome::Faulted(fault)
        } else {
            Outcome::Stopped
        };
        // The loop enters Stopping on a normal exit; errors and panics skip it.
        if self.shared.state() != ProducerState::Stopping {
            self.shared.set_state(ProducerState::Stopping);
        }
        self.shared.set_state(ProducerState::Done);
        if let Some(tx) = self.completion.take() {
            tx.post(Completion {
                frames: self.stats.frames(),
                outcome,
            });
        }
    }
}

fn producer_thread_main(
    mut kernel: Box<dyn Kernel>,
    width: usize,
    height: usize,
    frames: FrameSender,
    completion: CompletionSender,
    shared: Arc<Shared>,
) -> Result<u64> {
    let mut guard = CompletionGuard {
        completion: Some(completion),
        shared: Arc::clone(&shared),
        stats: RunStats::new(),
        fault: None,
    };

    let result = run(
        kernel.as_mut(),
        width,
        height,
        &frames,
        &shared,
        &mut guard.stats,
    );
    guard.stats.report(kernel.name());

    if let Err(e) = &result {
        error!("FrameProducer: {:#}", e);
        guard.fault = Some(format!("{:#}", e));
    }
    result
}

fn run(
    kernel: &mut dyn Kernel,
    width: usize,
    height: usize,
    frames: &FrameSender,
    shared: &Shared,
    stats: &mut RunStats,
) -> Result<u64> {
    shared.set_state(ProducerState::PreLoop);
    kernel
        .prepare(width, height)
        .with_context(|| format!("Failed to prepare {} kernel", kernel.name()))?;
    let mut raster = Raster::new(kernel.color_mode(), width, height)?;
    let palette = kernel.palette();

    let mut sequence: u64 = 0;
    if kernel.needs_initialization() {
        let timer = FrameTimer::start("PreLoop", Level::Debug);
        kernel
            .initialize(&mut raster, sequence)
            .with_context(|| format!("{} kernel initialization failed", kernel.name()))?;
        timer.finish();
    }

    shared.set_state(ProducerState::Looping);
    while !shared.stop_requested.load(Ordering::Acquire) {
        let timer = FrameTimer::start("Loop", Level::Trace);

        kernel
            .advance(&mut raster, sequence)
            .with_context(|| format!("{} kernel failed at frame {}", kernel.name(), sequence))?;
        let image = Image::from_raster(&raster, palette.as_ref())
            .with_context(|| format!("Image conversion failed at frame {}", sequence))?;

        if frames.put(Frame { sequence, image }).is_err() {
            info!("FrameProducer: Frame queue closed, stopping");
            break;
        }
        stats.record_frame();
        sequence += 1;

        timer.finish();
    }

    shared.set_state(ProducerState::Stopping);
    Ok(sequence)
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
