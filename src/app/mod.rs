// src/app/mod.rs
//! UI-thread side of the generator: the display loop, the shutdown
//! coordinator, and the single-threaded event loop that ticks them.
//!
//! Everything here runs on one thread. The only blocking call is the final
//! producer join, which happens after the completion sentinel was observed.

use crate::config::Config;
use crate::display::{DisplayEvent, DisplayManager};
use crate::pipeline::{Completion, CompletionReceiver, FrameProducer, FrameReceiver, Outcome};
use anyhow::{bail, Result};
use log::*;
use std::thread;
use std::time::Duration;

/// Status shown until the first frame arrives.
pub const WAITING_STATUS: &str = "Waiting";

/// Result of one event loop step.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppStatus {
    /// Frames are being shown; sleep one display tick.
    Running,
    /// Waiting for the producer to finish; sleep one shutdown poll period.
    Terminating,
    /// Producer joined. Leave the loop.
    Shutdown,
}

/// Takes at most one frame per tick and shows it.
pub struct DisplayLoop {
    frames: FrameReceiver,
    status_prefix: String,
    last_sequence: Option<u64>,
    presented: u64,
}

impl DisplayLoop {
    pub fn new(frames: FrameReceiver, status_prefix: impl Into<String>) -> Self {
        Self {
            frames,
            status_prefix: status_prefix.into(),
            last_sequence: None,
            presented: 0,
        }
    }

    /// Presents the oldest queued frame, if any, and returns its sequence number.
    pub fn tick(&mut self, display: &mut DisplayManager) -> Result<Option<u64>> {
        let Some(frame) = self.frames.try_take() else {
            return Ok(None);
        };
        if let Some(last) = self.last_sequence {
            if frame.sequence != last + 1 {
                warn!(
                    "DisplayLoop: sequence jumped from {} to {}",
                    last, frame.sequence
                );
            }
        }
        trace!("DisplayLoop: presenting frame {}", frame.sequence);
        display.present(frame.image)?;
        display.set_status(self.status_for(frame.sequence))?;
        self.last_sequence = Some(frame.sequence);
        self.presented += 1;
        Ok(Some(frame.sequence))
    }

    pub fn status_for(&self, sequence: u64) -> String {
        format!("{}: {}", self.status_prefix, sequence)
    }

    /// Discards queued frames so a bounded queue cannot hold the producer up.
    pub fn discard_pending(&self) -> usize {
        self.frames.drain()
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }
}

/// Lifecycle of the pipeline as seen from the UI thread.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PipelineState {
    Running,
    Terminating,
    Dead,
}

/// Stops the producer and waits for its completion sentinel.
pub struct ShutdownCoordinator {
    producer: FrameProducer,
    completion: CompletionReceiver,
    state: PipelineState,
    result: Option<Completion>,
}

impl ShutdownCoordinator {
    pub fn new(producer: FrameProducer, completion: CompletionReceiver) -> Self {
        Self {
            producer,
            completion,
            state: PipelineState::Running,
            result: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The sentinel, once taken.
    pub fn completion(&self) -> Option<&Completion> {
        self.result.as_ref()
    }

    /// Signals the producer to stop. Returns false if termination was
    /// already under way.
    pub fn request_termination(&mut self) -> bool {
        if self.state != PipelineState::Running {
            debug!(
                "ShutdownCoordinator: termination already requested ({:?})",
                self.state
            );
            return false;
        }
        info!("ShutdownCoordinator: termination requested");
        self.producer.stop();
        self.state = PipelineState::Terminating;
        true
    }

    /// While running, notices a producer that ended on its own.
    ///
    /// A faulted producer is joined and its fault returned as an error.
    pub fn check_producer(&mut self) -> Result<PipelineState> {
        if self.state != PipelineState::Running {
            return Ok(self.state);
        }
        if let Some(completion) = self.completion.try_take() {
            warn!(
                "ShutdownCoordinator: producer ended without a stop request ({:?})",
                completion.outcome
            );
            self.finish(completion)?;
        }
        Ok(self.state)
    }

    /// One shutdown poll: discard pending frames, then take the sentinel if it
    /// has been posted. Joins the producer once the sentinel is seen.
    pub fn poll(&mut self, display_loop: &DisplayLoop) -> Result<PipelineState> {
        if self.state != PipelineState::Terminating {
            return Ok(self.state);
        }
        let dropped = display_loop.discard_pending();
        if dropped > 0 {
            trace!("ShutdownCoordinator: discarded {} pending frames", dropped);
        }
        if let Some(completion) = self.completion.try_take() {
            self.finish(completion)?;
        }
        Ok(self.state)
    }

    fn finish(&mut self, completion: Completion) -> Result<()> {
        self.state = PipelineState::Dead;
        info!(
            "ShutdownCoordinator: producer finished after {} frames, joining",
            completion.frames
        );
        let joined = self.producer.join();
        let outcome = completion.outcome.clone();
        self.result = Some(completion);
        match (outcome, joined) {
            (Outcome::Faulted(reason), _) => bail!("producer faulted: {}", reason),
            (Outcome::Stopped, Err(e)) => Err(e.context("producer exited with an error")),
            (Outcome::Stopped, Ok(frames)) => {
                info!("ShutdownCoordinator: producer joined ({} frames)", frames);
                Ok(())
            }
        }
    }
}

/// The UI-thread event loop.
pub struct App {
    display: Option<DisplayManager>,
    display_loop: DisplayLoop,
    coordinator: ShutdownCoordinator,
    external_stop: fn() -> bool,
    tick: Duration,
    poll: Duration,
}

impl App {
    /// Wires the pieces together and shows the waiting status.
    ///
    /// `external_stop` is checked every step; returning true requests
    /// termination just like closing the display does.
    pub fn new(
        mut display: DisplayManager,
        display_loop: DisplayLoop,
        coordinator: ShutdownCoordinator,
        config: &Config,
        external_stop: fn() -> bool,
    ) -> Result<Self> {
        display.set_status(WAITING_STATUS)?;
        Ok(Self {
            display: Some(display),
            display_loop,
            coordinator,
            external_stop,
            tick: config.display.tick(),
            poll: config.shutdown.poll(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.coordinator.state()
    }

    pub fn display_loop(&self) -> &DisplayLoop {
        &self.display_loop
    }

    /// Runs one step of whichever loop is active.
    pub fn step(&mut self) -> Result<AppStatus> {
        match self.coordinator.state() {
            PipelineState::Running => self.step_running(),
            PipelineState::Terminating => self.step_terminating(),
            PipelineState::Dead => Ok(AppStatus::Shutdown),
        }
    }

    fn step_running(&mut self) -> Result<AppStatus> {
        let Some(display) = self.display.as_mut() else {
            bail!("display released while the pipeline is running");
        };

        let close_requested = display
            .poll_events()?
            .iter()
            .any(|event| *event == DisplayEvent::CloseRequested);
        if close_requested || (self.external_stop)() {
            self.coordinator.request_termination();
            return Ok(AppStatus::Terminating);
        }

        if self.coordinator.check_producer()? == PipelineState::Dead {
            return Ok(AppStatus::Shutdown);
        }

        self.display_loop.tick(display)?;
        Ok(AppStatus::Running)
    }

    fn step_terminating(&mut self) -> Result<AppStatus> {
        match self.coordinator.poll(&self.display_loop)? {
            PipelineState::Dead => Ok(AppStatus::Shutdown),
            _ => Ok(AppStatus::Terminating),
        }
    }

    /// Runs until the producer has been joined, then releases the display.
    ///
    /// Returns the completion sentinel. A producer fault is an error.
    pub fn run(mut self) -> Result<Completion> {
        info!("App: starting event loop");
        let result = loop {
            match self.step() {
                Ok(AppStatus::Running) => thread::sleep(self.tick),
                Ok(AppStatus::Terminating) => thread::sleep(self.poll),
                Ok(AppStatus::Shutdown) => {
                    info!("App: pipeline dead, exiting event loop");
                    break Ok(());
                }
                Err(e) => {
                    error!("App: event loop failed: {:#}", e);
                    break Err(e);
                }
            }
        };

        if let Some(display) = self.display.take() {
            debug!("App: releasing display");
            drop(display);
        }
        result?;

        info!(
            "App: presented {} frames",
            self.display_loop.presented()
        );
        self.coordinator
            .completion()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("event loop ended without a completion"))
    }
}
