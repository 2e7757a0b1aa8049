// src/display/messages.rs
//! Message types for communication between DisplayManager and DisplayDriver.
//!
//! Images are handed to the driver by value; the driver owns them from then on.

use crate::raster::Image;

/// Requests sent from DisplayManager to DisplayDriver.
#[derive(Debug, Clone)]
pub enum DriverRequest {
    /// Create the surface and report its size.
    Init,

    /// Fetch pending native events.
    PollEvents,

    /// Show an image.
    Present(Image),

    /// Set the window title.
    SetTitle(String),

    /// Replace the human-readable status line.
    SetStatus(String),
}

/// Responses sent from DisplayDriver to DisplayManager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverResponse {
    /// Surface ready; size in display units (pixels or terminal cells).
    InitComplete { width: u32, height: u32 },

    /// Native events that occurred since the last poll.
    Events(Vec<DisplayEvent>),

    PresentComplete,

    TitleSet,

    StatusSet,
}

/// Platform-agnostic display events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// User asked to close the window / quit.
    CloseRequested,

    /// Surface size changed.
    Resize { width: u32, height: u32 },
}

/// Errors reported by a display driver.
#[derive(thiserror::Error, Debug)]
pub enum DisplayError {
    #[error("display driver not initialized")]
    NotInitialized,

    #[error("unexpected driver response: expected {expected}, got {got:?}")]
    UnexpectedResponse {
        expected: &'static str,
        got: DriverResponse,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
