// src/display/driver.rs
//! DisplayDriver trait - minimal interface for a presentation surface.
//!
//! ## Threading Model
//! - DisplayDriver runs on the UI thread, together with the display loop and
//!   the shutdown coordinator
//! - The producer thread never touches the driver; it only enqueues images
//!
//! ## Lifecycle
//! 1. Construction - pure setup, no surface yet
//! 2. `handle_request(Init)` - create the surface, report its size
//! 3. Request/response loop
//! 4. `Drop` - release the surface (no explicit shutdown message)

use crate::display::messages::{DisplayError, DriverRequest, DriverResponse};

/// Minimal platform-specific display driver interface.
///
/// ## Request/Response Pairs
/// - `Init` → `InitComplete`
/// - `PollEvents` → `Events`
/// - `Present(image)` → `PresentComplete`
/// - `SetTitle(s)` → `TitleSet`
/// - `SetStatus(s)` → `StatusSet`
pub trait DisplayDriver {
    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError>;
}
