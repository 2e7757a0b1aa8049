// src/display/mod.rs
//! Message-based display system.
//!
//! - DisplayDriver: presentation primitives (terminal, headless)
//! - DisplayManager: typed wrapper over the request/response protocol
//! - Messages: Request/Response protocol for communication

pub mod driver;
pub mod drivers;
pub mod manager;
pub mod messages;

pub use driver::DisplayDriver;
pub use drivers::{ConsoleDisplayDriver, HeadlessDisplayDriver};
pub use manager::DisplayManager;
pub use messages::{DisplayError, DisplayEvent, DriverRequest, DriverResponse};
