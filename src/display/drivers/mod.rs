// src/display/drivers/mod.rs
//! Display driver implementations.

pub mod console;
pub mod headless;

pub use console::ConsoleDisplayDriver;
pub use headless::{HeadlessDisplayDriver, HeadlessProbe, HeadlessRecord};
