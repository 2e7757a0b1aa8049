// src/display/manager.rs
//! DisplayManager - typed wrapper around a DisplayDriver.

use crate::display::driver::DisplayDriver;
use crate::display::messages::{DisplayError, DisplayEvent, DriverRequest, DriverResponse};
use crate::raster::Image;
use anyhow::{Context, Result};
use log::{debug, info};

/// Owns the driver and checks each response against its request.
pub struct DisplayManager {
    driver: Box<dyn DisplayDriver>,
}

impl DisplayManager {
    /// Initializes `driver` and sets the window title.
    pub fn new(mut driver: Box<dyn DisplayDriver>, title: &str) -> Result<Self> {
        info!("DisplayManager: Initializing driver...");
        let response = driver
            .handle_request(DriverRequest::Init)
            .context("Failed to initialize display driver")?;

        match response {
            DriverResponse::InitComplete { width, height } => {
                info!("DisplayManager: Initialized - {}x{}", width, height);
            }
            got => {
                return Err(DisplayError::UnexpectedResponse {
                    expected: "InitComplete",
                    got,
                })
                .context("Display driver init handshake failed");
            }
        }

        let mut manager = Self { driver };
        manager.set_title(title)?;
        Ok(manager)
    }

    /// Pending events.
    pub fn poll_events(&mut self) -> Result<Vec<DisplayEvent>> {
        let events = match self.driver.handle_request(DriverRequest::PollEvents)? {
            DriverResponse::Events(events) => events,
            got => {
                return Err(DisplayError::UnexpectedResponse {
                    expected: "Events",
                    got,
                }
                .into())
            }
        };
        for event in &events {
            if let DisplayEvent::Resize { width, height } = *event {
                debug!("DisplayManager: surface resized to {}x{}", width, height);
            }
        }
        Ok(events)
    }

    pub fn present(&mut self, image: Image) -> Result<()> {
        self.driver
            .handle_request(DriverRequest::Present(image))
            .context("Failed to present frame")?;
        Ok(())
    }

    pub fn set_status(&mut self, status: impl Into<String>) -> Result<()> {
        self.driver
            .handle_request(DriverRequest::SetStatus(status.into()))
            .context("Failed to set status")?;
        Ok(())
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        self.driver
            .handle_request(DriverRequest::SetTitle(title.into()))
            .context("Failed to set title")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::HeadlessDisplayDriver;

    /// Answers every request with the same response.
    struct FixedDriver(DriverResponse);

    impl DisplayDriver for FixedDriver {
        fn handle_request(
            &mut self,
            _request: DriverRequest,
        ) -> Result<DriverResponse, DisplayError> {
            Ok(self.0.clone())
        }
    }

    #[test_log::test]
    fn init_handshake_sets_the_title() {
        let (driver, probe) = HeadlessDisplayDriver::new().with_probe();
        let mut manager = DisplayManager::new(Box::new(driver), "Image Generator").unwrap();
        assert!(manager.poll_events().unwrap().is_empty());
        assert_eq!(probe.lock().unwrap().title.as_deref(), Some("Image Generator"));
    }

    #[test_log::test]
    fn wrong_init_response_is_rejected() {
        let driver = FixedDriver(DriverResponse::StatusSet);
        let err = DisplayManager::new(Box::new(driver), "t").err().unwrap();
        assert!(format!("{err:#}").contains("expected InitComplete"), "{err:#}");
    }

    #[test_log::test]
    fn resize_events_are_passed_through() {
        let resize = DisplayEvent::Resize {
            width: 120,
            height: 40,
        };
        let driver = FixedDriver(DriverResponse::Events(vec![resize]));
        let mut manager = DisplayManager {
            driver: Box::new(driver),
        };
        assert_eq!(manager.poll_events().unwrap(), vec![resize]);
    }
}
