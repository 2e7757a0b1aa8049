//! Headless display driver. Accepts every request and shows nothing.
//!
//! Used for batch runs (`--display headless`) and by the UI-side tests,
//! which read back what was presented through a [`HeadlessProbe`].

use crate::display::driver::DisplayDriver;
use crate::display::messages::{DisplayError, DisplayEvent, DriverRequest, DriverResponse};
use log::{info, trace};
use std::sync::{Arc, Mutex};

/// Nominal surface size reported on Init.
const HEADLESS_WIDTH: u32 = 1024;
const HEADLESS_HEIGHT: u32 = 768;

/// What the driver has been asked to do so far.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeadlessRecord {
    pub title: Option<String>,
    pub statuses: Vec<String>,
    pub presented: u64,
    /// Size of the most recently presented image.
    pub last_size: Option<(usize, usize)>,
}

/// Shared view into a [`HeadlessDisplayDriver`]'s record.
pub type HeadlessProbe = Arc<Mutex<HeadlessRecord>>;

pub struct HeadlessDisplayDriver {
    initialized: bool,
    presented: u64,
    close_after: Option<u64>,
    close_sent: bool,
    probe: Option<HeadlessProbe>,
}

impl HeadlessDisplayDriver {
    pub fn new() -> Self {
        info!("HeadlessDisplayDriver::new()");
        Self {
            initialized: false,
            presented: 0,
            close_after: None,
            close_sent: false,
            probe: None,
        }
    }

    /// Report `CloseRequested` once `frames` images have been presented.
    pub fn close_after(mut self, frames: u64) -> Self {
        self.close_after = Some(frames);
        self
    }

    /// Record requests into a probe the caller keeps a handle to.
    pub fn with_probe(mut self) -> (Self, HeadlessProbe) {
        let probe = HeadlessProbe::default();
        self.probe = Some(Arc::clone(&probe));
        (self, probe)
    }

    fn record(&self, f: impl FnOnce(&mut HeadlessRecord)) {
        if let Some(probe) = &self.probe {
            // A poisoned probe only means a test thread panicked; keep recording.
            let mut record = match probe.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut record);
        }
    }
}

impl Default for HeadlessDisplayDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayDriver for HeadlessDisplayDriver {
    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        if !self.initialized && !matches!(request, DriverRequest::Init) {
            return Err(DisplayError::NotInitialized);
        }
        match request {
            DriverRequest::Init => {
                info!("HeadlessDisplayDriver: Init - returning metrics");
                self.initialized = true;
                Ok(DriverResponse::InitComplete {
                    width: HEADLESS_WIDTH,
                    height: HEADLESS_HEIGHT,
                })
            }
            DriverRequest::PollEvents => {
                let mut events = Vec::new();
                if let Some(limit) = self.close_after {
                    if !self.close_sent && self.presented >= limit {
                        info!(
                            "HeadlessDisplayDriver: {} frames presented, requesting close",
                            self.presented
                        );
                        self.close_sent = true;
                        events.push(DisplayEvent::CloseRequested);
                    }
                }
                Ok(DriverResponse::Events(events))
            }
            DriverRequest::Present(image) => {
                trace!(
                    "HeadlessDisplayDriver: Present {}x{}",
                    image.width(),
                    image.height()
                );
                self.presented += 1;
                let presented = self.presented;
                self.record(|r| {
                    r.presented = presented;
                    r.last_size = Some((image.width(), image.height()));
                });
                Ok(DriverResponse::PresentComplete)
            }
            DriverRequest::SetTitle(title) => {
                info!("HeadlessDisplayDriver: SetTitle '{}'", title);
                self.record(|r| r.title = Some(title));
                Ok(DriverResponse::TitleSet)
            }
            DriverRequest::SetStatus(status) => {
                trace!("HeadlessDisplayDriver: SetStatus '{}'", status);
                self.record(|r| r.statuses.push(status));
                Ok(DriverResponse::StatusSet)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{ColorMode, Image, Raster};

    fn image() -> Image {
        let raster = Raster::new(ColorMode::Direct, 3, 2).unwrap();
        Image::from_raster(&raster, None).unwrap()
    }

    #[test_log::test]
    fn rejects_requests_before_init() {
        let mut driver = HeadlessDisplayDriver::new();
        assert!(matches!(
            driver.handle_request(DriverRequest::PollEvents),
            Err(DisplayError::NotInitialized)
        ));
    }

    #[test_log::test]
    fn records_title_status_and_presents() {
        let (mut driver, probe) = HeadlessDisplayDriver::new().with_probe();
        driver.handle_request(DriverRequest::Init).unwrap();
        driver
            .handle_request(DriverRequest::SetTitle("Image Generator".into()))
            .unwrap();
        driver
            .handle_request(DriverRequest::SetStatus("Waiting".into()))
            .unwrap();
        driver.handle_request(DriverRequest::Present(image())).unwrap();

        let record = probe.lock().unwrap();
        assert_eq!(record.title.as_deref(), Some("Image Generator"));
        assert_eq!(record.statuses, vec!["Waiting".to_string()]);
        assert_eq!(record.presented, 1);
        assert_eq!(record.last_size, Some((3, 2)));
    }

    #[test_log::test]
    fn close_is_requested_once_after_the_limit() {
        let mut driver = HeadlessDisplayDriver::new().close_after(2);
        driver.handle_request(DriverRequest::Init).unwrap();
        let poll = |d: &mut HeadlessDisplayDriver| match d
            .handle_request(DriverRequest::PollEvents)
            .unwrap()
        {
            DriverResponse::Events(events) => events,
            other => panic!("unexpected {other:?}"),
        };

        driver.handle_request(DriverRequest::Present(image())).unwrap();
        assert!(poll(&mut driver).is_empty());
        driver.handle_request(DriverRequest::Present(image())).unwrap();
        assert_eq!(poll(&mut driver), vec![DisplayEvent::CloseRequested]);
        assert!(poll(&mut driver).is_empty());
    }
}
