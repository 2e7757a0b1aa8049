// src/display/drivers/console.rs
//! Terminal display driver.
//!
//! Draws each image with 24-bit SGR colors using the upper half block, so one
//! terminal cell shows two vertically stacked pixels. The image is scaled
//! nearest-neighbour to fit the terminal below a one-line status bar.
//!
//! Input is read in raw mode without blocking: `q`, Esc or Ctrl-C request
//! close. When stdin is not a terminal, input is ignored entirely.

use crate::color::Rgb;
use crate::display::driver::DisplayDriver;
use crate::display::messages::{DisplayError, DisplayEvent, DriverRequest, DriverResponse};
use crate::raster::Image;

use anyhow::{Context, Result};
use libc::{STDIN_FILENO, STDOUT_FILENO, TIOCGWINSZ, winsize};
use std::fmt::Write as _;
use std::io::{self, Read, Write, stdin, stdout};
use std::mem;
use std::os::unix::io::RawFd;
use termios::{ECHO, ICANON, ISIG, TCSANOW, Termios, VMIN, VTIME, tcsetattr};

use log::{debug, error, info, trace, warn};

const CURSOR_HIDE: &str = "\x1b[?25l";
const CURSOR_SHOW: &str = "\x1b[?25h";
const CLEAR_SCREEN_AND_HOME: &str = "\x1b[2J\x1b[H";
const SGR_RESET: &str = "\x1b[0m";
const CLEAR_LINE: &str = "\x1b[2K";
const UPPER_HALF_BLOCK: char = '\u{2580}';

const KEY_QUIT: u8 = b'q';
const KEY_ESC: u8 = 0x1b;
const KEY_CTRL_C: u8 = 0x03;

const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;

/// Rows reserved above the image for the status line.
const STATUS_ROWS: u16 = 1;

pub struct ConsoleDisplayDriver {
    original_termios: Option<Termios>,
    cols: u16,
    rows: u16,
    status: String,
    input_buffer: [u8; 64],
    out: String,
}

impl ConsoleDisplayDriver {
    /// Puts the terminal into raw mode (if stdin is a terminal) and hides the cursor.
    pub fn new() -> Result<Self> {
        info!("Creating new ConsoleDisplayDriver.");
        let original_termios = if is_tty(STDIN_FILENO) {
            match Termios::from_fd(STDIN_FILENO) {
                Ok(ts) => Some(ts),
                Err(e) => {
                    warn!(
                        "Failed to get initial termios: {}. Proceeding without raw mode.",
                        e
                    );
                    None
                }
            }
        } else {
            info!("ConsoleDisplayDriver: stdin is not a terminal, keyboard input disabled.");
            None
        };

        if let Some(ref ots) = original_termios {
            let mut raw_termios = *ots;
            raw_termios.c_lflag &= !(ECHO | ICANON | ISIG);
            raw_termios.c_cc[VMIN] = 0;
            raw_termios.c_cc[VTIME] = 0;
            tcsetattr(STDIN_FILENO, TCSANOW, &raw_termios)
                .context("ConsoleDisplayDriver: Failed to set raw terminal attributes")?;
            debug!("ConsoleDisplayDriver: Terminal set to raw mode.");
        }

        Ok(Self {
            original_termios,
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            status: String::new(),
            input_buffer: [0u8; 64],
            out: String::new(),
        })
    }

    fn write_out(&mut self) -> io::Result<()> {
        let mut handle = stdout().lock();
        handle.write_all(self.out.as_bytes())?;
        handle.flush()?;
        self.out.clear();
        Ok(())
    }

    fn queue_status(&mut self) {
        let width = self.cols as usize;
        let status: String = self.status.chars().take(width).collect();
        let _ = write!(self.out, "\x1b[1;1H{}{}{}", SGR_RESET, CLEAR_LINE, status);
    }

    fn poll_size(&mut self, events: &mut Vec<DisplayEvent>) {
        match get_terminal_size_cells(STDOUT_FILENO) {
            Ok((cols, rows)) if (cols, rows) != (self.cols, self.rows) => {
                info!(
                    "ConsoleDisplayDriver: Terminal resized from {}x{} to {}x{} cells.",
                    self.cols, self.rows, cols, rows
                );
                self.cols = cols;
                self.rows = rows;
                self.out.push_str(CLEAR_SCREEN_AND_HOME);
                events.push(DisplayEvent::Resize {
                    width: cols as u32,
                    height: rows as u32,
                });
            }
            Ok(_) => {}
            Err(e) => trace!("ConsoleDisplayDriver: size unavailable: {:#}", e),
        }
    }

    fn poll_input(&mut self, events: &mut Vec<DisplayEvent>) -> io::Result<()> {
        if self.original_termios.is_none() {
            return Ok(());
        }
        match stdin().read(&mut self.input_buffer) {
            // VMIN=0/VTIME=0: zero bytes means nothing pending, not EOF.
            Ok(0) => {}
            Ok(n) => {
                trace!("ConsoleDisplayDriver: Read {} bytes from stdin.", n);
                if self.input_buffer[..n]
                    .iter()
                    .any(|&b| matches!(b, KEY_QUIT | KEY_ESC | KEY_CTRL_C))
                {
                    info!("ConsoleDisplayDriver: Quit key pressed.");
                    events.push(DisplayEvent::CloseRequested);
                }
            }
            Err(ref e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        info!("ConsoleDisplayDriver: Cleaning up...");
        print!("{}{}\r\n", SGR_RESET, CURSOR_SHOW);
        stdout()
            .flush()
            .context("ConsoleDisplayDriver: Failed to flush for CURSOR_SHOW cleanup")?;
        if let Some(original_termios) = self.original_termios.take() {
            debug!("ConsoleDisplayDriver: Restoring original terminal attributes.");
            tcsetattr(STDIN_FILENO, TCSANOW, &original_termios)
                .context("ConsoleDisplayDriver: Failed to restore original terminal attributes")?;
        }
        Ok(())
    }
}

impl DisplayDriver for ConsoleDisplayDriver {
    fn handle_request(&mut self, request: DriverRequest) -> Result<DriverResponse, DisplayError> {
        match request {
            DriverRequest::Init => {
                let (cols, rows) = get_terminal_size_cells(STDOUT_FILENO)
                    .unwrap_or((DEFAULT_COLS, DEFAULT_ROWS));
                self.cols = cols;
                self.rows = rows;
                info!(
                    "ConsoleDisplayDriver: Initial terminal size: {}x{} cells.",
                    cols, rows
                );
                self.out.push_str(CURSOR_HIDE);
                self.out.push_str(CLEAR_SCREEN_AND_HOME);
                self.write_out()?;
                Ok(DriverResponse::InitComplete {
                    width: cols as u32,
                    height: rows as u32,
                })
            }
            DriverRequest::PollEvents => {
                let mut events = Vec::new();
                self.poll_size(&mut events);
                self.poll_input(&mut events)?;
                if !self.out.is_empty() {
                    self.write_out()?;
                }
                Ok(DriverResponse::Events(events))
            }
            DriverRequest::Present(image) => {
                let image_rows = self.rows.saturating_sub(STATUS_ROWS);
                let _ = write!(self.out, "\x1b[{};1H", STATUS_ROWS + 1);
                render_half_blocks(&image, self.cols as usize, image_rows as usize, &mut self.out);
                self.write_out()?;
                Ok(DriverResponse::PresentComplete)
            }
            DriverRequest::SetTitle(title) => {
                let _ = write!(self.out, "\x1b]0;{}\x07", title);
                self.write_out()?;
                Ok(DriverResponse::TitleSet)
            }
            DriverRequest::SetStatus(status) => {
                self.status = status;
                self.queue_status();
                self.write_out()?;
                Ok(DriverResponse::StatusSet)
            }
        }
    }
}

impl Drop for ConsoleDisplayDriver {
    fn drop(&mut self) {
        info!("ConsoleDisplayDriver: Dropping instance, attempting cleanup.");
        if let Err(e) = self.cleanup() {
            error!("ConsoleDisplayDriver: Error during cleanup in drop: {}", e);
        }
    }
}

/// Nearest-neighbour sample of `image` on a `cols × pixel_rows` grid, row-major.
pub fn downsample(image: &Image, cols: usize, pixel_rows: usize) -> Vec<Rgb> {
    let mut out = Vec::with_capacity(cols * pixel_rows);
    if image.width() == 0 || image.height() == 0 {
        return out;
    }
    for row in 0..pixel_rows {
        let y = row * image.height() / pixel_rows;
        for col in 0..cols {
            let x = col * image.width() / cols;
            out.push(image.pixel(x, y).unwrap_or(Rgb::BLACK));
        }
    }
    out
}

/// Appends escape sequences drawing `image` into `cols × rows` cells.
pub fn render_half_blocks(image: &Image, cols: usize, rows: usize, out: &mut String) {
    if cols == 0 || rows == 0 {
        return;
    }
    let samples = downsample(image, cols, rows * 2);
    for row in 0..rows {
        let top = &samples[(2 * row) * cols..(2 * row + 1) * cols];
        let bottom = &samples[(2 * row + 1) * cols..(2 * row + 2) * cols];
        let mut last: Option<(Rgb, Rgb)> = None;
        for (&fg, &bg) in top.iter().zip(bottom) {
            if last != Some((fg, bg)) {
                let _ = write!(
                    out,
                    "\x1b[38;2;{};{};{};48;2;{};{};{}m",
                    fg.0, fg.1, fg.2, bg.0, bg.1, bg.2
                );
                last = Some((fg, bg));
            }
            out.push(UPPER_HALF_BLOCK);
        }
        out.push_str(SGR_RESET);
        if row + 1 < rows {
            out.push_str("\r\n");
        }
    }
}

fn is_tty(fd: RawFd) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

fn get_terminal_size_cells(fd: RawFd) -> Result<(u16, u16)> {
    unsafe {
        let mut winsz: winsize = mem::zeroed();
        if libc::ioctl(fd, TIOCGWINSZ, &mut winsz) == -1 {
            return Err(anyhow::Error::from(io::Error::last_os_error())
                .context("ConsoleDisplayDriver: ioctl(TIOCGWINSZ) failed"));
        }
        let cols = if winsz.ws_col == 0 {
            DEFAULT_COLS
        } else {
            winsz.ws_col
        };
        let rows = if winsz.ws_row == 0 {
            DEFAULT_ROWS
        } else {
            winsz.ws_row
        };
        Ok((cols, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{ColorMode, Raster};

    fn quadrants() -> Image {
        // 4x4: left half red, right half blue, bottom-right green.
        let mut raster = Raster::new(ColorMode::Direct, 4, 4).unwrap();
        let px = raster.direct_mut().unwrap();
        for y in 0..4 {
            for x in 0..4 {
                px[y * 4 + x] = match (x < 2, y < 2) {
                    (true, _) => [255, 0, 0],
                    (false, true) => [0, 0, 255],
                    (false, false) => [0, 255, 0],
                };
            }
        }
        Image::from_raster(&raster, None).unwrap()
    }

    #[test_log::test]
    fn downsample_picks_nearest_pixels() {
        let samples = downsample(&quadrants(), 2, 2);
        assert_eq!(
            samples,
            vec![Rgb(255, 0, 0), Rgb(0, 0, 255), Rgb(255, 0, 0), Rgb(0, 255, 0)]
        );
    }

    #[test_log::test]
    fn downsample_can_upscale() {
        let samples = downsample(&quadrants(), 8, 8);
        assert_eq!(samples.len(), 64);
        assert_eq!(samples[0], Rgb(255, 0, 0));
        assert_eq!(samples[63], Rgb(0, 255, 0));
    }

    #[test_log::test]
    fn half_blocks_pair_top_and_bottom_pixels() {
        let mut out = String::new();
        render_half_blocks(&quadrants(), 2, 1, &mut out);
        assert_eq!(out.matches(UPPER_HALF_BLOCK).count(), 2);
        assert!(out.contains("\x1b[38;2;255;0;0;48;2;255;0;0m"));
        assert!(out.contains("\x1b[38;2;0;0;255;48;2;0;255;0m"));
        assert!(!out.contains("\r\n"));
    }

    #[test_log::test]
    fn repeated_colors_are_not_re_emitted() {
        let raster = Raster::new(ColorMode::Direct, 2, 2).unwrap();
        let image = Image::from_raster(&raster, None).unwrap();
        let mut out = String::new();
        render_half_blocks(&image, 10, 3, &mut out);
        assert_eq!(out.matches("\x1b[38;2;").count(), 3);
        assert_eq!(out.matches("\r\n").count(), 2);
    }

    #[test_log::test]
    fn empty_target_renders_nothing() {
        let mut out = String::new();
        render_half_blocks(&quadrants(), 0, 5, &mut out);
        assert!(out.is_empty());
    }
}
