// src/signals.rs
//! SIGINT/SIGTERM handling.
//!
//! The handler only flips an atomic flag; the event loop polls it each step
//! and routes it through the shutdown coordinator like a window close.

use anyhow::{Context, Result};
use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

static TERMINATION_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_termination_signal(_signal: libc::c_int) {
    TERMINATION_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the handler for SIGINT and SIGTERM.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_termination_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // Safety: the handler only touches an atomic.
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("Failed to install {} handler", signal))?;
        debug!("Installed {} handler", signal);
    }
    Ok(())
}

/// Whether SIGINT or SIGTERM has been received.
pub fn termination_requested() -> bool {
    TERMINATION_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::raise;

    #[test_log::test]
    fn sigterm_sets_the_flag_instead_of_killing_the_process() {
        install().unwrap();
        raise(Signal::SIGTERM).unwrap();
        assert!(termination_requested());
    }
}
