//! Signal handling for graceful shutdown of follow mode.
//!
//! Uses flag-based handlers from `signal-hook::flag`:
//! - SIGINT/SIGTERM set a flag that the follow loop polls between cycles
//! - a second signal while the flag is already set exits immediately with code 1

use crate::cancel::CancelToken;
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Register termination signal handlers and return a token tied to them.
///
/// The returned token becomes cancelled when SIGINT or SIGTERM arrives.
/// The caller keeps polling it; nothing is interrupted preemptively.
pub fn setup_shutdown_handlers() -> Result<CancelToken, std::io::Error> {
    let term_now = Arc::new(AtomicBool::new(false));

    for sig in TERM_SIGNALS {
        // Only fires if term_now is already true (second signal)
        flag::register_conditional_shutdown(*sig, 1, Arc::clone(&term_now))?;

        // Arms the conditional shutdown for the next signal
        flag::register(*sig, Arc::clone(&term_now))?;
    }

    Ok(CancelToken::from_flag(term_now))
}
