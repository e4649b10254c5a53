// src/signal.rs

//! Wires Ctrl+C to session cancellation.

use crate::session::Session;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Registers a Ctrl+C (SIGINT/SIGTERM) handler that cancels the run in
/// flight on `session`.
///
/// Cancellation is cooperative: the run stops at its next checkpoint and the
/// previously published result, if any, is kept.
///
/// # Errors
/// Returns an error if a handler has already been installed.
pub fn setup_signal_handler(session: Arc<Session>) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Ctrl+C signal received, cancelling the active run.");
        session.cancel();
    })
    .context("Failed to set Ctrl+C signal handler")
}
