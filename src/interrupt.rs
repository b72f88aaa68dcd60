//! Ctrl+C handling for renders that may be downloading weights.

use crate::error::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// Exit status for a process stopped by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Hands out one cancellation token per render and cancels the live one on Ctrl+C.
///
/// A Ctrl+C with nothing in flight exits the process.
#[derive(Clone, Default)]
pub struct Interrupt {
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for Ctrl+C on a background thread for the rest of the process.
    pub fn install(&self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let interrupt = self.clone();

        std::thread::Builder::new()
            .name("ctrl-c".into())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        if let Err(e) = tokio::signal::ctrl_c().await {
                            tracing::warn!("Ctrl+C listener stopped: {}", e);
                            return;
                        }
                        if !interrupt.fire() {
                            std::process::exit(INTERRUPTED_EXIT_CODE);
                        }
                    }
                })
            })?;

        Ok(())
    }

    /// Start a render: a fresh token that the next Ctrl+C cancels.
    pub fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.lock() = Some(token.clone());
        token
    }

    /// The render finished; Ctrl+C goes back to exiting.
    pub fn disarm(&self) {
        self.lock().take();
    }

    /// Cancel the live token. Returns false when there was nothing left to cancel.
    pub fn fire(&self) -> bool {
        match self.lock().as_ref() {
            Some(token) if !token.is_cancelled() => {
                tracing::info!("Interrupted, cancelling the current render");
                token.cancel();
                true
            }
            _ => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_cancels_only_the_armed_token() {
        let interrupt = Interrupt::new();
        assert!(!interrupt.fire());

        let first = interrupt.arm();
        let second = interrupt.arm();
        assert!(interrupt.fire());
        assert!(second.is_cancelled());
        assert!(!first.is_cancelled());

        // a second Ctrl+C on the same render falls through to exiting
        assert!(!interrupt.fire());
    }

    #[test]
    fn disarmed_interrupt_has_nothing_to_cancel() {
        let interrupt = Interrupt::new();
        let token = interrupt.arm();
        interrupt.disarm();

        assert!(!interrupt.fire());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn clones_share_the_live_token() {
        let interrupt = Interrupt::new();
        let listener = interrupt.clone();
        let token = interrupt.arm();

        assert!(listener.fire());
        assert!(token.is_cancelled());
    }
}
