//! Completion protocol between the DMA engine and the main loop
//!
//! The main loop raises the running flag, hands the engine a completion
//! routine together with a [`TransferContext`], and spins until the routine
//! lowers the flag again. The routine is the only writer of the outcome,
//! the main loop the only reader.
//!
//! ```text
//! main loop                       DMA engine
//! ---------                       ----------
//! begin()        running = 1
//! start transfer ────────────────▶ clocks bytes
//! while is_running() { rotor }
//!                 ◀──────────────── routine(status, ctx)
//!                                   ctx.finish(status): running = 0
//! last_status()
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use platform::TransferStatus;

/// Invoked by the engine exactly once per transfer, after the last byte.
pub type CompletionRoutine = fn(TransferStatus, &TransferContext);

/// Shared state of one in-flight transfer.
///
/// `Sync`, so it can live in a `static` and be reached from interrupt
/// context on the board.
#[derive(Debug, Default)]
pub struct TransferContext {
    running: AtomicBool,
    failed: AtomicBool,
    completed: AtomicU32,
}

impl TransferContext {
    /// Idle context with no transfer history
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            completed: AtomicU32::new(0),
        }
    }

    /// Mark a transfer as in flight. Clears the previous outcome.
    pub fn begin(&self) {
        self.failed.store(false, Ordering::Relaxed);
        self.running.store(true, Ordering::Release);
    }

    /// Record the outcome and clear the running flag.
    ///
    /// The Release store publishes the outcome to the main loop.
    pub fn finish(&self, status: TransferStatus) {
        match status {
            TransferStatus::Completed => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            TransferStatus::Failed => self.failed.store(true, Ordering::Relaxed),
        }
        self.running.store(false, Ordering::Release);
    }

    /// A transfer is in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Outcome of the last transfer; `None` while one is still running.
    pub fn last_status(&self) -> Option<TransferStatus> {
        if self.is_running() {
            return None;
        }
        if self.failed.load(Ordering::Relaxed) {
            Some(TransferStatus::Failed)
        } else {
            Some(TransferStatus::Completed)
        }
    }

    /// Number of transfers that finished without error
    pub fn completed_transfers(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }
}

/// Routine the kernel registers: record the outcome, release the main loop.
pub fn spi_completion_routine(status: TransferStatus, context: &TransferContext) {
    context.finish(status);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_is_idle() {
        let ctx = TransferContext::new();
        assert!(!ctx.is_running());
        assert_eq!(ctx.completed_transfers(), 0);
    }

    #[test]
    fn no_status_while_running() {
        let ctx = TransferContext::new();
        ctx.begin();
        assert!(ctx.is_running());
        assert_eq!(ctx.last_status(), None);
    }

    #[test]
    fn routine_clears_flag_and_records_success() {
        let ctx = TransferContext::new();
        ctx.begin();
        spi_completion_routine(TransferStatus::Completed, &ctx);
        assert!(!ctx.is_running());
        assert_eq!(ctx.last_status(), Some(TransferStatus::Completed));
        assert_eq!(ctx.completed_transfers(), 1);
    }

    #[test]
    fn routine_records_failure() {
        let ctx = TransferContext::new();
        ctx.begin();
        spi_completion_routine(TransferStatus::Failed, &ctx);
        assert!(!ctx.is_running());
        assert_eq!(ctx.last_status(), Some(TransferStatus::Failed));
        assert_eq!(ctx.completed_transfers(), 0);
    }

    #[test]
    fn begin_clears_previous_failure() {
        let ctx = TransferContext::new();
        ctx.begin();
        ctx.finish(TransferStatus::Failed);
        ctx.begin();
        ctx.finish(TransferStatus::Completed);
        assert_eq!(ctx.last_status(), Some(TransferStatus::Completed));
    }

    #[test]
    fn context_is_shared_across_threads() {
        static CTX: TransferContext = TransferContext::new();
        CTX.begin();
        let handle = std::thread::spawn(|| CTX.finish(TransferStatus::Completed));
        while CTX.is_running() {
            std::hint::spin_loop();
        }
        handle.join().ok();
        assert_eq!(CTX.last_status(), Some(TransferStatus::Completed));
    }
}
