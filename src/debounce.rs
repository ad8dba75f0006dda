//! Gridsift - Debounced intents
//!
//! Keystrokes update a local buffer immediately but reach the table only
//! after a quiet period. Scheduling a new intent before the period elapses
//! cancels the pending one and restarts the timer.

use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::commands::{CommandSender, TableCommand};

/// Quiet period before an edit is committed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Cancellable single-slot timer that forwards one intent after `delay`
pub struct Debouncer {
    delay: Duration,
    sender: CommandSender,
    runtime: Handle,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create a debouncer whose timers run on `runtime`
    pub fn new(delay: Duration, sender: CommandSender, runtime: Handle) -> Self {
        Self {
            delay,
            sender,
            runtime,
            pending: None,
        }
    }

    /// Create a debouncer on the current tokio runtime.
    ///
    /// Panics outside a runtime context, like `tokio::spawn`.
    pub fn on_current(delay: Duration, sender: CommandSender) -> Self {
        Self::new(delay, sender, Handle::current())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending intent with `command` and restart the timer
    pub fn schedule(&mut self, command: TableCommand) {
        self.cancel();
        let delay = self.delay;
        let sender = self.sender.clone();
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the UI is shutting down
            let _ = sender.send(command);
        }));
    }

    /// Send `command` right away, dropping anything pending
    pub fn flush(&mut self, command: TableCommand) {
        self.cancel();
        let _ = self.sender.send(command);
    }

    /// Abort the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !handle.is_finished() {
                debug!("Cancelled pending debounced intent");
            }
            handle.abort();
        }
    }

    /// Whether a timer is still running
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command_channel;

    fn global(text: &str) -> TableCommand {
        TableCommand::SetGlobalFilter(text.into())
    }

    #[tokio::test(start_paused = true)]
    async fn test_commits_after_quiet_period() {
        let (tx, mut rx) = command_channel();
        let mut debouncer = Debouncer::on_current(DEFAULT_DEBOUNCE, tx);
        debouncer.schedule(global("bo"));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(rx.try_recv().ok(), Some(global("bo")));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_keystroke_restarts_timer() {
        let (tx, mut rx) = command_channel();
        let mut debouncer = Debouncer::on_current(DEFAULT_DEBOUNCE, tx);
        debouncer.schedule(global("b"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.schedule(global("bo"));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(rx.try_recv().ok(), Some(global("bo")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let (tx, mut rx) = command_channel();
        let mut debouncer = Debouncer::on_current(DEFAULT_DEBOUNCE, tx);
        debouncer.schedule(global("x"));
        assert!(debouncer.is_pending());
        debouncer.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());

        debouncer.schedule(global("y"));
        drop(debouncer);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_is_immediate() {
        let (tx, mut rx) = command_channel();
        let mut debouncer = Debouncer::on_current(DEFAULT_DEBOUNCE, tx);
        debouncer.schedule(global("a"));
        debouncer.flush(global("ab"));
        assert_eq!(rx.try_recv().ok(), Some(global("ab")));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }
}
