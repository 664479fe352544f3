//! Fire-once timers delivered back to the controller's event loop
//!
//! A timer is a spawned task that sleeps and then sends a [`TimerEvent`] into
//! a channel drained by the same task that owns the controller, so timer
//! callbacks never run concurrently with key handling. Each timer can be
//! cancelled through its [`TimerHandle`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Sync the expected-symbol indicator after an accepted key
    AdvanceDisplay,
    /// End of the "receiving" window after the sequence completed
    CompletionWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerKind,
    /// Controller epoch at scheduling time; stale epochs are discarded
    pub epoch: u64,
}

/// Cancellation handle of a scheduled timer
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns timers that report into a single channel.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<TimerEvent>,
}

impl Scheduler {
    /// Create a scheduler and the receiver its timers fire into.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Deliver `event` after `delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, delay: Duration, event: TimerEvent) -> TimerHandle {
        // Deadline is taken now, not when the task is first polled
        let deadline = Instant::now() + delay;
        let tx = self.tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if tx.send(event).is_err() {
                tracing::debug!("Timer {:?} fired after the event loop stopped", event.kind);
            }
        });

        TimerHandle { task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: TimerKind) -> TimerEvent {
        TimerEvent { kind, epoch: 0 }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (scheduler, mut rx) = Scheduler::new();
        scheduler.schedule(Duration::from_millis(200), event(TimerKind::AdvanceDisplay));

        tokio::time::advance(Duration::from_millis(199)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "timer must not fire early");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(rx.recv().await, Some(event(TimerKind::AdvanceDisplay)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_in_deadline_order() {
        let (scheduler, mut rx) = Scheduler::new();
        scheduler.schedule(Duration::from_millis(3000), event(TimerKind::CompletionWindow));
        scheduler.schedule(Duration::from_millis(200), event(TimerKind::AdvanceDisplay));

        assert_eq!(rx.recv().await.map(|e| e.kind), Some(TimerKind::AdvanceDisplay));
        assert_eq!(rx.recv().await.map(|e| e.kind), Some(TimerKind::CompletionWindow));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (scheduler, mut rx) = Scheduler::new();
        let handle = scheduler.schedule(Duration::from_millis(200), event(TimerKind::AdvanceDisplay));
        handle.cancel();

        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
