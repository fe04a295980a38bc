//! Trailing-edge debounce.
//!
//! `Debounce` is the pure timing rule with an injected clock; `Debouncer`
//! runs it on a tokio task and emits settled values on a channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// A value settles once it has been the input, unchanged, for `delay`.
/// Every change restarts the window and cancels the pending value.
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
    settled: Option<T>,
}

impl<T: Clone + PartialEq> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            settled: None,
        }
    }

    /// Start out already settled on `value`.
    pub fn with_initial(delay: Duration, value: T) -> Self {
        Self {
            delay,
            pending: None,
            settled: Some(value),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Last settled value.
    pub fn current(&self) -> Option<&T> {
        self.settled.as_ref()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }

    /// Feed the latest raw input observed at `now`.
    pub fn update(&mut self, value: T, now: Instant) {
        if let Some((pending, _)) = &self.pending {
            if *pending == value {
                return;
            }
        }
        if self.settled.as_ref() == Some(&value) {
            // Back to what is already settled: nothing left to emit.
            self.pending = None;
            return;
        }
        self.pending = Some((value, now));
    }

    /// When the pending value will settle, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, since)| *since + self.delay)
    }

    /// Settle the pending value if its window has elapsed by `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }
        let (value, _) = self.pending.take()?;
        self.settled = Some(value.clone());
        Some(value)
    }

    /// Drop the pending value without settling it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Forget everything, including the settled value.
    pub fn reset(&mut self) {
        self.pending = None;
        self.settled = None;
    }
}

enum Command<T> {
    Update(T),
    Cancel,
    Reset,
}

/// Async driver for [`Debounce`]. Dropping it stops the task.
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
    handle: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + 'static,
{
    /// Spawn the timer task. Settled values arrive on the returned receiver.
    pub fn spawn(delay: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        Self::spawn_with(Debounce::new(delay))
    }

    pub fn spawn_with(mut state: Debounce<T>) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command<T>>();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            loop {
                let deadline = state.deadline();
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(Command::Update(value)) => state.update(value, Instant::now()),
                        Some(Command::Cancel) => state.cancel(),
                        Some(Command::Reset) => state.reset(),
                        None => break,
                    },
                    _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                        if let Some(value) = state.poll(Instant::now()) {
                            if out_tx.send(value).is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        (Self { tx, handle }, out_rx)
    }

    pub fn update(&self, value: T) {
        let _ = self.tx.send(Command::Update(value));
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(Command::Cancel);
    }

    pub fn reset(&self) {
        let _ = self.tx.send(Command::Reset);
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
