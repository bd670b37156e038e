//! A single-value channel used to hand a task's outcome from a lane worker back
//! to the submitting thread.
//!
//! The channel carries exactly one value from a single sender to a single receiver.
//! If the sender is dropped without sending (for example, the task closure was
//! discarded because its lane was closed), the receiver observes the channel as
//! closed and `recv` returns `None`.
//!
//! ## Channel Lifecycle
//!
//! 1. Pending: waiting for the value
//! 2. Ready: the value has been sent and can be taken
//! 3. Consumed: the value was taken, or the sender went away without sending

use std::{
    sync::{Arc, Condvar, Mutex},
    time::Duration,
};

/// Creates a new oneshot channel, returning a sender and receiver pair.
pub fn channel<T>() -> (OneshotSender<T>, OneshotReceiver<T>) {
    let cell = Arc::new(OneshotCell::new());
    (OneshotSender(cell.clone()), OneshotReceiver(cell))
}

/// The sending half of a oneshot channel.
///
/// Dropping the sender without calling [`send`](Self::send) closes the channel.
pub struct OneshotSender<T>(Arc<OneshotCell<T>>);

impl<T> OneshotSender<T> {
    /// Sends the value, consuming the sender.
    ///
    /// Returns `Err(value)` if the receiver already closed the channel.
    pub fn send(self, value: T) -> Result<(), T> {
        self.0.set(value)
    }
}

impl<T> Drop for OneshotSender<T> {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// The receiving half of a oneshot channel.
pub struct OneshotReceiver<T>(Arc<OneshotCell<T>>);

impl<T> OneshotReceiver<T> {
    /// Blocks until a value is received or the channel is closed.
    ///
    /// Returns `None` if the sender was dropped before sending, or if the value
    /// was already taken.
    pub fn recv(&self) -> Option<T> {
        self.0.wait()
    }

    /// Waits for a value for at most `timeout`.
    ///
    /// Returns `Err(RecvTimeoutError::Timeout)` if the channel is still pending
    /// when the timeout elapses.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Option<T>, std::sync::mpsc::RecvTimeoutError> {
        self.0
            .wait_for(timeout)
            .map_err(|_| std::sync::mpsc::RecvTimeoutError::Timeout)
    }

    /// Returns `true` if no value has been sent and the sender is still alive.
    pub fn is_pending(&self) -> bool {
        self.0.is_pending()
    }
}

struct OneshotCell<T> {
    value: Mutex<State<T>>,
    condvar: Condvar,
}

impl<T> OneshotCell<T> {
    fn new() -> OneshotCell<T> {
        OneshotCell {
            value: Mutex::new(State::Pending),
            condvar: Condvar::new(),
        }
    }

    fn set(&self, value: T) -> Result<(), T> {
        let res = self.value.lock().unwrap().set(value);
        self.condvar.notify_all();
        res
    }

    fn is_pending(&self) -> bool {
        self.value.lock().unwrap().is_pending()
    }

    /// Closes a still pending cell. A cell that already holds a value keeps it.
    fn cancel(&self) {
        self.value.lock().unwrap().cancel();
        self.condvar.notify_all();
    }

    fn wait(&self) -> Option<T> {
        let guard = self.value.lock().unwrap();
        self.condvar
            .wait_while(guard, |state| state.is_pending())
            .unwrap()
            .take()
    }

    fn wait_for(&self, timeout: Duration) -> Result<Option<T>, ()> {
        let guard = self.value.lock().unwrap();
        let (mut guard, res) = self
            .condvar
            .wait_timeout_while(guard, timeout, |state| state.is_pending())
            .unwrap();
        if res.timed_out() && guard.is_pending() {
            Err(())
        } else {
            Ok(guard.take())
        }
    }
}

/// State transitions:
/// - `Pending` -> `Ready(T)` when a value is sent
/// - `Pending` -> `Consumed` when the sender is dropped
/// - `Ready(T)` -> `Consumed` when the value is taken
enum State<T> {
    Pending,
    Ready(T),
    Consumed,
}

impl<T> State<T> {
    fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    fn set(&mut self, value: T) -> Result<(), T> {
        match self {
            State::Pending => {
                *self = State::Ready(value);
                Ok(())
            }
            State::Ready(_) | State::Consumed => Err(value),
        }
    }

    /// # Panics
    ///
    /// Panics if called while the state is still pending.
    fn take(&mut self) -> Option<T> {
        match std::mem::replace(self, State::Consumed) {
            State::Pending => panic!("State::take() unexpected: value is not ready yet"),
            State::Ready(value) => Some(value),
            State::Consumed => None,
        }
    }

    fn cancel(&mut self) {
        if self.is_pending() {
            *self = State::Consumed;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::oneshot::{self, OneshotReceiver, OneshotSender};

    #[test]
    fn test_oneshot_send_sync() {
        fn is_send_sync<T: Send + Sync>() {}
        is_send_sync::<OneshotReceiver<usize>>();
        is_send_sync::<OneshotSender<usize>>();
    }

    #[test]
    fn test_oneshot_basics() {
        let (tx, rx) = oneshot::channel::<usize>();
        assert!(rx.is_pending());
        tx.send(1).unwrap();
        assert!(!rx.is_pending());
        assert_eq!(rx.recv(), Some(1));
        assert!(rx.recv().is_none());

        let (tx, rx) = oneshot::channel::<usize>();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.send(7).unwrap();
        });
        assert_eq!(rx.recv(), Some(7));
    }

    #[test]
    fn test_oneshot_timeout() {
        let (tx, rx) = oneshot::channel::<usize>();
        let sender = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            tx.send(1).unwrap();
        });
        assert!(rx.recv_timeout(Duration::from_millis(10)).is_err());
        assert!(rx.is_pending());
        assert_eq!(rx.recv(), Some(1));
        sender.join().unwrap();
    }

    #[test]
    fn test_dropped_sender_closes_channel() {
        let (tx, rx) = oneshot::channel::<usize>();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            drop(tx);
        });
        assert!(rx.recv().is_none());
        assert!(!rx.is_pending());
    }
}
