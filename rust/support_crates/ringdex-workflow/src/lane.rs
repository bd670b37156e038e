//! Single-worker execution lanes.
//!
//! A [`Lane`] owns a bounded FIFO of tasks and exactly one worker thread that
//! drains it. Tasks on the same lane run one at a time, in the order they were
//! accepted. The bound counts only *waiting* tasks: a lane with capacity `c`
//! holds at most `c` queued tasks plus the one currently running, so a
//! capacity of zero turns every submission into a rendezvous with an idle
//! worker.

use std::{
    collections::VecDeque,
    sync::{Arc, Condvar, Mutex},
    thread::{self, ThreadId},
};

use ringdex_common::{Result, error::Error};

/// A unit of work executed by a lane worker.
pub(crate) type LaneTask = Box<dyn FnOnce() + Send + 'static>;

/// One execution lane: a bounded task queue plus its dedicated worker thread.
pub(crate) struct Lane {
    index: usize,
    queue: LaneQueue,
    worker_id: ThreadId,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Lane {
    /// Creates the lane and starts its worker thread.
    pub fn spawn(index: usize, capacity: usize) -> Result<Lane> {
        let queue = LaneQueue::new(capacity);
        let worker_queue = queue.clone();
        let worker = thread::Builder::new()
            .name(format!("ringdex-lane-{index}"))
            .spawn(move || Self::thread_fn(index, worker_queue))
            .map_err(|e| Error::invalid_operation(format!("spawn lane {index} worker: {e}")))?;
        Ok(Lane {
            index,
            queue,
            worker_id: worker.thread().id(),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` when called from this lane's worker thread.
    pub fn is_current_worker(&self) -> bool {
        thread::current().id() == self.worker_id
    }

    /// Appends `task` to the lane, blocking while the lane is at capacity.
    ///
    /// Fails if the lane has been closed; the task is dropped without running.
    pub fn submit(&self, task: LaneTask) -> Result<()> {
        self.queue.enqueue(task).map_err(|_| {
            Error::invalid_operation(format!("submit to closed lane {}", self.index))
        })
    }

    /// Stops accepting tasks. Already queued tasks still run.
    pub fn close(&self) {
        self.queue.close();
    }

    /// Waits for the worker thread to exit. Must follow [`close`](Self::close)
    /// and must not be called from the worker itself.
    pub fn join(&self) -> Result<()> {
        let worker = self.worker.lock().unwrap().take();
        match worker {
            Some(handle) => handle
                .join()
                .map_err(|_| Error::barrier(format!("lane {} worker panicked", self.index))),
            None => Ok(()),
        }
    }

    fn thread_fn(index: usize, queue: LaneQueue) {
        log::debug!("lane {index} worker started");
        while let Some(task) = queue.next() {
            task();
            queue.complete();
        }
        log::debug!("lane {index} worker stopped");
    }
}

/// The blocking FIFO behind a lane.
///
/// Producers are arbitrary submitting threads, the single consumer is the
/// lane worker. The worker marks the lane busy when it dequeues a task and
/// idle again once the task has returned, so the running task keeps occupying
/// a slot until it completes.
#[derive(Clone)]
struct LaneQueue {
    inner: Arc<Inner>,
}

impl LaneQueue {
    fn new(capacity: usize) -> Self {
        LaneQueue {
            inner: Arc::new(Inner {
                state: Mutex::new(LaneState {
                    tasks: VecDeque::new(),
                    capacity,
                    running: false,
                    closed: false,
                }),
                not_empty: Condvar::new(),
                has_room: Condvar::new(),
            }),
        }
    }

    /// Enqueues a task, blocking until there is room.
    ///
    /// Returns `Err(task)` if the queue is closed, either before the call or
    /// while waiting for room.
    fn enqueue(&self, task: LaneTask) -> std::result::Result<(), LaneTask> {
        let mut state = self.inner.state.lock().unwrap();
        loop {
            if state.closed {
                return Err(task);
            }
            if state.has_room() {
                break;
            }
            state = self.inner.has_room.wait(state).unwrap();
        }

        state.tasks.push_back(task);
        drop(state);
        self.inner.not_empty.notify_one();
        Ok(())
    }

    /// Takes the next task for the worker, marking the lane busy.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    fn next(&self) -> Option<LaneTask> {
        let mut state = self.inner.state.lock().unwrap();
        loop {
            if let Some(task) = state.tasks.pop_front() {
                state.running = true;
                return Some(task);
            }
            if state.closed {
                return None;
            }
            state = self.inner.not_empty.wait(state).unwrap();
        }
    }

    /// Marks the running task as finished, freeing its slot.
    fn complete(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.running = false;
        drop(state);
        self.inner.has_room.notify_one();
    }

    fn close(&self) {
        let mut state = self.inner.state.lock().unwrap();
        state.closed = true;
        drop(state);
        // Wake the worker so it can drain and exit, and any blocked producer so
        // it can observe the closed state.
        self.inner.not_empty.notify_all();
        self.inner.has_room.notify_all();
    }
}

struct LaneState {
    tasks: VecDeque<LaneTask>,
    capacity: usize,
    running: bool,
    closed: bool,
}

impl LaneState {
    fn has_room(&self) -> bool {
        self.tasks.len() + usize::from(self.running) <= self.capacity
    }
}

struct Inner {
    state: Mutex<LaneState>,
    not_empty: Condvar,
    has_room: Condvar,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
            mpsc,
        },
        time::Duration,
    };

    #[test]
    fn test_lane_runs_tasks_in_order() {
        let lane = Lane::spawn(0, 16).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..100 {
            let log = log.clone();
            lane.submit(Box::new(move || log.lock().unwrap().push(i)))
                .unwrap();
        }
        lane.close();
        lane.join().unwrap();
        assert_eq!(*log.lock().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_lane_runs_one_task_at_a_time() {
        let lane = Lane::spawn(0, 8).unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let max_active = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let active = active.clone();
            let max_active = max_active.clone();
            lane.submit(Box::new(move || {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_active.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(1));
                active.fetch_sub(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        lane.close();
        lane.join().unwrap();
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_capacity_blocks_until_idle() {
        let lane = Arc::new(Lane::spawn(0, 0).unwrap());
        let (release_tx, release_rx) = mpsc::channel::<()>();
        lane.submit(Box::new(move || {
            release_rx.recv().unwrap();
        }))
        .unwrap();

        let (done_tx, done_rx) = mpsc::channel::<()>();
        let submitter = {
            let lane = lane.clone();
            std::thread::spawn(move || {
                lane.submit(Box::new(|| {})).unwrap();
                done_tx.send(()).unwrap();
            })
        };

        // The second submission cannot be accepted while the first task runs.
        assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());
        release_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        submitter.join().unwrap();

        lane.close();
        lane.join().unwrap();
    }

    #[test]
    fn test_capacity_counts_waiting_tasks() {
        let lane = Arc::new(Lane::spawn(0, 2).unwrap());
        let (release_tx, release_rx) = mpsc::channel::<()>();
        lane.submit(Box::new(move || {
            release_rx.recv().unwrap();
        }))
        .unwrap();
        // Give the worker time to pick up the blocking task.
        std::thread::sleep(Duration::from_millis(20));

        // Two more fit into the queue behind the running task.
        lane.submit(Box::new(|| {})).unwrap();
        lane.submit(Box::new(|| {})).unwrap();

        let (done_tx, done_rx) = mpsc::channel::<()>();
        let submitter = {
            let lane = lane.clone();
            std::thread::spawn(move || {
                lane.submit(Box::new(|| {})).unwrap();
                done_tx.send(()).unwrap();
            })
        };
        assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());
        release_tx.send(()).unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        submitter.join().unwrap();

        lane.close();
        lane.join().unwrap();
    }

    #[test]
    fn test_is_current_worker() {
        let lane = Arc::new(Lane::spawn(0, 1).unwrap());
        assert!(!lane.is_current_worker());

        let (tx, rx) = mpsc::channel();
        let inner = lane.clone();
        lane.submit(Box::new(move || tx.send(inner.is_current_worker()).unwrap()))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());

        lane.close();
        lane.join().unwrap();
    }

    #[test]
    fn test_submit_after_close_fails() {
        let lane = Lane::spawn(3, 4).unwrap();
        lane.close();
        assert!(lane.submit(Box::new(|| {})).is_err());
        lane.join().unwrap();
        // Joining twice is a no-op.
        lane.join().unwrap();
    }

    #[test]
    fn test_close_drains_queued_tasks() {
        let lane = Lane::spawn(0, 64).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let counter = counter.clone();
            lane.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        lane.close();
        lane.join().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }
}
