//! Ordered, sharded task execution for index updates.
//!
//! [`TaskQueue`] spreads tasks over a fixed set of single-worker lanes. Every
//! task is submitted with a routing key; tasks with equal keys always land on
//! the same lane and therefore run one after another in submission order,
//! while tasks routed to different lanes run in parallel.
//!
//! # Barriers
//!
//! [`await_all`](TaskQueue::await_all) establishes a fence across all lanes: it
//! returns once every task accepted before the call has finished.
//! [`submit_sync`](TaskQueue::submit_sync) does the same and then runs a task on
//! the calling thread before any further submission is admitted.
//!
//! Submissions and fences are coordinated by a single reader/writer lock.
//! Ordinary submissions hold it in shared mode for the duration of the
//! enqueue, so they never block each other. Fences hold it exclusively while
//! they inject one no-op sentinel per lane and wait for every sentinel to run.
//! A submission is therefore either entirely ahead of a fence (and captured by
//! it) or entirely behind it.
//!
//! # Reentrancy
//!
//! A fence waits for every lane, including the one a calling task runs on, so
//! [`await_all`](TaskQueue::await_all) and [`submit_sync`](TaskQueue::submit_sync)
//! fail with `InvalidOperation` when called from a lane task of the same queue.
//! The closure passed to `submit_sync` runs under the exclusive lock and must
//! not submit to the queue.
//!
//! A task may hold the queue and submit follow-up work, but a submission to
//! its own lane blocks for good once that lane is full. When a task ends up
//! shutting the queue down, for example by dropping the last `Arc<TaskQueue>`,
//! the other lanes are drained and joined while the task's own lane is only
//! closed: its remaining tasks run after the current one returns.

use std::{
    hash::Hash,
    panic::{self, AssertUnwindSafe},
    sync::{
        PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use ringdex_common::{Result, error::Error, verify_arg};

use crate::{
    lane::Lane,
    oneshot,
    options::TaskQueueOptions,
    task_handle::{TaskHandle, panic_message},
};

/// A queue that executes each submitted task on one of several pooled lanes,
/// keeping tasks with the same key in order.
pub struct TaskQueue {
    lanes: Vec<Lane>,
    lane_capacity: usize,
    hasher: ahash::RandomState,
    /// Shared by submissions, exclusive for fences and shutdown.
    barrier: RwLock<()>,
    /// Only set while `barrier` is held exclusively.
    shut_down: AtomicBool,
}

impl TaskQueue {
    /// Creates a queue with `num_lanes` lanes, each holding up to
    /// `lane_capacity` waiting tasks before submissions block.
    ///
    /// A capacity of zero is valid: each lane then accepts a new task only
    /// once it is idle.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidArgument` error if `num_lanes` is zero, or an error
    /// if a lane worker thread cannot be started.
    pub fn new(num_lanes: usize, lane_capacity: usize) -> Result<TaskQueue> {
        verify_arg!(num_lanes, num_lanes > 0);

        let lanes = (0..num_lanes)
            .map(|i| Lane::spawn(i, lane_capacity))
            .collect::<Result<Vec<_>>>()?;

        log::info!("task queue started with {num_lanes} lanes of capacity {lane_capacity}");
        Ok(TaskQueue {
            lanes,
            lane_capacity,
            hasher: ahash::RandomState::with_seeds(
                0x5d1e_7a2c_4b3f_9e01,
                0x2f9c_63a8_d0b1_7e45,
                0x8e4a_1c57_f32d_0b69,
                0x71c3_b8e6_5a0f_d294,
            ),
            barrier: RwLock::new(()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Creates a queue from validated options.
    pub fn from_options(options: &TaskQueueOptions) -> Result<TaskQueue> {
        options.validate()?;
        TaskQueue::new(options.indexing_threads, options.indexing_queues_size)
    }

    /// Returns the number of lanes.
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Returns the number of tasks each lane may hold waiting behind its
    /// running task.
    pub fn lane_capacity(&self) -> usize {
        self.lane_capacity
    }

    /// Returns the index of the lane that tasks submitted with `key` run on.
    ///
    /// The mapping is fixed for the lifetime of the queue.
    pub fn lane_of<K: Hash + ?Sized>(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) % self.lanes.len() as u64) as usize
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has closed the lanes.
    ///
    /// Never blocks, also not while a barrier is being established.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Submits a task for asynchronous execution on the lane selected by `key`.
    ///
    /// Tasks submitted with equal keys execute in submission order. If the
    /// target lane is full, this call blocks until the lane has room. A panic
    /// inside the task is reported through the returned handle and does not
    /// affect other tasks.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidOperation` error if the queue has been shut down.
    pub fn submit_async<K, F, R>(&self, key: &K, task: F) -> Result<TaskHandle<R>>
    where
        K: Hash + ?Sized,
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let _shared = self.shared()?;
        let lane = &self.lanes[self.lane_of(key)];
        let lane_index = lane.index();

        let (tx, rx) = oneshot::channel();
        lane.submit(Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task)).map_err(panic_message);
            if let Err(message) = &outcome {
                log::warn!("task on lane {lane_index} failed: {message}");
            }
            // The submitter may have dropped its handle.
            let _ = tx.send(outcome);
        }))?;
        Ok(TaskHandle::new(rx))
    }

    /// Blocks until every task accepted before this call has finished.
    ///
    /// No ordinary submission is admitted while the fence is being
    /// established. Tasks submitted after this call may still be pending when
    /// it returns.
    ///
    /// # Errors
    ///
    /// Returns a `Barrier` error if the fence could not be established, which
    /// means the queue is broken and its ordering guarantees no longer hold.
    /// Returns `InvalidOperation` if the queue has been shut down or if called
    /// from one of its lane tasks.
    pub fn await_all(&self) -> Result<()> {
        let _exclusive = self.exclusive("await_all")?;
        self.fence(None)
    }

    /// Waits for all previously accepted tasks, then runs `task` on the
    /// calling thread before any other submission is admitted.
    ///
    /// # Errors
    ///
    /// Returns a `Barrier` error if the fence could not be established, a
    /// `TaskFailed` error if `task` panicked, or `InvalidOperation` under the
    /// same conditions as [`await_all`](Self::await_all).
    pub fn submit_sync<F, R>(&self, task: F) -> Result<R>
    where
        F: FnOnce() -> R,
    {
        let _exclusive = self.exclusive("submit_sync")?;
        self.fence(None)?;
        panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| {
            let message = panic_message(payload);
            log::error!("synchronous task failed: {message}");
            Error::task_failed(message)
        })
    }

    /// Drains all lanes, stops accepting submissions and stops the workers.
    ///
    /// Calling this more than once is a no-op. Called from one of the queue's
    /// lane tasks, the calling lane is closed but neither drained nor joined.
    ///
    /// # Errors
    ///
    /// Returns a `Barrier` error if the final drain failed or a worker thread
    /// panicked. The queue is shut down either way.
    pub fn shutdown(&self) -> Result<()> {
        let exclusive = self.barrier.write().unwrap_or_else(PoisonError::into_inner);
        if self.shut_down.load(Ordering::Acquire) {
            return Ok(());
        }

        let current = self.current_lane();
        let drained = self.fence(current);
        self.shut_down.store(true, Ordering::Release);
        for lane in &self.lanes {
            lane.close();
        }
        drop(exclusive);

        let mut result = drained;
        for lane in self.lanes.iter().filter(|lane| Some(lane.index()) != current) {
            let joined = lane.join();
            if result.is_ok() {
                result = joined;
            }
        }
        match current {
            Some(index) => log::info!("task queue shut down from a task on lane {index}"),
            None => log::info!("task queue shut down"),
        }
        result
    }

    /// Injects one sentinel per lane, except `skip`, and waits for all of them
    /// to run.
    ///
    /// Callers hold the barrier lock exclusively.
    fn fence(&self, skip: Option<usize>) -> Result<()> {
        let mut sentinels = Vec::with_capacity(self.lanes.len());
        for lane in self.lanes.iter().filter(|lane| Some(lane.index()) != skip) {
            let (tx, rx) = oneshot::channel::<()>();
            lane.submit(Box::new(move || {
                let _ = tx.send(());
            }))
            .map_err(|e| {
                log::error!("failed to enqueue barrier on lane {}: {e}", lane.index());
                Error::barrier(format!("lane {} rejected the barrier", lane.index()))
            })?;
            sentinels.push((lane.index(), rx));
        }

        for (index, sentinel) in sentinels {
            if sentinel.recv().is_none() {
                log::error!("lane {index} stopped before reaching the barrier");
                return Err(Error::barrier(format!(
                    "lane {index} stopped before reaching the barrier"
                )));
            }
        }
        Ok(())
    }

    /// Returns the lane whose worker is the calling thread, if any.
    fn current_lane(&self) -> Option<usize> {
        self.lanes
            .iter()
            .find(|lane| lane.is_current_worker())
            .map(Lane::index)
    }

    fn shared(&self) -> Result<RwLockReadGuard<'_, ()>> {
        let shared = self
            .barrier
            .read()
            .map_err(|_| Error::barrier("task queue lock poisoned"))?;
        if self.is_shut_down() {
            return Err(Error::invalid_operation("submit to a shut down task queue"));
        }
        Ok(shared)
    }

    fn exclusive(&self, operation: &str) -> Result<RwLockWriteGuard<'_, ()>> {
        if let Some(index) = self.current_lane() {
            return Err(Error::invalid_operation(format!(
                "{operation} from a task on lane {index} of the same queue"
            )));
        }
        let exclusive = self
            .barrier
            .write()
            .map_err(|_| Error::barrier("task queue lock poisoned"))?;
        if self.is_shut_down() {
            return Err(Error::invalid_operation(format!(
                "{operation} on a shut down task queue"
            )));
        }
        Ok(exclusive)
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::warn!("task queue shutdown on drop failed: {e}");
        }
    }
}
