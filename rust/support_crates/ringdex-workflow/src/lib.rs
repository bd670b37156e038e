//! Ordered concurrent execution of index updates.
//!
//! # Key Components
//!
//! - [`task_queue::TaskQueue`] - Runs tasks on a fixed set of single-worker lanes.
//!   Tasks sharing a key run in submission order, tasks on different lanes run in
//!   parallel, and fences ([`await_all`](task_queue::TaskQueue::await_all),
//!   [`submit_sync`](task_queue::TaskQueue::submit_sync)) wait for everything
//!   accepted before them.
//! - [`task_handle::TaskHandle`] - Waits for a submitted task and reports its
//!   value or failure.
//! - [`options::TaskQueueOptions`] - Serializable queue sizing.
//! - [`oneshot`] - Single-value handoff between a lane worker and a waiting thread.

mod lane;

pub mod oneshot;
pub mod options;
pub mod task_handle;
pub mod task_queue;

pub use options::TaskQueueOptions;
pub use task_handle::TaskHandle;
pub use task_queue::TaskQueue;
