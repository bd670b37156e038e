//! Sizing options for [`TaskQueue`](crate::task_queue::TaskQueue).

use serde::{Deserialize, Serialize};

use ringdex_common::{Result, verify_arg};

/// Default number of tasks each lane may hold behind its running task.
pub const DEFAULT_QUEUES_SIZE: usize = 50;

/// Indexing queue configuration, as found in an index's options document.
///
/// ```json
/// { "indexing_threads": 4, "indexing_queues_size": 50 }
/// ```
///
/// Missing fields take their defaults: one lane per available CPU and
/// [`DEFAULT_QUEUES_SIZE`] waiting tasks per lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskQueueOptions {
    /// Number of lanes (worker threads).
    pub indexing_threads: usize,
    /// Number of tasks a lane may hold waiting before submissions block.
    pub indexing_queues_size: usize,
}

impl TaskQueueOptions {
    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<TaskQueueOptions> {
        let options: TaskQueueOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(indexing_threads, self.indexing_threads > 0);
        Ok(())
    }
}

impl Default for TaskQueueOptions {
    fn default() -> Self {
        TaskQueueOptions {
            indexing_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(8),
            indexing_queues_size: DEFAULT_QUEUES_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringdex_common::error::ErrorKind;

    #[test]
    fn test_from_json() {
        let options =
            TaskQueueOptions::from_json(r#"{"indexing_threads": 4, "indexing_queues_size": 0}"#)
                .unwrap();
        assert_eq!(options.indexing_threads, 4);
        assert_eq!(options.indexing_queues_size, 0);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let options = TaskQueueOptions::from_json(r#"{"indexing_threads": 2}"#).unwrap();
        assert_eq!(options.indexing_threads, 2);
        assert_eq!(options.indexing_queues_size, DEFAULT_QUEUES_SIZE);

        let options = TaskQueueOptions::from_json("{}").unwrap();
        assert!(options.indexing_threads >= 1);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = TaskQueueOptions::from_json(r#"{"indexing_threads": 0}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = TaskQueueOptions::from_json(r#"{"indexing_threads": "four"}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Config { .. }));
    }
}
