use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn task_failed(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::TaskFailed {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn barrier(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Barrier {
                message: message.into(),
            }
            .into(),
        )
    }

    /// Returns `true` for failures of an individual submitted task, as opposed
    /// to failures of the queue itself.
    pub fn is_task_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::TaskFailed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("task failed: {message}")]
    TaskFailed { message: String },

    #[error("failed to establish barrier: {message}")]
    Barrier { message: String },

    #[error("invalid configuration: {source}")]
    Config { source: serde_json::Error },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        ErrorKind::Config { source: e }.into()
    }
}
