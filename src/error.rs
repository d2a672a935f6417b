use rusqlite::ErrorCode;
use thiserror::Error;

/// Failures callers are expected to tell apart. Everything else travels as
/// a plain `anyhow::Error`.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(i64),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
}

impl TaskError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Turn a uniqueness or primary-key violation into `TaskError::Conflict`,
/// passing any other SQLite error through.
pub fn conflict_on_unique(err: rusqlite::Error) -> anyhow::Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == ErrorCode::ConstraintViolation
                && matches!(
                    e.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                ) =>
        {
            let detail = msg.as_deref().unwrap_or("uniqueness constraint violated");
            TaskError::Conflict(format!("conflicting record already exists: {detail}")).into()
        }
        _ => err.into(),
    }
}
