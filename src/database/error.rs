use std::fmt::{Display, Formatter};

/// Error codes reported by database listener sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseErrorCode {
    /// Security rules no longer allow the listener to read the location.
    PermissionDenied,
    /// The connection dropped and the source gave up on the listener.
    Disconnected,
}

impl DatabaseErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseErrorCode::PermissionDenied => "database/permission-denied",
            DatabaseErrorCode::Disconnected => "database/disconnected",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseError {
    pub code: DatabaseErrorCode,
    message: String,
}

impl DatabaseError {
    pub fn new(code: DatabaseErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for DatabaseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for DatabaseError {}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

pub fn permission_denied(message: impl Into<String>) -> DatabaseError {
    DatabaseError::new(DatabaseErrorCode::PermissionDenied, message)
}

pub fn disconnected(message: impl Into<String>) -> DatabaseError {
    DatabaseError::new(DatabaseErrorCode::Disconnected, message)
}
