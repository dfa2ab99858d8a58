use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    /// Required text field was empty after trimming.
    EmptyField(&'static str),
    FieldTooLong {
        field: &'static str,
        max: usize,
    },
    /// Service duration must be a positive number of minutes.
    InvalidDuration(i64),
    NegativePrice(i64),
    UnknownStatus(String),
    LimitExceeded(&'static str),
    /// Store write failed. The whole check-then-write sequence is safe to
    /// retry from scratch; the decision itself was never persisted.
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::EmptyField(field) => write!(f, "required field is empty: {field}"),
            EngineError::FieldTooLong { field, max } => {
                write!(f, "field {field} exceeds {max} characters")
            }
            EngineError::InvalidDuration(minutes) => {
                write!(f, "service duration must be positive, got {minutes} minutes")
            }
            EngineError::NegativePrice(cents) => {
                write!(f, "price must not be negative, got {cents} cents")
            }
            EngineError::UnknownStatus(s) => write!(f, "unknown booking status: {s}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
