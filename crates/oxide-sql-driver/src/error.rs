//! Driver-level error type: wraps the engine's `Error` and the parser's
//! `ParseError` and adds the handful of error shapes that only exist at the
//! statement-driver layer (privilege checks, nested transactions, unbound
//! label targets).

use oxide_sql_core::ParseError;
use oxide_sql_types::Error as EngineError;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("access denied for this statement: missing {0} privilege")]
    PrivilegeDenied(String),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown database '{0}'")]
    UnknownDatabase(String),

    #[error("unknown view '{0}'")]
    UnknownView(String),

    #[error("unknown procedure or function '{0}'")]
    UnknownRoutine(String),

    #[error("LEAVE/ITERATE label '{0}' has no enclosing loop")]
    UnknownLabel(String),

    #[error("a transaction is already open on this session")]
    TransactionAlreadyOpen,

    #[error("referential cycle detected while cascading on table '{0}'")]
    CascadeCycle(String),

    #[error("recursive common table expression '{0}' did not reach a fixed point")]
    RecursionLimit(String),

    #[error("{0}")]
    Unsupported(String),
}

impl DriverError {
    /// The MySQL-style numeric code for this error, when one applies.
    /// Delegates to the wrapped engine error where possible.
    #[must_use]
    pub fn mysql_code(&self) -> Option<u16> {
        match self {
            Self::Engine(e) => e.mysql_code(),
            Self::PrivilegeDenied(_) => Some(1142),
            Self::UnknownTable(_) => Some(1146),
            Self::UnknownColumn(_) => Some(1054),
            Self::UnknownDatabase(_) => Some(1049),
            Self::TransactionAlreadyOpen => Some(1400),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
