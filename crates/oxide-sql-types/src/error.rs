//! The single engine-wide error type.

use thiserror::Error;

/// Errors raised anywhere in the `oxide-sql` execution stack.
///
/// Every variant carries a human-readable message. [`Error::mysql_code`]
/// maps variants that correspond to a MySQL server error onto that error's
/// numeric code, for callers that want wire-compatible diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    /// Column name did not resolve against the operator's schema.
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    /// Table name did not resolve against the catalog.
    #[error("table not found: {0}")]
    TableNotFound(String),
    /// Database name did not resolve against the catalog.
    #[error("database not found: {0}")]
    DatabaseNotFound(String),
    /// A column name resolved to more than one ordinal.
    #[error("ambiguous column: {0}")]
    AmbiguousColumn(String),

    /// Operand types could not be reconciled for an operator.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Arithmetic would wrap or exceed the representable range.
    #[error("numeric overflow: {0}")]
    Overflow(String),
    /// `CAST` could not convert between the requested types.
    #[error("invalid cast: {0}")]
    InvalidCast(String),
    /// A predicate evaluated to a non-boolean value.
    #[error("predicate did not evaluate to a boolean: {0}")]
    NonBooleanPredicate(String),
    /// An arithmetic operand was not numeric.
    #[error("non-numeric arithmetic operand: {0}")]
    NonNumericOperand(String),

    /// Statement shape is recognized but not implemented.
    #[error("unsupported statement: {0}")]
    UnsupportedStatement(String),
    /// Function name did not resolve in the builtin or user-defined catalog.
    #[error("unknown function: {0}")]
    UnknownFunction(String),
    /// An aggregate was used outside a grouped context, or vice versa.
    #[error("invalid aggregate use: {0}")]
    BadAggregateUse(String),

    /// A foreign key reference does not point at an existing parent row.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    /// A `CHECK` constraint evaluated to false or NULL.
    #[error("check constraint violation: {0}")]
    CheckViolation(String),
    /// A `NOT NULL` column was assigned a NULL value.
    #[error("NOT NULL constraint violation: column {0}")]
    NotNullViolation(String),
    /// A `PRIMARY KEY` or `UNIQUE` constraint was violated.
    #[error("duplicate entry for key {0}")]
    DuplicateKey(String),

    /// The privilege store denied the requested operation.
    #[error("access denied: {0}")]
    PrivilegeDenied(String),

    /// `BEGIN` was issued while a transaction was already open.
    #[error("transaction already in progress")]
    NestedTransaction,
    /// `COMMIT`/`ROLLBACK`-adjacent operation required an active transaction.
    #[error("no transaction is active")]
    NoActiveTransaction,

    /// Row lock could not be acquired before the configured timeout.
    #[error("lock wait timeout exceeded")]
    LockTimeout,
    /// Row lock acquisition under `NOWAIT` found a conflicting holder.
    #[error("lock conflict (NOWAIT)")]
    LockConflict,
    /// The lock manager detected a wait-for cycle.
    #[error("deadlock detected")]
    Deadlock,

    /// Spill-to-disk I/O failed.
    #[error("spill I/O error: {0}")]
    SpillIo(#[from] std::io::Error),
    /// A bounded allocation (spill buffer, worker queue) could not grow further.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// An invariant the engine relies on was violated; indicates a bug.
    #[error("internal error (invariant breach): {0}")]
    Internal(String),
}

impl Error {
    /// The MySQL server error code this variant corresponds to, if any.
    #[must_use]
    pub const fn mysql_code(&self) -> Option<u16> {
        match self {
            Self::ColumnNotFound(_) => Some(1054),
            Self::TableNotFound(_) => Some(1146),
            Self::DatabaseNotFound(_) => Some(1049),
            Self::AmbiguousColumn(_) => Some(1052),
            Self::DuplicateKey(_) => Some(1062),
            Self::ForeignKeyViolation(_) => Some(1452),
            Self::NotNullViolation(_) => Some(1048),
            Self::CheckViolation(_) => Some(3819),
            Self::PrivilegeDenied(_) => Some(1044),
            Self::NestedTransaction => Some(1400),
            Self::LockTimeout => Some(1205),
            Self::LockConflict => Some(3572),
            Self::Deadlock => Some(1213),
            Self::UnknownFunction(_) => Some(1305),
            Self::InvalidCast(_) => Some(1366),
            Self::Overflow(_) => Some(1264),
            _ => None,
        }
    }
}

/// Result type alias used throughout `oxide-sql`.
pub type Result<T> = std::result::Result<T, Error>;
