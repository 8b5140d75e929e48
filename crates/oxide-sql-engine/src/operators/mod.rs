//! The Volcano-style iterator contract and the physical operator catalog.

mod cte;
mod distinct;
mod dual;
mod group_by;
mod information_schema;
mod join;
mod order_by;
mod parallel;
mod project;
mod scan;
mod set_ops;
mod window;

pub use cte::CteOperator;
pub use distinct::{Distinct, SpillableDistinct};
pub use dual::Dual;
pub use group_by::{AggregateKind, AggregateSpec, GroupBy};
pub use information_schema::InformationSchema;
pub use join::{JoinCondition, NestedLoopJoin};
pub use order_by::{ExternalSort, Limit, OrderBy, SortKey};
pub use parallel::{ParallelAggregate, ParallelScan};
pub use project::{Alias, Filter, Project, ProjectColumn};
pub use scan::{IndexScan, LockingContext, TableScan};
pub use set_ops::{Except, Intersect, SetOpQuantifier, Union};
pub use window::{Window, WindowFunction, WindowSpec};

use std::sync::Arc;

use oxide_sql_types::{Error, Row, Schema};

/// Common lifecycle every physical operator implements.
///
/// `open()` must be called before `next()`; calling it twice without an
/// intervening `close()` is a usage error. `next()` returns `Ok(None)` at
/// end of stream and must not be called again afterward. `close()` is
/// idempotent and releases every resource the operator (and transitively
/// its children) acquired, including on error or cancellation paths.
pub trait Operator: Send {
    /// Output schema, stable across the open/close lifecycle and available
    /// before `open()`.
    fn schema(&self) -> Arc<Schema>;

    /// Allocates child resources and moves to the ready state.
    fn open(&mut self) -> Result<(), Error>;

    /// Produces the next output row, or `None` at end of stream.
    fn next(&mut self) -> Result<Option<Row>, Error>;

    /// Releases all held resources. Safe to call multiple times.
    fn close(&mut self) -> Result<(), Error>;
}

/// Tracks whether an operator has been opened/closed, for implementations
/// that need to reject a double-`open()` or no-op a repeated `close()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Lifecycle {
    #[default]
    Unopened,
    Open,
    Closed,
}

impl Lifecycle {
    pub(crate) fn open(&mut self) -> Result<(), Error> {
        if *self == Self::Open {
            return Err(Error::Internal("operator opened twice without an intervening close".into()));
        }
        *self = Self::Open;
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        *self = Self::Closed;
    }
}
