//! # oxide-sql-types
//!
//! The data model shared by every other crate in the `oxide-sql` workspace:
//! [`Value`], [`Row`], [`Schema`], the fixed-point [`Decimal`], and the
//! single tagged-union [`Error`] type the engine and driver both return.

mod decimal;
mod error;
mod schema;
mod value;

pub use decimal::Decimal;
pub use error::{Error, Result};
pub use schema::{ColumnDef, ColumnType, Row, RowId, Schema};
pub use value::{canonical_group_key, Value};
