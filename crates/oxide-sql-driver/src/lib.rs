//! # oxide-sql-driver
//!
//! The statement driver sitting between the parsed AST
//! (`oxide-sql-core`) and the storage/execution engine
//! (`oxide-sql-engine`): it turns a [`oxide_sql_core::ast::Statement`]
//! into a running operator tree or a direct catalog mutation, enforces
//! the constraints the storage layer doesn't know about, and fires
//! triggers and stored routines.
//!
//! [`Session`] is the public entry point — one per connection, sharing
//! a [`Registry`] and a storage `Catalog` with every other session
//! against the same database.

mod builder;
mod constraints;
mod ddl;
mod dml;
mod error;
mod procedure;
mod registry;
mod session;
mod show;
mod value_conv;

pub use error::{DriverError, Result};
pub use registry::{Registry, TriggerDef};
pub use session::{ExecResult, Session};
