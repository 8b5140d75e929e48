//! Volcano-style query execution engine: the expression evaluator,
//! physical operators, the spill-to-disk subsystem, and the storage
//! contracts those operators execute against.
//!
//! The operator builder and session state that turn a parsed statement
//! into a driven operator tree live in `oxide-sql-driver`; this crate
//! hosts only the execution machinery itself plus a reference storage
//! backend (`storage::mem`) used by this crate's own tests.

pub mod cancellation;
pub mod config;
pub mod expr;
pub mod operators;
pub mod spill;
pub mod storage;

pub use cancellation::CancellationToken;
pub use config::EngineConfig;
