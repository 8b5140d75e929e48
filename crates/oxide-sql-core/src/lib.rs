//! # oxide-sql-core
//!
//! A hand-written SQL lexer, parser and AST for the MySQL-compatible
//! statement surface consumed by the rest of the `oxide-sql` workspace.
//!
//! This crate provides:
//! - A hand-written recursive descent parser with Pratt expression parsing
//! - A complete AST covering DML, DDL, transactions, stored routines and
//!   window functions
//! - Span-tagged parse errors suitable for reporting back to a caller
//!
//! ## Parsing a statement
//!
//! ```rust
//! use oxide_sql_core::Parser;
//!
//! let mut parser = Parser::new("SELECT id, name FROM users WHERE active = 1");
//! let stmt = parser.parse_statement().unwrap();
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, Statement};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser};
