//! Abstract Syntax Tree (AST) types for SQL statements.

mod expression;
mod statement;
mod types;

pub use expression::{
    BinaryOp, Expr, FunctionCall, Literal, Quantifier, UnaryOp, WindowSpec,
};
pub use statement::{
    AlterAction, AlterTableStatement, BeginStatement, CallStatement, ConflictAction,
    CreateDatabaseStatement, CreateEventStatement, CreateFunctionStatement, CreateIndexStatement,
    CreateProcedureStatement, CreateTableStatement, CreateTriggerStatement, CreateViewStatement,
    CteDef, DeleteStatement, DropDatabaseStatement, DropIndexStatement, DropTableStatement,
    DropViewStatement, InsertSource, InsertStatement, IsolationLevel, JoinClause, JoinType,
    LockMode, LockingClause, OnConflict, OrderBy, OrderDirection, ParamMode, ProcParam,
    ProcStatement, ReferentialAction, SelectColumn, SelectStatement, SetOp, SetOpLeg,
    SetTransactionStatement, SetVariableStatement, ShowKind, ShowStatement, Statement,
    TableConstraint, TableRef, TransactionScope, TriggerEvent, TriggerTiming, UpdateAssignment,
    UpdateStatement, WaitPolicy,
};
pub use types::{ColumnDef, DataType};
