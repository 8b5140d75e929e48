//! SQL statement AST types.

use core::fmt;

use super::expression::Expr;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Null ordering for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrdering {
    /// NULLs come first.
    First,
    /// NULLs come last.
    Last,
}

impl NullOrdering {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::First => "NULLS FIRST",
            Self::Last => "NULLS LAST",
        }
    }
}

impl fmt::Display for NullOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ORDER BY clause entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// The expression to order by.
    pub expr: Expr,
    /// The direction (ASC or DESC).
    pub direction: OrderDirection,
    /// Null ordering (optional).
    pub nulls: Option<NullOrdering>,
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN.
    Right,
    /// FULL OUTER JOIN.
    Full,
    /// CROSS JOIN.
    Cross,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// The type of join.
    pub join_type: JoinType,
    /// The table to join.
    pub table: TableRef,
    /// The join condition (for non-CROSS joins).
    pub on: Option<Expr>,
    /// USING columns (alternative to ON).
    pub using: Vec<String>,
}

/// A table reference in FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// A simple table name.
    Table {
        /// Schema name (optional).
        schema: Option<String>,
        /// Table name.
        name: String,
        /// Alias.
        alias: Option<String>,
    },
    /// A subquery.
    Subquery {
        /// The subquery.
        query: Box<SelectStatement>,
        /// Alias (required for subqueries).
        alias: String,
    },
    /// A joined table.
    Join {
        /// Left side of the join.
        left: Box<TableRef>,
        /// The join clause.
        join: Box<JoinClause>,
    },
}

impl TableRef {
    /// Creates a simple table reference.
    #[must_use]
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    /// Creates a table reference with schema.
    #[must_use]
    pub fn with_schema(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Table {
            schema: Some(schema.into()),
            name: name.into(),
            alias: None,
        }
    }

    /// Adds an alias to this table reference.
    #[must_use]
    pub fn alias(self, alias: impl Into<String>) -> Self {
        match self {
            Self::Table { schema, name, .. } => Self::Table {
                schema,
                name,
                alias: Some(alias.into()),
            },
            Self::Subquery { query, .. } => Self::Subquery {
                query,
                alias: alias.into(),
            },
            Self::Join { left, join } => Self::Join {
                left: Box::new((*left).alias(alias)),
                join,
            },
        }
    }
}

/// A named CTE, as introduced by a `WITH` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CteDef {
    /// The CTE's name, visible only within the surrounding query.
    pub name: String,
    /// Explicit output column names, if given (`WITH r(n) AS (...)`).
    pub columns: Vec<String>,
    /// Whether this CTE was declared `RECURSIVE`.
    pub recursive: bool,
    /// The CTE body. For a recursive CTE this is the anchor member with the
    /// recursive member(s) chained as additional `set_ops` legs referencing
    /// the CTE's own name.
    pub query: Box<SelectStatement>,
}

/// A set-operation combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    /// `UNION` / `UNION ALL`.
    Union,
    /// `INTERSECT` / `INTERSECT ALL`.
    Intersect,
    /// `EXCEPT` / `EXCEPT ALL`.
    Except,
}

impl SetOp {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "UNION",
            Self::Intersect => "INTERSECT",
            Self::Except => "EXCEPT",
        }
    }
}

/// One additional leg chained onto a query by a set operator.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOpLeg {
    /// The combinator.
    pub op: SetOp,
    /// Whether `ALL` was specified (multiset semantics instead of dedup).
    pub all: bool,
    /// The right-hand side of the combinator.
    pub select: Box<SelectStatement>,
}

/// Row-locking mode for a `SELECT ... FOR ...` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// `FOR UPDATE` — exclusive row lock.
    Update,
    /// `FOR SHARE` — shared row lock.
    Share,
}

/// Wait behavior for row-lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Block up to the configured lock-wait timeout.
    #[default]
    Wait,
    /// Fail immediately on conflict.
    NoWait,
    /// Silently skip conflicting rows.
    SkipLocked,
}

/// A `FOR UPDATE` / `FOR SHARE` locking clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockingClause {
    /// Lock mode.
    pub mode: LockMode,
    /// Wait policy.
    pub wait: WaitPolicy,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    /// CTEs introduced by a `WITH` clause preceding this query.
    pub ctes: Vec<CteDef>,
    /// Whether to select DISTINCT values.
    pub distinct: bool,
    /// The columns to select.
    pub columns: Vec<SelectColumn>,
    /// The FROM clause.
    pub from: Option<TableRef>,
    /// The WHERE clause.
    pub where_clause: Option<Expr>,
    /// GROUP BY expressions.
    pub group_by: Vec<Expr>,
    /// HAVING clause.
    pub having: Option<Expr>,
    /// Additional legs chained by UNION/INTERSECT/EXCEPT, applied left to right.
    pub set_ops: Vec<SetOpLeg>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT clause.
    pub limit: Option<Expr>,
    /// OFFSET clause.
    pub offset: Option<Expr>,
    /// `FOR UPDATE`/`FOR SHARE` clause, if present.
    pub locking: Option<LockingClause>,
}

/// A column in SELECT clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectColumn {
    /// The expression.
    pub expr: Expr,
    /// Column alias.
    pub alias: Option<String>,
}

impl SelectColumn {
    /// Creates a new select column.
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    /// Creates a select column with an alias.
    #[must_use]
    pub fn with_alias(expr: Expr, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// An INSERT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Column names (optional).
    pub columns: Vec<String>,
    /// Values to insert.
    pub values: InsertSource,
    /// ON CONFLICT clause (for UPSERT).
    pub on_conflict: Option<OnConflict>,
}

/// Source of data for INSERT.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertSource {
    /// VALUES (...), (...), ...
    Values(Vec<Vec<Expr>>),
    /// SELECT ...
    Query(Box<SelectStatement>),
    /// DEFAULT VALUES
    DefaultValues,
}

/// ON CONFLICT clause for UPSERT.
#[derive(Debug, Clone, PartialEq)]
pub struct OnConflict {
    /// Conflict target columns.
    pub columns: Vec<String>,
    /// Action to take on conflict.
    pub action: ConflictAction,
}

/// Action to take on conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictAction {
    /// DO NOTHING
    DoNothing,
    /// DO UPDATE SET ...
    DoUpdate(Vec<UpdateAssignment>),
}

/// An UPDATE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Alias.
    pub alias: Option<String>,
    /// SET assignments.
    pub assignments: Vec<UpdateAssignment>,
    /// FROM clause (for joins in UPDATE).
    pub from: Option<TableRef>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
}

/// An assignment in UPDATE SET.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    /// Column name.
    pub column: String,
    /// Value expression.
    pub value: Expr,
}

/// A DELETE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Schema name.
    pub schema: Option<String>,
    /// Table name.
    pub table: String,
    /// Alias.
    pub alias: Option<String>,
    /// WHERE clause.
    pub where_clause: Option<Expr>,
}

/// A SQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// SELECT statement.
    Select(SelectStatement),
    /// INSERT statement.
    Insert(InsertStatement),
    /// UPDATE statement.
    Update(UpdateStatement),
    /// DELETE statement.
    Delete(DeleteStatement),
    /// CREATE DATABASE.
    CreateDatabase(CreateDatabaseStatement),
    /// DROP DATABASE.
    DropDatabase(DropDatabaseStatement),
    /// CREATE TABLE.
    CreateTable(CreateTableStatement),
    /// DROP TABLE.
    DropTable(DropTableStatement),
    /// ALTER TABLE.
    AlterTable(AlterTableStatement),
    /// CREATE INDEX.
    CreateIndex(CreateIndexStatement),
    /// DROP INDEX.
    DropIndex(DropIndexStatement),
    /// CREATE VIEW.
    CreateView(CreateViewStatement),
    /// DROP VIEW.
    DropView(DropViewStatement),
    /// CREATE TRIGGER.
    CreateTrigger(CreateTriggerStatement),
    /// CREATE PROCEDURE.
    CreateProcedure(CreateProcedureStatement),
    /// CREATE FUNCTION.
    CreateFunction(CreateFunctionStatement),
    /// CREATE EVENT.
    CreateEvent(CreateEventStatement),
    /// CALL a stored procedure.
    Call(CallStatement),
    /// BEGIN / START TRANSACTION.
    Begin(BeginStatement),
    /// COMMIT.
    Commit,
    /// ROLLBACK.
    Rollback,
    /// SET TRANSACTION (isolation level / access mode).
    SetTransaction(SetTransactionStatement),
    /// SET a session or global system variable.
    SetVariable(SetVariableStatement),
    /// SHOW ... (tables, databases, columns, ...).
    Show(ShowStatement),
    /// DESCRIBE / DESC a table.
    Describe {
        /// The table name.
        table: String,
    },
}

// ===================================================================
// Referential actions and constraints (CREATE/ALTER TABLE)
// ===================================================================

/// The referential action attached to a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    /// Reject the parent mutation if matching children exist (MySQL default).
    #[default]
    Restrict,
    /// Same observable behavior as `Restrict` in this engine.
    NoAction,
    /// Propagate the delete/update to children.
    Cascade,
    /// Set the child FK columns to NULL.
    SetNull,
    /// Set the child FK columns to their column defaults.
    SetDefault,
}

/// A table-level constraint in a CREATE TABLE / ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    /// `PRIMARY KEY (cols...)`.
    PrimaryKey {
        /// Optional constraint name.
        name: Option<String>,
        /// Key columns, in order.
        columns: Vec<String>,
    },
    /// `UNIQUE (cols...)`.
    Unique {
        /// Optional constraint name.
        name: Option<String>,
        /// Key columns, in order.
        columns: Vec<String>,
    },
    /// `FOREIGN KEY (cols...) REFERENCES parent(cols...) ON DELETE ... ON UPDATE ...`.
    ForeignKey {
        /// Optional constraint name.
        name: Option<String>,
        /// Child-side columns.
        columns: Vec<String>,
        /// Parent table name.
        ref_table: String,
        /// Parent-side columns (its primary or a unique key).
        ref_columns: Vec<String>,
        /// Action on parent DELETE.
        on_delete: ReferentialAction,
        /// Action on parent UPDATE.
        on_update: ReferentialAction,
    },
    /// `CHECK (expr)`.
    Check {
        /// Optional constraint name.
        name: Option<String>,
        /// The boolean expression that must hold for every row.
        expr: Expr,
    },
}

/// A CREATE TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Schema/database name (optional).
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// Column definitions, in declaration order.
    pub columns: Vec<super::ColumnDef>,
    /// Table-level constraints.
    pub constraints: Vec<TableConstraint>,
    /// `IF NOT EXISTS`.
    pub if_not_exists: bool,
}

/// A DROP TABLE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Schema/database name (optional).
    pub schema: Option<String>,
    /// Table name.
    pub name: String,
    /// `IF EXISTS`.
    pub if_exists: bool,
}

/// A CREATE DATABASE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDatabaseStatement {
    /// Database name.
    pub name: String,
    /// `IF NOT EXISTS`.
    pub if_not_exists: bool,
}

/// A DROP DATABASE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropDatabaseStatement {
    /// Database name.
    pub name: String,
    /// `IF EXISTS`.
    pub if_exists: bool,
}

/// One action within an `ALTER TABLE ... <actions>` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    /// `ADD [COLUMN] coldef`.
    AddColumn(super::ColumnDef),
    /// `DROP [COLUMN] name`.
    DropColumn(String),
    /// `MODIFY [COLUMN] coldef` (keeps the name, changes type/attributes).
    ModifyColumn(super::ColumnDef),
    /// `CHANGE [COLUMN] old_name coldef` (may rename).
    ChangeColumn {
        /// The column's current name.
        old_name: String,
        /// The new column definition (carries the new name).
        new_col: super::ColumnDef,
    },
    /// `RENAME COLUMN old TO new`.
    RenameColumn {
        /// Current name.
        old_name: String,
        /// New name.
        new_name: String,
    },
    /// `RENAME TO new_name`.
    RenameTable(String),
    /// `ADD CONSTRAINT ...` / `ADD PRIMARY KEY` / `ADD FOREIGN KEY` / `ADD CHECK`.
    AddConstraint(TableConstraint),
    /// `DROP PRIMARY KEY`.
    DropPrimaryKey,
    /// `DROP FOREIGN KEY name`.
    DropForeignKey(String),
    /// `DROP INDEX name` / `DROP KEY name`.
    DropIndexConstraint(String),
    /// `DROP CHECK name`.
    DropCheck(String),
}

/// An ALTER TABLE statement; actions are applied atomically from the
/// driver's perspective.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableStatement {
    /// Table name.
    pub table: String,
    /// The list of actions, applied in order.
    pub actions: Vec<AlterAction>,
}

/// A CREATE INDEX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    /// Index name.
    pub name: String,
    /// Table the index is built over.
    pub table: String,
    /// Indexed columns, in key order.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// `IF NOT EXISTS`.
    pub if_not_exists: bool,
}

/// A DROP INDEX statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropIndexStatement {
    /// Index name.
    pub name: String,
    /// Table the index belongs to.
    pub table: String,
    /// `IF EXISTS`.
    pub if_exists: bool,
}

/// A CREATE VIEW statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateViewStatement {
    /// View name.
    pub name: String,
    /// The underlying query.
    pub query: Box<SelectStatement>,
    /// `OR REPLACE`.
    pub or_replace: bool,
}

/// A DROP VIEW statement.
#[derive(Debug, Clone, PartialEq)]
pub struct DropViewStatement {
    /// View name.
    pub name: String,
    /// `IF EXISTS`.
    pub if_exists: bool,
}

// ===================================================================
// Procedural control flow (trigger/procedure/function/event bodies)
// ===================================================================

/// One statement inside a stored-routine or trigger body.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcStatement {
    /// `IF cond THEN ... [ELSEIF cond THEN ...]... [ELSE ...] END IF`.
    If {
        /// `(condition, body)` pairs, tried in order.
        branches: Vec<(Expr, Vec<ProcStatement>)>,
        /// The `ELSE` body, if any.
        else_branch: Vec<ProcStatement>,
    },
    /// `[label:] WHILE cond DO ... END WHILE`.
    While {
        /// Optional loop label, the target of `LEAVE`/`ITERATE`.
        label: Option<String>,
        /// Loop condition, checked before each iteration.
        cond: Expr,
        /// Loop body.
        body: Vec<ProcStatement>,
    },
    /// `[label:] REPEAT ... UNTIL cond END REPEAT`.
    Repeat {
        /// Optional loop label.
        label: Option<String>,
        /// Loop body.
        body: Vec<ProcStatement>,
        /// Exit condition, checked after each iteration.
        until: Expr,
    },
    /// `[label:] LOOP ... END LOOP` — unconditional, exited via `LEAVE`.
    Loop {
        /// Optional loop label.
        label: Option<String>,
        /// Loop body.
        body: Vec<ProcStatement>,
    },
    /// `LEAVE label` — exits the named enclosing loop.
    Leave(String),
    /// `ITERATE label` — restarts the named enclosing loop.
    Iterate(String),
    /// `RETURN [expr]` — short-circuits the remaining body.
    Return(Option<Expr>),
    /// `SET name = expr` assigning a local variable.
    SetVar {
        /// Variable name.
        name: String,
        /// Value expression.
        value: Expr,
    },
    /// `DECLARE name type [DEFAULT expr]` local variable declaration.
    Declare {
        /// Variable name.
        name: String,
        /// Declared type.
        data_type: super::DataType,
        /// Initial value, if given.
        default: Option<Expr>,
    },
    /// A nested `CALL name(args)`.
    Call {
        /// Procedure name.
        name: String,
        /// Call arguments.
        args: Vec<Expr>,
    },
    /// A DML/DQL statement executed for effect (or, for SELECT INTO-style
    /// usage, to populate `OLD`/`NEW` adjacent state).
    Exec(Box<Statement>),
}

/// Parameter passing mode for a stored procedure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamMode {
    /// Input only (the default).
    #[default]
    In,
    /// Output only.
    Out,
    /// Both input and output.
    InOut,
}

/// A stored procedure/function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcParam {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub data_type: super::DataType,
    /// Passing mode.
    pub mode: ParamMode,
}

/// Trigger firing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTiming {
    /// Fires before the triggering row mutation is applied.
    Before,
    /// Fires after the triggering row mutation is applied.
    After,
}

/// The DML event a trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Fires on INSERT.
    Insert,
    /// Fires on UPDATE.
    Update,
    /// Fires on DELETE.
    Delete,
}

/// A CREATE TRIGGER statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTriggerStatement {
    /// Trigger name.
    pub name: String,
    /// Table the trigger is attached to.
    pub table: String,
    /// BEFORE or AFTER.
    pub timing: TriggerTiming,
    /// INSERT, UPDATE, or DELETE.
    pub event: TriggerEvent,
    /// The trigger body.
    pub body: Vec<ProcStatement>,
}

/// A CREATE PROCEDURE statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateProcedureStatement {
    /// Procedure name.
    pub name: String,
    /// Declared parameters.
    pub params: Vec<ProcParam>,
    /// The procedure body.
    pub body: Vec<ProcStatement>,
}

/// A CREATE FUNCTION statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateFunctionStatement {
    /// Function name.
    pub name: String,
    /// Declared parameters (always `IN` for functions).
    pub params: Vec<ProcParam>,
    /// The declared return type.
    pub returns: super::DataType,
    /// The function body; must reach a `RETURN`.
    pub body: Vec<ProcStatement>,
}

/// A CREATE EVENT statement (a scheduled procedure; scheduling itself is
/// out of scope — only the body and an on-demand entry point are modeled).
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEventStatement {
    /// Event name.
    pub name: String,
    /// The event body.
    pub body: Vec<ProcStatement>,
}

/// A CALL statement invoking a stored procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct CallStatement {
    /// Procedure name.
    pub name: String,
    /// Call arguments.
    pub args: Vec<Expr>,
}

// ===================================================================
// Transactions
// ===================================================================

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    /// Dirty reads visible (rarely used; accepted for completeness).
    ReadUncommitted,
    /// Each statement sees a fresh snapshot.
    ReadCommitted,
    /// The snapshot is fixed for the whole transaction (the engine default).
    #[default]
    RepeatableRead,
    /// Fully serializable.
    Serializable,
}

/// A BEGIN / START TRANSACTION statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeginStatement {
    /// Explicit isolation level override for this transaction, if any.
    pub isolation: Option<IsolationLevel>,
    /// Whether the transaction is read-only.
    pub read_only: bool,
}

/// The scope a `SET TRANSACTION` statement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionScope {
    /// Applies only to the next transaction opened on this session.
    #[default]
    Next,
    /// Applies to every subsequent transaction on this session.
    Session,
    /// Applies to every subsequent transaction on every session.
    Global,
}

/// A SET TRANSACTION statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetTransactionStatement {
    /// New isolation level, if specified.
    pub isolation: Option<IsolationLevel>,
    /// New read-only flag, if specified.
    pub read_only: Option<bool>,
    /// The scope this assignment applies to.
    pub scope: TransactionScope,
}

/// A `SET` statement assigning a session or global system variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SetVariableStatement {
    /// Variable name.
    pub name: String,
    /// Assigned value.
    pub value: Expr,
    /// `true` for `SET GLOBAL`, `false` for session-local.
    pub global: bool,
}

// ===================================================================
// SHOW
// ===================================================================

/// The kind of metadata a SHOW statement requests.
#[derive(Debug, Clone, PartialEq)]
pub enum ShowKind {
    /// `SHOW DATABASES`.
    Databases,
    /// `SHOW TABLES [FROM db]`.
    Tables {
        /// Database to list (defaults to the session's current database).
        database: Option<String>,
    },
    /// `SHOW COLUMNS FROM table`.
    Columns {
        /// Table to describe.
        table: String,
    },
}

/// A SHOW statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ShowStatement {
    /// What to show.
    pub kind: ShowKind,
    /// Optional `LIKE 'pattern'` filter (`%`/`_` wildcards, case-insensitive).
    pub like_pattern: Option<String>,
    /// Optional `WHERE` clause evaluated over the synthesized result schema.
    pub where_clause: Option<Expr>,
}

// ===================================================================
// Display implementations
// ===================================================================

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.expr, self.direction)?;
        if let Some(nulls) = &self.nulls {
            write!(f, " {nulls}")?;
        }
        Ok(())
    }
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.join_type, self.table)?;
        if let Some(on) = &self.on {
            write!(f, " ON {on}")?;
        }
        if !self.using.is_empty() {
            write!(f, " USING (")?;
            for (i, col) in self.using.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{col}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table {
                schema,
                name,
                alias,
            } => {
                if let Some(s) = schema {
                    write!(f, "{s}.")?;
                }
                write!(f, "{name}")?;
                if let Some(a) = alias {
                    write!(f, " AS {a}")?;
                }
                Ok(())
            }
            Self::Subquery { query, alias } => {
                write!(f, "({query}) AS {alias}")
            }
            Self::Join { left, join } => {
                write!(f, "{left} {join}")
            }
        }
    }
}

impl fmt::Display for SelectColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        if let Some(a) = &self.alias {
            write!(f, " AS {a}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ctes.is_empty() {
            write!(f, "WITH ")?;
            if self.ctes.iter().any(|c| c.recursive) {
                write!(f, "RECURSIVE ")?;
            }
            for (i, cte) in self.ctes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} AS ({})", cte.name, cte.query)?;
            }
            write!(f, " ")?;
        }
        write!(f, "SELECT")?;
        if self.distinct {
            write!(f, " DISTINCT")?;
        }
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {col}")?;
        }
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY")?;
            for (i, g) in self.group_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {g}")?;
            }
        }
        if let Some(h) = &self.having {
            write!(f, " HAVING {h}")?;
        }
        for leg in &self.set_ops {
            write!(f, " {}", leg.op.as_str())?;
            if leg.all {
                write!(f, " ALL")?;
            }
            write!(f, " {}", leg.select)?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY")?;
            for (i, o) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {o}")?;
            }
        }
        if let Some(l) = &self.limit {
            write!(f, " LIMIT {l}")?;
        }
        if let Some(o) = &self.offset {
            write!(f, " OFFSET {o}")?;
        }
        if let Some(locking) = &self.locking {
            match locking.mode {
                LockMode::Update => write!(f, " FOR UPDATE")?,
                LockMode::Share => write!(f, " FOR SHARE")?,
            }
            match locking.wait {
                WaitPolicy::Wait => {}
                WaitPolicy::NoWait => write!(f, " NOWAIT")?,
                WaitPolicy::SkipLocked => write!(f, " SKIP LOCKED")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for InsertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values(rows) => {
                write!(f, "VALUES")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " (")?;
                    for (j, val) in row.iter().enumerate() {
                        if j > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{val}")?;
                    }
                    write!(f, ")")?;
                }
                Ok(())
            }
            Self::Query(q) => write!(f, "{q}"),
            Self::DefaultValues => write!(f, "DEFAULT VALUES"),
        }
    }
}

impl fmt::Display for OnConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ON CONFLICT (")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        write!(f, ") {}", self.action)
    }
}

impl fmt::Display for ConflictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoNothing => write!(f, "DO NOTHING"),
            Self::DoUpdate(assignments) => {
                write!(f, "DO UPDATE SET")?;
                for (i, a) in assignments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {a}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO ")?;
        if let Some(s) = &self.schema {
            write!(f, "{s}.")?;
        }
        write!(f, "{}", self.table)?;
        if !self.columns.is_empty() {
            write!(f, " (")?;
            for (i, col) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{col}")?;
            }
            write!(f, ")")?;
        }
        write!(f, " {}", self.values)?;
        if let Some(oc) = &self.on_conflict {
            write!(f, " {oc}")?;
        }
        Ok(())
    }
}

impl fmt::Display for UpdateAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

impl fmt::Display for UpdateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE ")?;
        if let Some(s) = &self.schema {
            write!(f, "{s}.")?;
        }
        write!(f, "{}", self.table)?;
        if let Some(a) = &self.alias {
            write!(f, " AS {a}")?;
        }
        write!(f, " SET")?;
        for (i, a) in self.assignments.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {a}")?;
        }
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DeleteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM ")?;
        if let Some(s) = &self.schema {
            write!(f, "{s}.")?;
        }
        write!(f, "{}", self.table)?;
        if let Some(a) = &self.alias {
            write!(f, " AS {a}")?;
        }
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(s) => write!(f, "{s}"),
            Self::Insert(i) => write!(f, "{i}"),
            Self::Update(u) => write!(f, "{u}"),
            Self::Delete(d) => write!(f, "{d}"),
            Self::CreateDatabase(s) => write!(f, "CREATE DATABASE {}", s.name),
            Self::DropDatabase(s) => write!(f, "DROP DATABASE {}", s.name),
            Self::CreateTable(s) => write!(f, "CREATE TABLE {}", s.name),
            Self::DropTable(s) => write!(f, "DROP TABLE {}", s.name),
            Self::AlterTable(s) => write!(f, "ALTER TABLE {}", s.table),
            Self::CreateIndex(s) => write!(f, "CREATE INDEX {} ON {}", s.name, s.table),
            Self::DropIndex(s) => write!(f, "DROP INDEX {} ON {}", s.name, s.table),
            Self::CreateView(s) => write!(f, "CREATE VIEW {}", s.name),
            Self::DropView(s) => write!(f, "DROP VIEW {}", s.name),
            Self::CreateTrigger(s) => write!(f, "CREATE TRIGGER {}", s.name),
            Self::CreateProcedure(s) => write!(f, "CREATE PROCEDURE {}", s.name),
            Self::CreateFunction(s) => write!(f, "CREATE FUNCTION {}", s.name),
            Self::CreateEvent(s) => write!(f, "CREATE EVENT {}", s.name),
            Self::Call(s) => write!(f, "CALL {}", s.name),
            Self::Begin(_) => write!(f, "BEGIN"),
            Self::Commit => write!(f, "COMMIT"),
            Self::Rollback => write!(f, "ROLLBACK"),
            Self::SetTransaction(_) => write!(f, "SET TRANSACTION"),
            Self::SetVariable(s) => write!(f, "SET {}", s.name),
            Self::Show(_) => write!(f, "SHOW"),
            Self::Describe { table } => write!(f, "DESCRIBE {table}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction() {
        assert_eq!(OrderDirection::Asc.as_str(), "ASC");
        assert_eq!(OrderDirection::Desc.as_str(), "DESC");
    }

    #[test]
    fn test_join_type() {
        assert_eq!(JoinType::Inner.as_str(), "INNER JOIN");
        assert_eq!(JoinType::Left.as_str(), "LEFT JOIN");
    }

    #[test]
    fn test_table_ref_builder() {
        let table = TableRef::table("users").alias("u");
        assert!(
            matches!(table, TableRef::Table { name, alias, .. } if name == "users" && alias == Some(String::from("u")))
        );
    }
}
