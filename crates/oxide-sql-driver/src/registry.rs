//! Driver-side metadata the storage `Catalog` does not carry: table-level
//! constraint shapes (CHECK, FOREIGN KEY, table PRIMARY KEY/UNIQUE) and
//! trigger/procedure/function/event bodies.
//!
//! `Catalog` stores views and routines as opaque `CREATE ...` source text
//! (mirroring `information_schema.VIEWS.VIEW_DEFINITION`); this registry
//! is where the driver keeps the *parsed* shape it actually executes
//! against, since procedural bodies cannot round-trip through the SQL
//! text parser (see `DESIGN.md`).

use std::collections::HashMap;

use oxide_sql_core::ast::{
    CreateEventStatement, CreateFunctionStatement, CreateProcedureStatement, ProcStatement, TableConstraint,
    TriggerEvent, TriggerTiming,
};

/// A trigger attached to one table.
#[derive(Debug, Clone)]
pub struct TriggerDef {
    pub name: String,
    pub table: String,
    pub timing: TriggerTiming,
    pub event: TriggerEvent,
    pub body: Vec<ProcStatement>,
}

fn key(database: &str, name: &str) -> String {
    format!("{}.{}", database.to_lowercase(), name.to_lowercase())
}

/// Process-scoped registry of constraint shapes and routine bodies, keyed
/// by database. One instance is shared (via `Arc<Mutex<_>>`) across every
/// `Session` attached to the same catalog, exactly like the catalog
/// itself; a `Session` takes a cheap [`Clone`]d snapshot for the duration
/// of one statement rather than holding the lock across nested
/// trigger/procedure execution.
#[derive(Default, Clone)]
pub struct Registry {
    constraints: HashMap<String, Vec<TableConstraint>>,
    triggers: HashMap<String, Vec<TriggerDef>>,
    procedures: HashMap<String, CreateProcedureStatement>,
    functions: HashMap<String, CreateFunctionStatement>,
    events: HashMap<String, CreateEventStatement>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_table_constraints(&mut self, database: &str, table: &str, constraints: Vec<TableConstraint>) {
        self.constraints.insert(key(database, table), constraints);
    }

    pub fn add_table_constraint(&mut self, database: &str, table: &str, constraint: TableConstraint) {
        self.constraints.entry(key(database, table)).or_default().push(constraint);
    }

    #[must_use]
    pub fn table_constraints(&self, database: &str, table: &str) -> &[TableConstraint] {
        self.constraints.get(&key(database, table)).map_or(&[], Vec::as_slice)
    }

    pub fn remove_table_constraint(&mut self, database: &str, table: &str, name: &str) {
        if let Some(list) = self.constraints.get_mut(&key(database, table)) {
            list.retain(|c| constraint_name(c) != Some(name));
        }
    }

    pub fn drop_table(&mut self, database: &str, table: &str) {
        self.constraints.remove(&key(database, table));
        self.triggers.remove(&key(database, table));
    }

    pub fn add_trigger(&mut self, database: &str, trigger: TriggerDef) {
        self.triggers.entry(key(database, &trigger.table)).or_default().push(trigger);
    }

    #[must_use]
    pub fn triggers_for(
        &self,
        database: &str,
        table: &str,
        timing: TriggerTiming,
        event: TriggerEvent,
    ) -> Vec<TriggerDef> {
        self.triggers
            .get(&key(database, table))
            .into_iter()
            .flatten()
            .filter(|t| t.timing == timing && t.event == event)
            .cloned()
            .collect()
    }

    pub fn add_procedure(&mut self, database: &str, def: CreateProcedureStatement) {
        self.procedures.insert(key(database, &def.name), def);
    }

    #[must_use]
    pub fn procedure(&self, database: &str, name: &str) -> Option<&CreateProcedureStatement> {
        self.procedures.get(&key(database, name))
    }

    pub fn add_function(&mut self, database: &str, def: CreateFunctionStatement) {
        self.functions.insert(key(database, &def.name), def);
    }

    #[must_use]
    pub fn function(&self, database: &str, name: &str) -> Option<&CreateFunctionStatement> {
        self.functions.get(&key(database, name))
    }

    pub fn add_event(&mut self, database: &str, def: CreateEventStatement) {
        self.events.insert(key(database, &def.name), def);
    }

    #[must_use]
    pub fn event(&self, database: &str, name: &str) -> Option<&CreateEventStatement> {
        self.events.get(&key(database, name))
    }
}

/// The constraint's own name, if it was given one explicitly.
#[must_use]
pub fn constraint_name(constraint: &TableConstraint) -> Option<&str> {
    match constraint {
        TableConstraint::PrimaryKey { name, .. }
        | TableConstraint::Unique { name, .. }
        | TableConstraint::ForeignKey { name, .. }
        | TableConstraint::Check { name, .. } => name.as_deref(),
    }
}
