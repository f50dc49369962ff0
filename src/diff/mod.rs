pub mod grants;
pub mod objects;
pub mod tables;

use crate::model::{Column, Function, Sequence, Snapshot, Table, View};
use crate::pg::sqlgen::generate_statement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub use objects::{diff_functions, diff_sequences, diff_views};
pub use tables::diff_tables;

/// One structural change needed to bring a slave in line with the master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Create or replace; the definition carries its own `OR REPLACE`.
    CreateFunction(Function),
    DropFunction(String),
    CreateSequence(Sequence),
    DropSequence(String),
    CreateTable(Table),
    DropTable(String),
    AddColumn {
        table: String,
        column: Column,
    },
    DropColumn {
        table: String,
        column: String,
    },
    AlterColumnType {
        table: String,
        column: Column,
    },
    /// Always a full `CREATE OR REPLACE`, whether the view is new or changed.
    CreateView(View),
    DropView(String),
    GrantAll {
        object: String,
        role: String,
    },
    RevokeAll {
        object: String,
        role: String,
    },
    SetOwner {
        object: String,
        owner: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    #[serde(rename = "functions")]
    Function,
    #[serde(rename = "sequences")]
    Sequence,
    #[serde(rename = "tables")]
    Table,
    #[serde(rename = "columns")]
    Column,
    #[serde(rename = "views")]
    View,
    #[serde(rename = "grants")]
    Grant,
    #[serde(rename = "owners")]
    Owner,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ObjectKind::Function => "functions",
            ObjectKind::Sequence => "sequences",
            ObjectKind::Table => "tables",
            ObjectKind::Column => "columns",
            ObjectKind::View => "views",
            ObjectKind::Grant => "grants",
            ObjectKind::Owner => "owners",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Drop,
    Alter,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Create => "create",
            Action::Drop => "drop",
            Action::Alter => "alter",
        };
        f.write_str(label)
    }
}

impl Change {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Change::CreateFunction(_) | Change::DropFunction(_) => ObjectKind::Function,
            Change::CreateSequence(_) | Change::DropSequence(_) => ObjectKind::Sequence,
            Change::CreateTable(_) | Change::DropTable(_) => ObjectKind::Table,
            Change::AddColumn { .. } | Change::DropColumn { .. } | Change::AlterColumnType { .. } => {
                ObjectKind::Column
            }
            Change::CreateView(_) | Change::DropView(_) => ObjectKind::View,
            Change::GrantAll { .. } | Change::RevokeAll { .. } => ObjectKind::Grant,
            Change::SetOwner { .. } => ObjectKind::Owner,
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Change::CreateFunction(_)
            | Change::CreateSequence(_)
            | Change::CreateTable(_)
            | Change::AddColumn { .. }
            | Change::CreateView(_)
            | Change::GrantAll { .. } => Action::Create,
            Change::DropFunction(_)
            | Change::DropSequence(_)
            | Change::DropTable(_)
            | Change::DropColumn { .. }
            | Change::DropView(_)
            | Change::RevokeAll { .. } => Action::Drop,
            Change::AlterColumnType { .. } | Change::SetOwner { .. } => Action::Alter,
        }
    }

    /// Schema-qualified identifier recorded in the summary.
    pub fn identifier(&self, schema: &str) -> String {
        match self {
            Change::CreateFunction(Function { name, .. })
            | Change::CreateSequence(Sequence { name, .. })
            | Change::CreateTable(Table { name, .. })
            | Change::CreateView(View { name, .. })
            | Change::DropFunction(name)
            | Change::DropSequence(name)
            | Change::DropTable(name)
            | Change::DropView(name) => format!("{schema}.{name}"),
            Change::AddColumn { table, column } | Change::AlterColumnType { table, column } => {
                format!("{schema}.{table}.{}", column.name)
            }
            Change::DropColumn { table, column } => format!("{schema}.{table}.{column}"),
            Change::GrantAll { object, role } | Change::RevokeAll { object, role } => {
                format!("{schema}.{object} {role}")
            }
            Change::SetOwner { object, owner } => format!("{schema}.{object} {owner}"),
        }
    }
}

/// Changed objects grouped by kind, then by action, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary(BTreeMap<ObjectKind, BTreeMap<Action, Vec<String>>>);

impl Summary {
    pub fn record(&mut self, kind: ObjectKind, action: Action, identifier: String) {
        self.0
            .entry(kind)
            .or_default()
            .entry(action)
            .or_default()
            .push(identifier);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self, kind: ObjectKind, action: Action) -> &[String] {
        self.0
            .get(&kind)
            .and_then(|actions| actions.get(&action))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectKind, &BTreeMap<Action, Vec<String>>)> {
        self.0.iter()
    }

    pub fn count(&self) -> usize {
        self.0.values().flat_map(|a| a.values()).map(Vec::len).sum()
    }
}

/// Statements and summary for one slave.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub statements: Vec<String>,
    pub summary: Summary,
}

impl DiffResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty() && self.summary.is_empty()
    }

    pub fn from_changes(schema: &str, changes: &[Change]) -> Self {
        let mut result = Self::empty();
        for change in changes {
            result.statements.push(generate_statement(schema, change));
            result
                .summary
                .record(change.kind(), change.action(), change.identifier(schema));
        }
        result
    }
}

/// What the diff manages beyond object existence and column types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOptions {
    /// Grant and revoke roles on objects present on both sides.
    pub manage_grants: bool,
    /// Reassign owners on objects present on both sides.
    pub manage_ownership: bool,
}

pub fn compute_diff(master: &Snapshot, slave: &Snapshot, schema: &str) -> DiffResult {
    compute_diff_with_options(master, slave, schema, &DiffOptions::default())
}

pub fn compute_diff_with_options(
    master: &Snapshot,
    slave: &Snapshot,
    schema: &str,
    options: &DiffOptions,
) -> DiffResult {
    if master == slave {
        return DiffResult::empty();
    }
    let changes = compute_changes(master, slave, options);
    DiffResult::from_changes(schema, &changes)
}

/// Ordered changes: functions, then sequences, then tables, then views.
pub fn compute_changes(master: &Snapshot, slave: &Snapshot, options: &DiffOptions) -> Vec<Change> {
    let mut changes = Vec::new();

    let functions = diff_functions(master, slave);
    let sequences = diff_sequences(master, slave, options);
    let tables = diff_tables(master, slave, options);
    let views = diff_views(master, slave, options);

    debug!(
        functions = functions.len(),
        sequences = sequences.len(),
        tables = tables.len(),
        views = views.len(),
        "computed changes"
    );

    changes.extend(functions);
    changes.extend(sequences);
    changes.extend(tables);
    changes.extend(views);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn function(name: &str, definition: &str) -> Function {
        Function {
            name: name.to_string(),
            definition: definition.to_string(),
        }
    }

    fn view(name: &str, definition: &str) -> View {
        View {
            name: name.to_string(),
            owner: "app".to_string(),
            definition: definition.to_string(),
            grants: BTreeSet::new(),
        }
    }

    fn sequence(name: &str) -> Sequence {
        Sequence {
            name: name.to_string(),
            owner: "app".to_string(),
            increment: 1,
            min_value: 1,
            max_value: 1000,
            start_value: 1,
            grants: BTreeSet::new(),
        }
    }

    fn table(name: &str) -> Table {
        Table {
            name: name.to_string(),
            owner: "app".to_string(),
            tablespace: None,
            columns: vec![Column {
                name: "id".to_string(),
                data_type: "integer".to_string(),
                precision: String::new(),
                nullable: false,
            }],
            constraints: BTreeMap::new(),
            grants: BTreeSet::new(),
        }
    }

    #[test]
    fn identical_snapshots_produce_empty_result() {
        let mut snapshot = Snapshot::new();
        snapshot
            .functions
            .insert("f()".to_string(), function("f()", "CREATE FUNCTION f()"));
        snapshot.tables.insert("users".to_string(), table("users"));

        let result = compute_diff(&snapshot, &snapshot.clone(), "public");
        assert!(result.is_empty());
    }

    #[test]
    fn statements_follow_kind_order() {
        let mut master = Snapshot::new();
        master.views.insert("v".to_string(), view("v", "SELECT 1"));
        master.tables.insert("t".to_string(), table("t"));
        master.sequences.insert("s".to_string(), sequence("s"));
        master
            .functions
            .insert("f()".to_string(), function("f()", "CREATE FUNCTION f()"));

        let changes = compute_changes(&master, &Snapshot::new(), &DiffOptions::default());
        let kinds: Vec<ObjectKind> = changes.iter().map(Change::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ObjectKind::Function,
                ObjectKind::Sequence,
                ObjectKind::Table,
                ObjectKind::View
            ]
        );
    }

    #[test]
    fn dropped_view_is_summarized() {
        let mut slave = Snapshot::new();
        slave.views.insert("v".to_string(), view("v", "SELECT 1"));

        let result = compute_diff(&Snapshot::new(), &slave, "sales");
        assert_eq!(result.statements, vec!["drop view sales.v;".to_string()]);
        assert_eq!(result.summary.entries(ObjectKind::View, Action::Drop), ["sales.v"]);
        assert_eq!(result.summary.count(), 1);
    }

    #[test]
    fn summary_serializes_with_readable_keys() {
        let mut summary = Summary::default();
        summary.record(ObjectKind::Table, Action::Create, "public.users".to_string());

        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"tables":{"create":["public.users"]}}"#);
    }

    #[test]
    fn column_identifiers_are_qualified() {
        let change = Change::DropColumn {
            table: "users".to_string(),
            column: "age".to_string(),
        };
        assert_eq!(change.identifier("public"), "public.users.age");
        assert_eq!(change.kind(), ObjectKind::Column);
        assert_eq!(change.action(), Action::Drop);
    }
}
