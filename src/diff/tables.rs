use crate::model::{Snapshot, Table};

use super::grants::{diff_grants, diff_owner};
use super::{Change, DiffOptions};

pub fn diff_tables(master: &Snapshot, slave: &Snapshot, options: &DiffOptions) -> Vec<Change> {
    let mut ops = Vec::new();

    for name in slave.tables.keys() {
        if !master.tables.contains_key(name) {
            ops.push(Change::DropTable(name.clone()));
        }
    }

    for (name, table) in &master.tables {
        if !slave.tables.contains_key(name) {
            ops.push(Change::CreateTable(table.clone()));
        }
    }

    for (name, table) in &master.tables {
        let Some(existing) = slave.tables.get(name) else {
            continue;
        };
        ops.extend(diff_columns(table, existing));
        if options.manage_ownership {
            ops.extend(diff_owner(name, &table.owner, &existing.owner));
        }
        if options.manage_grants {
            ops.extend(diff_grants(name, &table.grants, &existing.grants));
        }
    }

    ops
}

/// Added columns, then removed ones, then type or precision changes.
///
/// Nullability is not compared.
fn diff_columns(master: &Table, slave: &Table) -> Vec<Change> {
    let mut ops = Vec::new();

    for column in &master.columns {
        if slave.column(&column.name).is_none() {
            ops.push(Change::AddColumn {
                table: master.name.clone(),
                column: column.clone(),
            });
        }
    }

    for column in &slave.columns {
        if master.column(&column.name).is_none() {
            ops.push(Change::DropColumn {
                table: master.name.clone(),
                column: column.name.clone(),
            });
        }
    }

    for column in &master.columns {
        let Some(existing) = slave.column(&column.name) else {
            continue;
        };
        if existing.data_type != column.data_type || existing.precision != column.precision {
            ops.push(Change::AlterColumnType {
                table: master.name.clone(),
                column: column.clone(),
            });
        }
    }

    ops
}
