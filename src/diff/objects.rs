use crate::model::Snapshot;

use super::grants::{diff_grants, diff_owner};
use super::{Change, DiffOptions};

/// Drops first, then creates for functions that are new or whose definition text changed.
pub fn diff_functions(master: &Snapshot, slave: &Snapshot) -> Vec<Change> {
    let mut ops = Vec::new();

    for name in slave.functions.keys() {
        if !master.functions.contains_key(name) {
            ops.push(Change::DropFunction(name.clone()));
        }
    }

    for (name, function) in &master.functions {
        let changed = match slave.functions.get(name) {
            Some(existing) => existing.definition != function.definition,
            None => true,
        };
        if changed {
            ops.push(Change::CreateFunction(function.clone()));
        }
    }

    ops
}

/// Sequences are only created or dropped; parameter drift is left alone.
pub fn diff_sequences(master: &Snapshot, slave: &Snapshot, options: &DiffOptions) -> Vec<Change> {
    let mut ops = Vec::new();

    for name in slave.sequences.keys() {
        if !master.sequences.contains_key(name) {
            ops.push(Change::DropSequence(name.clone()));
        }
    }

    for (name, sequence) in &master.sequences {
        if !slave.sequences.contains_key(name) {
            ops.push(Change::CreateSequence(sequence.clone()));
        }
    }

    for (name, sequence) in &master.sequences {
        let Some(existing) = slave.sequences.get(name) else {
            continue;
        };
        if options.manage_ownership {
            ops.extend(diff_owner(name, &sequence.owner, &existing.owner));
        }
        if options.manage_grants {
            ops.extend(diff_grants(name, &sequence.grants, &existing.grants));
        }
    }

    ops
}

/// A changed view is re-created in full with `CREATE OR REPLACE`.
pub fn diff_views(master: &Snapshot, slave: &Snapshot, options: &DiffOptions) -> Vec<Change> {
    let mut ops = Vec::new();

    for name in slave.views.keys() {
        if !master.views.contains_key(name) {
            ops.push(Change::DropView(name.clone()));
        }
    }

    for (name, view) in &master.views {
        match slave.views.get(name) {
            None => ops.push(Change::CreateView(view.clone())),
            Some(existing) if existing.definition != view.definition => {
                ops.push(Change::CreateView(view.clone()));
                // The replacement already sets the owner and master's grants.
                if options.manage_grants {
                    ops.extend(
                        diff_grants(name, &view.grants, &existing.grants)
                            .into_iter()
                            .filter(|op| matches!(op, Change::RevokeAll { .. })),
                    );
                }
            }
            Some(existing) => {
                if options.manage_ownership {
                    ops.extend(diff_owner(name, &view.owner, &existing.owner));
                }
                if options.manage_grants {
                    ops.extend(diff_grants(name, &view.grants, &existing.grants));
                }
            }
        }
    }

    ops
}
