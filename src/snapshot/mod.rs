use crate::catalog::{
    CatalogFunction, CatalogSequence, CatalogSource, CatalogTable, CatalogView,
};
use crate::model::{Column, Constraint, Function, Sequence, Snapshot, Table, View};
use crate::util::{Result, SchemaError};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Reads every object of `schema` from `source` into a fresh snapshot.
pub async fn build_snapshot<C: CatalogSource>(source: &C, schema: &str) -> Result<Snapshot> {
    if schema.trim().is_empty() {
        return Err(SchemaError::ConfigurationError(
            "no schema name supplied".to_string(),
        ));
    }

    let functions = source.functions(schema).await?;
    let sequences = source.sequences(schema).await?;
    let tables = source.tables(schema).await?;
    let views = source.views(schema).await?;

    let snapshot = normalize(functions, sequences, tables, views)?;
    debug!(
        schema,
        functions = snapshot.functions.len(),
        sequences = snapshot.sequences.len(),
        tables = snapshot.tables.len(),
        views = snapshot.views.len(),
        "built snapshot"
    );
    Ok(snapshot)
}

/// Projects raw catalog rows onto the comparable snapshot structure.
pub fn normalize(
    functions: Vec<CatalogFunction>,
    sequences: Vec<CatalogSequence>,
    tables: Vec<CatalogTable>,
    views: Vec<CatalogView>,
) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();

    for function in functions {
        let name = function.name.clone();
        insert_unique(
            &mut snapshot.functions,
            "function",
            name,
            Function {
                name: function.name,
                definition: function.definition,
            },
        )?;
    }

    for sequence in sequences {
        let name = sequence.name.clone();
        insert_unique(
            &mut snapshot.sequences,
            "sequence",
            name,
            Sequence {
                name: sequence.name,
                owner: sequence.owner,
                increment: sequence.increment,
                min_value: sequence.min_value,
                max_value: sequence.max_value,
                start_value: sequence.start_value,
                grants: collect_grants(sequence.grants),
            },
        )?;
    }

    for table in tables {
        let name = table.name.clone();
        let normalized = normalize_table(table)?;
        insert_unique(&mut snapshot.tables, "table", name, normalized)?;
    }

    for view in views {
        let name = view.name.clone();
        insert_unique(
            &mut snapshot.views,
            "view",
            name,
            View {
                name: view.name,
                owner: view.owner,
                definition: view.definition,
                grants: collect_grants(view.grants),
            },
        )?;
    }

    Ok(snapshot)
}

fn normalize_table(table: CatalogTable) -> Result<Table> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::with_capacity(table.columns.len());
    for column in table.columns {
        if !seen.insert(column.name.clone()) {
            return Err(SchemaError::InvalidCatalog(format!(
                "duplicate column {} in table {}",
                column.name, table.name
            )));
        }
        columns.push(Column {
            name: column.name,
            data_type: column.data_type,
            precision: column.precision.unwrap_or_default(),
            nullable: column.nullable,
        });
    }

    let mut constraints = BTreeMap::new();
    for constraint in table.constraints {
        if let Some(ordinal) = constraint
            .column_ordinals
            .iter()
            .find(|&&ordinal| ordinal == 0 || ordinal > columns.len())
        {
            return Err(SchemaError::InvalidCatalog(format!(
                "constraint {} on table {} refers to column position {ordinal}, table has {} columns",
                constraint.name,
                table.name,
                columns.len()
            )));
        }
        let name = constraint.name.clone();
        insert_unique(
            &mut constraints,
            "constraint",
            name,
            Constraint {
                name: constraint.name,
                kind: constraint.kind,
                source: constraint.source,
                column_ordinals: constraint.column_ordinals,
            },
        )?;
    }

    Ok(Table {
        name: table.name,
        owner: table.owner,
        tablespace: table.tablespace.filter(|t| !t.is_empty()),
        columns,
        constraints,
        grants: collect_grants(table.grants),
    })
}

fn collect_grants(grants: Vec<String>) -> BTreeSet<String> {
    grants.into_iter().filter(|g| !g.is_empty()).collect()
}

fn insert_unique<T>(
    map: &mut BTreeMap<String, T>,
    kind: &str,
    name: String,
    value: T,
) -> Result<()> {
    if map.contains_key(&name) {
        return Err(SchemaError::InvalidCatalog(format!("duplicate {kind} {name}")));
    }
    map.insert(name, value);
    Ok(())
}
