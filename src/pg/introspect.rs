use crate::catalog::{
    CatalogColumn, CatalogConstraint, CatalogFunction, CatalogSequence, CatalogSource,
    CatalogTable, CatalogView,
};
use crate::model::ConstraintKind;
use crate::pg::connection::PgConnection;
use crate::util::{Result, SchemaError};
use sqlx::Row;
use std::collections::HashMap;

fn require_schema(schema: &str) -> Result<()> {
    if schema.is_empty() {
        return Err(SchemaError::SchemaNotSet);
    }
    Ok(())
}

impl CatalogSource for PgConnection {
    async fn functions(&self, schema: &str) -> Result<Vec<CatalogFunction>> {
        require_schema(schema)?;
        let rows = sqlx::query(
            r#"
            SELECT
                p.proname || '(' || pg_get_function_identity_arguments(p.oid) || ')' AS name,
                pg_get_functiondef(p.oid) AS definition
            FROM pg_proc p
            JOIN pg_namespace n ON p.pronamespace = n.oid
            WHERE n.nspname = $1
              AND p.prokind = 'f'
              AND NOT EXISTS (
                  SELECT 1 FROM pg_depend d
                  WHERE d.classid = 'pg_proc'::regclass
                    AND d.objid = p.oid
                    AND d.deptype = 'e'
              )
            ORDER BY 1
            "#,
        )
        .bind(schema)
        .fetch_all(self.pool())
        .await
        .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch functions: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| CatalogFunction {
                name: row.get("name"),
                definition: row.get("definition"),
            })
            .collect())
    }

    async fn sequences(&self, schema: &str) -> Result<Vec<CatalogSequence>> {
        require_schema(schema)?;
        let rows = sqlx::query(
            r#"
            SELECT
                s.sequencename::text AS name,
                s.sequenceowner::text AS owner,
                s.increment_by,
                s.min_value,
                s.max_value,
                s.start_value,
                ARRAY(
                    SELECT DISTINCT COALESCE(r.rolname::text, 'PUBLIC')
                    FROM aclexplode(c.relacl) a
                    LEFT JOIN pg_roles r ON r.oid = a.grantee
                    WHERE a.grantee <> c.relowner
                    ORDER BY 1
                ) AS grants
            FROM pg_sequences s
            JOIN pg_namespace n ON n.nspname = s.schemaname
            JOIN pg_class c ON c.relname = s.sequencename AND c.relnamespace = n.oid
            WHERE s.schemaname = $1
            ORDER BY s.sequencename
            "#,
        )
        .bind(schema)
        .fetch_all(self.pool())
        .await
        .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch sequences: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| CatalogSequence {
                name: row.get("name"),
                owner: row.get("owner"),
                increment: row.get("increment_by"),
                min_value: row.get("min_value"),
                max_value: row.get("max_value"),
                start_value: row.get("start_value"),
                grants: row.get("grants"),
            })
            .collect())
    }

    async fn tables(&self, schema: &str) -> Result<Vec<CatalogTable>> {
        require_schema(schema)?;
        let rows = sqlx::query(
            r#"
            SELECT
                t.tablename::text AS name,
                t.tableowner::text AS owner,
                t.tablespace::text AS tablespace,
                ARRAY(
                    SELECT DISTINCT COALESCE(r.rolname::text, 'PUBLIC')
                    FROM aclexplode(c.relacl) a
                    LEFT JOIN pg_roles r ON r.oid = a.grantee
                    WHERE a.grantee <> c.relowner
                    ORDER BY 1
                ) AS grants
            FROM pg_tables t
            JOIN pg_namespace n ON n.nspname = t.schemaname
            JOIN pg_class c ON c.relname = t.tablename AND c.relnamespace = n.oid
            WHERE t.schemaname = $1
            ORDER BY t.tablename
            "#,
        )
        .bind(schema)
        .fetch_all(self.pool())
        .await
        .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.get("name");
            let (columns, attnums) = introspect_columns(self, schema, &name).await?;
            let constraints = introspect_constraints(self, schema, &name, &attnums).await?;
            tables.push(CatalogTable {
                name,
                owner: row.get("owner"),
                tablespace: row.get("tablespace"),
                columns,
                constraints,
                grants: row.get("grants"),
            });
        }

        Ok(tables)
    }

    async fn views(&self, schema: &str) -> Result<Vec<CatalogView>> {
        require_schema(schema)?;
        let rows = sqlx::query(
            r#"
            SELECT
                v.viewname::text AS name,
                v.viewowner::text AS owner,
                v.definition,
                ARRAY(
                    SELECT DISTINCT COALESCE(r.rolname::text, 'PUBLIC')
                    FROM aclexplode(c.relacl) a
                    LEFT JOIN pg_roles r ON r.oid = a.grantee
                    WHERE a.grantee <> c.relowner
                    ORDER BY 1
                ) AS grants
            FROM pg_views v
            JOIN pg_namespace n ON n.nspname = v.schemaname
            JOIN pg_class c ON c.relname = v.viewname AND c.relnamespace = n.oid
            WHERE v.schemaname = $1
            ORDER BY v.viewname
            "#,
        )
        .bind(schema)
        .fetch_all(self.pool())
        .await
        .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch views: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let definition: String = row.get("definition");
                CatalogView {
                    name: row.get("name"),
                    owner: row.get("owner"),
                    definition: definition.trim().trim_end_matches(';').to_string(),
                    grants: row.get("grants"),
                }
            })
            .collect())
    }
}

/// Columns in declaration order, plus a map from attribute number to 1-based position.
///
/// Attribute numbers keep gaps left by dropped columns; positions do not.
async fn introspect_columns(
    connection: &PgConnection,
    schema: &str,
    table: &str,
) -> Result<(Vec<CatalogColumn>, HashMap<i32, usize>)> {
    let rows = sqlx::query(
        r#"
        SELECT
            ordinal_position::int4 AS attnum,
            column_name::text AS column_name,
            data_type::text AS data_type,
            udt_schema::text AS udt_schema,
            udt_name::text AS udt_name,
            character_maximum_length::int4 AS char_max_length,
            numeric_precision::int4 AS numeric_precision,
            numeric_scale::int4 AS numeric_scale,
            is_nullable::text AS is_nullable
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(connection.pool())
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch columns: {e}")))?;

    let mut columns = Vec::with_capacity(rows.len());
    let mut positions = HashMap::new();
    for (index, row) in rows.into_iter().enumerate() {
        let attnum: i32 = row.get("attnum");
        let data_type = column_type(
            &row.get::<String, _>("data_type"),
            &row.get::<String, _>("udt_schema"),
            &row.get::<String, _>("udt_name"),
        );
        let precision = column_precision(
            &data_type,
            row.get("char_max_length"),
            row.get("numeric_precision"),
            row.get("numeric_scale"),
        );
        let is_nullable: String = row.get("is_nullable");

        positions.insert(attnum, index + 1);
        columns.push(CatalogColumn {
            name: row.get("column_name"),
            data_type,
            precision,
            nullable: is_nullable == "YES",
        });
    }

    Ok((columns, positions))
}

/// Spells out the types `information_schema` reports only as `ARRAY` or `USER-DEFINED`.
///
/// Array element names carry a leading underscore in `udt_name`. Types outside
/// `pg_catalog` are schema-qualified so the DDL resolves on any search path.
fn column_type(data_type: &str, udt_schema: &str, udt_name: &str) -> String {
    match data_type {
        "ARRAY" => {
            let element = udt_name.strip_prefix('_').unwrap_or(udt_name);
            format!("{}[]", qualified_type(udt_schema, element))
        }
        "USER-DEFINED" => qualified_type(udt_schema, udt_name),
        _ => data_type.to_string(),
    }
}

fn qualified_type(schema: &str, name: &str) -> String {
    if schema == "pg_catalog" {
        name.to_string()
    } else {
        format!("{schema}.{name}")
    }
}

fn column_precision(
    data_type: &str,
    char_max_length: Option<i32>,
    numeric_precision: Option<i32>,
    numeric_scale: Option<i32>,
) -> Option<String> {
    if let Some(length) = char_max_length {
        return Some(length.to_string());
    }
    if data_type != "numeric" {
        return None;
    }
    match (numeric_precision, numeric_scale) {
        (Some(precision), Some(scale)) => Some(format!("{precision},{scale}")),
        (Some(precision), None) => Some(precision.to_string()),
        _ => None,
    }
}

async fn introspect_constraints(
    connection: &PgConnection,
    schema: &str,
    table: &str,
    positions: &HashMap<i32, usize>,
) -> Result<Vec<CatalogConstraint>> {
    let rows = sqlx::query(
        r#"
        SELECT
            con.conname::text AS name,
            con.contype::text AS contype,
            pg_get_constraintdef(con.oid) AS definition,
            COALESCE(con.conkey, '{}')::int4[] AS conkey
        FROM pg_constraint con
        JOIN pg_class c ON c.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        WHERE n.nspname = $1 AND c.relname = $2
        ORDER BY con.conname
        "#,
    )
    .bind(schema)
    .bind(table)
    .fetch_all(connection.pool())
    .await
    .map_err(|e| SchemaError::DatabaseError(format!("Failed to fetch constraints: {e}")))?;

    let mut constraints = Vec::new();
    for row in rows {
        let contype: String = row.get("contype");
        let Some(kind) = contype.chars().next().and_then(ConstraintKind::from_contype) else {
            continue;
        };
        let definition: String = row.get("definition");
        let conkey: Vec<i32> = row.get("conkey");

        constraints.push(CatalogConstraint {
            name: row.get("name"),
            kind,
            source: constraint_source(kind, &definition),
            column_ordinals: conkey
                .iter()
                .filter_map(|attnum| positions.get(attnum).copied())
                .collect(),
        });
    }

    Ok(constraints)
}

/// `CHECK` sources keep only the expression; other kinds keep the full definition.
fn constraint_source(kind: ConstraintKind, definition: &str) -> String {
    match kind {
        ConstraintKind::Check => definition
            .strip_prefix("CHECK ")
            .unwrap_or(definition)
            .to_string(),
        _ => definition.to_string(),
    }
}
