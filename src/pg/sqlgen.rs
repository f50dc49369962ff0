use crate::diff::Change;
use crate::model::{Column, Constraint, ConstraintKind, Function, Sequence, Table, View};
use tracing::warn;

/// Renders the DDL for one change. Multi-statement output is newline separated.
pub fn generate_statement(schema: &str, change: &Change) -> String {
    match change {
        Change::CreateFunction(function) => generate_create_function(function),

        Change::DropFunction(name) => format!("drop function {schema}.{name};"),

        Change::CreateSequence(sequence) => generate_create_sequence(schema, sequence),

        Change::DropSequence(name) => format!("drop sequence {schema}.{name};"),

        Change::CreateTable(table) => generate_create_table(schema, table),

        Change::DropTable(name) => format!("DROP TABLE {schema}.{name};"),

        Change::AddColumn { table, column } => format!(
            "-- not yet implemented: add column {} to table {schema}.{table}",
            column.name
        ),

        Change::DropColumn { table, column } => {
            format!("-- not yet implemented: delete column {column} from table {schema}.{table}")
        }

        Change::AlterColumnType { table, column } => format!(
            "ALTER TABLE {schema}.{table} ALTER {} TYPE {};",
            column.name,
            format_type(column)
        ),

        Change::CreateView(view) => generate_create_view(schema, view),

        Change::DropView(name) => format!("drop view {schema}.{name};"),

        Change::GrantAll { object, role } => grant_all(schema, object, role),

        Change::RevokeAll { object, role } => {
            format!("REVOKE ALL ON TABLE {schema}.{object} FROM {role};")
        }

        Change::SetOwner { object, owner } => owner_to(schema, object, owner),
    }
}

fn generate_create_function(function: &Function) -> String {
    let definition = function.definition.trim_end();
    if definition.ends_with(';') {
        definition.to_string()
    } else {
        format!("{definition};")
    }
}

fn generate_create_sequence(schema: &str, sequence: &Sequence) -> String {
    let mut lines = vec![
        format!("CREATE SEQUENCE {schema}.{}", sequence.name),
        format!("  INCREMENT {}", sequence.increment),
        format!("  MINVALUE {}", sequence.min_value),
        format!("  MAXVALUE {}", sequence.max_value),
        format!("  START {};", sequence.start_value),
    ];
    lines.push(owner_to(schema, &sequence.name, &sequence.owner));
    lines.extend(
        sequence
            .grants
            .iter()
            .map(|role| grant_all(schema, &sequence.name, role)),
    );
    lines.join("\n")
}

fn generate_create_table(schema: &str, table: &Table) -> String {
    let mut definitions: Vec<String> = table.columns.iter().map(format_column).collect();
    definitions.extend(
        table
            .constraints
            .values()
            .filter_map(|constraint| format_constraint(table, constraint)),
    );

    let mut lines = vec![
        format!("CREATE TABLE {schema}.{}(", table.name),
        format!(" {}", definitions.join(",\n ")),
    ];
    match &table.tablespace {
        Some(tablespace) => {
            lines.push(")".to_string());
            lines.push(format!("TABLESPACE {tablespace};"));
        }
        None => lines.push(");".to_string()),
    }
    lines.push(owner_to(schema, &table.name, &table.owner));
    lines.extend(
        table
            .grants
            .iter()
            .map(|role| grant_all(schema, &table.name, role)),
    );
    lines.join("\n")
}

fn generate_create_view(schema: &str, view: &View) -> String {
    let mut lines = vec![
        format!("CREATE OR REPLACE VIEW {schema}.{} AS", view.name),
        format!("  {};", view.definition),
    ];
    lines.push(owner_to(schema, &view.name, &view.owner));
    lines.extend(
        view.grants
            .iter()
            .map(|role| grant_all(schema, &view.name, role)),
    );
    lines.join("\n")
}

fn format_column(column: &Column) -> String {
    let mut definition = format!("{} {}", column.name, format_type(column));
    if !column.nullable {
        definition.push_str(" NOT NULL");
    }
    definition
}

fn format_type(column: &Column) -> String {
    if column.precision.is_empty() {
        column.data_type.clone()
    } else {
        format!("{}({})", column.data_type, column.precision)
    }
}

/// Constraint clause inside `CREATE TABLE`, with column positions resolved
/// against the table's own column order.
fn format_constraint(table: &Table, constraint: &Constraint) -> Option<String> {
    match constraint.kind {
        ConstraintKind::Check => Some(format!(
            "CONSTRAINT {} CHECK {}",
            constraint.name, constraint.source
        )),
        ConstraintKind::PrimaryKey => Some(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            constraint.name,
            resolve_columns(table, constraint)
        )),
        ConstraintKind::Unique => Some(format!(
            "CONSTRAINT {} UNIQUE ({})",
            constraint.name,
            resolve_columns(table, constraint)
        )),
        ConstraintKind::ForeignKey | ConstraintKind::Exclusion => {
            warn!(
                table = %table.name,
                constraint = %constraint.name,
                kind = ?constraint.kind,
                "constraint kind is not rendered into CREATE TABLE"
            );
            None
        }
    }
}

fn resolve_columns(table: &Table, constraint: &Constraint) -> String {
    constraint
        .column_ordinals
        .iter()
        .filter_map(|&ordinal| table.column_name_at(ordinal))
        .collect::<Vec<_>>()
        .join(", ")
}

fn owner_to(schema: &str, object: &str, owner: &str) -> String {
    format!("ALTER TABLE {schema}.{object} OWNER TO {owner};")
}

fn grant_all(schema: &str, object: &str, role: &str) -> String {
    format!("GRANT ALL ON TABLE {schema}.{object} TO {role};")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn column(name: &str, data_type: &str, precision: &str, nullable: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            precision: precision.to_string(),
            nullable,
        }
    }

    fn users_table() -> Table {
        let mut constraints = BTreeMap::new();
        constraints.insert(
            "users_pkey".to_string(),
            Constraint {
                name: "users_pkey".to_string(),
                kind: ConstraintKind::PrimaryKey,
                source: "PRIMARY KEY (id)".to_string(),
                column_ordinals: vec![1],
            },
        );
        Table {
            name: "users".to_string(),
            owner: "app".to_string(),
            tablespace: None,
            columns: vec![
                column("id", "integer", "", false),
                column("name", "character varying", "50", true),
                column("age", "integer", "", true),
            ],
            constraints,
            grants: ["reader", "writer"].iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn create_table_generates_full_ddl() {
        let sql = generate_statement("public", &Change::CreateTable(users_table()));
        assert_eq!(
            sql,
            "CREATE TABLE public.users(\n \
             id integer NOT NULL,\n \
             name character varying(50),\n \
             age integer,\n \
             CONSTRAINT users_pkey PRIMARY KEY (id)\n\
             );\n\
             ALTER TABLE public.users OWNER TO app;\n\
             GRANT ALL ON TABLE public.users TO reader;\n\
             GRANT ALL ON TABLE public.users TO writer;"
        );
    }

    #[test]
    fn create_table_with_tablespace() {
        let mut table = users_table();
        table.tablespace = Some("fast_ssd".to_string());
        table.grants.clear();

        let sql = generate_statement("public", &Change::CreateTable(table));
        assert!(sql.contains("\n)\nTABLESPACE fast_ssd;\nALTER TABLE public.users OWNER TO app;"));
        assert!(!sql.contains("GRANT"));
    }

    #[test]
    fn primary_key_resolves_ordinals_to_names() {
        let mut table = users_table();
        table.constraints.insert(
            "users_pkey".to_string(),
            Constraint {
                name: "users_pkey".to_string(),
                kind: ConstraintKind::PrimaryKey,
                source: String::new(),
                column_ordinals: vec![3, 1],
            },
        );

        let sql = generate_statement("public", &Change::CreateTable(table));
        assert!(sql.contains("CONSTRAINT users_pkey PRIMARY KEY (age, id)"));
    }

    #[test]
    fn check_constraint_uses_source_verbatim() {
        let mut table = users_table();
        table.constraints.insert(
            "age_positive".to_string(),
            Constraint {
                name: "age_positive".to_string(),
                kind: ConstraintKind::Check,
                source: "((age > 0))".to_string(),
                column_ordinals: vec![3],
            },
        );

        let sql = generate_statement("public", &Change::CreateTable(table));
        assert!(sql.contains("CONSTRAINT age_positive CHECK ((age > 0))"));
    }

    #[test]
    fn foreign_keys_are_skipped() {
        let mut table = users_table();
        table.constraints.insert(
            "users_org_fkey".to_string(),
            Constraint {
                name: "users_org_fkey".to_string(),
                kind: ConstraintKind::ForeignKey,
                source: "FOREIGN KEY (age) REFERENCES orgs(id)".to_string(),
                column_ordinals: vec![3],
            },
        );

        let sql = generate_statement("public", &Change::CreateTable(table));
        assert!(!sql.contains("users_org_fkey"));
    }

    #[test]
    fn create_sequence_uses_recorded_start() {
        let sequence = Sequence {
            name: "order_seq".to_string(),
            owner: "app".to_string(),
            increment: 2,
            min_value: 10,
            max_value: 5000,
            start_value: 100,
            grants: BTreeSet::from(["reader".to_string()]),
        };

        let sql = generate_statement("shop", &Change::CreateSequence(sequence));
        assert_eq!(
            sql,
            "CREATE SEQUENCE shop.order_seq\n  \
             INCREMENT 2\n  \
             MINVALUE 10\n  \
             MAXVALUE 5000\n  \
             START 100;\n\
             ALTER TABLE shop.order_seq OWNER TO app;\n\
             GRANT ALL ON TABLE shop.order_seq TO reader;"
        );
    }

    #[test]
    fn create_view_generates_replace() {
        let view = View {
            name: "adults".to_string(),
            owner: "app".to_string(),
            definition: "SELECT id FROM users WHERE age >= 18".to_string(),
            grants: BTreeSet::new(),
        };

        let sql = generate_statement("public", &Change::CreateView(view));
        assert_eq!(
            sql,
            "CREATE OR REPLACE VIEW public.adults AS\n  \
             SELECT id FROM users WHERE age >= 18;\n\
             ALTER TABLE public.adults OWNER TO app;"
        );
    }

    #[test]
    fn alter_column_type_with_and_without_precision() {
        let with_precision = Change::AlterColumnType {
            table: "users".to_string(),
            column: column("name", "character varying", "100", true),
        };
        assert_eq!(
            generate_statement("public", &with_precision),
            "ALTER TABLE public.users ALTER name TYPE character varying(100);"
        );

        let without_precision = Change::AlterColumnType {
            table: "users".to_string(),
            column: column("age", "bigint", "", true),
        };
        assert_eq!(
            generate_statement("public", &without_precision),
            "ALTER TABLE public.users ALTER age TYPE bigint;"
        );
    }

    #[test]
    fn column_add_and_drop_are_comments() {
        let add = Change::AddColumn {
            table: "users".to_string(),
            column: column("email", "text", "", true),
        };
        let drop = Change::DropColumn {
            table: "users".to_string(),
            column: "nickname".to_string(),
        };
        assert!(generate_statement("public", &add).starts_with("-- not yet implemented"));
        assert!(generate_statement("public", &drop).starts_with("-- not yet implemented"));
    }

    #[test]
    fn function_definition_gets_terminator() {
        let function = Function {
            name: "touch()".to_string(),
            definition: "CREATE OR REPLACE FUNCTION public.touch()\n RETURNS void\n LANGUAGE sql\nAS $function$ SELECT 1 $function$\n".to_string(),
        };
        let sql = generate_statement("public", &Change::CreateFunction(function));
        assert!(sql.ends_with("$function$;"));

        assert_eq!(
            generate_statement("public", &Change::DropFunction("touch()".to_string())),
            "drop function public.touch();"
        );
    }

    #[test]
    fn grant_revoke_and_owner() {
        let grant = Change::GrantAll {
            object: "users".to_string(),
            role: "reader".to_string(),
        };
        let revoke = Change::RevokeAll {
            object: "users".to_string(),
            role: "legacy".to_string(),
        };
        let owner = Change::SetOwner {
            object: "users".to_string(),
            owner: "app".to_string(),
        };
        assert_eq!(
            generate_statement("public", &grant),
            "GRANT ALL ON TABLE public.users TO reader;"
        );
        assert_eq!(
            generate_statement("public", &revoke),
            "REVOKE ALL ON TABLE public.users FROM legacy;"
        );
        assert_eq!(
            generate_statement("public", &owner),
            "ALTER TABLE public.users OWNER TO app;"
        );
    }
}
