use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Normalized state of one schema on one database.
///
/// Every map is keyed by the object's name within the schema, so two
/// snapshots taken from different databases can be compared key by key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub functions: BTreeMap<String, Function>,
    pub sequences: BTreeMap<String, Sequence>,
    pub tables: BTreeMap<String, Table>,
    pub views: BTreeMap<String, View>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sequence {
    pub name: String,
    pub owner: String,
    pub increment: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub start_value: i64,
    pub grants: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub owner: String,
    pub tablespace: Option<String>,
    /// Declaration order; constraints refer to these positions.
    pub columns: Vec<Column>,
    pub constraints: BTreeMap<String, Constraint>,
    pub grants: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    /// Empty when the type takes no precision clause.
    pub precision: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub source: String,
    /// 1-based positions into the owning table's column list.
    pub column_ordinals: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConstraintKind {
    Check,
    PrimaryKey,
    Unique,
    ForeignKey,
    Exclusion,
}

impl ConstraintKind {
    /// Maps `pg_constraint.contype` to a kind.
    pub fn from_contype(contype: char) -> Option<Self> {
        match contype {
            'c' => Some(ConstraintKind::Check),
            'p' => Some(ConstraintKind::PrimaryKey),
            'u' => Some(ConstraintKind::Unique),
            'f' => Some(ConstraintKind::ForeignKey),
            'x' => Some(ConstraintKind::Exclusion),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct View {
    pub name: String,
    pub owner: String,
    pub definition: String,
    pub grants: BTreeSet<String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
            && self.sequences.is_empty()
            && self.tables.is_empty()
            && self.views.is_empty()
    }

    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        // Maps and sets are ordered, so the JSON form is canonical.
        let json = serde_json::to_string(self).unwrap_or_default();
        let hash = Sha256::digest(json.as_bytes());
        hex::encode(hash)
    }
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Resolves a 1-based column position to the column's name.
    pub fn column_name_at(&self, ordinal: usize) -> Option<&str> {
        ordinal
            .checked_sub(1)
            .and_then(|index| self.columns.get(index))
            .map(|c| c.name.as_str())
    }
}

pub fn qualified_name(schema: &str, name: &str) -> String {
    format!("{schema}.{name}")
}
