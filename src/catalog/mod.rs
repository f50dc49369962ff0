//! Raw catalog rows as handed over by a database's metadata layer.
//!
//! Nothing here is normalized: grants may repeat, rows arrive in whatever
//! order the source produced them. [`crate::snapshot`] turns these into a
//! comparable [`crate::model::Snapshot`].

use crate::model::ConstraintKind;
use crate::util::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFunction {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSequence {
    pub name: String,
    pub owner: String,
    pub increment: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub start_value: i64,
    pub grants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    pub name: String,
    pub owner: String,
    pub tablespace: Option<String>,
    pub columns: Vec<CatalogColumn>,
    pub constraints: Vec<CatalogConstraint>,
    pub grants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub precision: Option<String>,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConstraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub source: String,
    pub column_ordinals: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogView {
    pub name: String,
    pub owner: String,
    pub definition: String,
    pub grants: Vec<String>,
}

/// Read-only access to the objects of one schema.
///
/// Implementations must fail with [`crate::util::SchemaError::SchemaNotSet`]
/// when handed an empty schema name, before issuing any query.
#[allow(async_fn_in_trait)]
pub trait CatalogSource {
    async fn functions(&self, schema: &str) -> Result<Vec<CatalogFunction>>;
    async fn sequences(&self, schema: &str) -> Result<Vec<CatalogSequence>>;
    async fn tables(&self, schema: &str) -> Result<Vec<CatalogTable>>;
    async fn views(&self, schema: &str) -> Result<Vec<CatalogView>>;
}

