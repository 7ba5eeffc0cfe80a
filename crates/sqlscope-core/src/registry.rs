//! Explicit model registry.
//!
//! Application models register here once at startup. The registry is then
//! frozen behind an `Arc` and shared read-only for the life of the process.

use std::any::{TypeId, type_name};
use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{RegistryError, RegistryErrorKind, Result};
use crate::model::Model;

/// One registered column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub nullable: bool,
    pub primary_key: bool,
}

/// One registered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: &'static str,
    /// Rust type that registered the table.
    pub model: &'static str,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<&'static str>,
    #[serde(skip)]
    type_id: TypeId,
}

impl TableInfo {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Table metadata for every registered model, keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    tables: BTreeMap<&'static str, TableInfo>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model's table.
    pub fn register<M: Model>(&mut self) -> Result<()> {
        let table = M::TABLE_NAME;
        if table.trim().is_empty() {
            return Err(RegistryError::new(
                RegistryErrorKind::EmptyTableName,
                table,
                format!("model {} declares an empty table name", type_name::<M>()),
            )
            .into());
        }

        let fields = M::fields();
        if fields.is_empty() {
            return Err(RegistryError::new(
                RegistryErrorKind::NoFields,
                table,
                "model declares no fields",
            )
            .into());
        }

        for pk in M::PRIMARY_KEY {
            if !fields.iter().any(|f| f.column_name == *pk) {
                return Err(RegistryError::new(
                    RegistryErrorKind::UnknownPrimaryKey,
                    table,
                    format!("primary key column \"{}\" is not a field", pk),
                )
                .into());
            }
        }

        if let Some(existing) = self.tables.get(table) {
            return Err(RegistryError::new(
                RegistryErrorKind::DuplicateTable,
                table,
                format!("already registered by {}", existing.model),
            )
            .into());
        }

        let columns = fields
            .iter()
            .map(|f| ColumnInfo {
                name: f.column_name,
                sql_type: f.sql_type,
                nullable: f.nullable,
                primary_key: f.primary_key || M::PRIMARY_KEY.contains(&f.column_name),
            })
            .collect();

        tracing::debug!(table = table, model = type_name::<M>(), "Registered model");

        self.tables.insert(
            table,
            TableInfo {
                name: table,
                model: type_name::<M>(),
                columns,
                primary_key: M::PRIMARY_KEY.to_vec(),
                type_id: TypeId::of::<M>(),
            },
        );
        Ok(())
    }

    /// Builder-style registration for startup code.
    pub fn with<M: Model>(mut self) -> Result<Self> {
        self.register::<M>()?;
        Ok(self)
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(name)
    }

    /// Whether this exact model type is registered.
    pub fn contains<M: Model>(&self) -> bool {
        self.tables
            .get(M::TABLE_NAME)
            .is_some_and(|t| t.type_id == TypeId::of::<M>())
    }

    /// Registered tables sorted by name.
    pub fn tables(&self) -> impl Iterator<Item = &TableInfo> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Export all table metadata as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        let tables: Vec<&TableInfo> = self.tables.values().collect();
        serde_json::json!({ "tables": tables })
    }
}
