//! Model metadata.
//!
//! A `Model` is a Rust type mapped to one table. Its metadata is static so
//! the registry can be assembled at startup without runtime reflection.

/// Metadata about one mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Rust field name.
    pub name: &'static str,
    /// Column name in the database.
    pub column_name: &'static str,
    /// SQL type as written in DDL (`BIGINT`, `TEXT`, ...).
    pub sql_type: &'static str,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

impl FieldInfo {
    /// A non-null column whose name matches the field name.
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self {
            name,
            column_name: name,
            sql_type,
            nullable: false,
            primary_key: false,
        }
    }

    /// Map the field to a differently-named column.
    pub const fn column(mut self, column_name: &'static str) -> Self {
        self.column_name = column_name;
        self
    }

    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub const fn primary_key(mut self, primary_key: bool) -> Self {
        self.primary_key = primary_key;
        self
    }
}

/// A type mapped to a database table.
///
/// # Example
///
/// ```ignore
/// struct Hero;
///
/// impl Model for Hero {
///     const TABLE_NAME: &'static str = "heroes";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///
///     fn fields() -> &'static [FieldInfo] {
///         static FIELDS: [FieldInfo; 2] = [
///             FieldInfo::new("id", "BIGINT").primary_key(true),
///             FieldInfo::new("name", "TEXT"),
///         ];
///         &FIELDS
///     }
/// }
/// ```
pub trait Model: Send + Sync + 'static {
    /// Table this model maps to.
    const TABLE_NAME: &'static str;

    /// Primary-key column names.
    const PRIMARY_KEY: &'static [&'static str];

    /// Column metadata in declaration order.
    fn fields() -> &'static [FieldInfo];
}
