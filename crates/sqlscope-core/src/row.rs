//! Result rows.

use std::sync::Arc;

use crate::Value;

/// A single row returned by a query.
///
/// Column names are shared between all rows of one result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row. `values` must line up with `columns`.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value by column name.
    pub fn get_named(&self, name: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_lookup() {
        let columns: Arc<[String]> = Arc::from(vec!["id".to_string(), "name".to_string()]);
        let row = Row::new(columns, vec![Value::BigInt(1), Value::from("Deadpond")]);
        assert_eq!(row.len(), 2);
        assert_eq!(row.get_named("name"), Some(&Value::from("Deadpond")));
        assert!(row.get_named("age").is_none());
        assert_eq!(row.column_names().collect::<Vec<_>>(), vec!["id", "name"]);
    }
}
