use std::iter::FromIterator;
use std::vec;

use crate::error::{Error, Result};
use crate::types::value::Value;
use crate::types::{AsRustType, ByName, IntoRustByName};

/// A single result row with named columns, kept in server order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Row { columns }
    }

    /// Checks if a column is present in the row.
    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(column, _)| column == name)
    }

    /// Checks for NULL for a given column. Returns false if given column does not exist.
    pub fn is_empty_by_name(&self, name: &str) -> bool {
        self.value(name).map(Value::is_null).unwrap_or(false)
    }

    /// Returns raw value of a column.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Sets a column value, replacing the previous one if present.
    pub fn set<S: Into<String>, V: Into<Value>>(&mut self, name: S, value: V) {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(column, _)| *column == name) {
            Some((_, old)) => *old = value,
            None => self.columns.push((name, value)),
        }
    }

    #[inline]
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut row = Row::default();
        for (name, value) in iter {
            row.set(name, value);
        }

        row
    }
}

impl ByName for Row {}

impl<R> IntoRustByName<R> for Row
where
    Value: AsRustType<R>,
{
    fn get_by_name(&self, name: &str) -> Result<Option<R>> {
        match self.value(name) {
            Some(value) => value.as_rust_type().map_err(|error| match error {
                Error::General(_) => Error::UnexpectedColumnType {
                    column: name.into(),
                    expected: std::any::type_name::<R>(),
                },
                error => error,
            }),
            None => Ok(None),
        }
    }
}

/// Rows returned by a request. Requests without rows (e.g. `REGISTER`) produce an empty result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(rows: Vec<Row>) -> Self {
        QueryResult { rows }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl From<Vec<Row>> for QueryResult {
    fn from(rows: Vec<Row>) -> Self {
        QueryResult::new(rows)
    }
}
