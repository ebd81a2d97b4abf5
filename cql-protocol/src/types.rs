use crate::error::{column_is_empty_err, Result};

pub mod rows;
pub mod value;

pub use crate::types::rows::{QueryResult, Row};
pub use crate::types::value::Value;

/// Converts a column value into a Rust type. `None` stands for a `NULL` column.
pub trait AsRustType<T> {
    fn as_rust_type(&self) -> Result<Option<T>>;
}

pub trait IntoRustByName<R> {
    fn get_by_name(&self, name: &str) -> Result<Option<R>>;

    fn get_r_by_name(&self, name: &str) -> Result<R> {
        self.get_by_name(name)
            .and_then(|op| op.ok_or_else(|| column_is_empty_err(name)))
    }
}

pub trait ByName {
    fn by_name<R>(&self, name: &str) -> Result<Option<R>>
    where
        Self: IntoRustByName<R>,
    {
        self.get_by_name(name)
    }

    fn r_by_name<R>(&self, name: &str) -> Result<R>
    where
        Self: IntoRustByName<R>,
    {
        self.get_r_by_name(name)
    }
}
