//! Builders materialize user-defined values field by field. The protocol layer looks them up in
//! a [`BuilderRegistry`] by keyspace and type name.

use bitflags::bitflags;
use std::any::Any;

use crate::error::Result;
use crate::types::rows::Row;
use crate::types::value::Value;

mod registry;

pub use self::registry::BuilderRegistry;

/// Finished value produced by a builder.
pub type Built = Box<dyn Any + Send>;

bitflags! {
    /// Operations a builder factory supports. The registry only accepts factories supporting all
    /// of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BuilderCapabilities: u8 {
        /// Factory can construct new, empty builders.
        const CONSTRUCT = 0x01;
        /// Builders accept field assignment.
        const ASSIGN = 0x02;
        /// Builders can be finalized into a value.
        const BUILD = 0x04;
    }
}

/// Accumulates fields of a single value.
pub trait Builder: Send {
    /// Assigns a field.
    fn set(&mut self, field: &str, value: Value) -> Result<()>;

    /// Finalizes the value.
    fn build(self: Box<Self>) -> Result<Built>;
}

/// Creates builders of one kind of value.
pub trait BuilderFactory: Send + Sync {
    fn capabilities(&self) -> BuilderCapabilities;

    fn create(&self) -> Box<dyn Builder>;
}

/// Builds values as plain [`Row`]s with one column per field.
#[derive(Default, Debug)]
pub struct RowBuilder {
    row: Row,
}

impl Builder for RowBuilder {
    fn set(&mut self, field: &str, value: Value) -> Result<()> {
        self.row.set(field, value);
        Ok(())
    }

    fn build(self: Box<Self>) -> Result<Built> {
        Ok(Box::new(self.row))
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct RowBuilderFactory;

impl BuilderFactory for RowBuilderFactory {
    fn capabilities(&self) -> BuilderCapabilities {
        BuilderCapabilities::all()
    }

    fn create(&self) -> Box<dyn Builder> {
        Box::new(RowBuilder::default())
    }
}
