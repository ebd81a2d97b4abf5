use arc_swap::ArcSwap;
use fxhash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::*;

use crate::builders::{BuilderCapabilities, BuilderFactory, Built, RowBuilderFactory};
use crate::error::{Error, Result};
use crate::types::value::Value;

type BuilderMap = FxHashMap<String, Arc<dyn BuilderFactory>>;

/// Thread-safe lookup of builder factories keyed by keyspace and identifier, with a default used
/// for unregistered keys.
///
/// Readers load an immutable snapshot and never block. Writers copy the current map, apply their
/// change and swap the new map in while holding the write lock.
///
/// Keys are `"{keyspace}.{identifier}"` without escaping, so `("a.b", "c")` and `("a", "b.c")`
/// refer to the same entry.
pub struct BuilderRegistry {
    builders: ArcSwap<BuilderMap>,
    default: ArcSwap<Arc<dyn BuilderFactory>>,
    writer: Mutex<()>,
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        BuilderRegistry {
            builders: ArcSwap::from_pointee(BuilderMap::default()),
            default: ArcSwap::from_pointee(Arc::new(RowBuilderFactory) as Arc<dyn BuilderFactory>),
            writer: Mutex::new(()),
        }
    }
}

impl BuilderRegistry {
    /// Creates a registry with a custom default factory.
    pub fn new(default: Arc<dyn BuilderFactory>) -> Result<Self> {
        validate_builder(default.as_ref())?;

        Ok(BuilderRegistry {
            default: ArcSwap::from_pointee(default),
            ..Default::default()
        })
    }

    /// Returns the factory registered for given key, or the default one.
    pub fn fetch(&self, keyspace: &str, identifier: &str) -> Arc<dyn BuilderFactory> {
        self.builders
            .load()
            .get(&determine_key(keyspace, identifier))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&**self.default.load()))
    }

    /// Registers a factory for given key, replacing any previous one.
    pub fn add(
        &self,
        keyspace: &str,
        identifier: &str,
        builder: Arc<dyn BuilderFactory>,
    ) -> Result<()> {
        validate_builder(builder.as_ref())?;
        let key = determine_key(keyspace, identifier);

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut builders = BuilderMap::clone(&self.builders.load());
        builders.insert(key, builder);
        self.builders.store(Arc::new(builders));

        Ok(())
    }

    /// Removes factory registered for given key. Subsequent fetches fall back to the default.
    pub fn remove(&self, keyspace: &str, identifier: &str) {
        let key = determine_key(keyspace, identifier);

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut builders = BuilderMap::clone(&self.builders.load());
        if builders.remove(&key).is_some() {
            self.builders.store(Arc::new(builders));
        }
    }

    /// Replaces the default factory.
    pub fn set_default(&self, builder: Arc<dyn BuilderFactory>) -> Result<()> {
        validate_builder(builder.as_ref())?;

        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.default.store(Arc::new(builder));

        Ok(())
    }

    /// Builds a value with the factory registered for given key, assigning fields in order.
    pub fn build<I>(&self, keyspace: &str, identifier: &str, fields: I) -> Result<Built>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut builder = self.fetch(keyspace, identifier).create();
        for (field, value) in fields {
            builder.set(&field, value)?;
        }

        builder.build()
    }
}

fn determine_key(keyspace: &str, identifier: &str) -> String {
    format!("{}.{}", keyspace, identifier)
}

fn validate_builder(builder: &dyn BuilderFactory) -> Result<()> {
    let capabilities = builder.capabilities();
    if capabilities.contains(BuilderCapabilities::all()) {
        return Ok(());
    }

    warn!(?capabilities, "Rejecting incomplete builder.");

    Err(Error::InvalidBuilder(format!(
        "builder supports {:?}, but construction, field assignment and build are required",
        capabilities
    )))
}
