use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{ResolveError, Unit, UnitResolver};

/// Resolver over a fixed set of units, for embedding callers that already
/// know their graph
#[derive(Default)]
pub struct MemoryResolver {
    units: RwLock<HashMap<String, Unit>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(self, unit: Unit) -> Self {
        self.insert(unit);
        self
    }

    pub fn insert(&self, unit: Unit) {
        self.units.write().insert(unit.identifier.clone(), unit);
    }
}

#[async_trait]
impl UnitResolver for MemoryResolver {
    async fn resolve(&self, identifier: &str) -> Result<Unit, ResolveError> {
        self.units
            .read()
            .get(identifier)
            .cloned()
            .ok_or_else(|| ResolveError::not_found(identifier, Vec::new()))
    }
}
