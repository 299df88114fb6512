use indexmap::IndexMap;
use ndarray::ArrayD;

use crate::{
    error::{Error, Result},
    grid::GridCoordinates,
};

/// Payload of one snapshot attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// Opaque record, e.g. the run header.
    Record(serde_json::Value),
    /// Coordinate triple, e.g. `Grid_Grid`.
    Coordinates(GridCoordinates),
    Array(ArrayD<f64>),
}

/// An attribute as handed out by a reader, still carrying its name.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub data: AttributeData,
}

/// Read access to one simulation timestep.
pub trait Snapshot {
    /// All attribute names, in the reader's order.
    fn names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool;

    fn read(&mut self, name: &str) -> Result<Attribute>;
}

/// Snapshot held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshot {
    attributes: IndexMap<String, AttributeData>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, data: AttributeData) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: AttributeData) {
        self.attributes.insert(name.into(), data);
    }
}

impl Snapshot for MemorySnapshot {
    fn names(&self) -> Vec<String> {
        self.attributes.keys().cloned().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    fn read(&mut self, name: &str) -> Result<Attribute> {
        let data = self
            .attributes
            .get(name)
            .ok_or_else(|| Error::MissingAttribute(name.to_string()))?;
        Ok(Attribute {
            name: name.to_string(),
            data: data.clone(),
        })
    }
}
