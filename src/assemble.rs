use indexmap::IndexMap;
use log::debug;
use ndarray::ArrayD;

use crate::{
    error::Result,
    grid::GridCoordinates,
    snapshot::{Attribute, AttributeData, Snapshot},
};

/// Attributes kept whole instead of being reduced to their payload.
pub const FLAT_ATTRIBUTES: [&str; 1] = ["Header"];

/// Attribute as read for one build.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    Flat(Attribute),
    Coordinates(GridCoordinates),
    Array(ArrayD<f64>),
}

/// Read every name in `names`, in order.
pub fn assemble<S: Snapshot + ?Sized>(
    snapshot: &mut S,
    names: &[String],
) -> Result<IndexMap<String, Assembled>> {
    let mut assembled = IndexMap::with_capacity(names.len());
    for name in names {
        debug!("reading {name}");
        let attribute = snapshot.read(name)?;
        let value = match attribute {
            attribute if FLAT_ATTRIBUTES.contains(&name.as_str()) => Assembled::Flat(attribute),
            Attribute {
                data: AttributeData::Coordinates(coords),
                ..
            } => Assembled::Coordinates(coords),
            Attribute {
                data: AttributeData::Array(array),
                ..
            } => Assembled::Array(array),
            record => Assembled::Flat(record),
        };
        assembled.insert(name.clone(), value);
    }
    Ok(assembled)
}
