//! Reduce 3d plasma simulation snapshots to unit-scaled 2d slices.
//!
//! [`builder::SnapshotBuilder`] reads one timestep, picks the configured
//! attributes, and cuts every volumetric field at the configured
//! coordinates. [`convert::postprocess`] runs it over a whole run directory
//! and exports the slices as TIFF images plus a `metadata.json`.

pub mod assemble;
pub mod builder;
pub mod config;
pub mod convert;
pub mod error;
pub mod grid;
pub mod read;
pub mod render;
pub mod select;
pub mod slicer;
pub mod snapshot;
pub mod units;
pub mod write;

pub use error::{Error, Result};
