use std::fmt;

use indexmap::IndexMap;
use log::debug;
use ndarray::{Array2, ArrayView3};

use crate::{
    config::{Cut, VolumeSlices},
    grid::{Axis, AxisExtent, GridExtent},
    units,
};

/// Name of one output slice: `{axis}_slice_{coordinate}_{unit}`, with the
/// coordinate as configured. Floats are rounded to 5 decimals and always
/// carry a fraction, integers print as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SliceKey {
    axis: Axis,
    name: String,
}

impl SliceKey {
    pub fn new(axis: Axis, coordinate: impl Into<Cut>, unit: &str) -> Self {
        let name = match coordinate.into() {
            Cut::Integer(v) => format!("{axis}_slice_{v}_{unit}"),
            Cut::Float(v) => {
                let rounded = (v * 1e5).round() / 1e5;
                format!("{axis}_slice_{rounded:?}_{unit}")
            }
        };
        Self { axis, name }
    }

    /// Axis held fixed by this slice.
    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Index of the cell containing `coordinate` along an axis with `len`
/// samples, or `None` if the cut falls outside the volume.
pub fn cut_index(coordinate: f64, extent: &AxisExtent, len: usize) -> Option<usize> {
    if !extent.contains(coordinate) {
        return None;
    }
    let span = extent.max - extent.min;
    let idx = if span > 0.0 {
        ((coordinate - extent.min) * extent.count as f64 / span).trunc()
    } else {
        0.0
    };
    // cannot trigger after the bounds check
    if idx < 0.0 {
        return None;
    }
    let idx = idx as usize;
    // a cut exactly at `max` lands one past the last sample
    (idx < len).then_some(idx)
}

/// Cuts 3d volumes `[x, y, z]` into 2d slabs at configured coordinates.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSlicer {
    coordinate_scale: f64,
}

impl Default for VolumeSlicer {
    fn default() -> Self {
        Self {
            coordinate_scale: 1.0,
        }
    }
}

impl VolumeSlicer {
    /// `coordinate_scale` is the length in metres of one unit of the grid
    /// extent the slicer is given; cut coordinates are converted into it.
    pub fn new(coordinate_scale: f64) -> Self {
        Self { coordinate_scale }
    }

    pub fn coordinate_scale(&self) -> f64 {
        self.coordinate_scale
    }

    /// Factor taking a cut coordinate in `unit` to grid-extent units.
    pub fn unit_factor(&self, unit: &str) -> f64 {
        units::prefix_factor(unit) / self.coordinate_scale
    }

    /// Out-of-range cuts are skipped. Cuts with the same key overwrite
    /// earlier ones in place.
    pub fn slice(
        &self,
        volume: ArrayView3<'_, f64>,
        slices: &VolumeSlices,
        extent: &GridExtent,
    ) -> IndexMap<SliceKey, Array2<f64>> {
        let factor = self.unit_factor(&slices.unit);
        let mut output = IndexMap::new();

        for (&axis, spec) in &slices.axes {
            let dim = ndarray::Axis(axis.index());
            let len = volume.len_of(dim);
            let axis_extent = extent.axis(axis);

            for cut in spec.coordinates() {
                let raw = cut.value();
                let scaled = raw * factor;
                let Some(idx) = cut_index(scaled, axis_extent, len) else {
                    debug!(
                        "{axis} cut at {raw} {} outside [{}, {}], skipping",
                        slices.unit, axis_extent.min, axis_extent.max
                    );
                    continue;
                };
                let key = SliceKey::new(axis, cut, &slices.unit);
                output.insert(key, volume.index_axis(dim, idx).to_owned());
            }
        }

        output
    }
}
