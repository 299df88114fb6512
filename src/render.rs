use ndarray::{ArrayView2, s};
use serde::Serialize;

use crate::{
    grid::{Axis, GridExtent},
    units,
};

pub const DEFAULT_DIVERGING: &str = "seismic";
pub const DEFAULT_ABS: &str = "jet";

// field family, signed colormap, magnitude colormap
const COLORMAPS: [(&str, &str, &str); 4] = [
    ("Electric_Field", DEFAULT_DIVERGING, DEFAULT_ABS),
    ("Current_Density", DEFAULT_DIVERGING, DEFAULT_ABS),
    ("Magnetic_Field", DEFAULT_DIVERGING, DEFAULT_ABS),
    ("Number_Density", "hot", DEFAULT_ABS),
];

pub fn colormap(field: &str, abs: bool) -> &'static str {
    let entry = COLORMAPS.iter().find(|(family, _, _)| field.contains(family));
    match (entry, abs) {
        (Some((_, _, magnitude)), true) => *magnitude,
        (Some((_, signed, _)), false) => *signed,
        (None, true) => DEFAULT_ABS,
        (None, false) => DEFAULT_DIVERGING,
    }
}

/// `[min, max]` of the two axes spanning a slice perpendicular to `axis`,
/// converted from grid units into `unit`.
pub fn plot_extent(extent: &GridExtent, axis: Axis, grid_scale: f64, unit: &str) -> [f64; 4] {
    let to_unit = grid_scale / units::prefix_factor(unit);
    let [a, b] = axis.others().map(|other| extent.axis(other));
    [
        a.min * to_unit,
        a.max * to_unit,
        b.min * to_unit,
        b.max * to_unit,
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceMetadata {
    pub vmin: f64,
    pub vmax: f64,
    pub scaler: f64,
    pub cmap: String,
    pub extent: [f64; 4],
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSlice {
    /// Row-major, first row at the top of the image.
    pub pixels: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub metadata: SliceMetadata,
}

/// Scale a slab for export and pick its colour limits: symmetric around
/// zero, or `0..max|v|` when `abs` is set.
pub fn render(
    slab: ArrayView2<'_, f64>,
    field: &str,
    abs: bool,
    scaler: f64,
    extent: [f64; 4],
) -> RenderedSlice {
    let peak = slab.iter().fold(0.0_f64, |peak, v| peak.max(v.abs()));
    let (vmin, vmax) = if abs { (0.0, peak) } else { (-peak, peak) };

    let (height, width) = slab.dim();
    // origin at the lower left
    let pixels = slab
        .slice(s![..;-1, ..])
        .iter()
        .map(|v| (v * scaler) as f32)
        .collect();

    RenderedSlice {
        pixels,
        width,
        height,
        metadata: SliceMetadata {
            vmin: vmin * scaler,
            vmax: vmax * scaler,
            scaler,
            cmap: colormap(field, abs).to_string(),
            extent,
        },
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::grid::AxisExtent;

    #[test]
    fn colormap_by_family() {
        assert_eq!(colormap("Electric_Field_Ex", false), "seismic");
        assert_eq!(colormap("Magnetic_Field_Bx", true), "jet");
        assert_eq!(colormap("Derived_Number_Density_electron", false), "hot");
        assert_eq!(colormap("Derived_Temperature_electron", false), DEFAULT_DIVERGING);
        assert_eq!(colormap("Derived_Temperature_electron", true), DEFAULT_ABS);
    }

    #[test]
    fn signed_limits_and_flip() {
        let slab = array![[1.0, -4.0, 2.0], [0.5, 3.0, 0.0]];
        let image = render(slab.view(), "Electric_Field_Ex", false, 2.0, [0.0; 4]);

        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.metadata.vmin, -8.0);
        assert_eq!(image.metadata.vmax, 8.0);
        assert_eq!(image.metadata.cmap, "seismic");
        assert_eq!(image.pixels, [1.0, 6.0, 0.0, 2.0, -8.0, 4.0]);
    }

    #[test]
    fn magnitude_limits() {
        let slab = array![[-3.0, 1.0]];
        let image = render(slab.view(), "Magnetic_Field_Bx", true, 1.0, [0.0; 4]);
        assert_eq!(image.metadata.vmin, 0.0);
        assert_eq!(image.metadata.vmax, 3.0);
        assert_eq!(image.metadata.cmap, "jet");
    }

    #[test]
    fn extent_in_slice_unit() {
        let axis = |max| AxisExtent { min: 0.0, max, count: 2 };
        let extent = GridExtent {
            x: axis(1000.0),
            y: axis(2000.0),
            z: axis(3000.0),
        };
        // grid in nm, plotted in nm
        assert_eq!(plot_extent(&extent, Axis::Y, 1e-9, "nano"), [0.0, 1000.0, 0.0, 3000.0]);
        let um = plot_extent(&extent, Axis::X, 1e-9, "micro");
        assert!((um[1] - 2.0).abs() < 1e-9);
        assert!((um[3] - 3.0).abs() < 1e-9);
    }
}
