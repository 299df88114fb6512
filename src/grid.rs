use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Array dimension this axis runs along in a `[x, y, z]` volume.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    pub fn from_name(name: &str) -> Option<Axis> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    /// The two axes spanning a slab cut perpendicular to `self`, in x, y, z order.
    pub fn others(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Coordinate triple as stored in a snapshot: grid cell positions for
/// `Grid_Grid`, per-particle positions for `Grid_Particles_*`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCoordinates {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub z: Array1<f64>,
}

impl GridCoordinates {
    pub fn new(x: Array1<f64>, y: Array1<f64>, z: Array1<f64>) -> Self {
        Self { x, y, z }
    }

    pub fn axis(&self, axis: Axis) -> &Array1<f64> {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }

    /// Divide every coordinate by `scale`.
    pub fn rescaled(&self, scale: f64) -> Self {
        Self {
            x: &self.x / scale,
            y: &self.y / scale,
            z: &self.z / scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisExtent {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl AxisExtent {
    pub fn of(axis: Axis, coords: &Array1<f64>) -> Result<Self> {
        if coords.is_empty() {
            return Err(Error::InvalidGrid(format!("{axis} axis has no coordinates")));
        }
        let (min, max) = coords
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::InvalidGrid(format!(
                "{axis} axis has no finite coordinates"
            )));
        }
        Ok(Self {
            min,
            max,
            count: coords.len(),
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridExtent {
    pub x: AxisExtent,
    pub y: AxisExtent,
    pub z: AxisExtent,
}

impl GridExtent {
    pub fn compute(grid: &GridCoordinates) -> Result<Self> {
        Ok(Self {
            x: AxisExtent::of(Axis::X, &grid.x)?,
            y: AxisExtent::of(Axis::Y, &grid.y)?,
            z: AxisExtent::of(Axis::Z, &grid.z)?,
        })
    }

    pub fn axis(&self, axis: Axis) -> &AxisExtent {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}
