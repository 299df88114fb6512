//! Post-processing configuration, loaded from YAML and validated once.
//!
//! ```yaml
//! species: [electron, proton]
//! extract: [Derived_Poynting_Flux]
//! particle_extract: []
//! volume_slices:
//!   unit: nano
//!   x: [100, 250.5]
//!   z: {start: 0, stop: 1000, nstep: 4}
//! ```

use std::path::Path;

use indexmap::IndexMap;
use log::warn;
use ndarray::Array1;
use serde::Deserialize;
use serde_yaml::Value;

use crate::{
    error::{ConfigSource, Error, Result},
    grid::Axis,
    units,
};

pub const DEFAULT_CONFIG_PATH: &str = "output-config.yml";

/// Largest accepted `nstep` of a range, far above any useful cut count.
pub const MAX_NSTEP: usize = 100_000;

/// One cut coordinate. Whole numbers written without a fraction stay
/// integers, so slice names print them as `100` rather than `100.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cut {
    Integer(i64),
    Float(f64),
}

impl Cut {
    pub fn value(self) -> f64 {
        match self {
            Cut::Integer(v) => v as f64,
            Cut::Float(v) => v,
        }
    }
}

impl From<f64> for Cut {
    fn from(v: f64) -> Self {
        Cut::Float(v)
    }
}

impl From<i64> for Cut {
    fn from(v: i64) -> Self {
        Cut::Integer(v)
    }
}

/// Cut positions along one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceSpec {
    Explicit(Vec<Cut>),
    /// `nstep + 1` evenly spaced cuts, both ends included.
    Range { start: f64, stop: f64, nstep: usize },
}

impl SliceSpec {
    pub fn explicit<C: Into<Cut>>(cuts: impl IntoIterator<Item = C>) -> Self {
        SliceSpec::Explicit(cuts.into_iter().map(Into::into).collect())
    }

    pub fn coordinates(&self) -> Vec<Cut> {
        match self {
            SliceSpec::Explicit(cuts) => cuts.clone(),
            SliceSpec::Range { start, stop, nstep } => {
                let mut coords = Array1::linspace(*start, *stop, nstep + 1).to_vec();
                if *nstep > 0
                    && let Some(last) = coords.last_mut()
                {
                    *last = *stop;
                }
                coords.into_iter().map(Cut::Float).collect()
            }
        }
    }

    fn from_yaml(key: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Sequence(items) => items
                .iter()
                .map(|item| {
                    item.as_i64()
                        .map(Cut::Integer)
                        .or_else(|| item.as_f64().map(Cut::Float))
                        .ok_or_else(|| Error::slice_spec(key, format!("non-numeric cut {item:?}")))
                })
                .collect::<Result<Vec<_>>>()
                .map(SliceSpec::Explicit),
            Value::Mapping(map) => {
                if let Some(extra) = map
                    .keys()
                    .find(|k| !matches!(k.as_str(), Some("start" | "stop" | "nstep")))
                {
                    return Err(Error::slice_spec(key, format!("unexpected range key {extra:?}")));
                }
                let number = |name: &str| {
                    map.get(name)
                        .and_then(Value::as_f64)
                        .ok_or_else(|| Error::slice_spec(key, format!("range needs a numeric `{name}`")))
                };
                let start = number("start")?;
                let stop = number("stop")?;
                let nstep = map
                    .get("nstep")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| {
                        Error::slice_spec(key, "range needs a non-negative integer `nstep`")
                    })?;
                let nstep = usize::try_from(nstep)
                    .ok()
                    .filter(|n| *n <= MAX_NSTEP)
                    .ok_or_else(|| {
                        Error::slice_spec(key, format!("`nstep` {nstep} exceeds {MAX_NSTEP}"))
                    })?;
                Ok(SliceSpec::Range { start, stop, nstep })
            }
            other => Err(Error::slice_spec(
                key,
                format!("expected a list of cuts or {{start, stop, nstep}}, got {other:?}"),
            )),
        }
    }
}

/// Which cuts to take through every volumetric field, and the unit the
/// cut coordinates are given in.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSlices {
    pub unit: String,
    pub axes: IndexMap<Axis, SliceSpec>,
}

impl Default for VolumeSlices {
    fn default() -> Self {
        Self {
            unit: "nano".to_string(),
            axes: IndexMap::new(),
        }
    }
}

impl VolumeSlices {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            axes: IndexMap::new(),
        }
    }

    pub fn with_axis(mut self, axis: Axis, spec: SliceSpec) -> Self {
        self.axes.insert(axis, spec);
        self
    }

    fn from_yaml(map: IndexMap<String, Value>) -> Result<Self> {
        let unit = match map.get("unit") {
            Some(Value::String(unit)) => unit.clone(),
            Some(other) => {
                return Err(Error::slice_spec("unit", format!("expected a prefix name, got {other:?}")));
            }
            None => return Err(Error::slice_spec("unit", "missing")),
        };
        if units::lookup_prefix(&unit).is_none() {
            warn!("unknown unit `{unit}`, slice coordinates will not be scaled");
        }

        let mut axes = IndexMap::new();
        for (key, value) in map.iter().filter(|(k, _)| *k != "unit") {
            let axis = Axis::from_name(key)
                .ok_or_else(|| Error::slice_spec(key.as_str(), "not one of x, y, z"))?;
            axes.insert(axis, SliceSpec::from_yaml(key, value)?);
        }

        Ok(Self { unit, axes })
    }
}

/// One field to render for every slice the builder produced for it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlotSpec {
    pub field: String,
    #[serde(default)]
    pub abs: bool,
    #[serde(default = "default_scaler")]
    pub scaler: f64,
}

fn default_scaler() -> f64 {
    1.0
}

fn default_plots() -> Vec<PlotSpec> {
    vec![
        PlotSpec {
            field: "Electric_Field_Ex".to_string(),
            abs: false,
            scaler: 1.0,
        },
        PlotSpec {
            field: "Current_Density_Jx".to_string(),
            abs: false,
            scaler: 1.0,
        },
        PlotSpec {
            field: "Magnetic_Field_Bx".to_string(),
            abs: true,
            scaler: 1e-5,
        },
    ]
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    species: Vec<String>,
    #[serde(default)]
    extract: Vec<String>,
    #[serde(default)]
    particle_extract: Vec<String>,
    #[serde(default)]
    volume_slices: Option<IndexMap<String, Value>>,
    #[serde(default = "default_plots")]
    plots: Vec<PlotSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub species: Vec<String>,
    pub extract: Vec<String>,
    pub particle_extract: Vec<String>,
    pub volume_slices: VolumeSlices,
    pub plots: Vec<PlotSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            species: Vec::new(),
            extract: Vec::new(),
            particle_extract: Vec::new(),
            volume_slices: VolumeSlices::default(),
            plots: default_plots(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::MissingConfig {
            origin: path.display().to_string(),
            source: ConfigSource::Io(e),
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse(yaml, "inline yaml")
    }

    fn parse(yaml: &str, origin: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml).map_err(|e| Error::MissingConfig {
            origin: origin.to_string(),
            source: ConfigSource::Yaml(e),
        })?;
        let volume_slices = match raw.volume_slices {
            Some(map) => VolumeSlices::from_yaml(map)?,
            None => VolumeSlices::default(),
        };
        Ok(Self {
            species: raw.species,
            extract: raw.extract,
            particle_extract: raw.particle_extract,
            volume_slices,
            plots: raw.plots,
        })
    }
}
