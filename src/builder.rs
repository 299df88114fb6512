use std::path::Path;

use indexmap::IndexMap;
use log::{debug, info};
use ndarray::{Array2, ArrayD, Ix3};

use crate::{
    assemble::{Assembled, FLAT_ATTRIBUTES, assemble},
    config::Config,
    error::{Error, Result},
    grid::{GridCoordinates, GridExtent},
    read::NpzSnapshot,
    select::AttributeSelector,
    slicer::{SliceKey, VolumeSlicer},
    snapshot::{Attribute, AttributeData, Snapshot},
    units,
};

pub const GRID_ATTRIBUTE: &str = "Grid_Grid";
pub const PARTICLE_POSITION_PREFIX: &str = "Grid_Particles_";
pub const PARTICLE_VELOCITY_PREFIX: &str = "Particles_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Flat,
    Grid,
    ParticlePositions,
    ParticleVelocities,
    Volume,
}

pub fn classify(name: &str) -> AttributeKind {
    if FLAT_ATTRIBUTES.contains(&name) {
        AttributeKind::Flat
    } else if name == GRID_ATTRIBUTE {
        AttributeKind::Grid
    } else if name.starts_with(PARTICLE_POSITION_PREFIX) {
        AttributeKind::ParticlePositions
    } else if name.starts_with(PARTICLE_VELOCITY_PREFIX) {
        AttributeKind::ParticleVelocities
    } else {
        AttributeKind::Volume
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Flat(Attribute),
    Coordinates(GridCoordinates),
    Array(ArrayD<f64>),
    Slices(IndexMap<SliceKey, Array2<f64>>),
}

/// Everything one build produced. Grid coordinates, particle positions and
/// `extent` are in grid units (see [`SnapshotBuilder::grid_scale`]).
#[derive(Debug, Clone)]
pub struct OutputBundle {
    pub attributes: IndexMap<String, Output>,
    pub extent: GridExtent,
    pub config: Config,
}

impl OutputBundle {
    pub fn get(&self, name: &str) -> Option<&Output> {
        self.attributes.get(name)
    }

    pub fn slices(&self, name: &str) -> Option<&IndexMap<SliceKey, Array2<f64>>> {
        match self.attributes.get(name)? {
            Output::Slices(slices) => Some(slices),
            _ => None,
        }
    }

    pub fn header(&self) -> Option<&serde_json::Value> {
        self.attributes.values().find_map(|output| match output {
            Output::Flat(Attribute {
                data: AttributeData::Record(record),
                ..
            }) => Some(record),
            _ => None,
        })
    }
}

/// Reads a snapshot and reduces it to slices and normalised particle data.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    grid_scale: f64,
    velocity_scale: f64,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self {
            grid_scale: units::GRID_SCALE,
            velocity_scale: 1.0,
        }
    }
}

impl SnapshotBuilder {
    pub fn new(grid_scale: f64, velocity_scale: f64) -> Self {
        Self {
            grid_scale,
            velocity_scale,
        }
    }

    /// Length in metres of one grid unit.
    pub fn grid_scale(&self) -> f64 {
        self.grid_scale
    }

    /// The snapshot file is closed once the selected attributes are read;
    /// slicing works on the in-memory copies only.
    pub fn build(&self, path: impl AsRef<Path>, config: &Config) -> Result<OutputBundle> {
        let path = path.as_ref();
        info!("building {path:?}");
        let assembled = {
            let mut snapshot = NpzSnapshot::open(path)?;
            self.assemble_from(&mut snapshot, config)?
        };
        self.optimize(assembled, config)
    }

    pub fn build_from<S: Snapshot + ?Sized>(
        &self,
        snapshot: &mut S,
        config: &Config,
    ) -> Result<OutputBundle> {
        let assembled = self.assemble_from(snapshot, config)?;
        self.optimize(assembled, config)
    }

    /// Read every configured attribute the snapshot has.
    pub fn assemble_from<S: Snapshot + ?Sized>(
        &self,
        snapshot: &mut S,
        config: &Config,
    ) -> Result<IndexMap<String, Assembled>> {
        debug!("available attributes: {:?}", snapshot.names());

        let selection =
            AttributeSelector::from_config(config).select_best_effort(|name| snapshot.contains(name));
        debug!("building with attributes: {:?}", selection.resolved);

        assemble(snapshot, &selection.resolved)
    }

    /// Rescale the grid and particles, and cut every volume into slices.
    pub fn optimize(
        &self,
        assembled: IndexMap<String, Assembled>,
        config: &Config,
    ) -> Result<OutputBundle> {
        let grid = match assembled.get(GRID_ATTRIBUTE) {
            Some(Assembled::Coordinates(grid)) => grid.rescaled(self.grid_scale),
            _ => {
                return Err(Error::InvalidGrid(format!(
                    "snapshot has no `{GRID_ATTRIBUTE}` coordinates"
                )));
            }
        };
        let extent = GridExtent::compute(&grid)?;
        let slicer = VolumeSlicer::new(self.grid_scale);

        let mut attributes = IndexMap::with_capacity(assembled.len());
        for (name, value) in assembled {
            let output = match (classify(&name), value) {
                (_, Assembled::Flat(attribute)) => Output::Flat(attribute),
                (AttributeKind::Grid, Assembled::Coordinates(_)) => Output::Coordinates(grid.clone()),
                (AttributeKind::ParticlePositions, Assembled::Coordinates(positions)) => {
                    Output::Coordinates(positions.rescaled(self.grid_scale))
                }
                (AttributeKind::ParticlePositions, Assembled::Array(positions)) => {
                    Output::Array(positions / self.grid_scale)
                }
                (AttributeKind::ParticleVelocities, Assembled::Array(velocities)) => Output::Array(
                    units::normalize_velocities(velocities.view(), self.velocity_scale),
                ),
                (AttributeKind::Volume, Assembled::Array(volume)) => {
                    let shape = volume.shape().to_vec();
                    let volume = volume
                        .into_dimensionality::<Ix3>()
                        .map_err(|_| Error::NotAVolume {
                            name: name.clone(),
                            shape,
                        })?;
                    debug!("slicing {name} {:?}", volume.shape());
                    Output::Slices(slicer.slice(volume.view(), &config.volume_slices, &extent))
                }
                (_, Assembled::Coordinates(coords)) => Output::Coordinates(coords),
                (_, Assembled::Array(array)) => Output::Array(array),
            };
            attributes.insert(name, output);
        }

        Ok(OutputBundle {
            attributes,
            extent,
            config: config.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use ndarray::{Array1, Array3, array, s};

    use super::*;
    use crate::{
        config::{SliceSpec, VolumeSlices},
        grid::Axis,
        snapshot::MemorySnapshot,
    };

    fn metres(n: usize) -> Array1<f64> {
        Array1::linspace(0.0, (n - 1) as f64 * 1e-9, n)
    }

    fn snapshot() -> MemorySnapshot {
        let volume = Array3::from_shape_fn((4, 3, 2), |(i, j, k)| (100 * i + 10 * j + k) as f64);
        MemorySnapshot::new()
            .with("Header", AttributeData::Record(serde_json::json!({"step": 7})))
            .with(
                GRID_ATTRIBUTE,
                AttributeData::Coordinates(GridCoordinates::new(metres(4), metres(3), metres(2))),
            )
            .with("Electric_Field_Ex", AttributeData::Array(volume.into_dyn()))
            .with(
                "Derived_Number_Density_electron",
                AttributeData::Array(Array3::<f64>::ones((4, 3, 2)).into_dyn()),
            )
            .with(
                "Particles_Vx_electron",
                AttributeData::Array(array![1.5e8, -3e8].into_dyn()),
            )
            .with(
                "Grid_Particles_electron",
                AttributeData::Coordinates(GridCoordinates::new(
                    array![2e-9],
                    array![1e-9],
                    array![0.0],
                )),
            )
    }

    fn config() -> Config {
        Config {
            species: vec!["electron".to_string()],
            extract: vec![
                "Particles_Vx_electron".to_string(),
                "Grid_Particles_electron".to_string(),
            ],
            volume_slices: VolumeSlices::new("nano")
                .with_axis(Axis::X, SliceSpec::explicit([1.2, 2.4, 99.0]))
                .with_axis(Axis::Z, SliceSpec::Range { start: 0.0, stop: 1.0, nstep: 1 }),
            ..Config::default()
        }
    }

    #[test]
    fn classification() {
        assert_eq!(classify("Header"), AttributeKind::Flat);
        assert_eq!(classify("Grid_Grid"), AttributeKind::Grid);
        assert_eq!(classify("Grid_Particles_proton"), AttributeKind::ParticlePositions);
        assert_eq!(classify("Particles_Px_proton"), AttributeKind::ParticleVelocities);
        assert_eq!(classify("Magnetic_Field_Bz"), AttributeKind::Volume);
    }

    #[test]
    fn builds_bundle() {
        let bundle = SnapshotBuilder::default()
            .build_from(&mut snapshot(), &config())
            .unwrap();

        // extent is reported in nanometres
        assert_eq!(bundle.extent.x.count, 4);
        assert!((bundle.extent.x.max - 3.0).abs() < 1e-9);
        assert!((bundle.extent.z.max - 1.0).abs() < 1e-9);

        assert_eq!(bundle.header(), Some(&serde_json::json!({"step": 7})));

        let ex = bundle.slices("Electric_Field_Ex").unwrap();
        let keys: Vec<_> = ex.keys().map(SliceKey::as_str).collect();
        // x = 99 nm is outside the grid; z = 1 nm sits on the upper edge
        assert_eq!(keys, ["x_slice_1.2_nano", "x_slice_2.4_nano", "z_slice_0.0_nano"]);

        let x12 = &ex[0];
        assert_eq!(x12.shape(), &[3, 2]);
        assert_eq!(x12[[1, 1]], 111.0);
        let z0 = &ex[2];
        assert_eq!(z0.shape(), &[4, 3]);
        assert_eq!(z0[[3, 2]], 320.0);

        assert!(bundle.slices("Derived_Number_Density_electron").is_some());

        match bundle.get("Particles_Vx_electron") {
            Some(Output::Array(v)) => assert_eq!(v, &array![0.5, -1.0].into_dyn()),
            other => panic!("unexpected {other:?}"),
        }
        match bundle.get("Grid_Particles_electron") {
            Some(Output::Coordinates(p)) => assert!((p.x[0] - 2.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
        match bundle.get(GRID_ATTRIBUTE) {
            Some(Output::Coordinates(g)) => assert!((g.y[2] - 2.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn slicing_is_deterministic() {
        let a = SnapshotBuilder::default()
            .build_from(&mut snapshot(), &config())
            .unwrap();
        let b = SnapshotBuilder::default()
            .build_from(&mut snapshot(), &config())
            .unwrap();
        assert_eq!(a.attributes, b.attributes);
    }

    #[test]
    fn missing_grid() {
        let mut snapshot = MemorySnapshot::new().with(
            "Electric_Field_Ex",
            AttributeData::Array(Array3::<f64>::zeros((2, 2, 2)).into_dyn()),
        );
        assert!(matches!(
            SnapshotBuilder::default().build_from(&mut snapshot, &Config::default()),
            Err(Error::InvalidGrid(_))
        ));
    }

    #[test]
    fn flat_volume_is_rejected() {
        let mut snapshot = snapshot().with(
            "Electric_Field_Ey",
            AttributeData::Array(array![[1.0, 2.0]].into_dyn()),
        );
        let err = SnapshotBuilder::default()
            .build_from(&mut snapshot, &config())
            .unwrap_err();
        assert!(matches!(err, Error::NotAVolume { name, shape } if name == "Electric_Field_Ey" && shape == [1, 2]));
    }

    #[test]
    fn slab_matches_volume() {
        let bundle = SnapshotBuilder::default()
            .build_from(&mut snapshot(), &config())
            .unwrap();
        let full = match snapshot().read("Electric_Field_Ex").unwrap().data {
            AttributeData::Array(a) => a.into_dimensionality::<Ix3>().unwrap(),
            other => panic!("unexpected {other:?}"),
        };
        let key = SliceKey::new(Axis::X, 2.4, "nano");
        assert_eq!(
            bundle.slices("Electric_Field_Ex").unwrap()[&key],
            full.slice(s![3, .., ..])
        );
    }

    struct Tracked {
        inner: MemorySnapshot,
        closed: Rc<Cell<bool>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.closed.set(true);
        }
    }

    impl Snapshot for Tracked {
        fn names(&self) -> Vec<String> {
            self.inner.names()
        }

        fn contains(&self, name: &str) -> bool {
            self.inner.contains(name)
        }

        fn read(&mut self, name: &str) -> Result<Attribute> {
            self.inner.read(name)
        }
    }

    #[test]
    fn slicing_needs_no_open_snapshot() {
        let builder = SnapshotBuilder::default();
        let closed = Rc::new(Cell::new(false));
        let mut tracked = Tracked {
            inner: snapshot(),
            closed: Rc::clone(&closed),
        };

        let assembled = builder.assemble_from(&mut tracked, &config()).unwrap();
        drop(tracked);
        assert!(closed.get());

        let bundle = builder.optimize(assembled, &config()).unwrap();
        let expected = builder.build_from(&mut snapshot(), &config()).unwrap();
        assert_eq!(bundle.attributes, expected.attributes);
    }
}
