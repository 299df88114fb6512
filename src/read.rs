use std::{
    fs::File,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::debug;
use ndarray::{Array1, ArrayD};
use ndarray_npy::NpzReader;

use crate::{
    error::{Error, Result},
    grid::GridCoordinates,
    snapshot::{Attribute, AttributeData, Snapshot},
};

const HEADER: &str = "Header";

enum Entry {
    Array(String),
    Triple([String; 3]),
    Header(PathBuf),
}

/// One timestep stored as a NumPy `.npz` archive.
///
/// Every array entry is an attribute. `<base>_x`, `<base>_y`, `<base>_z`
/// with `<base>` starting with `Grid_` are read together as the coordinate
/// triple `<base>`. A `<stem>.header.json` next to the archive is exposed
/// as the `Header` record.
pub struct NpzSnapshot {
    path: PathBuf,
    npz: NpzReader<File>,
    entries: IndexMap<String, Entry>,
}

impl NpzSnapshot {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let mut npz = NpzReader::new(File::open(&path)?)?;

        let arrays: IndexMap<String, String> = npz
            .names()?
            .into_iter()
            .map(|entry| {
                let name = entry.strip_suffix(".npy").unwrap_or(&entry).to_string();
                (name, entry)
            })
            .collect();

        let mut entries = IndexMap::new();
        for (name, entry) in &arrays {
            match triple_base(name, &arrays) {
                Some(base) => {
                    if !entries.contains_key(base) {
                        let component = |axis: &str| arrays[&format!("{base}_{axis}")].clone();
                        let triple = [component("x"), component("y"), component("z")];
                        entries.insert(base.to_string(), Entry::Triple(triple));
                    }
                }
                None => {
                    entries.insert(name.clone(), Entry::Array(entry.clone()));
                }
            }
        }

        let header = path.with_extension("header.json");
        if header.is_file() {
            entries.insert(HEADER.to_string(), Entry::Header(header));
        }

        debug!("{path:?}: {} attributes", entries.len());

        Ok(Self { path, npz, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn triple_base<'a>(name: &'a str, arrays: &IndexMap<String, String>) -> Option<&'a str> {
    let base = ["_x", "_y", "_z"]
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))?;
    let complete = ["x", "y", "z"]
        .iter()
        .all(|axis| arrays.contains_key(&format!("{base}_{axis}")));
    (base.starts_with("Grid_") && complete).then_some(base)
}

impl Snapshot for NpzSnapshot {
    fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn read(&mut self, name: &str) -> Result<Attribute> {
        let data = match self.entries.get(name) {
            Some(Entry::Array(entry)) => {
                let array: ArrayD<f64> = self.npz.by_name(entry)?;
                AttributeData::Array(array)
            }
            Some(Entry::Triple([x, y, z])) => {
                let x: Array1<f64> = self.npz.by_name(x)?;
                let y: Array1<f64> = self.npz.by_name(y)?;
                let z: Array1<f64> = self.npz.by_name(z)?;
                AttributeData::Coordinates(GridCoordinates::new(x, y, z))
            }
            Some(Entry::Header(path)) => {
                let file = File::open(path)?;
                AttributeData::Record(serde_json::from_reader(file)?)
            }
            None => return Err(Error::MissingAttribute(name.to_string())),
        };
        Ok(Attribute {
            name: name.to_string(),
            data,
        })
    }
}
