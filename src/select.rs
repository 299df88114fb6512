use log::debug;

use crate::config::Config;

pub const DEFAULT_FIELDS: [&str; 11] = [
    "Electric_Field_Ex",
    "Electric_Field_Ey",
    "Electric_Field_Ez",
    "Magnetic_Field_Bx",
    "Magnetic_Field_By",
    "Magnetic_Field_Bz",
    "Current_Density_Jx",
    "Current_Density_Jy",
    "Current_Density_Jz",
    "Grid_Grid",
    "Header",
];

pub const DEFAULT_PARTICLE_FIELDS: [&str; 3] = [
    "Derived_Number_Density",
    "Derived_Temperature",
    "Derived_Average_Particle_Energy",
];

/// Attribute names a build asks for, before checking what a snapshot has.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    fields: Vec<String>,
    particle_fields: Vec<String>,
}

/// Outcome of a best-effort selection: names the snapshot can deliver, in
/// request order, and the requested names it cannot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub resolved: Vec<String>,
    pub missing: Vec<String>,
}

impl AttributeSelector {
    /// Requested names go first, defaults after. With a non-empty `species`
    /// every particle name is replaced by one `{name}_{species}` per species.
    pub fn new<S: AsRef<str>>(
        requested_fields: &[S],
        default_fields: &[S],
        species: &[S],
        requested_particle_fields: &[S],
        default_particle_fields: &[S],
    ) -> Self {
        let owned = |names: &[S]| names.iter().map(|n| n.as_ref().to_string()).collect::<Vec<_>>();

        let fields = [owned(requested_fields), owned(default_fields)].concat();
        let particle_base = [
            owned(requested_particle_fields),
            owned(default_particle_fields),
        ]
        .concat();

        let particle_fields = if species.is_empty() {
            particle_base
        } else {
            particle_base
                .iter()
                .flat_map(|base| {
                    species
                        .iter()
                        .map(move |s| format!("{base}_{}", s.as_ref()))
                })
                .collect()
        };

        Self {
            fields,
            particle_fields,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let defaults = DEFAULT_FIELDS.map(String::from);
        let particle_defaults = DEFAULT_PARTICLE_FIELDS.map(String::from);
        Self::new(
            &config.extract,
            &defaults,
            &config.species,
            &config.particle_extract,
            &particle_defaults,
        )
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Particle names after species qualification.
    pub fn particle_fields(&self) -> &[String] {
        &self.particle_fields
    }

    /// Keep the names `is_available` accepts and drop the rest without
    /// error, so newer and older snapshot layouts work with one config.
    pub fn select_best_effort(&self, is_available: impl Fn(&str) -> bool) -> Selection {
        let mut selection = Selection::default();
        for name in self.fields.iter().chain(&self.particle_fields) {
            if is_available(name) {
                selection.resolved.push(name.clone());
            } else {
                selection.missing.push(name.clone());
            }
        }
        if !selection.missing.is_empty() {
            debug!("not in snapshot, skipping: {:?}", selection.missing);
        }
        selection
    }
}
