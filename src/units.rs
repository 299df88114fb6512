use ndarray::{ArrayD, ArrayViewD};

/// Speed of light used for velocity normalisation, in m/s.
pub const SPEED_OF_LIGHT: f64 = 3e8;

/// Grid coordinates are divided by this on load: metres to nanometres.
pub const GRID_SCALE: f64 = 1e-9;

const METRIC_PREFIXES: [(&str, f64); 13] = [
    ("zepto", 1e-21),
    ("atto", 1e-18),
    ("femto", 1e-15),
    ("pico", 1e-12),
    ("nano", 1e-9),
    ("micro", 1e-6),
    ("milli", 1e-3),
    ("centi", 1e-2),
    ("kilo", 1e3),
    ("mega", 1e6),
    ("giga", 1e9),
    ("tera", 1e12),
    ("peta", 1e15),
];

pub fn lookup_prefix(unit: &str) -> Option<f64> {
    METRIC_PREFIXES
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, factor)| *factor)
}

/// Power of ten for a metric prefix name. Unknown names scale by 1.
pub fn prefix_factor(unit: &str) -> f64 {
    lookup_prefix(unit).unwrap_or(1.0)
}

pub fn normalize_velocity(value: f64, speed_of_light: f64, scale: f64) -> f64 {
    value / (speed_of_light * scale)
}

/// Express a particle velocity array as a fraction of light speed.
pub fn normalize_velocities(values: ArrayViewD<'_, f64>, scale: f64) -> ArrayD<f64> {
    values.mapv(|v| normalize_velocity(v, SPEED_OF_LIGHT, scale))
}
