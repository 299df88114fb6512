use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid slice specification for `{key}`: {reason}")]
    InvalidSliceSpec { key: String, reason: String },

    #[error("could not load configuration from {origin}: {source}")]
    MissingConfig {
        origin: String,
        #[source]
        source: ConfigSource,
    },

    #[error("attribute `{0}` is not present in the snapshot")]
    MissingAttribute(String),

    #[error("attribute `{name}` has shape {shape:?}, expected a 3d volume")]
    NotAVolume { name: String, shape: Vec<usize> },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Npz(#[from] ndarray_npy::ReadNpzError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Tiff(#[from] tiff::TiffError),
}

#[derive(Debug, Error)]
pub enum ConfigSource {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn slice_spec(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidSliceSpec {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
