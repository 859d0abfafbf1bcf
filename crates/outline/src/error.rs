use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutlineError {
    #[error("Invalid image shape {shape:?}: {reason}")]
    InvalidImageShape { shape: Vec<usize>, reason: String },

    #[error("Pixel buffer holds {actual} samples but its shape requires {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Degenerate threshold: image has a single intensity ({value})")]
    DegenerateThreshold { value: f32 },

    #[error("Degenerate curve with {points} points cannot form a closed outline")]
    DegenerateCurve { points: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported configuration format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

impl OutlineError {
    /// Errors the pipeline absorbs locally instead of aborting the invocation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateThreshold { .. } | Self::DegenerateCurve { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OutlineError>;
