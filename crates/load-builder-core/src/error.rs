use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadBuilderError {
    #[error("invalid dimensions for {what}: {length} x {width} x {height}")]
    InvalidDimensions {
        what: String,
        length: f64,
        width: f64,
        height: f64,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("placed footprint {model} ({length}x{width}) has no surviving wish candidate")]
    UnmatchedPlacement {
        model: String,
        length: f64,
        width: f64,
    },
    #[error("released more inventory than was reserved for item {index}")]
    PoolUnderflow { index: usize },
    #[error("nothing to plan")]
    Empty,
}

pub type Result<T> = std::result::Result<T, LoadBuilderError>;
