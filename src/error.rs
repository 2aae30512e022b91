use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a puzzle or driving the solver from outside.
#[derive(Debug, Error)]
pub enum CrosswordError {
    /// A structure or word list file couldn't be read.
    #[error("couldn't read file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The structure template has no rows.
    #[error("structure must have at least one row")]
    EmptyStructure,

    /// The slots don't describe a consistent grid (out of bounds, duplicated, or sharing more
    /// than one cell).
    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),

    /// The filled grid couldn't be drawn or saved as an image.
    #[error("couldn't write image '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The embedded font couldn't be parsed.
    #[error("invalid font: {0}")]
    Font(#[from] ab_glyph::InvalidFont),

    /// A caller tried to assign a word that isn't in the variable's current domain.
    #[error("word '{word}' is not a candidate for variable {variable}")]
    InvalidAction { variable: usize, word: String },
}

pub type CrosswordResult<T = ()> = Result<T, CrosswordError>;
