//! See [`Error`].

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Error types for this crate.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Expected one aspect ratio set per feature map ({expected}), got {found}")]
    #[diagnostic(help("pass a single flat list to share the aspect ratios across all levels"))]
    AspectRatioLevels { expected: usize, found: usize },

    #[error("Missing scale at index {index}, only {len} scales were given")]
    #[diagnostic(help(
        "`scales` needs one entry per feature map, plus one trailing entry when \
        `extra_aspect_ratio` is enabled"
    ))]
    MissingScale { index: usize, len: usize },

    #[error("Aspect ratio {ratio} of level {level} must be finite and strictly positive")]
    NonPositiveAspectRatio { level: usize, ratio: f64 },

    #[error("Scales of level {level} and {} have a negative product ({product})", .level + 1)]
    #[diagnostic(help("the intermediate prior's scale is `sqrt(s_k * s_(k+1))`"))]
    NegativeScaleProduct { level: usize, product: f64 },

    #[error("`variance` must contain at least one strictly positive value")]
    NonPositiveVariance,

    #[error("Failed to read prior box config from `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),
}

/// Type alias for [`Result<T, Error>`].
pub type Result<T> = std::result::Result<T, Error>;
