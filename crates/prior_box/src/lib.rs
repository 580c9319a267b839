//! Prior box (anchor) generation for single-shot object detectors.
//!
//! See [`PriorBoxGenerator`] for the tiling scheme, and [`PriorBoxConfig`] for the
//! configuration it is generated from.

pub mod config;
pub mod error;
pub mod generator;
pub mod prior;

pub use config::{AspectRatios, PriorBoxConfig};
pub use error::{Error, Result};
pub use generator::{PriorBoxGenerator, expected_len};
pub use prior::PriorBox;
