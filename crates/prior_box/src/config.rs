//! Configuration for the [`PriorBoxGenerator`](crate::PriorBoxGenerator).

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Aspect ratios used to derive the rectangular priors of each feature map level.
///
/// Deserializes from either a flat list, which is shared by every level, or a list of lists
/// with exactly one set of aspect ratios per level.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AspectRatios {
    /// A single set of aspect ratios, broadcast to every feature map level.
    Shared(Vec<f64>),
    /// One set of aspect ratios per feature map level.
    PerLevel(Vec<Vec<f64>>),
}

impl AspectRatios {
    /// Resolve the aspect ratios into a table with one entry per feature map level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AspectRatioLevels`] if per-level aspect ratios are given for a
    /// different number of levels than `num_levels`.
    pub fn resolve(&self, num_levels: usize) -> Result<Vec<Vec<f64>>> {
        match self {
            AspectRatios::Shared(ratios) => Ok(vec![ratios.clone(); num_levels]),
            AspectRatios::PerLevel(levels) if levels.len() == num_levels => Ok(levels.clone()),
            AspectRatios::PerLevel(levels) => Err(Error::AspectRatioLevels {
                expected: num_levels,
                found: levels.len(),
            }),
        }
    }
}

impl From<Vec<f64>> for AspectRatios {
    fn from(ratios: Vec<f64>) -> Self {
        AspectRatios::Shared(ratios)
    }
}

impl From<Vec<Vec<f64>>> for AspectRatios {
    fn from(levels: Vec<Vec<f64>>) -> Self {
        AspectRatios::PerLevel(levels)
    }
}

/// Prior box configuration of a single-shot detection model.
///
/// Unknown keys are ignored, so the prior box section of a larger model description can be
/// deserialized directly.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriorBoxConfig {
    /// Side length of the square grid of every feature map level.
    pub feature_maps: Vec<usize>,
    /// Relative size of the base prior of every level.
    ///
    /// When [`Self::extra_aspect_ratio`] is enabled, one trailing scale is required for the
    /// last level's intermediate prior.
    pub scales: Vec<f64>,
    /// Aspect ratios of the rectangular priors.
    pub aspect_ratios: AspectRatios,
    /// Emit an additional square prior with a scale of `sqrt(s_k * s_(k+1))` for every cell.
    pub extra_aspect_ratio: bool,
    /// Clamp all prior coordinates into `[0, 1]`.
    pub clip: bool,
    /// Variances used to encode and decode box offsets against the priors.
    pub variance: Vec<f64>,
}

impl PriorBoxConfig {
    /// Parse a config from a TOML string.
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a config from the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&source)
    }

    /// Number of feature map levels.
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.feature_maps.len()
    }

    /// The prior box configuration of SSD300 as trained on Pascal VOC.
    ///
    /// Generates 8732 priors over six feature maps.
    #[must_use]
    pub fn ssd300() -> Self {
        PriorBoxConfig {
            feature_maps: vec![38, 19, 10, 5, 3, 1],
            scales: vec![0.1, 0.2, 0.37, 0.54, 0.71, 0.88, 1.05],
            aspect_ratios: AspectRatios::PerLevel(vec![
                vec![2.0],
                vec![2.0, 3.0],
                vec![2.0, 3.0],
                vec![2.0, 3.0],
                vec![2.0],
                vec![2.0],
            ]),
            extra_aspect_ratio: true,
            clip: true,
            variance: vec![0.1, 0.2],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::{AspectRatios, PriorBoxConfig};
    use crate::Error;

    const NESTED: &str = r"
        feature_maps = [4, 2]
        scales = [0.2, 0.5, 0.8]
        aspect_ratios = [[2], [2, 3]]
        extra_aspect_ratio = true
        clip = false
        variance = [0.1, 0.2]
    ";

    #[test]
    fn parse_nested_aspect_ratios() {
        let config = PriorBoxConfig::from_toml(NESTED).unwrap();

        assert_eq!(config.feature_maps, vec![4, 2]);
        assert_eq!(
            config.aspect_ratios,
            AspectRatios::PerLevel(vec![vec![2.0], vec![2.0, 3.0]])
        );
        assert!(config.extra_aspect_ratio);
        assert!(!config.clip);
    }

    #[test]
    fn parse_flat_aspect_ratios() {
        let config = PriorBoxConfig::from_toml(
            r"
            feature_maps = [3]
            scales = [0.3]
            aspect_ratios = [2.0, 0.5]
            extra_aspect_ratio = false
            clip = true
            variance = [0.1, 0.1, 0.2, 0.2]
            ",
        )
        .unwrap();

        assert_eq!(config.aspect_ratios, AspectRatios::Shared(vec![2.0, 0.5]));
    }

    #[test]
    fn parse_ignores_unknown_keys() {
        let source = format!("{NESTED}\nmin_dim = 300\nname = \"ssd\"\n");
        assert!(PriorBoxConfig::from_toml(&source).is_ok());
    }

    #[test]
    fn parse_mixed_aspect_ratios() {
        let result = PriorBoxConfig::from_toml(
            r"
            feature_maps = [2, 1]
            scales = [0.3, 0.6]
            aspect_ratios = [2, [3]]
            extra_aspect_ratio = false
            clip = true
            variance = [0.1, 0.2]
            ",
        );

        assert!(matches!(result, Err(Error::Deserialize(_))));
    }

    #[test]
    fn parse_missing_field() {
        let result = PriorBoxConfig::from_toml("feature_maps = [2]");
        assert!(matches!(result, Err(Error::Deserialize(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(NESTED.as_bytes()).unwrap();

        let config = PriorBoxConfig::load(file.path()).unwrap();
        assert_eq!(config, PriorBoxConfig::from_toml(NESTED).unwrap());
    }

    #[test]
    fn load_missing_file() {
        let result = PriorBoxConfig::load("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn resolve_broadcasts_shared() {
        let ratios = AspectRatios::Shared(vec![2.0, 3.0]);
        assert_eq!(
            ratios.resolve(3).unwrap(),
            vec![vec![2.0, 3.0], vec![2.0, 3.0], vec![2.0, 3.0]]
        );
    }

    #[test]
    fn aspect_ratios_from_vec() {
        assert_eq!(
            AspectRatios::from(vec![2.0_f64]),
            AspectRatios::Shared(vec![2.0])
        );
        assert_eq!(
            AspectRatios::from(vec![vec![2.0_f64], vec![]]),
            AspectRatios::PerLevel(vec![vec![2.0], vec![]])
        );
    }

    #[test]
    fn resolve_rejects_level_mismatch() {
        let ratios = AspectRatios::PerLevel(vec![vec![2.0], vec![3.0]]);
        assert!(matches!(
            ratios.resolve(3),
            Err(Error::AspectRatioLevels {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn ssd300_config_file_matches_preset() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/ssd300.toml");
        assert_eq!(PriorBoxConfig::load(path).unwrap(), PriorBoxConfig::ssd300());
    }

    #[test]
    fn ssd300_round_trips_through_toml() {
        let config = PriorBoxConfig::ssd300();
        let source = toml::to_string(&config).unwrap();

        assert_eq!(PriorBoxConfig::from_toml(&source).unwrap(), config);
    }
}
