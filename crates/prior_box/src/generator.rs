use std::ops::Range;

use itertools::iproduct;
use ndarray::Array2;

use crate::{Error, PriorBox, PriorBoxConfig, Result};

/// Generates the prior boxes of a single-shot detector, following the tiling scheme of the
/// SSD paper.
///
/// For every cell of every feature map level `k` the following priors are emitted, in order:
/// - a square prior with scale `s_k`
/// - optionally, a square prior with scale `sqrt(s_k * s_(k+1))`
/// - for every aspect ratio `ar` of the level, a wide prior `(s_k * sqrt(ar), s_k / sqrt(ar))`
///   followed by a tall prior `(s_k / sqrt(ar), s_k * sqrt(ar))`
///
/// Cells are visited row by row, so the priors line up with the per-cell output channels of
/// the detection head.
///
/// ```
/// use prior_box::{AspectRatios, PriorBoxConfig, PriorBoxGenerator};
///
/// let config = PriorBoxConfig {
///     feature_maps: vec![2],
///     scales: vec![0.2, 0.3],
///     aspect_ratios: AspectRatios::PerLevel(vec![vec![2.0]]),
///     extra_aspect_ratio: true,
///     clip: true,
///     variance: vec![0.1, 0.1, 0.2, 0.2],
/// };
///
/// let generator = PriorBoxGenerator::new(config).unwrap();
///
/// assert_eq!(generator.len(), 16);
/// assert_eq!(generator.boxes_per_cell(0), Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct PriorBoxGenerator {
    config: PriorBoxConfig,
    aspect_ratios: Vec<Vec<f64>>,
    level_offsets: Vec<usize>,
    priors: Vec<PriorBox>,
}

impl PriorBoxGenerator {
    /// Validate the config and generate all prior boxes.
    ///
    /// # Errors
    ///
    /// - [`Error::AspectRatioLevels`] if per-level aspect ratios don't match the number of
    ///   feature maps.
    /// - [`Error::NonPositiveVariance`] if `variance` has no strictly positive value.
    /// - [`Error::MissingScale`] if `scales` is too short for the number of feature maps.
    /// - [`Error::NonPositiveAspectRatio`] if an aspect ratio is zero, negative or not finite.
    /// - [`Error::NegativeScaleProduct`] if an intermediate prior's scale has no square root.
    pub fn new(config: PriorBoxConfig) -> Result<PriorBoxGenerator> {
        let aspect_ratios = validate(&config)?;

        let wh_pairs = create_width_height_pairs(&config, &aspect_ratios);
        let level_offsets = level_offsets(&config.feature_maps, &wh_pairs);
        let priors = grid_prior_boxes(&config, &wh_pairs, level_offsets[level_offsets.len() - 1]);

        tracing::debug!(
            levels = config.num_levels(),
            priors = priors.len(),
            clip = config.clip,
            "generated prior boxes"
        );

        Ok(PriorBoxGenerator {
            config,
            aspect_ratios,
            level_offsets,
            priors,
        })
    }

    /// All prior boxes, in emission order.
    #[must_use]
    pub fn priors(&self) -> &[PriorBox] {
        &self.priors
    }

    /// The config these priors were generated from.
    #[must_use]
    pub fn config(&self) -> &PriorBoxConfig {
        &self.config
    }

    /// The variances used to encode box offsets against these priors.
    #[must_use]
    pub fn variance(&self) -> &[f64] {
        &self.config.variance
    }

    /// The aspect ratios of every feature map level, after broadcasting.
    #[must_use]
    pub fn aspect_ratios(&self) -> &[Vec<f64>] {
        &self.aspect_ratios
    }

    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.config.num_levels()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.priors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }

    /// Number of priors emitted for every cell of feature map level `level`.
    #[must_use]
    pub fn boxes_per_cell(&self, level: usize) -> Option<usize> {
        self.aspect_ratios
            .get(level)
            .map(|ratios| boxes_per_cell(self.config.extra_aspect_ratio, ratios))
    }

    /// Index range of the priors of feature map level `level`.
    #[must_use]
    pub fn level_range(&self, level: usize) -> Option<Range<usize>> {
        let start = *self.level_offsets.get(level)?;
        let end = *self.level_offsets.get(level + 1)?;

        Some(start..end)
    }

    /// The priors of feature map level `level`.
    #[must_use]
    pub fn level(&self, level: usize) -> Option<&[PriorBox]> {
        self.level_range(level).map(|range| &self.priors[range])
    }

    /// The priors as an array of shape `(N, 4)`, with `(cx, cy, w, h)` rows.
    #[must_use]
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_vec((self.priors.len(), 4), self.to_flat())
            .expect("every prior has exactly four coordinates")
    }

    /// The priors as a flat list of `(cx, cy, w, h)` coordinates.
    #[must_use]
    pub fn to_flat(&self) -> Vec<f32> {
        self.priors
            .iter()
            .flat_map(|&prior| <[f32; 4]>::from(prior))
            .collect()
    }
}

/// Compute the number of priors a config generates, without generating them.
pub fn expected_len(config: &PriorBoxConfig) -> Result<usize> {
    let aspect_ratios = config.aspect_ratios.resolve(config.num_levels())?;

    Ok(config
        .feature_maps
        .iter()
        .zip(&aspect_ratios)
        .map(|(&f, ratios)| f * f * boxes_per_cell(config.extra_aspect_ratio, ratios))
        .sum())
}

fn boxes_per_cell(extra_aspect_ratio: bool, aspect_ratios: &[f64]) -> usize {
    1 + usize::from(extra_aspect_ratio) + 2 * aspect_ratios.len()
}

/// Check the config and resolve its aspect ratios into one set per level.
fn validate(config: &PriorBoxConfig) -> Result<Vec<Vec<f64>>> {
    let num_levels = config.num_levels();
    let aspect_ratios = config.aspect_ratios.resolve(num_levels)?;

    if !config.variance.iter().any(|&v| v > 0.0) {
        return Err(Error::NonPositiveVariance);
    }

    // the intermediate prior of the last level reads `scales[num_levels]`
    let required = num_levels + usize::from(config.extra_aspect_ratio);
    if config.scales.len() < required {
        return Err(Error::MissingScale {
            index: config.scales.len(),
            len: config.scales.len(),
        });
    }

    for (level, ratios) in aspect_ratios.iter().enumerate() {
        if let Some(&ratio) = ratios.iter().find(|ar| !(ar.is_finite() && **ar > 0.0)) {
            return Err(Error::NonPositiveAspectRatio { level, ratio });
        }

        if config.extra_aspect_ratio {
            let product = config.scales[level] * config.scales[level + 1];
            if product < 0.0 {
                return Err(Error::NegativeScaleProduct { level, product });
            }
        }
    }

    Ok(aspect_ratios)
}

/// Generate the width and height pairs of a single cell for every level, in emission order.
///
/// Sizes are computed in `f64` and only rounded once the priors are built.
fn create_width_height_pairs(
    config: &PriorBoxConfig,
    aspect_ratios: &[Vec<f64>],
) -> Vec<Vec<(f64, f64)>> {
    aspect_ratios
        .iter()
        .enumerate()
        .map(|(k, ratios)| {
            let scale = config.scales[k];
            let mut pairs = Vec::with_capacity(boxes_per_cell(config.extra_aspect_ratio, ratios));

            pairs.push((scale, scale));

            if config.extra_aspect_ratio {
                let scale_prime = (scale * config.scales[k + 1]).sqrt();
                pairs.push((scale_prime, scale_prime));
            }

            for ar in ratios {
                let sqrt_ar = ar.sqrt();
                pairs.push((scale * sqrt_ar, scale / sqrt_ar));
                pairs.push((scale / sqrt_ar, scale * sqrt_ar));
            }

            pairs
        })
        .collect()
}

/// Start index of every level in the flat list of priors, followed by the total count.
fn level_offsets(feature_maps: &[usize], wh_pairs: &[Vec<(f64, f64)>]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(feature_maps.len() + 1);
    let mut offset = 0;

    offsets.push(offset);
    for (&f, pairs) in feature_maps.iter().zip(wh_pairs) {
        offset += f * f * pairs.len();
        offsets.push(offset);
    }

    offsets
}

/// Tile the width and height pairs over the cells of every feature map.
fn grid_prior_boxes(
    config: &PriorBoxConfig,
    wh_pairs: &[Vec<(f64, f64)>],
    num_priors: usize,
) -> Vec<PriorBox> {
    let mut priors = Vec::with_capacity(num_priors);

    for (k, (&f, pairs)) in config.feature_maps.iter().zip(wh_pairs).enumerate() {
        let f_k = f as f64;

        for (i, j) in iproduct!(0..f, 0..f) {
            // unit center x,y
            let cx = ((j as f64 + 0.5) / f_k) as f32;
            let cy = ((i as f64 + 0.5) / f_k) as f32;

            priors.extend(
                pairs
                    .iter()
                    .map(|&(w, h)| PriorBox::new(cx, cy, w as f32, h as f32)),
            );
        }

        tracing::trace!(index = k, feature_map = f, boxes_per_cell = pairs.len(), "tiled level");
    }

    if config.clip {
        priors.iter_mut().for_each(|prior| *prior = prior.clamped());
    }

    priors
}
