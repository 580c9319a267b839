//! Generates the SSD300 prior boxes from a config file and logs a summary per level.
//!
//! Run with `RUST_LOG=debug` to see the generator's own logging.

use miette::Result;
use prior_box::{PriorBoxConfig, PriorBoxGenerator};

const CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/ssd300.toml");

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    miette::set_panic_hook();

    let config = PriorBoxConfig::load(CONFIG_PATH)?;
    let generator = PriorBoxGenerator::new(config)?;

    for (level, &feature_map) in generator.config().feature_maps.iter().enumerate() {
        let boxes_per_cell = generator.boxes_per_cell(level).unwrap_or_default();
        let range = generator.level_range(level).unwrap_or_default();

        tracing::info!(
            "level {level}: {feature_map}x{feature_map} cells, {boxes_per_cell} boxes per cell, priors {range:?}"
        );
    }

    let priors = generator.to_array();
    tracing::info!("generated {} prior boxes", priors.nrows());

    if let Some(last) = generator.priors().last() {
        tracing::info!("last prior: {last:?}, corners {:?}", last.to_corners());
    }

    Ok(())
}
