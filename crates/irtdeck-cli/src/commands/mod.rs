pub mod evaluate;
pub mod init;
pub mod items;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use irtdeck_core::parameters::ModelParameters;
use irtdeck_core::{parser, presets};

/// Load the model at `path`, or the built-in preset when no path is given.
pub fn load_model(path: Option<&Path>) -> Result<ModelParameters> {
    match path {
        Some(p) => parser::parse_model(p),
        None => {
            tracing::debug!("no model file given, using preset {}", presets::DEFAULT_PRESET);
            presets::preset(presets::DEFAULT_PRESET)
        }
    }
}
