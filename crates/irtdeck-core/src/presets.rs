//! Built-in model parameter sets.

use std::path::Path;

use anyhow::Result;

use crate::parameters::ModelParameters;
use crate::parser::parse_model_str;

/// TOML source of the cladribine / EDSS model.
pub const CLADRIBINE_EDSS_TOML: &str = include_str!("../presets/cladribine-edss.toml");

/// Identifier of the default preset.
pub const DEFAULT_PRESET: &str = "cladribine-edss";

/// Names of all built-in presets.
pub fn preset_names() -> &'static [&'static str] {
    &[DEFAULT_PRESET]
}

/// The cladribine / EDSS model of Novakovic et al. (2016).
pub fn cladribine_edss() -> Result<ModelParameters> {
    parse_model_str(CLADRIBINE_EDSS_TOML, Path::new("<preset:cladribine-edss>"))
}

/// Look up a built-in preset by identifier.
pub fn preset(name: &str) -> Result<ModelParameters> {
    match name {
        DEFAULT_PRESET => cladribine_edss(),
        other => anyhow::bail!(
            "unknown preset '{other}' (available: {})",
            preset_names().join(", ")
        ),
    }
}
