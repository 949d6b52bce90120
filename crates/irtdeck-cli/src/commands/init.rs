//! The `irtdeck init` command.

use std::path::Path;

use anyhow::{Context, Result};

use irtdeck_core::presets::CLADRIBINE_EDSS_TOML;

pub fn execute() -> Result<()> {
    // Create irtdeck.toml
    if Path::new("irtdeck.toml").exists() {
        println!("irtdeck.toml already exists, skipping.");
    } else {
        std::fs::write("irtdeck.toml", SAMPLE_CONFIG).context("failed to write irtdeck.toml")?;
        println!("Created irtdeck.toml");
    }

    // Create example model file
    std::fs::create_dir_all("models")?;
    let example_path = Path::new("models/cladribine-edss.toml");
    if example_path.exists() {
        println!("models/cladribine-edss.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, CLADRIBINE_EDSS_TOML)
            .with_context(|| format!("failed to write {}", example_path.display()))?;
        println!("Created models/cladribine-edss.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit irtdeck.toml to set grids and output formats");
    println!("  2. Run: irtdeck validate --model models/cladribine-edss.toml");
    println!("  3. Run: irtdeck evaluate --model models/cladribine-edss.toml --format all");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# irtdeck configuration

# Latent-trait grid
theta_min = -3.0
theta_max = 6.0
grid_points = 200

# Emax exposure grid
exposure_max = 2000.0
exposure_points = 200

# Progression time grid, in years
horizon_years = 5.0
time_points = 100

# Exposure for the symptomatic offset (defaults to EC50)
# reference_exposure = 408.29

output_dir = "./irtdeck-output"
formats = ["json", "html", "deck", "csv"]
"#;
