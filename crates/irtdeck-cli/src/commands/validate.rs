//! The `irtdeck validate` command.

use std::path::PathBuf;

use anyhow::Result;

use irtdeck_core::parser;

pub fn execute(model_path: PathBuf) -> Result<()> {
    let models = if model_path.is_dir() {
        parser::load_model_directory(&model_path)?
    } else {
        vec![parser::parse_model(&model_path)?]
    };

    anyhow::ensure!(
        !models.is_empty(),
        "no valid model files found in {}",
        model_path.display()
    );

    let mut total_warnings = 0;

    for model in &models {
        println!(
            "Model: {} ({} items, {} random effects)",
            model.model.title,
            model.items.len(),
            model.random_effects.names.len()
        );

        let warnings = parser::validate_parameters(model);
        for w in &warnings {
            let prefix = w
                .item
                .as_ref()
                .map(|name| format!("  [{name}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All models valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
