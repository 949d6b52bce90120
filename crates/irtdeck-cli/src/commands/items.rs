//! The `irtdeck items` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use irtdeck_core::config::load_config_from;
use irtdeck_core::grm::item_thresholds;
use irtdeck_core::statistics::{evaluate_battery, summarize_discrimination};

pub fn execute(model_path: Option<PathBuf>, ranked: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let params = super::load_model(model_path.as_deref())?;
    let grid = config.theta_grid()?;

    let battery = evaluate_battery(&params.items, &grid);
    let peaks = battery.item_peaks();

    let mut items: Vec<_> = params.items.iter().zip(&peaks).collect();
    if ranked {
        items.sort_by(|(a, _), (b, _)| b.discrimination().total_cmp(&a.discrimination()));
    }

    let mut table = Table::new();
    table.set_header(vec!["Item", "a", "Class", "Max score", "Thresholds", "Peak θ"]);
    for (item, peak) in items {
        let thresholds: Vec<String> = item_thresholds(item)
            .iter()
            .map(|t| format!("{t:.3}"))
            .collect();
        let peak = peak
            .map(|p| format!("{:.2}", p.theta))
            .unwrap_or_else(|| "-".into());
        table.add_row(vec![
            Cell::new(item.name()),
            Cell::new(format!("{:.3}", item.discrimination())),
            Cell::new(item.discrimination_class()),
            Cell::new(item.max_score()),
            Cell::new(thresholds.join(", ")),
            Cell::new(peak),
        ]);
    }

    println!("Model: {} ({} items)", params.model.title, params.items.len());
    println!("{table}");

    let summary = summarize_discrimination(&params.items);
    if let Some(mean) = summary.mean {
        println!("Mean discrimination: {mean:.3}");
    }
    if let [(name, slope)] = summary.bottom(1).as_slice() {
        println!("Least discriminating: {name} ({slope:.3})");
    }

    Ok(())
}
