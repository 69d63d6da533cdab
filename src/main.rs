use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use mortality_views::utils::io::write_views;
use mortality_views::utils::logging::console::{print_view, print_views_summary};
use mortality_views::utils::logging::{create_spinner, finish_and_clear};
use mortality_views::{PipelineConfig, load_sources, run_pipeline};

/// Rows of each view shown on the console
const PREVIEW_ROWS: usize = 10;

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_json_file(Path::new(&path))
            .with_context(|| format!("Failed to read configuration from {path}"))?,
        None => {
            info!("No configuration given, using default source paths");
            PipelineConfig::default()
        }
    };

    let start = Instant::now();
    let spinner = create_spinner(Some("Loading sources..."));
    let sources = match load_sources(&config) {
        Ok(sources) => sources,
        Err(e) => {
            finish_and_clear(&spinner);
            return Err(e).context("Failed to load source tables");
        }
    };

    spinner.set_message("Building views...");
    let views = run_pipeline(&sources, &config.views);
    finish_and_clear(&spinner);
    let views = views.context("Failed to build mortality views")?;

    print_views_summary(&views, start.elapsed());
    for (name, view) in views.iter() {
        print_view(name, view, PREVIEW_ROWS);
    }

    if let Some(dir) = &config.output_dir {
        let written = write_views(&views, dir)?;
        info!("Wrote {} views to {}", written.len(), dir.display());
    }

    Ok(())
}
