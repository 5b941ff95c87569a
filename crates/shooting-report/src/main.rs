mod bootstrap;
mod render;

use anyhow::{Context, Result};
use report_core::settings::Settings;
use report_data::analysis::{analyze_incidents, AnalysisOptions};

fn main() -> Result<()> {
    let settings = Settings::load()?;

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Shooting report v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Source: {}, trend hours: {}-{}, format: {}",
        settings.source,
        settings.hour_start,
        settings.hour_end,
        settings.format
    );

    let options = AnalysisOptions::from(&settings);
    let result = analyze_incidents(&options)?;

    let rendered = if settings.wants_json() {
        result.to_json_pretty()?
    } else {
        render::render_text(&result)
    };

    match &settings.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            tracing::info!("Report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }

    Ok(())
}
