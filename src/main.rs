/// Запуск конвейера предобработки

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use booking_prep::{init_tracing, Config, DataProcessor};

#[derive(Parser, Debug)]
#[command(name = "booking-prep", version, about = "Prepare hotel booking data for training")]
struct Args {
    /// Путь к YAML-конфигурации
    #[arg(default_value = "config/config.yaml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Инициализация логирования
    init_tracing();

    let args = Args::parse();
    let config = Config::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let processor = DataProcessor::new(config)?;
    let report = processor.process()?;

    tracing::info!(
        "Processed train: {} rows, test: {} rows, columns: {:?}",
        report.train_rows,
        report.test_rows,
        report.columns
    );
    tracing::debug!("Report: {}", serde_json::to_string(&report)?);

    Ok(())
}
