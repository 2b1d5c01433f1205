use anyhow::{Result, anyhow};
use log::{error, info};
use std::env;
use std::fs;
use trendscope::{AnalysisConfig, Candle, MarketAnalyzer};

fn main() {
    // Initialize logger with default info level if RUST_LOG not set
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "info");
        }
    }
    env_logger::init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let bars_file = args
        .get(1)
        .ok_or_else(|| anyhow!("Usage: trendscope <bars.json> [config.json]"))?;
    let config_file = args.get(2).map(String::as_str).unwrap_or("config.json");

    info!("Loading configuration from: {}", config_file);
    let config = AnalysisConfig::load_from_file(config_file)?;

    info!("Loading bars from: {}", bars_file);
    let bars: Vec<Candle> = serde_json::from_str(&fs::read_to_string(bars_file)?)?;
    if bars.is_empty() {
        return Err(anyhow!("No bars found in {}", bars_file));
    }

    let snapshot = MarketAnalyzer::new(config).analyze(&bars);
    if let Some(phase) = snapshot.latest_phase() {
        info!(
            "Latest phase: {:?} over bars {}..={}",
            phase.kind,
            phase.start(),
            phase.end()
        );
    }

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
