use std::{env, fs};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;

use upscale_rs::config::API_KEY_VAR;
use upscale_rs::{Config, FrameProcessor, GeminiClient};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    let api_key = env::var(API_KEY_VAR)
        .with_context(|| format!("Set the {API_KEY_VAR} environment variable"))?;

    ensure!(
        config.input_dir.exists(),
        "Input directory does not exist: {}",
        config.input_dir.display()
    );
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.output_dir.display()
        )
    })?;

    let client = GeminiClient::new(api_key, config.model.clone(), config.temperature);
    info!(
        "Loaded agent: {} | Creativity: {}",
        client.model(),
        client.temperature()
    );

    let summary = FrameProcessor::new(client, &config).process_directory()?;
    info!(
        "Finished: {} upscaled, {} skipped, {} failed ({} rate-limit pauses)",
        summary.processed, summary.skipped, summary.failed, summary.rate_limit_pauses
    );

    Ok(())
}
