//! Application entry point: OpenAI effects bridge.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (stderr; stdout carries the protocol).
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the stdout writer channel.
//! 4. Build the lazily-connected [`OpenAiClient`] and the effect registry.
//! 5. Serve requests from stdin until EOF.

use std::sync::Arc;

use openai_effects::{
    bridge::{write_lines, Bridge, ChannelChatAlerts, SpoolPlayback},
    config::AppConfig,
    effects::EffectRegistry,
    openai::OpenAiClient,
};
use tokio::io::BufReader;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    log::info!("OpenAI effects bridge starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if config.openai.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
        log::warn!("No OpenAI API key configured; every request will fail until one is set");
    }

    // 3. Output channel
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_lines(line_rx, tokio::io::stdout()));

    // 4. Client and effects
    let spool_dir = config.tts.resolved_spool_dir();
    log::info!("TTS spool directory: {}", spool_dir.display());
    let default_model = config.openai.default_model.clone();
    let client = Arc::new(OpenAiClient::new(config.openai.clone(), Arc::new(config)));
    let registry = EffectRegistry::new(
        client,
        Arc::new(ChannelChatAlerts::new(line_tx.clone())),
        Arc::new(SpoolPlayback::new(spool_dir, line_tx.clone())),
        default_model,
    );

    // 5. Serve
    let bridge = Arc::new(Bridge::new(Arc::new(registry), line_tx));
    bridge.serve(BufReader::new(tokio::io::stdin())).await?;

    // Every sender lives in the bridge and the registry; once they are gone
    // the writer drains and exits.
    writer.await??;
    log::info!("OpenAI effects bridge shut down");
    Ok(())
}
