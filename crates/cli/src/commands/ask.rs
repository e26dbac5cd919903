//! `libreassistant ask` — run one orchestrated request.

use std::sync::Arc;
use std::time::Duration;

use libreassistant_config::AppConfig;
use libreassistant_core::{EventBus, ModelClient};
use libreassistant_orchestrator::{ApiResponse, IterationController};
use libreassistant_providers::OllamaClient;
use uuid::Uuid;

pub async fn run(message: String, request_id: Option<String>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    let client = OllamaClient::new(
        &config.model.base_url,
        Duration::from_secs(config.model.request_timeout_secs),
    )?;

    if !client.health_check().await.unwrap_or(false) {
        eprintln!();
        eprintln!(
            "  WARNING: could not reach the model service at {}.",
            config.model.base_url
        );
        eprintln!("  Start Ollama (`ollama serve`) or point LIBREASSISTANT_BASE_URL elsewhere.");
        eprintln!();
    }

    let registry = Arc::new(libreassistant_plugins::default_registry(
        config.file_io_root(),
    ));
    let event_bus = Arc::new(EventBus::default());

    let controller = IterationController::new(
        Arc::new(client),
        &config.model.model,
        config.model.temperature,
        registry,
        event_bus,
    )
    .with_config(&config.orchestrator);

    let request_id = request_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let outcome = controller.run(request_id, &message).await;

    let api = ApiResponse::from(&outcome);
    println!("{}", serde_json::to_string_pretty(&api)?);

    Ok(())
}
