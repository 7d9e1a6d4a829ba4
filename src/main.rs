//! Oneuleun AI API
//!
//! Emotion classification of user photos and shout detection on voice
//! recordings for the Oneuleun companion service.

use std::sync::Arc;

use oneul_core::config::AppConfig;
use oneul_core::traits::MediaStore;
use oneul_gateway::{
    AppState, AudioProcessor, GatewayConfig, GatewayServer, HttpAudioSource, RmsShoutDetector,
    VisionProcessor,
};
use oneul_model_gateway::OpenAiVisionClient;
use oneul_store::{InMemoryMediaStore, KeyLayout, S3MediaStore};

const LOCAL_PUBLIC_BASE: &str = "memory://oneul";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    oneul_governance::configure_tracing(&config.telemetry)?;
    tracing::info!("Starting Oneuleun AI API v{}", env!("CARGO_PKG_VERSION"));

    let metrics = oneul_governance::setup_metrics_recorder()?;

    // =========================================================================
    // Media storage
    // =========================================================================
    let store: Arc<dyn MediaStore> = if config.storage.bucket.is_some() {
        Arc::new(S3MediaStore::from_config(&config.storage).await?)
    } else {
        tracing::warn!("No storage bucket configured, uploads are kept in memory");
        let public_base = config
            .storage
            .public_base
            .clone()
            .unwrap_or_else(|| LOCAL_PUBLIC_BASE.to_string());
        Arc::new(InMemoryMediaStore::new(
            KeyLayout::new(&config.storage.root_prefix, None),
            public_base,
        ))
    };

    // =========================================================================
    // Vision classification
    // =========================================================================
    let classifier = Arc::new(OpenAiVisionClient::from_config(&config.vision)?);
    tracing::info!(model = %classifier.model(), "Vision classifier configured");

    let inline_uploads = config.inline_uploads();
    if inline_uploads && !config.vision.inline_uploads {
        tracing::warn!("Uploaded images are sent to the provider inline because no bucket is configured");
    }
    let vision = VisionProcessor::new(classifier, store.clone()).with_inline_uploads(inline_uploads);

    // =========================================================================
    // Audio analysis
    // =========================================================================
    let source = Arc::new(HttpAudioSource::from_config(&config.audio)?);
    let detector = Arc::new(RmsShoutDetector::new(config.audio.detector.clone()));
    let audio = AudioProcessor::new(source, detector, store);

    // =========================================================================
    // HTTP server
    // =========================================================================
    let server = GatewayServer::new(GatewayConfig::from(&config.server), AppState { vision, audio })
        .with_metrics(metrics);

    server.run().await?;
    Ok(())
}
