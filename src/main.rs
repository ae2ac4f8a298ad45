use std::sync::Arc;
use clap::Parser;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use waste_vision::{
    adapters::{
        http::{router, state::HttpState},
        onnx::model_catalog::OnnxModelCatalog,
        storage::upload_store::LocalUploadStore,
    },
    application::{
        ports::ModelCatalogPort,
        services::{DetectionService, ModelGate},
    },
    config::ServerConfig,
    domain::{errors::DomainError, model::ModelId},
    imaging::annotator::Annotator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Inicializar logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::parse();

    // 2. Carpeta de subidas
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    // 3. Cargar el modelo una sola vez; si falla, el servicio arranca igualmente
    //    y los endpoints de detección responden 500.
    let model = ModelId {
        name: config
            .model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".into()),
        onnx_path: config.model_path.to_string_lossy().into_owned(),
    };
    let gate = Arc::new(ModelGate::new(model));
    let catalog = OnnxModelCatalog::new(
        config.labels_path.clone(),
        config.yolo_params(),
        config.intra_threads,
    );

    match catalog.load(gate.model()).await {
        Ok(detector) => {
            gate.install(detector);
            tracing::info!("✓ Model loaded successfully from {}", gate.model().onnx_path);
        }
        Err(DomainError::NotFound(msg)) => {
            tracing::warn!("✗ {msg}");
            tracing::warn!(
                "  Export your trained model to ONNX and place it at {}",
                gate.model().onnx_path
            );
        }
        Err(e) => tracing::error!("✗ Error loading model: {e}"),
    }

    // 4. Servicios
    let url_prefix = LocalUploadStore::url_prefix_for(&config.upload_dir);
    let store = Arc::new(LocalUploadStore::new(config.upload_dir.clone(), url_prefix));
    let detection = Arc::new(DetectionService::new(
        gate.clone(),
        store,
        Arc::new(Annotator::default()),
    ));

    let state = HttpState {
        detection,
        max_upload_bytes: config.max_upload_bytes,
    };

    // 5. Router + archivos estáticos (las subidas cuelgan de /static)
    let app = router(state).nest_service("/static", ServeDir::new(&config.static_dir));

    tracing::info!("🗑️  YOLO-Based Waste Detection System");
    tracing::info!("Model loaded: {}", if gate.is_ready() { "✓ Yes" } else { "✗ No" });
    tracing::info!("Upload folder: {}", config.upload_dir.display());
    tracing::info!("Max file size: {}MB", config.max_upload_bytes / (1024 * 1024));

    // 6. Lanzar el servidor
    tracing::info!("🚀 Servidor iniciado en http://{}", config.bind);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
