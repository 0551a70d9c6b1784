use std::env;

use actix_web::{App, HttpServer};
use leafcheck_backend::config::AppConfig;
use leafcheck_backend::inference::model::Model;
use leafcheck_backend::{configure_app, cors};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let model = Model::load(&config.model).map_err(|e| {
        log::error!("Failed to preload model at startup: {}", e);
        std::io::Error::other(format!("Model loading failed: {}", e))
    })?;
    log::info!(
        "Model ready ({} backend, {}x{} input)",
        model.backend_name(),
        config.model.input_size,
        config.model.input_size
    );

    std::fs::create_dir_all(&config.upload.static_dir)?;
    log::info!(
        "Uploads are written to {}",
        config.upload.upload_path().display()
    );

    let bind_address = config.bind_address();
    log::info!("Starting server on {}", bind_address);

    let upload = config.upload.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .configure(|cfg| configure_app(cfg, model.clone(), upload.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await
}
