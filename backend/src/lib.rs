pub mod config;
pub mod error;
pub mod inference;
pub mod page;
pub mod routes;

use actix_cors::Cors;
use actix_web::{http::header, web};

use config::UploadConfig;
use inference::model::Model;

/// Registers shared state and routes; used by `main` and by the HTTP tests.
pub fn configure_app(cfg: &mut web::ServiceConfig, model: Model, upload: UploadConfig) {
    routes::configure_routes(cfg, &upload);
    cfg.app_data(web::Data::new(model))
        .app_data(web::Data::new(upload));
}

pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}
