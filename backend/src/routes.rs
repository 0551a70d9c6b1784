use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use leafcheck_shared::{ErrorResponse, InferenceResponse};
use log::{info, warn};

use crate::config::UploadConfig;
use crate::error::AppError;
use crate::inference::model::{Classification, Model};
use crate::page::IndexPage;

pub const FILE_FIELD: &str = "file";
pub const NO_FILE_UPLOADED: &str = "No file uploaded";
pub const NO_FILE_SELECTED: &str = "No file selected";

pub fn configure_routes(cfg: &mut web::ServiceConfig, upload: &UploadConfig) {
    cfg.service(
        web::resource("/")
            .route(web::get().to(index))
            .route(web::post().to(upload_image)),
    )
    .service(web::resource("/api/predict").route(web::post().to(predict_json)))
    .service(Files::new("/static", upload.static_dir.clone()));
}

/// Outcome of scanning a multipart body for the `file` part.
#[derive(Debug, PartialEq)]
enum Upload {
    Missing,
    Unselected,
    File { file_name: String, bytes: Vec<u8> },
}

async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<Upload, AppError> {
    let mut upload = Upload::Missing;

    // A body that is not multipart at all ends the loop on its first error.
    while let Ok(Some(mut field)) = payload.try_next().await {
        let file_name = if field.name() == Some(FILE_FIELD) && upload == Upload::Missing {
            field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_owned)
        } else {
            None
        };

        let mut image_data = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            if file_name.is_none() {
                continue;
            }
            if image_data.len() + data.len() > max_bytes {
                return Err(AppError::PayloadTooLarge { limit: max_bytes });
            }
            image_data.extend_from_slice(&data);
        }

        match file_name {
            Some(name) if name.is_empty() => upload = Upload::Unselected,
            Some(name) => {
                upload = Upload::File {
                    file_name: name,
                    bytes: image_data,
                }
            }
            None => {}
        }
    }

    Ok(upload)
}

/// Writes the upload to its fixed location, replacing the previous one, and
/// classifies it.
fn store_and_classify(
    model: &Model,
    upload: &UploadConfig,
    file_name: &str,
    bytes: &[u8],
) -> Result<Classification, AppError> {
    std::fs::create_dir_all(&upload.static_dir)?;
    std::fs::write(upload.upload_path(), bytes)?;

    let result = model.classify(bytes)?;
    info!(
        "Classified {} ({} bytes) as {} with {}",
        file_name,
        bytes.len(),
        result.prediction.label,
        result.prediction.formatted_confidence()
    );
    Ok(result)
}

fn html(page: IndexPage) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page.render())
}

async fn index() -> HttpResponse {
    html(IndexPage::empty())
}

async fn upload_image(
    model: web::Data<Model>,
    upload: web::Data<UploadConfig>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    match read_upload(payload, upload.max_bytes).await? {
        Upload::Missing => {
            warn!("Upload form submitted without a file part");
            Ok(html(IndexPage::with_message(NO_FILE_UPLOADED)))
        }
        Upload::Unselected => {
            warn!("Upload form submitted with an empty file name");
            Ok(html(IndexPage::with_message(NO_FILE_SELECTED)))
        }
        Upload::File { file_name, bytes } => {
            let result = store_and_classify(&model, &upload, &file_name, &bytes)?;
            Ok(html(IndexPage::with_result(
                &result.prediction,
                upload.public_path(),
            )))
        }
    }
}

async fn predict_json(
    model: web::Data<Model>,
    upload: web::Data<UploadConfig>,
    payload: Multipart,
) -> Result<HttpResponse, AppError> {
    let (file_name, bytes) = match read_upload(payload, upload.max_bytes).await? {
        Upload::Missing => return Ok(bad_request(NO_FILE_UPLOADED)),
        Upload::Unselected => return Ok(bad_request(NO_FILE_SELECTED)),
        Upload::File { file_name, bytes } => (file_name, bytes),
    };

    let result = store_and_classify(&model, &upload, &file_name, &bytes)?;
    Ok(HttpResponse::Ok().json(InferenceResponse::new(
        &result.prediction,
        &result.scores,
        upload.public_path(),
    )))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: message.to_string(),
    })
}
