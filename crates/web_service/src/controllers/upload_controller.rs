use std::io::ErrorKind;

use actix_multipart::Multipart;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use super::ROUTE_NOT_FOUND;
use crate::dto::{DataResponse, UploadedImage};
use crate::error::{AppError, Result};
use crate::middleware::RateLimiters;
use crate::server::AppState;
use crate::services::uploads::{ImageUpload, UploadError, MAX_UPLOAD_BYTES};

const CACHE_ONE_DAY: &str = "public, max-age=86400";
const IMAGE_FIELD: &str = "image";

pub fn config(cfg: &mut web::ServiceConfig, limits: &RateLimiters) {
    cfg.service(
        web::resource("/api/auth/upload-image")
            .wrap(limits.upload.clone())
            .route(web::post().to(upload_image)),
    )
    .service(web::resource("/uploads/{filename}").route(web::get().to(serve_upload)));
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    filename: Option<String>,
}

/// Collect a body stream, stopping as soon as it passes `limit`.
async fn read_capped<S, E>(stream: &mut S, limit: usize) -> Result<Bytes>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut body = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| AppError::BadRequest(err.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(UploadError::TooLarge.into());
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

fn content_type(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

fn is_multipart(req: &HttpRequest) -> bool {
    content_type(req).is_some_and(|value| {
        value
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("multipart/form-data")
    })
}

/// The `image` part of a form upload. Other parts are drained and ignored.
async fn image_part(mut form: Multipart) -> Result<ImageUpload> {
    while let Some(field) = form.next().await {
        let mut field = field.map_err(|err| AppError::BadRequest(err.to_string()))?;
        if field.name() != Some(IMAGE_FIELD) {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|err| AppError::BadRequest(err.to_string()))?;
            }
            continue;
        }

        let file_name = field
            .content_disposition()
            .and_then(|disposition| disposition.get_filename())
            .map(str::to_string);
        let content_type = field.content_type().map(|mime| mime.essence_str().to_string());
        let body = read_capped(&mut field, MAX_UPLOAD_BYTES).await?;
        return Ok(ImageUpload {
            content_type,
            file_name,
            body,
        });
    }
    Err(UploadError::NoFile.into())
}

/// POST /api/auth/upload-image
///
/// Takes a `multipart/form-data` form with an `image` file, or the raw image
/// as the body with an optional `?filename=`.
async fn upload_image(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<UploadQuery>,
    mut payload: web::Payload,
) -> Result<HttpResponse> {
    let upload = if is_multipart(&req) {
        image_part(Multipart::new(req.headers(), payload)).await?
    } else {
        ImageUpload {
            content_type: content_type(&req).map(str::to_string),
            file_name: query.into_inner().filename,
            body: read_capped(&mut payload, MAX_UPLOAD_BYTES).await?,
        }
    };

    let stored = state.uploads.save(upload).await?;

    let image_url = {
        let info = req.connection_info();
        format!("{}://{}/uploads/{}", info.scheme(), info.host(), stored)
    };
    Ok(HttpResponse::Ok().json(DataResponse::ok(
        "Image uploaded successfully",
        UploadedImage { image_url },
    )))
}

/// GET /uploads/{filename}
async fn serve_upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let file = state
        .uploads
        .resolve(&path)
        .ok_or(AppError::NotFound(ROUTE_NOT_FOUND))?;

    let contents = match tokio::fs::read(&file).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(AppError::NotFound(ROUTE_NOT_FOUND))
        }
        Err(err) => return Err(anyhow::Error::from(err).into()),
    };

    let mime = mime_guess::from_path(&file).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .content_type(mime.essence_str().to_string())
        .insert_header(("X-Content-Type-Options", "nosniff"))
        .insert_header(("X-Frame-Options", "DENY"))
        .insert_header((header::CACHE_CONTROL, CACHE_ONE_DAY))
        .body(contents))
}
