use crate::core::CompareError;
use crate::models::{CompareFacesRequest, ErrorResponse, UploadedImage};
use crate::routes::AppState;
use actix_multipart::{Field, Multipart, MultipartError};
use actix_web::{web, HttpResponse, Responder};
use futures_util::TryStreamExt;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

pub const MISSING_URLS: &str = "Both image URLs are required";
pub const MISSING_MIXED_INPUTS: &str = "Both image URL and an uploaded file are required";

/// Cap for plain text form fields such as `imageUrl`
const MAX_TEXT_FIELD_BYTES: u64 = 8 * 1024;

/// Configure the comparison routes (mounted under `/api`)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/compare-faces", web::post().to(compare_faces))
        .route("/compare-mixed", web::post().to(compare_mixed));
}

/// Compare two faces given by URL
///
/// POST /api/compare-faces
///
/// Request body:
/// ```json
/// {
///   "image1Url": "https://...",
///   "image2Url": "https://..."
/// }
/// ```
async fn compare_faces(
    state: web::Data<AppState>,
    req: web::Json<CompareFacesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Rejected compare-faces request: {}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::new(MISSING_URLS));
    }
    let Some((first_url, second_url)) = req.urls() else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(MISSING_URLS));
    };

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("compare_faces", %request_id);

    async {
        tracing::info!("Comparing {} with {}", first_url, second_url);
        match state.comparator.compare_urls(first_url, second_url).await {
            Ok(response) => {
                tracing::info!("Comparison done: matched={}, distance={}", response.matched, response.distance);
                HttpResponse::Ok().json(response)
            }
            Err(e) => comparison_failed(e),
        }
    }
    .instrument(span)
    .await
}

/// Compare an uploaded face with one given by URL
///
/// POST /api/compare-mixed
///
/// Multipart form fields: `imageUrl` (text) and `image` (file).
async fn compare_mixed(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let form = match read_mixed_form(payload, state.max_upload_bytes).await {
        Ok(form) => form,
        Err(FormError::TooLarge(limit)) => {
            return HttpResponse::PayloadTooLarge()
                .json(ErrorResponse::new(format!("Uploaded data exceeds the {} byte limit", limit)));
        }
        Err(e) => {
            tracing::info!("Rejected compare-mixed form: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::new(format!("Invalid multipart form: {}", e)));
        }
    };

    let (Some(image_url), Some(upload)) = form.into_parts() else {
        return HttpResponse::BadRequest().json(ErrorResponse::new(MISSING_MIXED_INPUTS));
    };

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("compare_mixed", %request_id);

    async {
        tracing::info!("Comparing upload {:?} with {}", upload.filename, image_url);
        match state.comparator.compare_mixed(&image_url, upload).await {
            Ok(response) => {
                tracing::info!("Comparison done: matched={}, distance={}", response.matched, response.distance);
                HttpResponse::Ok().json(response)
            }
            Err(e) => comparison_failed(e),
        }
    }
    .instrument(span)
    .await
}

fn comparison_failed(err: CompareError) -> HttpResponse {
    if err.is_timeout() {
        tracing::warn!("Face comparison timed out: {}", err);
    } else {
        tracing::error!("Face comparison failed: {}", err);
    }
    HttpResponse::InternalServerError().json(ErrorResponse::new(err.to_string()))
}

#[derive(Debug, Error)]
enum FormError {
    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("field `{0}` is not valid UTF-8")]
    NotUtf8(String),

    #[error("field exceeds the {0} byte limit")]
    TooLarge(u64),
}

#[derive(Debug, Default)]
struct MixedForm {
    image_url: Option<String>,
    image: Option<UploadedImage>,
}

impl MixedForm {
    /// The URL and upload, with blank values treated as missing
    fn into_parts(self) -> (Option<String>, Option<UploadedImage>) {
        (
            self.image_url.filter(|url| !url.is_empty()),
            self.image.filter(|upload| !upload.is_empty()),
        )
    }
}

async fn read_mixed_form(mut payload: Multipart, max_upload_bytes: u64) -> Result<MixedForm, FormError> {
    let mut form = MixedForm::default();

    while let Some(mut field) = payload.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "imageUrl" => {
                let bytes = read_field(&mut field, MAX_TEXT_FIELD_BYTES).await?;
                let url = String::from_utf8(bytes).map_err(|_| FormError::NotUtf8(name))?;
                form.image_url = Some(url.trim().to_string());
            }
            "image" => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .unwrap_or_default()
                    .to_string();
                let bytes = read_field(&mut field, max_upload_bytes).await?;
                form.image = Some(UploadedImage::new(filename, bytes));
            }
            _ => {
                // drain unknown fields so the stream can advance
                while field.try_next().await?.is_some() {}
            }
        }
    }

    Ok(form)
}

async fn read_field(field: &mut Field, limit: u64) -> Result<Vec<u8>, FormError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if (bytes.len() + chunk.len()) as u64 > limit {
            return Err(FormError::TooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
