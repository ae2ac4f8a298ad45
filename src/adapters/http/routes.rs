use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{
    ConfidenceField, FrameDetectionResponse, FrameRequest, HealthResponse, UploadDetectionResponse,
    UploadedFile,
};
use crate::domain::errors::DomainError;

pub async fn detect(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadDetectionResponse>, ApiError> {
    let (file, confidence) = match multipart {
        Ok(form) => read_upload_form(form, &st).await?,
        Err(rejection) => {
            debug!("not a multipart body: {rejection}");
            (None, None)
        }
    };
    let res = st.detection.detect_upload(file, confidence).await?;
    Ok(Json(res))
}

async fn read_upload_form(
    mut form: Multipart,
    st: &HttpState,
) -> Result<(Option<UploadedFile>, Option<ConfidenceField>), ApiError> {
    let too_large = |status: StatusCode| status == StatusCode::PAYLOAD_TOO_LARGE;
    let malformed = |e: axum::extract::multipart::MultipartError| {
        if too_large(e.status()) {
            ApiError(DomainError::PayloadTooLarge(st.max_upload_mb()))
        } else {
            ApiError(DomainError::InvalidInput(format!("Malformed upload: {}", e.body_text())))
        }
    };

    let mut file = None;
    let mut confidence = None;
    while let Some(field) = form.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(malformed)?;
                file = Some(UploadedFile { filename, bytes: bytes.to_vec() });
            }
            Some("confidence") => {
                confidence = Some(ConfidenceField::Text(field.text().await.map_err(malformed)?));
            }
            _ => {}
        }
    }
    Ok((file, confidence))
}

pub async fn detect_frame(
    State(st): State<HttpState>,
    payload: Result<Json<FrameRequest>, JsonRejection>,
) -> Result<Json<FrameDetectionResponse>, ApiError> {
    let request = match payload {
        Ok(Json(req)) => Some(req),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ApiError(DomainError::PayloadTooLarge(st.max_upload_mb())));
        }
        Err(rejection) => {
            debug!("unusable frame body: {rejection}");
            None
        }
    };
    let res = st.detection.detect_frame(request).await?;
    Ok(Json(res))
}

pub async fn health(State(st): State<HttpState>) -> Json<HealthResponse> {
    Json(st.detection.health())
}

pub async fn not_found() -> ApiError {
    ApiError(DomainError::NotFound("Endpoint not found".into()))
}
