use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::debug;

use crate::errors::AppError;
use crate::extraction::ResumeUpload;

/// Fields of a resume upload form: a `resume` file and an optional `job` JSON text field.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub resume: Option<ResumeUpload>,
    pub job: Option<String>,
}

impl UploadForm {
    pub fn require_resume(&mut self) -> Result<ResumeUpload, AppError> {
        self.resume
            .take()
            .ok_or_else(|| AppError::Validation("multipart field 'resume' is required".to_string()))
    }
}

/// Reads the whole form. Unknown fields are skipped.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.resume = Some(ResumeUpload {
                    filename,
                    content_type,
                    bytes,
                });
            }
            Some("job") => form.job = Some(field.text().await.map_err(multipart_error)?),
            other => debug!("Ignoring multipart field {other:?}"),
        }
    }

    Ok(form)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(format!("invalid multipart body: {}", err.body_text()))
    }
}
