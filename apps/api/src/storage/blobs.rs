use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::errors::AppError;

/// S3 key of an uploaded resume original.
pub fn resume_key(match_id: uuid::Uuid, extension: &str) -> String {
    format!("resumes/{match_id}.{extension}")
}

/// S3 key of a rendered HTML match report.
pub fn report_key(match_id: uuid::Uuid) -> String {
    format!("reports/{match_id}.html")
}

/// Uploads one object; the bucket is the configured `S3_BUCKET`.
pub async fn put_blob(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    content_type: &str,
) -> Result<(), AppError> {
    let size = body.len();
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of {key} failed: {e}")))?;

    info!("Uploaded {size} bytes to s3://{bucket}/{key}");
    Ok(())
}

/// Removes one object. Missing keys are not an error in S3.
pub async fn delete_blob(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) -> Result<(), AppError> {
    s3.delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("delete of {key} failed: {e}")))?;

    info!("Deleted s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_keys_are_namespaced_by_match_id() {
        let id = Uuid::nil();
        assert_eq!(
            resume_key(id, "pdf"),
            "resumes/00000000-0000-0000-0000-000000000000.pdf"
        );
        assert_eq!(
            report_key(id),
            "reports/00000000-0000-0000-0000-000000000000.html"
        );
    }
}
