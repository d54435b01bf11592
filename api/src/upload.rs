use axum::extract::multipart::{Multipart, MultipartError};
use paper_analyzer::UploadedDocument;

/// Collects the filled file slots of the upload form, in form order.
/// Slots left empty arrive with a blank file name and no bytes.
pub async fn read_uploads(mut multipart: Multipart) -> Result<Vec<UploadedDocument>, MultipartError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let filename = match field.file_name() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => continue,
        };
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            log::debug!("Ignoring empty upload {}", filename);
            continue;
        }

        log::info!("Received {} ({} bytes)", filename, bytes.len());
        uploads.push(UploadedDocument::new(filename, bytes.to_vec()));
    }

    Ok(uploads)
}
