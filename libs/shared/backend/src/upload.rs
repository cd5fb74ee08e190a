use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::multipart::Part;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

/// An image sent by the browser as a data URL (`data:image/png;base64,...`)
/// or bare base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUpload {
    pub file_data: String,
}

impl ImageUpload {
    fn extension(&self) -> &'static str {
        if self.file_data.contains("image/jpeg") || self.file_data.contains("image/jpg") {
            "jpg"
        } else {
            "png"
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, AppError> {
        let encoded = self
            .file_data
            .split_once(',')
            .map_or(self.file_data.as_str(), |(_, data)| data);

        BASE64
            .decode(encoded.trim())
            .map_err(|e| AppError::ValidationError(format!("Invalid image data: {}", e)))
    }

    /// Multipart file part with a generated file name.
    pub fn into_part(&self) -> Result<Part, AppError> {
        let ext = self.extension();
        let file_name = format!("{}.{}", Uuid::new_v4().simple(), ext);
        let mime = if ext == "jpg" { "image/jpeg" } else { "image/png" };

        Part::bytes(self.decode()?)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn decodes_data_urls_and_bare_base64() {
        let data_url = ImageUpload { file_data: "data:image/png;base64,aGVsbG8=".to_string() };
        assert_eq!(data_url.decode().unwrap(), b"hello");
        assert_eq!(data_url.extension(), "png");

        let bare = ImageUpload { file_data: "aGVsbG8=".to_string() };
        assert_eq!(bare.decode().unwrap(), b"hello");

        let jpeg = ImageUpload { file_data: "data:image/jpeg;base64,aGVsbG8=".to_string() };
        assert_eq!(jpeg.extension(), "jpg");
    }

    #[test]
    fn rejects_garbage() {
        let upload = ImageUpload { file_data: "data:image/png;base64,@@@".to_string() };
        assert_matches!(upload.decode(), Err(AppError::ValidationError(_)));
    }
}
