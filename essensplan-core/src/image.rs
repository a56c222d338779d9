//! Image validation and fetching utilities.
//!
//! Formats are detected from magic bytes, never from file names or
//! declared content types.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use thiserror::Error;

use crate::http::HttpClient;

/// Allowed image formats for recipe photos.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Default maximum image size (5MB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] crate::error::FetchError),

    #[error("Image is empty")]
    Empty,

    #[error("Image too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Could not detect image format")]
    UnknownFormat,

    #[error("Unsupported image format: {0}. Allowed: JPEG, PNG, GIF, WebP")]
    Unsupported(String),
}

/// Result of successfully fetching and validating an image.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub data: Vec<u8>,
    /// The detected content type (e.g., "image/jpeg").
    pub content_type: String,
}

/// Validate image data: check size and format, and detect the content type.
pub fn validate_image(data: &[u8], max_bytes: usize) -> Result<String, ImageError> {
    if data.is_empty() {
        return Err(ImageError::Empty);
    }
    if data.len() > max_bytes {
        return Err(ImageError::TooLarge {
            size: data.len(),
            max: max_bytes,
        });
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|_| ImageError::UnknownFormat)?;

    let format = reader.format().ok_or(ImageError::UnknownFormat)?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(ImageError::Unsupported(format!("{:?}", format)));
    }

    Ok(format.to_mime_type().to_string())
}

/// File extension for an allowed mime type, e.g. "image/png" -> "png".
pub fn extension_for(mime: &str) -> &'static str {
    ImageFormat::from_mime_type(mime)
        .and_then(|f| f.extensions_str().first().copied())
        .unwrap_or("bin")
}

/// Fetch an image from a URL and validate it.
///
/// The body is downloaded completely before validation; a truncated
/// transfer surfaces as a fetch error rather than a partial image.
pub async fn fetch_and_validate_image<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    max_bytes: usize,
) -> Result<FetchedImage, ImageError> {
    let data = client.fetch_bytes(url).await?;
    let content_type = validate_image(&data, max_bytes)?;
    Ok(FetchedImage { data, content_type })
}

/// Encode a small solid-colour PNG. Used by tests across the crate.
#[doc(hidden)]
pub fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 120, 40]));
    let mut buf = Cursor::new(Vec::new());
    // Encoding an in-memory RGB buffer to PNG cannot fail.
    let _ = img.write_to(&mut buf, ImageFormat::Png);
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockClient;

    #[test]
    fn test_validate_png() {
        let png = sample_png();
        assert_eq!(
            validate_image(&png, DEFAULT_MAX_IMAGE_BYTES).unwrap(),
            "image/png"
        );
    }

    #[test]
    fn test_validate_invalid_format() {
        let result = validate_image(b"not an image", DEFAULT_MAX_IMAGE_BYTES);
        assert!(matches!(result, Err(ImageError::UnknownFormat)));
    }

    #[test]
    fn test_validate_size_limit() {
        let png = sample_png();
        let result = validate_image(&png, 10);
        assert!(matches!(result, Err(ImageError::TooLarge { max: 10, .. })));
        assert!(matches!(
            validate_image(&[], 10),
            Err(ImageError::Empty)
        ));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("text/html"), "bin");
    }

    #[tokio::test]
    async fn test_fetch_and_validate() {
        let client = MockClient::new()
            .with_bytes("https://img.example.com/a.png", sample_png())
            .with_error("https://img.example.com/missing.png", "HTTP 404");

        let fetched =
            fetch_and_validate_image(&client, "https://img.example.com/a.png", 1024 * 1024)
                .await
                .unwrap();
        assert_eq!(fetched.content_type, "image/png");

        let missing = fetch_and_validate_image(
            &client,
            "https://img.example.com/missing.png",
            1024 * 1024,
        )
        .await;
        assert!(matches!(missing, Err(ImageError::Fetch(_))));
    }
}
