/// Remote image loader
///
/// Downloads panel and thumbnail images and decodes them into RGBA handles
/// the renderer can draw. Decoding is CPU-bound and runs on the blocking
/// pool so the UI loop never stalls on a large panel.
use std::time::Duration;

use async_trait::async_trait;
use iced::widget::image::Handle;
use image::imageops::FilterType;
use reqwest::Client;
use thiserror::Error;
use tokio::task;

/// Longest edge the GPU is asked to upload; taller strips are scaled down
const MAX_EDGE: u32 = 8192;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("download failed: {0}")]
    Transport(String),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("could not decode image: {0}")]
    Decode(String),
    #[error("decode task failed: {0}")]
    Task(String),
}

/// Anything that can turn an image URL into a drawable handle
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Handle, ImageError>;
}

/// Fetches images over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ImageError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Handle, ImageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Transport(e.to_string()))?;

        // Spawn blocking because image decoding is CPU-intensive
        let decoded = task::spawn_blocking(move || decode_blocking(&bytes))
            .await
            .map_err(|e| ImageError::Task(e.to_string()))??;

        Ok(decoded.into_handle())
    }
}

/// Decoded RGBA pixels
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn into_handle(self) -> Handle {
        Handle::from_rgba(self.width, self.height, self.pixels)
    }
}

/// Decode an encoded image (PNG, JPEG, WebP, ...) into RGBA
pub fn decode_blocking(bytes: &[u8]) -> Result<DecodedImage, ImageError> {
    let mut img = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;

    if img.width() > MAX_EDGE || img.height() > MAX_EDGE {
        tracing::debug!(
            width = img.width(),
            height = img.height(),
            "Scaling down oversized image"
        );
        // Resize maintaining aspect ratio
        img = img.resize(MAX_EDGE, MAX_EDGE, FilterType::Triangle);
    }

    let rgba = img.into_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let decoded = decode_blocking(&png(3, 2)).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixels.len(), 3 * 2 * 4);
    }

    #[test]
    fn test_oversized_strip_is_scaled() {
        let decoded = decode_blocking(&png(10, MAX_EDGE * 2)).unwrap();
        assert_eq!(decoded.height, MAX_EDGE);
        assert_eq!(decoded.width, 5);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = decode_blocking(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ImageError::Decode(_)));
    }
}
