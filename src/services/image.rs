use std::sync::Arc;

use base64::Engine;
use futures::future::BoxFuture;
use futures::FutureExt;
use image::DynamicImage;
use tracing::debug;

use crate::model::{ImageHandle, LoadedImage};
use crate::state::{AvatarError, AvatarResult};

/// Encoded images above this size are refused.
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

/// Resolves an image handle into a decoded picture.
///
/// The returned future completes exactly once with either the decoded image or
/// the error that prevented decoding. Dropping it detaches the listener.
pub trait ImageLoader: Send + Sync {
    fn load(&self, handle: ImageHandle) -> BoxFuture<'static, AvatarResult<LoadedImage>>;
}

/// Loader for in-memory bytes, base64 / data URLs and local files.
///
/// Decoding happens on the blocking pool so the UI loop keeps running.
#[derive(Debug, Clone, Default)]
pub struct DecodingImageLoader;

impl ImageLoader for DecodingImageLoader {
    fn load(&self, handle: ImageHandle) -> BoxFuture<'static, AvatarResult<LoadedImage>> {
        async move {
            let bytes = ImageService::read_bytes(&handle).await?;
            let image = tokio::task::spawn_blocking(move || ImageService::decode(&bytes))
                .await
                .map_err(|e| AvatarError::Render(format!("decoder task failed: {}", e)))??;
            debug!(width = image.width(), height = image.height(), "decoded avatar image");
            Ok(LoadedImage {
                handle,
                image: Arc::new(image),
            })
        }
        .boxed()
    }
}

/// Service for image validation and decoding
pub struct ImageService;

impl ImageService {
    /// Fetch the encoded bytes behind a handle.
    pub async fn read_bytes(handle: &ImageHandle) -> AvatarResult<Vec<u8>> {
        let bytes = match handle {
            ImageHandle::Memory(bytes) => bytes.to_vec(),
            ImageHandle::Encoded(text) => Self::decode_base64(text)?,
            ImageHandle::File(path) => tokio::fs::read(path).await?,
        };
        Self::check_size(&bytes)?;
        Ok(bytes)
    }

    /// Decode base64 text, stripping a `data:...;base64,` prefix if present.
    pub fn decode_base64(text: &str) -> AvatarResult<Vec<u8>> {
        let b64 = match text.find(',') {
            Some(idx) if text.starts_with("data:") => &text[idx + 1..],
            _ => text,
        };
        base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| AvatarError::InvalidEncoding(format!("Invalid base64: {}", e)))
    }

    pub fn check_size(bytes: &[u8]) -> AvatarResult<()> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AvatarError::TooLarge {
                size: bytes.len(),
                max: MAX_IMAGE_BYTES,
            });
        }
        Ok(())
    }

    pub fn decode(bytes: &[u8]) -> AvatarResult<DynamicImage> {
        Self::detect_image_type(bytes)?;
        Ok(image::load_from_memory(bytes)?)
    }

    /// Detect image content type from bytes
    pub fn detect_image_type(data: &[u8]) -> AvatarResult<&'static str> {
        if data.len() < 4 {
            return Err(AvatarError::InvalidEncoding("Image data too short".to_string()));
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Ok("image/png");
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Ok("image/jpeg");
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Ok("image/gif");
        }

        if data.len() >= 12 && data[0..4] == [0x52, 0x49, 0x46, 0x46] && data[8..12] == [0x57, 0x45, 0x42, 0x50] {
            return Ok("image/webp");
        }

        Err(AvatarError::Unsupported("unrecognized image format".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, image::Rgba([200, 10, 10, 255])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn detects_png_and_rejects_garbage() {
        assert_eq!(ImageService::detect_image_type(&png_bytes(1, 1)).unwrap(), "image/png");
        assert!(ImageService::detect_image_type(&[1, 2]).is_err());
        assert!(matches!(
            ImageService::detect_image_type(b"hello world"),
            Err(AvatarError::Unsupported(_))
        ));
    }

    #[test]
    fn strips_data_url_prefix() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"abcd");
        let decoded = ImageService::decode_base64(&format!("data:image/png;base64,{}", encoded)).unwrap();
        assert_eq!(decoded, b"abcd");
    }

    #[test]
    fn oversized_images_are_refused() {
        let bytes = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            ImageService::check_size(&bytes),
            Err(AvatarError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn loads_memory_handle() {
        let handle = ImageHandle::from_bytes(png_bytes(4, 3));
        let loaded = DecodingImageLoader.load(handle.clone()).await.unwrap();
        assert_eq!(loaded.handle, handle);
        assert_eq!((loaded.image.width(), loaded.image.height()), (4, 3));
    }

    #[tokio::test]
    async fn truncated_png_fails_to_decode() {
        let mut bytes = png_bytes(4, 4);
        bytes.truncate(20);
        let err = DecodingImageLoader.load(ImageHandle::from_bytes(bytes)).await.unwrap_err();
        assert!(matches!(err, AvatarError::Decode(_)));
    }

    #[tokio::test]
    async fn loads_file_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, png_bytes(2, 2)).unwrap();
        let loaded = DecodingImageLoader.load(ImageHandle::File(path)).await.unwrap();
        assert_eq!(loaded.image.width(), 2);
    }
}
