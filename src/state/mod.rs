pub mod avatar;

pub use avatar::{AvatarViewState, LoadOutcome, LoadState};

/// Avatar error types
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),
    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image source: {0}")]
    Unsupported(String),
    #[error("Image render error: {0}")]
    Render(String),
    #[error("Image load cancelled")]
    Cancelled,
}

pub type AvatarResult<T> = Result<T, AvatarError>;
