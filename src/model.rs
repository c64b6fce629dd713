use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use futures::future::BoxFuture;
use image::DynamicImage;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::state::{AvatarError, AvatarResult};

// --- Constants ---

/// Radius (circles) or edge length (everything else) used when no size is given.
pub const DEFAULT_AVATAR_SIZE: f32 = 24.0;
/// Largest size accepted; bigger values are clamped.
pub const MAX_AVATAR_SIZE: f32 = 512.0;
/// Corner radius of square avatars, in the same units as the size.
pub const SQUARE_CORNER_RADIUS: f32 = 6.0;

// --- Configuration ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AvatarMode {
    User,
    DirectMessage,
    Space,
    GroupChat,
}

impl AvatarMode {
    pub const ALL: [AvatarMode; 4] = [
        AvatarMode::User,
        AvatarMode::DirectMessage,
        AvatarMode::Space,
        AvatarMode::GroupChat,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TooltipStyle {
    DisplayName,
    UniqueId,
    #[default]
    Combined,
    None,
}

impl TooltipStyle {
    pub fn next(self) -> Self {
        match self {
            TooltipStyle::DisplayName => TooltipStyle::UniqueId,
            TooltipStyle::UniqueId => TooltipStyle::Combined,
            TooltipStyle::Combined => TooltipStyle::None,
            TooltipStyle::None => TooltipStyle::DisplayName,
        }
    }
}

/// A picture that can be handed to an [`crate::services::ImageLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageHandle {
    /// Raw encoded bytes (png, jpeg, gif, ...).
    Memory(Arc<[u8]>),
    /// Base64 text, with or without a `data:` URL prefix.
    Encoded(String),
    /// A local image file.
    File(PathBuf),
}

impl ImageHandle {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ImageHandle::Memory(Arc::from(bytes.into()))
    }

    /// Interprets a profile picture field: a `data:` URL, a local file path or raw base64.
    pub fn parse(val: &str) -> AvatarResult<Self> {
        let trimmed = val.trim();
        if trimmed.is_empty() {
            return Err(AvatarError::InvalidEncoding("empty image source".to_string()));
        }
        if trimmed.starts_with("data:") {
            return Ok(ImageHandle::Encoded(trimmed.to_string()));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Err(AvatarError::Unsupported(format!("remote image '{}'", trimmed)));
        }
        if Path::new(trimmed).exists() {
            return Ok(ImageHandle::File(PathBuf::from(trimmed)));
        }
        base64::engine::general_purpose::STANDARD
            .decode(trimmed)
            .map_err(|e| {
                AvatarError::InvalidEncoding(format!(
                    "'{}' is not a valid file path, data URL, or base64 data: {}",
                    trimmed, e
                ))
            })?;
        Ok(ImageHandle::Encoded(trimmed.to_string()))
    }
}

/// An image source that becomes available later, e.g. after a media download.
pub type DeferredImage = BoxFuture<'static, AvatarResult<ImageHandle>>;

/// Where the picture of an avatar comes from. At most one is active.
pub enum ImageSource {
    None,
    Immediate(ImageHandle),
    Deferred(DeferredImage),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::None => write!(f, "None"),
            ImageSource::Immediate(handle) => f.debug_tuple("Immediate").field(handle).finish(),
            ImageSource::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

/// Everything the host hands over when it mounts an avatar.
pub struct AvatarConfig {
    pub mode: AvatarMode,
    pub unique_id: String,
    pub display_name: Option<String>,
    pub unique_name: Option<String>,
    pub tooltip_style: TooltipStyle,
    pub size: Option<f32>,
    pub avatar: Option<ImageHandle>,
    pub image_provider_future: Option<DeferredImage>,
}

impl AvatarConfig {
    pub fn new(mode: AvatarMode, unique_id: impl Into<String>) -> Self {
        Self {
            mode,
            unique_id: unique_id.into(),
            display_name: None,
            unique_name: None,
            tooltip_style: TooltipStyle::default(),
            size: None,
            avatar: None,
            image_provider_future: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_unique_name(mut self, name: impl Into<String>) -> Self {
        self.unique_name = Some(name.into());
        self
    }

    pub fn with_tooltip_style(mut self, style: TooltipStyle) -> Self {
        self.tooltip_style = style;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_avatar(mut self, handle: ImageHandle) -> Self {
        self.avatar = Some(handle);
        self
    }

    pub fn with_image_provider(mut self, future: DeferredImage) -> Self {
        self.image_provider_future = Some(future);
        self
    }

    /// The configured size, or the default when missing, non-finite or not positive.
    pub fn resolved_size(&self) -> f32 {
        match self.size {
            Some(size) if size.is_finite() && size > 0.0 => size.min(MAX_AVATAR_SIZE),
            _ => DEFAULT_AVATAR_SIZE,
        }
    }

    /// Splits off the image source. An immediate handle wins over a deferred one.
    pub fn take_source(&mut self) -> ImageSource {
        let deferred = self.image_provider_future.take();
        match (self.avatar.clone(), deferred) {
            (Some(handle), _) => ImageSource::Immediate(handle),
            (None, Some(future)) => ImageSource::Deferred(future),
            (None, None) => ImageSource::None,
        }
    }
}

impl fmt::Debug for AvatarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarConfig")
            .field("mode", &self.mode)
            .field("unique_id", &self.unique_id)
            .field("display_name", &self.display_name)
            .field("unique_name", &self.unique_name)
            .field("tooltip_style", &self.tooltip_style)
            .field("size", &self.size)
            .field("avatar", &self.avatar)
            .field("image_provider_future", &self.image_provider_future.is_some())
            .finish()
    }
}

// --- Rendered output ---

/// Stable identity of a mounted avatar, so two identical-looking avatars stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AvatarKey {
    unique_id: String,
    size_bits: u32,
}

impl AvatarKey {
    pub fn new(unique_id: impl Into<String>, size: f32) -> Self {
        Self {
            unique_id: unique_id.into(),
            size_bits: size.to_bits(),
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn size(&self) -> f32 {
        f32::from_bits(self.size_bits)
    }
}

impl fmt::Display for AvatarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.unique_id, self.size())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageShape {
    Circle { radius: f32 },
    RoundedRect { edge: f32, corner_radius: f32 },
}

impl ImageShape {
    pub fn for_mode(mode: AvatarMode, size: f32) -> Self {
        match mode {
            AvatarMode::User | AvatarMode::DirectMessage => ImageShape::Circle { radius: size },
            AvatarMode::Space | AvatarMode::GroupChat => ImageShape::RoundedRect {
                edge: size,
                corner_radius: SQUARE_CORNER_RADIUS,
            },
        }
    }

    /// Width and height of the shape in logical pixels.
    pub fn extent(&self) -> f32 {
        match self {
            ImageShape::Circle { radius } => radius * 2.0,
            ImageShape::RoundedRect { edge, .. } => *edge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileShape {
    Rectangle,
    Circle,
}

/// A successfully decoded picture. Two loaded images are equal when they came from the same handle.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub handle: ImageHandle,
    pub image: Arc<DynamicImage>,
}

impl PartialEq for LoadedImage {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identicon {
    pub seed: String,
    pub size: f32,
    /// Row-major cells, `None` is background.
    pub cells: Vec<Vec<Option<Color>>>,
    pub background: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextTile {
    pub text: String,
    pub seed: String,
    pub initials: String,
    pub size: f32,
    pub shape: TileShape,
    pub background: Color,
    pub foreground: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AvatarVisual {
    Image { image: LoadedImage, shape: ImageShape },
    Identicon(Identicon),
    TextTile(TextTile),
    Placeholder { size: f32 },
    Tooltip { text: String, child: Box<AvatarVisual> },
}

impl AvatarVisual {
    /// The visual with any tooltip wrapper removed.
    pub fn content(&self) -> &AvatarVisual {
        match self {
            AvatarVisual::Tooltip { child, .. } => child.content(),
            other => other,
        }
    }

    pub fn tooltip(&self) -> Option<&str> {
        match self {
            AvatarVisual::Tooltip { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Edge length of the drawn content in logical pixels.
    pub fn extent(&self) -> f32 {
        match self {
            AvatarVisual::Image { shape, .. } => shape.extent(),
            AvatarVisual::Identicon(identicon) => identicon.size,
            AvatarVisual::TextTile(tile) => tile.size,
            AvatarVisual::Placeholder { size } => *size,
            AvatarVisual::Tooltip { child, .. } => child.extent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvatarView {
    pub key: AvatarKey,
    pub visual: AvatarVisual,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use pretty_assertions::assert_eq;

    #[test]
    fn immediate_handle_wins_over_deferred() {
        let handle = ImageHandle::from_bytes(vec![1, 2, 3]);
        let mut config = AvatarConfig::new(AvatarMode::User, "bob")
            .with_avatar(handle.clone())
            .with_image_provider(async { Err::<ImageHandle, _>(AvatarError::Cancelled) }.boxed());
        match config.take_source() {
            ImageSource::Immediate(h) => assert_eq!(h, handle),
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn no_source_when_nothing_given() {
        let mut config = AvatarConfig::new(AvatarMode::Space, "#general:x");
        assert!(matches!(config.take_source(), ImageSource::None));
        assert_eq!(config.resolved_size(), DEFAULT_AVATAR_SIZE);
    }

    #[test]
    fn unusable_sizes_fall_back_or_clamp() {
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -3.0, 0.0] {
            let config = AvatarConfig::new(AvatarMode::GroupChat, "g").with_size(bad);
            assert_eq!(config.resolved_size(), DEFAULT_AVATAR_SIZE);
        }
        let huge = AvatarConfig::new(AvatarMode::Space, "g").with_size(1.0e9);
        assert_eq!(huge.resolved_size(), MAX_AVATAR_SIZE);
        let odd = AvatarConfig::new(AvatarMode::User, "g").with_size(31.5);
        assert_eq!(odd.resolved_size(), 31.5);
    }

    #[test]
    fn key_includes_size() {
        let a = AvatarKey::new("alice", 24.0);
        let b = AvatarKey::new("alice", 32.0);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "alice-24");
    }

    #[test]
    fn shapes_follow_mode() {
        assert_eq!(ImageShape::for_mode(AvatarMode::DirectMessage, 24.0), ImageShape::Circle { radius: 24.0 });
        assert_eq!(
            ImageShape::for_mode(AvatarMode::GroupChat, 40.0),
            ImageShape::RoundedRect { edge: 40.0, corner_radius: 6.0 }
        );
        assert_eq!(ImageShape::Circle { radius: 24.0 }.extent(), 48.0);
    }

    #[test]
    fn parse_rejects_remote_urls() {
        assert!(matches!(
            ImageHandle::parse("https://example.org/a.png"),
            Err(AvatarError::Unsupported(_))
        ));
        assert!(matches!(ImageHandle::parse("data:image/png;base64,AAAA"), Ok(ImageHandle::Encoded(_))));
        assert!(matches!(ImageHandle::parse("not base64 !!"), Err(AvatarError::InvalidEncoding(_))));
    }
}
