//! Avatar widget for the Nexus TUI chat client.
//!
//! Shows a user's or space's picture, or a generated identicon / initials tile
//! when there is no picture or it fails to load.

pub mod controller;
pub mod global_prefs;
pub mod model;
pub mod services;
pub mod state;
pub mod ui;

pub use controller::{AvatarController, AvatarEvent, AvatarEventKind, AvatarRenderers};
pub use model::{
    AvatarConfig, AvatarKey, AvatarMode, AvatarView, AvatarVisual, ImageHandle, ImageShape, TooltipStyle,
    DEFAULT_AVATAR_SIZE, MAX_AVATAR_SIZE,
};
pub use state::{AvatarError, AvatarResult};
