//! Terminal rendering for avatars.

pub mod avatar;
pub mod tooltip;

pub use avatar::{draw_avatar, IdenticonWidget, TextTileWidget};
pub use tooltip::tooltip_text;
