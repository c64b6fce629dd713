pub mod identicon;
pub mod image;
pub mod initials;

pub use identicon::{IdenticonGenerator, PatternIdenticon};
pub use self::image::{DecodingImageLoader, ImageLoader, ImageService};
pub use initials::{InitialsTile, InitialsTileGenerator};
