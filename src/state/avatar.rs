use crate::model::{ImageHandle, LoadedImage};

use super::AvatarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No image source was configured, or a deferred one has not produced a handle yet.
    NoImage,
    /// A handle is known and its load notification is outstanding.
    Loading,
    Resolved(LoadOutcome),
}

/// Mutable view state of one mounted avatar.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarViewState {
    pub load: LoadState,
    pub image_loaded: bool,
    pub resolved_image: Option<ImageHandle>,
    pub image: Option<LoadedImage>,
    pub last_error: Option<String>,
}

impl Default for AvatarViewState {
    fn default() -> Self {
        Self {
            load: LoadState::NoImage,
            image_loaded: false,
            resolved_image: None,
            image: None,
            last_error: None,
        }
    }
}

impl AvatarViewState {
    /// A handle became available (immediately or after a deferred source resolved).
    pub fn begin_loading(&mut self, handle: ImageHandle) {
        self.resolved_image = Some(handle);
        self.image_loaded = false;
        self.image = None;
        self.load = LoadState::Loading;
    }

    /// Returns false when the image does not belong to the handle being loaded.
    pub fn finish_loading(&mut self, image: LoadedImage) -> bool {
        if self.load != LoadState::Loading || self.resolved_image.as_ref() != Some(&image.handle) {
            return false;
        }
        self.image = Some(image);
        self.image_loaded = true;
        self.load = LoadState::Resolved(LoadOutcome::Loaded);
        true
    }

    pub fn fail(&mut self, error: &AvatarError) {
        self.resolved_image = None;
        self.image = None;
        self.image_loaded = false;
        self.last_error = Some(error.to_string());
        self.load = LoadState::Resolved(LoadOutcome::Failed);
    }

    /// The image to draw, only while it is loaded.
    pub fn displayable_image(&self) -> Option<&LoadedImage> {
        match (&self.resolved_image, &self.image) {
            (Some(_), Some(image)) if self.image_loaded => Some(image),
            _ => None,
        }
    }
}
