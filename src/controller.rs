//! Avatar display controller.
//!
//! A controller is mounted with an [`AvatarConfig`], starts loading its picture
//! right away and is fed the outcome back through [`AvatarController::handle_event`]
//! on the UI loop. Until a picture is loaded, and after any failure, it renders a
//! generated fallback. Dropping the controller cancels whatever is still in flight.

use std::sync::Arc;

use ratatui_image::protocol::StatefulProtocol;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{
    AvatarConfig, AvatarKey, AvatarMode, AvatarView, AvatarVisual, DeferredImage, ImageHandle,
    ImageShape, ImageSource, LoadedImage, TileShape,
};
use crate::services::{
    DecodingImageLoader, IdenticonGenerator, ImageLoader, InitialsTile, InitialsTileGenerator,
    PatternIdenticon,
};
use crate::state::{AvatarError, AvatarResult, AvatarViewState, LoadState};
use crate::ui::tooltip::tooltip_text;

/// Notification delivered to the UI loop by a controller's background work.
#[derive(Debug)]
pub struct AvatarEvent {
    pub instance: Uuid,
    pub kind: AvatarEventKind,
}

#[derive(Debug)]
pub enum AvatarEventKind {
    /// A deferred image source produced its handle (or failed to).
    SourceResolved(AvatarResult<ImageHandle>),
    /// The active handle finished decoding (or failed to).
    ImageLoaded(AvatarResult<LoadedImage>),
}

/// The collaborators an avatar delegates to.
#[derive(Clone)]
pub struct AvatarRenderers {
    pub loader: Arc<dyn ImageLoader>,
    pub identicon: Arc<dyn IdenticonGenerator>,
    pub tiles: Arc<dyn InitialsTileGenerator>,
}

impl Default for AvatarRenderers {
    fn default() -> Self {
        Self {
            loader: Arc::new(DecodingImageLoader),
            identicon: Arc::new(PatternIdenticon),
            tiles: Arc::new(InitialsTile),
        }
    }
}

pub struct AvatarController {
    id: Uuid,
    config: AvatarConfig,
    state: AvatarViewState,
    renderers: AvatarRenderers,
    events: mpsc::UnboundedSender<AvatarEvent>,
    cancel: CancellationToken,
    _cancel_on_drop: DropGuard,
    awaiting_source: bool,
    pub(crate) protocol: Option<StatefulProtocol>,
}

impl AvatarController {
    /// Mounts an avatar. Must be called within a tokio runtime when the config carries an image.
    pub fn mount(
        mut config: AvatarConfig,
        renderers: AvatarRenderers,
        events: mpsc::UnboundedSender<AvatarEvent>,
    ) -> Self {
        let source = config.take_source();
        let cancel = CancellationToken::new();
        let mut controller = Self {
            id: Uuid::new_v4(),
            config,
            state: AvatarViewState::default(),
            renderers,
            events,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            awaiting_source: false,
            protocol: None,
        };

        debug!(unique_id = %controller.config.unique_id, source = ?source, "mounting avatar");
        match source {
            ImageSource::None => {}
            ImageSource::Immediate(handle) => controller.subscribe(handle),
            ImageSource::Deferred(future) => controller.await_source(future),
        }
        controller
    }

    /// Releases the avatar. Pending work is cancelled and later notifications are ignored.
    pub fn unmount(self) {
        debug!(unique_id = %self.config.unique_id, "unmounting avatar");
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    pub fn state(&self) -> &AvatarViewState {
        &self.state
    }

    pub fn key(&self) -> AvatarKey {
        AvatarKey::new(self.config.unique_id.clone(), self.config.resolved_size())
    }

    /// Applies a notification. Returns true when the view changed.
    pub fn handle_event(&mut self, event: AvatarEvent) -> bool {
        if event.instance != self.id || self.cancel.is_cancelled() {
            return false;
        }
        match event.kind {
            AvatarEventKind::SourceResolved(result) => {
                if !self.awaiting_source {
                    return false;
                }
                self.awaiting_source = false;
                match result {
                    Ok(handle) => self.subscribe(handle),
                    Err(e) => self.fail(e),
                }
                true
            }
            AvatarEventKind::ImageLoaded(Ok(image)) => {
                let applied = self.state.finish_loading(image);
                if applied {
                    self.protocol = None;
                }
                applied
            }
            AvatarEventKind::ImageLoaded(Err(e)) => {
                if self.state.load != LoadState::Loading {
                    return false;
                }
                self.fail(e);
                true
            }
        }
    }

    /// Called by the renderer when a loaded picture cannot be drawn after all.
    pub fn report_render_error(&mut self, error: AvatarError) {
        if self.state.image_loaded {
            self.fail(error);
        }
    }

    pub fn view(&self) -> AvatarView {
        render_view(&self.config, self.state.displayable_image(), &self.renderers)
    }

    fn subscribe(&mut self, handle: ImageHandle) {
        self.state.begin_loading(handle.clone());
        let load = self.renderers.loader.load(handle.clone());
        let token = self.cancel.clone();
        let tx = self.events.clone();
        let instance = self.id;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                result = load => {
                    // Loaders may hand back a canonicalised handle; the result belongs to the one requested.
                    let result = result.map(|image| LoadedImage { handle, ..image });
                    if !token.is_cancelled() {
                        let _ = tx.send(AvatarEvent { instance, kind: AvatarEventKind::ImageLoaded(result) });
                    }
                }
            }
        });
    }

    fn await_source(&mut self, future: DeferredImage) {
        self.awaiting_source = true;
        let token = self.cancel.clone();
        let tx = self.events.clone();
        let instance = self.id;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                result = future => {
                    if !token.is_cancelled() {
                        let _ = tx.send(AvatarEvent { instance, kind: AvatarEventKind::SourceResolved(result) });
                    }
                }
            }
        });
    }

    fn fail(&mut self, error: AvatarError) {
        warn!(unique_id = %self.config.unique_id, error = %error, "avatar image failed, using generated fallback");
        self.state.fail(&error);
        self.protocol = None;
    }
}

/// Builds the view for a config, given the picture currently loaded for it (if any).
pub fn render_view(
    config: &AvatarConfig,
    image: Option<&LoadedImage>,
    renderers: &AvatarRenderers,
) -> AvatarView {
    let size = config.resolved_size();
    let content = match image {
        Some(image) => AvatarVisual::Image {
            image: image.clone(),
            shape: ImageShape::for_mode(config.mode, size),
        },
        None => fallback_visual(
            config.mode,
            &config.unique_id,
            config.display_name.as_deref(),
            size,
            renderers,
        ),
    };
    let visual = match tooltip_text(
        config.tooltip_style,
        config.display_name.as_deref(),
        &config.unique_id,
        config.unique_name.as_deref(),
    ) {
        Some(text) => AvatarVisual::Tooltip {
            text,
            child: Box::new(content),
        },
        None => content,
    };
    AvatarView {
        key: AvatarKey::new(config.unique_id.clone(), size),
        visual,
    }
}

/// Generated visual used whenever no picture is showing.
pub fn fallback_visual(
    mode: AvatarMode,
    unique_id: &str,
    display_name: Option<&str>,
    size: f32,
    renderers: &AvatarRenderers,
) -> AvatarVisual {
    match mode {
        AvatarMode::User => AvatarVisual::Identicon(renderers.identicon.render(unique_id, size)),
        AvatarMode::Space => AvatarVisual::TextTile(renderers.tiles.render(
            display_name.unwrap_or(unique_id),
            unique_id,
            size,
            TileShape::Rectangle,
        )),
        // No generated art for these yet.
        AvatarMode::GroupChat | AvatarMode::DirectMessage => AvatarVisual::Placeholder { size },
    }
}
