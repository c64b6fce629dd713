// Gallery application state.

use std::io::Cursor;
use std::time::Duration;

use futures::FutureExt;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use nexus_avatar::{
    AvatarConfig, AvatarController, AvatarError, AvatarEvent, AvatarMode, AvatarRenderers, ImageHandle,
    TooltipStyle,
};
use ratatui_image::picker::Picker;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Number of avatars shown in the gallery.
pub const GALLERY_LEN: usize = 8;

pub struct App {
    pub slots: Vec<Option<AvatarController>>,
    pub selected: usize,
    pub tooltip_style: TooltipStyle,
    pub avatar_size: f32,
    pub picker: Picker,
    pub renderers: AvatarRenderers,
    pub events: mpsc::UnboundedSender<AvatarEvent>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        events: mpsc::UnboundedSender<AvatarEvent>,
        tooltip_style: TooltipStyle,
        avatar_size: f32,
        picker: Picker,
    ) -> Self {
        let mut app = Self {
            slots: Vec::with_capacity(GALLERY_LEN),
            selected: 0,
            tooltip_style,
            avatar_size,
            picker,
            renderers: AvatarRenderers::default(),
            events,
            should_quit: false,
        };
        for index in 0..GALLERY_LEN {
            let controller = app.mount(index);
            app.slots.push(Some(controller));
        }
        app
    }

    fn mount(&self, index: usize) -> AvatarController {
        let config = gallery_config(index, self.tooltip_style, self.avatar_size);
        AvatarController::mount(config, self.renderers.clone(), self.events.clone())
    }

    /// Routes a load notification to the avatar it belongs to.
    pub fn handle_avatar_event(&mut self, event: AvatarEvent) {
        let instance = event.instance;
        match self.slots.iter_mut().flatten().find(|c| c.id() == instance) {
            Some(controller) => {
                controller.handle_event(event);
            }
            None => debug!(%instance, "dropping notification for unmounted avatar"),
        }
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % GALLERY_LEN;
    }

    pub fn select_previous(&mut self) {
        self.selected = (self.selected + GALLERY_LEN - 1) % GALLERY_LEN;
    }

    pub fn remount_selected(&mut self) {
        let controller = self.mount(self.selected);
        if let Some(old) = self.slots[self.selected].replace(controller) {
            old.unmount();
        }
    }

    pub fn unmount_selected(&mut self) {
        if let Some(old) = self.slots[self.selected].take() {
            old.unmount();
        }
    }

    /// Cycles the tooltip style. Configs are immutable, so every avatar is remounted.
    pub fn cycle_tooltip_style(&mut self) {
        self.tooltip_style = self.tooltip_style.next();
        info!(style = ?self.tooltip_style, "tooltip style changed");
        for index in 0..GALLERY_LEN {
            let controller = self.mount(index);
            if let Some(old) = self.slots[index].replace(controller) {
                old.unmount();
            }
        }
    }
}

/// Label shown above each gallery slot.
pub fn gallery_label(index: usize) -> &'static str {
    match index {
        0 => "user, no picture",
        1 => "space, no picture",
        2 => "user, picture",
        3 => "space, slow picture",
        4 => "user, broken picture",
        5 => "group chat",
        6 => "direct message",
        _ => "space, lost picture",
    }
}

fn gallery_config(index: usize, style: TooltipStyle, size: f32) -> AvatarConfig {
    let config = match index {
        0 => AvatarConfig::new(AvatarMode::User, "alice").with_display_name("Alice"),
        1 => AvatarConfig::new(AvatarMode::Space, "#general:x"),
        2 => AvatarConfig::new(AvatarMode::User, "bob")
            .with_unique_name("@bob:nexus")
            .with_avatar(sample_picture([40, 120, 220])),
        3 => AvatarConfig::new(AvatarMode::Space, "#rust:x")
            .with_display_name("Rust")
            .with_image_provider(
                async {
                    tokio::time::sleep(Duration::from_millis(1500)).await;
                    Ok::<_, AvatarError>(sample_picture([230, 110, 30]))
                }
                .boxed(),
            ),
        4 => AvatarConfig::new(AvatarMode::User, "mallory")
            .with_avatar(ImageHandle::from_bytes(b"\x89PNG not really".to_vec())),
        5 => AvatarConfig::new(AvatarMode::GroupChat, "g1").with_display_name("Weekend plans"),
        6 => AvatarConfig::new(AvatarMode::DirectMessage, "dm1")
            .with_display_name("Dana")
            .with_avatar(sample_picture([120, 200, 90])),
        _ => AvatarConfig::new(AvatarMode::Space, "#archive:x").with_image_provider(
            async {
                tokio::time::sleep(Duration::from_millis(800)).await;
                Err::<ImageHandle, _>(AvatarError::Unsupported("media server unreachable".to_string()))
            }
            .boxed(),
        ),
    };
    config.with_tooltip_style(style).with_size(size)
}

/// Diagonal gradient PNG used as a stand-in profile picture.
fn sample_picture(base: [u8; 3]) -> ImageHandle {
    let img = RgbaImage::from_fn(64, 64, |x, y| {
        let t = (x + y) as f32 / 126.0;
        Rgba([
            (base[0] as f32 * (1.0 - t) + 255.0 * t) as u8,
            (base[1] as f32 * (1.0 - t)) as u8,
            (base[2] as f32 * (1.0 - t) + 80.0 * t) as u8,
            255,
        ])
    });
    let mut out = Cursor::new(Vec::new());
    match DynamicImage::ImageRgba8(img).write_to(&mut out, ImageFormat::Png) {
        Ok(()) => ImageHandle::from_bytes(out.into_inner()),
        // An undecodable handle still exercises the fallback path.
        Err(_) => ImageHandle::from_bytes(Vec::new()),
    }
}
