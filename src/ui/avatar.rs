//! Avatar widget: picture protocol, masks and generated fallbacks.

use image::{DynamicImage, GenericImageView, RgbaImage};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::Widget,
    Frame,
};
use ratatui_image::{picker::Picker, protocol::StatefulProtocol, StatefulImage};

use crate::controller::AvatarController;
use crate::model::{AvatarVisual, Identicon, ImageShape, TextTile};
use crate::state::AvatarError;
use crate::ui::tooltip::draw_tooltip;

/// Font size assumed when the terminal does not report one.
const FALLBACK_FONT_SIZE: (u16, u16) = (8, 16);

/// Number of terminal cells covering `extent` logical pixels.
pub fn cell_extent(extent: f32, font_size: (u16, u16)) -> (u16, u16) {
    let (font_w, font_h) = if font_size.0 == 0 || font_size.1 == 0 { FALLBACK_FONT_SIZE } else { font_size };
    let w = (extent / font_w as f32).ceil().max(1.0) as u16;
    let h = (extent / font_h as f32).ceil().max(1.0) as u16;
    (w, h)
}

/// Draws a mounted avatar into `area`. With `highlighted` set, the tooltip (if any) is shown below it.
pub fn draw_avatar(f: &mut Frame, area: Rect, controller: &mut AvatarController, picker: &Picker, highlighted: bool) {
    let view = controller.view();
    let (w, h) = cell_extent(view.visual.extent(), picker.font_size());
    let avatar_area = Rect::new(area.x, area.y, w.min(area.width), h.min(area.height));
    if avatar_area.width == 0 || avatar_area.height == 0 {
        return;
    }

    match view.visual.content() {
        AvatarVisual::Image { .. } => {
            if let Some(state) = avatar_protocol(controller, picker) {
                f.render_stateful_widget(StatefulImage::default(), avatar_area, state);
                if let Some(Err(e)) = state.last_encoding_result() {
                    controller.report_render_error(AvatarError::Render(format!("{:?}", e)));
                }
            }
        }
        AvatarVisual::Identicon(identicon) => f.render_widget(IdenticonWidget(identicon), avatar_area),
        AvatarVisual::TextTile(tile) => f.render_widget(TextTileWidget(tile), avatar_area),
        AvatarVisual::Placeholder { .. } | AvatarVisual::Tooltip { .. } => {}
    }

    if highlighted {
        if let Some(text) = view.visual.tooltip() {
            let bounds = f.area();
            draw_tooltip(f, text, avatar_area, bounds);
        }
    }
}

// Returns the cached StatefulProtocol for the controller's picture, creating it if needed.
pub fn avatar_protocol<'a>(controller: &'a mut AvatarController, picker: &Picker) -> Option<&'a mut StatefulProtocol> {
    if controller.protocol.is_none() {
        let (image, shape) = match controller.view().visual.content() {
            AvatarVisual::Image { image, shape } => (image.image.clone(), *shape),
            _ => return None,
        };
        let prepared = prepare_image(&image, shape);
        controller.protocol = Some(picker.new_resize_protocol(DynamicImage::ImageRgba8(prepared)));
    }
    controller.protocol.as_mut()
}

/// Cover-fits the picture into the shape's square and masks it to the shape.
pub fn prepare_image(img: &DynamicImage, shape: ImageShape) -> RgbaImage {
    let size = shape.extent().round().max(1.0) as u32;
    let (orig_w, orig_h) = img.dimensions();
    let scale = f32::max(size as f32 / orig_w as f32, size as f32 / orig_h as f32);
    let new_w = ((orig_w as f32 * scale).ceil() as u32).max(size);
    let new_h = ((orig_h as f32 * scale).ceil() as u32).max(size);
    let resized = img.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3).to_rgba8();
    // Crop the center square
    let x_offset = (new_w - size) / 2;
    let y_offset = (new_h - size) / 2;
    let mut square = image::imageops::crop_imm(&resized, x_offset, y_offset, size, size).to_image();
    match shape {
        ImageShape::Circle { .. } => apply_circular_mask(&mut square),
        ImageShape::RoundedRect { edge, corner_radius } => {
            let radius = corner_radius * size as f32 / edge.max(1.0);
            apply_rounded_mask(&mut square, radius);
        }
    }
    square
}

// Helper: Apply a circular alpha mask to an RgbaImage in-place
pub fn apply_circular_mask(img: &mut RgbaImage) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let r = w.min(h) / 2.0;
    for (x, y, p) in img.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if (dx * dx + dy * dy).sqrt() > r {
            p[3] = 0;
        }
    }
}

/// Clears the pixels outside rounded corners of the given radius.
pub fn apply_rounded_mask(img: &mut RgbaImage, radius: f32) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let radius = radius.min(w / 2.0).min(h / 2.0);
    if radius <= 0.0 {
        return;
    }
    for (x, y, p) in img.enumerate_pixels_mut() {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let cx = px.clamp(radius, w - radius);
        let cy = py.clamp(radius, h - radius);
        let (dx, dy) = (px - cx, py - cy);
        if (dx * dx + dy * dy).sqrt() > radius {
            p[3] = 0;
        }
    }
}

/// Identicon drawn with upper half blocks, two pattern rows per terminal row.
pub struct IdenticonWidget<'a>(pub &'a Identicon);

impl Widget for IdenticonWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let grid = self.0.cells.len();
        if grid == 0 || area.width == 0 || area.height == 0 {
            return;
        }
        let color_at = |col: u16, sub_row: u16| {
            let gx = (col as usize * grid) / area.width as usize;
            let gy = (sub_row as usize * grid) / (area.height as usize * 2);
            self.0.cells[gy.min(grid - 1)][gx.min(grid - 1)].unwrap_or(self.0.background)
        };
        for row in 0..area.height {
            for col in 0..area.width {
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_char('▀')
                        .set_fg(color_at(col, row * 2))
                        .set_bg(color_at(col, row * 2 + 1));
                }
            }
        }
    }
}

/// Coloured tile with the initials centred on its middle row.
pub struct TextTileWidget<'a>(pub &'a TextTile);

impl Widget for TextTileWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let tile = self.0;
        let style = Style::default().bg(tile.background).fg(tile.foreground);
        buf.set_style(area, style);
        let len = tile.initials.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(len) / 2;
        let y = area.y + area.height / 2;
        buf.set_stringn(x, y, &tile.initials, area.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::controller::AvatarRenderers;
    use crate::model::{AvatarConfig, AvatarMode, ImageHandle, TileShape, TooltipStyle};
    use crate::services::{IdenticonGenerator, InitialsTile, InitialsTileGenerator, PatternIdenticon};
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, buffer::Cell, style::Color, Terminal};
    use tokio::sync::mpsc;

    fn png(w: u32, h: u32) -> ImageHandle {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, image::Rgba([10, 200, 30, 255])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        ImageHandle::from_bytes(out.into_inner())
    }

    async fn loaded_controller(config: AvatarConfig) -> AvatarController {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut controller = AvatarController::mount(config, AvatarRenderers::default(), tx);
        let event = rx.recv().await.unwrap();
        assert!(controller.handle_event(event));
        assert!(controller.state().image_loaded);
        controller
    }

    fn draw(terminal: &mut Terminal<TestBackend>, controller: &mut AvatarController, picker: &Picker, highlighted: bool) {
        terminal
            .draw(|f| {
                let area = f.area();
                draw_avatar(f, area, controller, picker, highlighted);
            })
            .unwrap();
    }

    fn row_text(buf: &Buffer, y: u16, width: u16) -> String {
        (0..width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn bob() -> AvatarConfig {
        AvatarConfig::new(AvatarMode::User, "bob")
            .with_display_name("Bob")
            .with_tooltip_style(TooltipStyle::Combined)
    }

    #[test]
    fn cell_extent_uses_font_size() {
        assert_eq!(cell_extent(48.0, (8, 16)), (6, 3));
        assert_eq!(cell_extent(24.0, (0, 0)), (3, 2));
        assert_eq!(cell_extent(1.0, (10, 20)), (1, 1));
    }

    #[test]
    fn circle_mask_clears_corners() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 20, image::Rgba([1, 2, 3, 255])));
        let out = prepare_image(&img, ImageShape::Circle { radius: 8.0 });
        assert_eq!(out.dimensions(), (16, 16));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(8, 8)[3], 255);
    }

    #[test]
    fn rounded_mask_keeps_edges() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(24, 24, image::Rgba([1, 2, 3, 255])));
        let out = prepare_image(&img, ImageShape::RoundedRect { edge: 24.0, corner_radius: 6.0 });
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(12, 0)[3], 255);
        assert_eq!(out.get_pixel(0, 12)[3], 255);
    }

    #[test]
    fn tile_widget_centres_initials() {
        let tile = InitialsTile.render("#general:x", "#general:x", 24.0, TileShape::Rectangle);
        let area = Rect::new(0, 0, 5, 3);
        let mut buf = Buffer::empty(area);
        TextTileWidget(&tile).render(area, &mut buf);
        assert_eq!(buf[(1, 1)].symbol(), "G");
        assert_eq!(buf[(2, 1)].symbol(), "X");
        assert_eq!(buf[(0, 0)].bg, tile.background);
    }

    #[test]
    fn identicon_widget_fills_area() {
        let icon = PatternIdenticon.render("alice", 24.0);
        let area = Rect::new(0, 0, 5, 3);
        let mut buf = Buffer::empty(area);
        IdenticonWidget(&icon).render(area, &mut buf);
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(buf[(x, y)].symbol(), "▀");
                assert_ne!(buf[(x, y)].fg, Color::Reset);
            }
        }
    }

    #[tokio::test]
    async fn highlighted_picture_draws_image_and_tooltip_below() {
        let picker = Picker::from_fontsize((8, 16));
        let mut controller = loaded_controller(bob().with_avatar(png(16, 16))).await;
        let mut terminal = Terminal::new(TestBackend::new(20, 6)).unwrap();
        draw(&mut terminal, &mut controller, &picker, true);

        assert!(controller.protocol.is_some());
        assert!(controller.state().image_loaded);
        let buf = terminal.backend().buffer();
        // A 48px circle is 6x3 cells at 8x16, so the label sits on row 3.
        assert_ne!(buf[(2, 1)], Cell::default());
        assert_eq!(row_text(buf, 3, 9), "Bob (bob)");
        assert_eq!(buf[(0, 3)].bg, Color::DarkGray);
        assert_eq!(buf[(9, 3)], Cell::default());
    }

    #[tokio::test]
    async fn tooltip_is_only_drawn_when_highlighted() {
        let picker = Picker::from_fontsize((8, 16));
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut controller = AvatarController::mount(bob(), AvatarRenderers::default(), tx);
        let mut terminal = Terminal::new(TestBackend::new(20, 6)).unwrap();
        draw(&mut terminal, &mut controller, &picker, false);
        assert_eq!(row_text(terminal.backend().buffer(), 2, 9), " ".repeat(9));
        draw(&mut terminal, &mut controller, &picker, true);
        assert_eq!(row_text(terminal.backend().buffer(), 2, 9), "Bob (bob)");
    }

    #[tokio::test]
    async fn every_fallback_mode_draws_without_a_picture() {
        let picker = Picker::from_fontsize((8, 16));
        let (tx, _rx) = mpsc::unbounded_channel();
        let renderers = AvatarRenderers::default();
        let mut terminal = Terminal::new(TestBackend::new(10, 4)).unwrap();

        let mut user = AvatarController::mount(
            AvatarConfig::new(AvatarMode::User, "alice").with_tooltip_style(TooltipStyle::None),
            renderers.clone(),
            tx.clone(),
        );
        draw(&mut terminal, &mut user, &picker, true);
        let buf = terminal.backend().buffer();
        assert_eq!(buf[(0, 0)].symbol(), "▀");
        assert_eq!(buf[(2, 1)].symbol(), "▀");
        assert_eq!(buf[(3, 0)], Cell::default());
        assert!(user.protocol.is_none());

        let mut space = AvatarController::mount(
            AvatarConfig::new(AvatarMode::Space, "#general:x").with_tooltip_style(TooltipStyle::None),
            renderers.clone(),
            tx.clone(),
        );
        draw(&mut terminal, &mut space, &picker, true);
        let buf = terminal.backend().buffer();
        assert_eq!(buf[(0, 1)].symbol(), "G");
        assert_eq!(buf[(1, 1)].symbol(), "X");
        assert_ne!(buf[(2, 0)].bg, Color::Reset);
        assert_eq!(buf[(3, 0)], Cell::default());

        for mode in [AvatarMode::GroupChat, AvatarMode::DirectMessage] {
            let mut placeholder = AvatarController::mount(
                AvatarConfig::new(mode, "g1").with_tooltip_style(TooltipStyle::None),
                renderers.clone(),
                tx.clone(),
            );
            draw(&mut terminal, &mut placeholder, &picker, true);
            let buf = terminal.backend().buffer();
            assert_eq!(*buf, Buffer::empty(Rect::new(0, 0, 10, 4)), "{:?} should leave its area blank", mode);
        }
    }

    #[tokio::test]
    async fn render_failure_switches_next_frame_to_fallback() {
        let picker = Picker::from_fontsize((8, 16));
        let mut controller = loaded_controller(bob().with_avatar(png(16, 16))).await;
        let mut terminal = Terminal::new(TestBackend::new(20, 6)).unwrap();
        draw(&mut terminal, &mut controller, &picker, true);
        assert!(avatar_protocol(&mut controller, &picker).is_some());

        controller.report_render_error(AvatarError::Render("encoder gave up".to_string()));
        assert!(controller.protocol.is_none());
        assert!(!controller.state().image_loaded);
        assert!(avatar_protocol(&mut controller, &picker).is_none());
        draw(&mut terminal, &mut controller, &picker, true);

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut fresh = AvatarController::mount(bob(), AvatarRenderers::default(), tx);
        let mut expected = Terminal::new(TestBackend::new(20, 6)).unwrap();
        draw(&mut expected, &mut fresh, &picker, true);

        assert_eq!(terminal.backend().buffer(), expected.backend().buffer());
        assert_eq!(row_text(terminal.backend().buffer(), 2, 9), "Bob (bob)");
    }
}
