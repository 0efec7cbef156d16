use image::RgbaImage;
use once_cell::sync::Lazy;
use tracing::error;

use crate::canvas::Canvas;

const ERROR_ICON_PNG: &[u8] = include_bytes!("../assets/error_icon.png");

static ERROR_ICON: Lazy<RgbaImage> = Lazy::new(|| decode_asset(ERROR_ICON_PNG, "error icon"));

/// The warning sign drawn when a stream has no valid frame.
pub fn error_icon() -> &'static RgbaImage {
    &ERROR_ICON
}

/// Draws the error icon at half the given size, centred.
pub fn draw_error_icon(canvas: &mut Canvas, width: u32, height: u32) {
    let (w, h) = (width as f64, height as f64);
    let x = ((w - w / 2.0) / 2.0).round() as i64;
    let y = ((h - h / 2.0) / 2.0).round() as i64;
    let icon_width = (w / 2.0).round().max(1.0) as u32;
    let icon_height = (h / 2.0).round().max(1.0) as u32;
    canvas.draw_image_scaled(error_icon(), x, y, icon_width, icon_height);
}

pub(crate) fn decode_asset(bytes: &[u8], name: &str) -> RgbaImage {
    match image::load_from_memory(bytes) {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
            error!("failed to decode embedded {}: {}", name, e);
            RgbaImage::new(1, 1)
        }
    }
}
