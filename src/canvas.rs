use std::sync::Arc;

use image::{
    imageops::{self, FilterType},
    Pixel, Rgba, RgbaImage,
};
use parking_lot::Mutex;

use crate::error::AppError;
use crate::result::Result;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub type SharedCanvas = Arc<Mutex<Canvas>>;

/// An RGBA drawing surface. `clear` resets it to the background colour, which
/// is transparent unless one was given.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    background: Rgba<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, TRANSPARENT)
    }

    pub fn with_background(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Canvas {
            pixels: RgbaImage::from_pixel(width, height, background),
            background,
        }
    }

    pub fn shared(self) -> SharedCanvas {
        Arc::new(Mutex::new(self))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    pub fn set_background(&mut self, background: Rgba<u8>) {
        self.background = background;
    }

    /// Reallocates the surface, dropping its contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::from_pixel(width, height, self.background);
    }

    pub fn clear(&mut self) {
        let background = self.background;
        self.pixels.pixels_mut().for_each(|p| *p = background);
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Composites `image` at its natural size with its top-left at `(x, y)`.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.pixels, image, x, y);
    }

    /// Composites `image` scaled to `width`×`height`.
    pub fn draw_image_scaled(&mut self, image: &RgbaImage, x: i64, y: i64, width: u32, height: u32) {
        if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
            return;
        }
        if image.dimensions() == (width, height) {
            self.draw_image(image, x, y);
        } else {
            let scaled = imageops::resize(image, width, height, FilterType::Triangle);
            self.draw_image(&scaled, x, y);
        }
    }

    /// Blends a solid rectangle over the surface, clipped to its bounds.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        let Rgba([r, g, b, a]) = color;
        let paint = Rgba([r, g, b, (a as f32 * alpha).round() as u8]);

        let x0 = x.clamp(0, self.width() as i64) as u32;
        let y0 = y.clamp(0, self.height() as i64) as u32;
        let x1 = (x + width as i64).clamp(0, self.width() as i64) as u32;
        let y1 = (y + height as i64).clamp(0, self.height() as i64) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels.get_pixel_mut(px, py).blend(&paint);
            }
        }
    }
}

/// A host node that owns the canvases placed in it.
#[derive(Debug)]
pub struct Container {
    id: String,
    children: Mutex<Vec<SharedCanvas>>,
}

impl Container {
    pub fn new<T: ToString>(id: T) -> Arc<Self> {
        Arc::new(Container {
            id: id.to_string(),
            children: Mutex::new(vec![]),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn append(&self, canvas: SharedCanvas) {
        self.children.lock().push(canvas);
    }

    pub fn replace_children(&self, canvas: SharedCanvas) {
        let mut children = self.children.lock();
        children.clear();
        children.push(canvas);
    }

    pub fn children(&self) -> Vec<SharedCanvas> {
        self.children.lock().clone()
    }
}

/// Parses `#rgb` or `#rrggbb`.
pub fn parse_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value
        .strip_prefix('#')
        .ok_or_else(|| AppError::invalid_config(format!("color {value} must start with '#'")))?;
    let digits: Vec<u8> = hex
        .chars()
        .map(|c| c.to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()
        .ok_or_else(|| AppError::invalid_config(format!("color {value} is not hex")))?;
    match digits.as_slice() {
        [r, g, b] => Ok(Rgba([r * 17, g * 17, b * 17, 255])),
        [r1, r0, g1, g0, b1, b0] => Ok(Rgba([r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0, 255])),
        _ => Err(AppError::invalid_config(format!(
            "color {value} must have 3 or 6 digits"
        ))),
    }
}
