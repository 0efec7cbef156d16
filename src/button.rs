use image::{Rgba, RgbaImage};
use once_cell::sync::Lazy;

use crate::canvas::Canvas;
use crate::glyph;
use crate::icon::decode_asset;

const BUTTON_PNG: &[u8] = include_bytes!("../assets/button.png");
const TEXT_COLOR: Rgba<u8> = Rgba([0x12, 0x12, 0x12, 255]);
const PADDING_RATIO: f32 = 0.33;

static BACKGROUND: Lazy<RgbaImage> = Lazy::new(|| decode_asset(BUTTON_PNG, "button background"));

/// A labelled button rendered to its own canvas. The width grows to fit the
/// text.
#[derive(Debug, Clone)]
pub struct Button {
    text: String,
    height: f32,
    width: f32,
    canvas: Canvas,
}

impl Button {
    pub fn new<T: ToString>(text: T, height: f32) -> Self {
        let mut button = Button {
            text: text.to_string(),
            height,
            width: 0.0,
            canvas: Canvas::new(1, 1),
        };
        button.redraw();
        button
    }

    pub fn redraw(&mut self) {
        let padding = self.height * PADDING_RATIO;
        let font_size = self.height - padding;
        self.width = glyph::measure(&self.text, font_size) + padding * 2.0;

        let width = self.width.ceil().max(1.0) as u32;
        let height = self.height.ceil().max(1.0) as u32;
        self.canvas = Canvas::new(width, height);
        self.canvas.draw_image_scaled(&BACKGROUND, 0, 0, width, height);
        glyph::fill_text(
            &mut self.canvas,
            &self.text,
            padding,
            self.height - padding,
            font_size,
            TEXT_COLOR,
        );
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
}
