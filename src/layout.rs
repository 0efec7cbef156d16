/// Offsets of one element in the host's layout, relative to its offset parent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementBox {
    pub offset_left: f64,
    pub offset_top: f64,
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl ElementBox {
    pub fn at(offset_left: f64, offset_top: f64) -> Self {
        ElementBox {
            offset_left,
            offset_top,
            ..Default::default()
        }
    }
}

/// Page position of the first element of `chain`, which lists the element
/// followed by its offset parents. The walk stops at the first entry without
/// finite offsets.
pub fn page_origin(chain: &[ElementBox]) -> (f64, f64) {
    chain
        .iter()
        .take_while(|b| b.offset_left.is_finite() && b.offset_top.is_finite())
        .fold((0.0, 0.0), |(left, top), b| {
            (
                left + b.offset_left - b.scroll_left,
                top + b.offset_top - b.scroll_top,
            )
        })
}

/// An axis-aligned box; edges count as inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}
