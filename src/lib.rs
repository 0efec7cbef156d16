pub mod button;
pub mod canvas;
pub mod compat;
pub mod config;
pub mod event;
pub mod glyph;
pub mod handle;
pub mod icon;
pub mod layout;
pub mod log;
pub mod multi;
pub mod popup;
pub mod source;
pub mod view;

mod error;
mod result;

pub use canvas::{Canvas, Container, SharedCanvas};
pub use config::{MultiStreamConfig, StreamConfig};
pub use error::AppError;
pub use event::{Emitter, Event, INVALID_STREAM};
pub use handle::{FrameLoader, FrameSink, HttpLoader, ImageHandle, LoadState};
pub use layout::ElementBox;
pub use multi::{Interaction, MultiStreamView};
pub use result::Result;
pub use view::{StreamView, Target};
