use std::sync::Arc;
use std::time::Duration;

use image::Rgba;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::button::Button;
use crate::canvas::{Canvas, SharedCanvas};
use crate::config::MultiStreamConfig;
use crate::error::AppError;
use crate::event::{Emitter, Event};
use crate::handle::FrameLoader;
use crate::layout::{page_origin, Bounds, ElementBox};
use crate::popup::{Menu, MenuOption, Placement, Popup};
use crate::result::Result;
use crate::view::{StreamView, Target};

pub const BUTTON_TEXT: &str = "Edit";
const BUTTON_PADDING: f64 = 10.0;
const BUTTON_TIMEOUT: Duration = Duration::from_secs(3);
const FADE_COLOR: Rgba<u8> = Rgba([0xfe, 0xfe, 0xfe, 0xff]);
const FADE_ALPHA: f32 = 0.44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Idle,
    ButtonShown,
    MenuOpen,
}

struct Ui {
    closed: bool,
    menu_open: bool,
    has_button: bool,
    generation: u64,
    hide_task: Option<JoinHandle<()>>,
    topic: String,
    popup: Popup,
    layout: Vec<ElementBox>,
}

struct Chrome {
    config: MultiStreamConfig,
    overlay: SharedCanvas,
    button: Button,
    events: Emitter,
    ui: Mutex<Ui>,
}

/// A [`StreamView`] with an on-canvas "Edit" button that opens a menu for
/// picking one of several streams.
pub struct MultiStreamView {
    view: StreamView,
    chrome: Arc<Chrome>,
}

impl MultiStreamView {
    pub fn new(config: MultiStreamConfig, target: Target, loader: Arc<dyn FrameLoader>) -> Result<Self> {
        config.validate()?;
        let view_config = config.view_config();
        let overlay = Canvas::new(view_config.width, view_config.height).shared();
        let button = Button::new(BUTTON_TEXT, view_config.height as f32 / 8.0);
        let view = StreamView::new(view_config.clone(), target, loader)?.with_overlay(overlay.clone());

        let chrome = Arc::new(Chrome {
            button,
            overlay,
            events: Emitter::default(),
            ui: Mutex::new(Ui {
                closed: false,
                menu_open: false,
                has_button: false,
                generation: 0,
                hide_task: None,
                topic: view_config.topic,
                popup: Popup::default(),
                layout: vec![],
            }),
            config,
        });

        let forward = Arc::downgrade(&chrome);
        view.events().on(move |event| {
            let Some(chrome) = forward.upgrade() else {
                return;
            };
            if let Event::Change(topic) = event {
                chrome.ui.lock().topic = topic.clone();
            }
            chrome.events.emit(event.clone());
        });

        Ok(MultiStreamView { view, chrome })
    }

    /// Starts the inner view. Its initial `change` is forwarded.
    pub fn start(&self) -> Result<()> {
        self.view.start()
    }

    /// The host's offset chain for the canvas, innermost first.
    pub fn set_layout(&self, layout: Vec<ElementBox>) {
        self.chrome.ui.lock().layout = layout;
    }

    pub fn pointer_move(&self) {
        let mut ui = self.chrome.ui.lock();
        if ui.closed {
            return;
        }
        self.chrome.clear_button(&mut ui);
        if ui.menu_open {
            self.chrome.fade();
            return;
        }

        let bounds = self.chrome.button_bounds();
        self.chrome
            .overlay
            .lock()
            .draw_image(self.chrome.button.canvas().pixels(), bounds.left as i64, bounds.top as i64);
        ui.has_button = true;
        ui.generation += 1;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(hide_button(Arc::downgrade(&self.chrome), ui.generation));
                ui.hide_task = Some(task);
            }
            Err(e) => warn!("button stays until the next move, no runtime: {}", e),
        }
    }

    /// A click at page coordinates. Opens the menu when it lands on the
    /// button. Returns whether it did.
    pub fn click(&self, page_x: f64, page_y: f64) -> bool {
        let mut ui = self.chrome.ui.lock();
        if ui.closed || !ui.has_button {
            return false;
        }
        let (left, top) = page_origin(&ui.layout);
        let (x, y) = (page_x - left, page_y - top);
        if !self.chrome.button_bounds().contains(x, y) {
            debug!("click at ({}, {}) missed the button", x, y);
            return false;
        }

        ui.menu_open = true;
        self.chrome.clear_button(&mut ui);

        let config = &self.chrome.config;
        let options = config
            .topics
            .iter()
            .enumerate()
            .map(|(i, topic)| MenuOption {
                value: topic.clone(),
                text: config.label(i).unwrap_or(topic.as_str()).to_string(),
                selected: *topic == ui.topic,
            })
            .collect();
        let placement = Placement {
            top,
            left,
            width: config.stream.width as f64,
        };
        ui.popup.show(Menu::new(options), placement);
        info!("stream menu opened");
        true
    }

    /// Picks a stream from the open menu. Returns whether the view switched.
    pub fn select(&self, topic: &str) -> Result<bool> {
        if self.view.is_closed() {
            return Err(AppError::Closed);
        }
        {
            let mut ui = self.chrome.ui.lock();
            if ui.closed {
                return Err(AppError::Closed);
            }
            if !ui.menu_open {
                return Err(AppError::MenuClosed);
            }
            let known = ui
                .popup
                .menu_mut()
                .map(|menu| menu.select(topic))
                .unwrap_or(false);
            if !known {
                return Err(AppError::unknown_stream(topic));
            }
            if ui.topic == topic {
                return Ok(false);
            }
        }
        self.view.change_stream(topic);
        Ok(true)
    }

    pub fn close_menu(&self) {
        let mut ui = self.chrome.ui.lock();
        ui.popup.clear();
        ui.menu_open = false;
        self.chrome.overlay.lock().clear();
        debug!("stream menu closed");
    }

    pub fn interaction(&self) -> Interaction {
        let ui = self.chrome.ui.lock();
        if ui.menu_open {
            Interaction::MenuOpen
        } else if ui.has_button {
            Interaction::ButtonShown
        } else {
            Interaction::Idle
        }
    }

    pub fn popup(&self) -> Popup {
        self.chrome.ui.lock().popup.clone()
    }

    pub fn overlay(&self) -> SharedCanvas {
        self.chrome.overlay.clone()
    }

    pub fn canvas(&self) -> SharedCanvas {
        self.view.canvas()
    }

    pub fn view(&self) -> &StreamView {
        &self.view
    }

    pub fn current_topic(&self) -> String {
        self.chrome.ui.lock().topic.clone()
    }

    /// The button's hit box in canvas coordinates.
    pub fn button_bounds(&self) -> Bounds {
        self.chrome.button_bounds()
    }

    pub fn events(&self) -> &Emitter {
        &self.chrome.events
    }

    /// Closes the inner view and drops the button and menu.
    pub fn close(&self) {
        let mut ui = self.chrome.ui.lock();
        if !ui.closed {
            ui.closed = true;
            self.chrome.clear_button(&mut ui);
            ui.popup.clear();
            ui.menu_open = false;
            self.chrome.overlay.lock().clear();
        }
        drop(ui);
        self.view.close();
    }
}

impl Drop for MultiStreamView {
    fn drop(&mut self) {
        self.close();
    }
}

impl Chrome {
    fn button_bounds(&self) -> Bounds {
        let height = self.config.stream.height as f64;
        let button_height = self.button.height() as f64;
        let top = height - (button_height + BUTTON_PADDING);
        Bounds {
            left: BUTTON_PADDING,
            top,
            right: self.button.width() as f64 + BUTTON_PADDING,
            bottom: height - BUTTON_PADDING,
        }
    }

    /// Takes the button off the overlay and cancels its hide timer.
    fn clear_button(&self, ui: &mut Ui) {
        if let Some(task) = ui.hide_task.take() {
            task.abort();
        }
        if ui.has_button {
            self.overlay.lock().clear();
            ui.has_button = false;
        }
    }

    fn fade(&self) {
        let mut overlay = self.overlay.lock();
        overlay.clear();
        let (width, height) = (overlay.width(), overlay.height());
        overlay.fill_rect(0, 0, width, height, FADE_COLOR, FADE_ALPHA);
    }
}

async fn hide_button(chrome: std::sync::Weak<Chrome>, generation: u64) {
    tokio::time::sleep(BUTTON_TIMEOUT).await;
    let Some(chrome) = chrome.upgrade() else {
        return;
    };
    let mut ui = chrome.ui.lock();
    if ui.generation != generation || !ui.has_button {
        return;
    }
    ui.hide_task = None;
    ui.has_button = false;
    chrome.overlay.lock().clear();
    debug!("button hidden");
}
