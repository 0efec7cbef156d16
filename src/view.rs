use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, trace};

use crate::canvas::{parse_color, Canvas, Container, SharedCanvas};
use crate::compat::Compat;
use crate::config::StreamConfig;
use crate::error::AppError;
use crate::event::{Emitter, Event, INVALID_STREAM};
use crate::handle::{FrameLoader, ImageHandle, LoadState};
use crate::icon;
use crate::result::Result;
use crate::source;

/// Where a view puts its canvas.
#[derive(Debug, Clone)]
pub enum Target {
    /// A fresh canvas is created and replaces the container's children.
    Container(Arc<Container>),
    /// The given canvas is resized and painted in place.
    Canvas(SharedCanvas),
}

struct State {
    handle: Option<ImageHandle>,
    topic: String,
    sources: HashMap<String, String>,
    overlay: Option<SharedCanvas>,
    timer: Option<JoinHandle<()>>,
    closed: bool,
}

struct Inner {
    config: StreamConfig,
    canvas: SharedCanvas,
    loader: Arc<dyn FrameLoader>,
    compat: Compat,
    period: Duration,
    events: Emitter,
    state: Mutex<State>,
}

/// Paints the latest frame of one remote stream into a canvas on a fixed
/// period.
pub struct StreamView {
    inner: Arc<Inner>,
}

impl StreamView {
    pub fn new(config: StreamConfig, target: Target, loader: Arc<dyn FrameLoader>) -> Result<Self> {
        config.validate()?;
        let background = parse_color(&config.background)?;
        let canvas = match target {
            Target::Container(container) => {
                let canvas = Canvas::with_background(config.width, config.height, background).shared();
                container.replace_children(canvas.clone());
                canvas
            }
            Target::Canvas(canvas) => {
                {
                    let mut c = canvas.lock();
                    c.set_background(background);
                    c.resize(config.width, config.height);
                }
                canvas
            }
        };
        let compat = Compat::from_user_agent(config.user_agent.as_deref());
        let period = config.period();
        debug!(
            "stream view {}x{} period {:?} compat {:?}",
            config.width, config.height, period, compat
        );
        let state = State {
            handle: None,
            topic: config.topic.clone(),
            sources: HashMap::new(),
            overlay: None,
            timer: None,
            closed: false,
        };
        Ok(StreamView {
            inner: Arc::new(Inner {
                config,
                canvas,
                loader,
                compat,
                period,
                events: Emitter::default(),
                state: Mutex::new(state),
            }),
        })
    }

    /// Composites `overlay` over every frame.
    pub fn with_overlay(self, overlay: SharedCanvas) -> Self {
        self.inner.state.lock().overlay = Some(overlay);
        self
    }

    /// Loads the configured stream and starts the redraw timer. The first
    /// redraw happens one period from now.
    pub fn start(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| AppError::NoRuntime)?;
        let topic = {
            let state = self.inner.state.lock();
            if state.closed {
                return Err(AppError::Closed);
            }
            state.topic.clone()
        };
        self.inner.change_stream(&topic);

        let period = self.inner.period;
        let task = runtime.spawn(redraw_loop(Arc::downgrade(&self.inner), period));
        if let Some(old) = self.inner.state.lock().timer.replace(task) {
            old.abort();
        }
        Ok(())
    }

    pub fn draw(&self) {
        self.inner.draw();
    }

    /// Points the view at `topic`, cancelling the current load. Raises
    /// `change` even when the topic is unchanged.
    pub fn change_stream(&self, topic: &str) {
        self.inner.change_stream(topic);
    }

    pub fn close(&self) {
        let (timer, handle) = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            (state.timer.take(), state.handle.take())
        };
        if let Some(timer) = timer {
            timer.abort();
        }
        if let Some(mut handle) = handle {
            handle.cancel();
        }
        info!("stream view closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    pub fn canvas(&self) -> SharedCanvas {
        self.inner.canvas.clone()
    }

    pub fn current_topic(&self) -> String {
        self.inner.state.lock().topic.clone()
    }

    /// The URL the active handle loads, if any.
    pub fn source(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .handle
            .as_ref()
            .map(|handle| handle.source().to_string())
    }

    /// `None` before `start` and after `close`.
    pub fn load_state(&self) -> Option<LoadState> {
        self.inner.state.lock().handle.as_ref().map(ImageHandle::state)
    }

    pub fn period(&self) -> Duration {
        self.inner.period
    }

    pub fn events(&self) -> &Emitter {
        &self.inner.events
    }
}

impl Drop for StreamView {
    fn drop(&mut self) {
        self.close();
    }
}

async fn redraw_loop(inner: Weak<Inner>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    loop {
        ticker.tick().await;
        match inner.upgrade() {
            Some(inner) => inner.draw(),
            None => return,
        }
    }
}

impl Inner {
    fn change_stream(&self, topic: &str) {
        let previous = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            let source = state
                .sources
                .entry(topic.to_string())
                .or_insert_with(|| source::compose(&self.config, topic))
                .clone();
            state.topic = topic.to_string();
            state.handle.replace(self.loader.load(&source))
        };
        if let Some(mut previous) = previous {
            previous.cancel();
        }
        info!("stream changed to {}", topic);
        self.events.emit(Event::Change(topic.to_string()));
    }

    fn draw(&self) {
        let invalid = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            let (width, height) = (self.config.width, self.config.height);
            let mut canvas = self.canvas.lock();
            canvas.clear();
            let drawn = state
                .handle
                .as_ref()
                .and_then(|handle| {
                    handle.with_frame(|frame| canvas.draw_image_scaled(frame, 0, 0, width, height))
                })
                .is_some();
            if !drawn {
                icon::draw_error_icon(&mut canvas, width, height);
            }
            if let Some(overlay) = &state.overlay {
                let overlay = overlay.lock();
                canvas.draw_image(overlay.pixels(), 0, 0);
            }
            drop(canvas);

            if self.compat.cache_bust {
                if let Some(source) = state.handle.as_ref().map(|h| h.source().to_string()) {
                    let busted = Compat::bust(&source, rand::random::<f64>());
                    trace!("reload {}", busted);
                    let fresh = self.loader.load(&busted);
                    if let Some(mut old) = state.handle.replace(fresh) {
                        if let Some(fresh) = state.handle.as_ref() {
                            fresh.inherit_frame(&old);
                        }
                        old.cancel();
                    }
                }
            }
            !drawn
        };
        if invalid {
            debug!("no frame to draw");
            self.events.emit(Event::Warning(INVALID_STREAM.to_string()));
        }
    }
}
