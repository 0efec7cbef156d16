use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Errored(String),
    Cancelled,
}

#[derive(Debug)]
struct Slot {
    state: LoadState,
    frame: Option<RgbaImage>,
    frames: u64,
}

/// The in-flight request for one stream source and the latest frame it
/// produced.
///
/// Dropping or cancelling the handle aborts the fetch task and releases the
/// frame.
pub struct ImageHandle {
    source: String,
    slot: Arc<Mutex<Slot>>,
    task: Option<JoinHandle<()>>,
}

impl ImageHandle {
    pub fn new(source: String) -> (Self, FrameSink) {
        let slot = Arc::new(Mutex::new(Slot {
            state: LoadState::Loading,
            frame: None,
            frames: 0,
        }));
        let sink = FrameSink { slot: slot.clone() };
        (
            ImageHandle {
                source,
                slot,
                task: None,
            },
            sink,
        )
    }

    /// Ties a producer task to the handle's lifetime.
    pub fn attach(&mut self, task: JoinHandle<()>) {
        if let Some(old) = self.task.replace(task) {
            old.abort();
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn state(&self) -> LoadState {
        self.slot.lock().state.clone()
    }

    /// Number of frames received so far.
    pub fn frames(&self) -> u64 {
        self.slot.lock().frames
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.slot
            .lock()
            .frame
            .as_ref()
            .map(|frame| frame.dimensions())
            .unwrap_or((0, 0))
    }

    /// Runs `f` on the latest frame if there is one with a nonzero area.
    pub fn with_frame<R>(&self, f: impl FnOnce(&RgbaImage) -> R) -> Option<R> {
        let slot = self.slot.lock();
        slot.frame
            .as_ref()
            .filter(|frame| frame.width() > 0 && frame.height() > 0)
            .map(f)
    }

    /// Moves the frame of `previous` into this handle so it stays drawable
    /// until this load produces its own. Does nothing once a frame arrived.
    pub fn inherit_frame(&self, previous: &ImageHandle) {
        if self.slot.lock().frame.is_some() {
            return;
        }
        let Some(frame) = previous.slot.lock().frame.take() else {
            return;
        };
        let mut slot = self.slot.lock();
        if slot.frame.is_none() && slot.state != LoadState::Cancelled {
            slot.frame = Some(frame);
        }
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut slot = self.slot.lock();
        if slot.state != LoadState::Cancelled {
            debug!("cancel {}", self.source);
            slot.state = LoadState::Cancelled;
            slot.frame = None;
        }
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The producer side of an [`ImageHandle`].
#[derive(Clone)]
pub struct FrameSink {
    slot: Arc<Mutex<Slot>>,
}

impl FrameSink {
    /// Stores a decoded frame. Returns `false` once the handle is cancelled.
    pub fn push(&self, frame: RgbaImage) -> bool {
        let mut slot = self.slot.lock();
        if slot.state == LoadState::Cancelled {
            return false;
        }
        slot.state = LoadState::Ready;
        slot.frame = Some(frame);
        slot.frames += 1;
        true
    }

    /// Marks the load as failed. A frame that already arrived stays visible.
    pub fn fail<T: ToString>(&self, reason: T) {
        let mut slot = self.slot.lock();
        if slot.state != LoadState::Cancelled {
            slot.state = LoadState::Errored(reason.to_string());
        }
    }

    pub fn has_frame(&self) -> bool {
        self.slot.lock().frame.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.slot.lock().state == LoadState::Cancelled
    }
}

/// Starts loads for stream sources.
pub trait FrameLoader: Send + Sync {
    fn load(&self, source: &str) -> ImageHandle;
}

/// Loads sources over HTTP, decoding each multipart part as an image.
#[derive(Debug, Default, Clone)]
pub struct HttpLoader;

impl FrameLoader for HttpLoader {
    fn load(&self, source: &str) -> ImageHandle {
        let (mut handle, sink) = ImageHandle::new(source.to_string());
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let client = mjpeg::Client::new(source.to_string(), None);
                handle.attach(runtime.spawn(fetch(client, sink)));
            }
            Err(e) => {
                warn!("cannot load {} outside a tokio runtime: {}", source, e);
                sink.fail(e);
            }
        }
        handle
    }
}

async fn fetch(client: mjpeg::Client, sink: FrameSink) {
    let mut stream = match client.connect().await {
        Ok(stream) => stream,
        Err(e) => {
            warn!("{} load failed: {}", client.url(), e);
            sink.fail(e);
            return;
        }
    };
    info!(
        "{} connected, multipart: {}",
        client.url(),
        stream.is_multipart()
    );
    loop {
        match stream.next_frame().await {
            Ok(Some(bytes)) => match image::load_from_memory(&bytes) {
                Ok(frame) => {
                    if !sink.push(frame.to_rgba8()) {
                        return;
                    }
                }
                Err(e) => warn!("{} undecodable frame: {}", client.url(), e),
            },
            Ok(None) => {
                debug!("{} stream ended", client.url());
                if !sink.has_frame() {
                    sink.fail("stream ended without a frame");
                }
                return;
            }
            Err(e) => {
                warn!("{} stream failed: {}", client.url(), e);
                sink.fail(e);
                return;
            }
        }
    }
}
