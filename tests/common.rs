#![allow(dead_code)]

use std::io::Cursor;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use axum::{
    body::Body,
    extract::Query,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use tokio::net::TcpListener;

use streamcanvas::{Emitter, Event, FrameLoader, FrameSink, ImageHandle, StreamConfig};

pub const BOUNDARY: &str = "frame";

/// Hands out handles without any network. Frames are pushed by the test
/// through the recorded sinks.
#[derive(Default)]
pub struct ScriptedLoader {
    pub frame: Option<RgbaImage>,
    pub sources: Mutex<Vec<String>>,
    pub sinks: Mutex<Vec<FrameSink>>,
}

impl ScriptedLoader {
    pub fn with_frame(frame: RgbaImage) -> Self {
        ScriptedLoader {
            frame: Some(frame),
            ..Default::default()
        }
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }

    pub fn sink(&self, index: usize) -> FrameSink {
        self.sinks.lock().unwrap()[index].clone()
    }
}

impl FrameLoader for ScriptedLoader {
    fn load(&self, source: &str) -> ImageHandle {
        let (handle, sink) = ImageHandle::new(source.to_string());
        if let Some(frame) = &self.frame {
            sink.push(frame.clone());
        }
        self.sources.lock().unwrap().push(source.to_string());
        self.sinks.lock().unwrap().push(sink);
        handle
    }
}

pub fn stream_config(host: &str, port: u16, topic: &str) -> StreamConfig {
    StreamConfig {
        width: 320,
        height: 240,
        host: host.to_string(),
        port: Some(port),
        topic: topic.to_string(),
        refresh_rate: 10.0,
        interval: 50,
        ..Default::default()
    }
}

#[derive(Clone, Default)]
pub struct Counter {
    warnings: Arc<AtomicUsize>,
    changes: Arc<Mutex<Vec<String>>>,
}

impl Counter {
    pub fn attach(emitter: &Emitter) -> Self {
        let counter = Counter::default();
        let c = counter.clone();
        emitter.on(move |event| match event {
            Event::Warning(_) => {
                c.warnings.fetch_add(1, Ordering::SeqCst);
            }
            Event::Change(topic) => c.changes.lock().unwrap().push(topic.clone()),
        });
        counter
    }

    pub fn warnings(&self) -> usize {
        self.warnings.load(Ordering::SeqCst)
    }

    pub fn changes(&self) -> Vec<String> {
        self.changes.lock().unwrap().clone()
    }
}

pub fn jpeg(color: [u8; 3], width: u32, height: u32) -> Bytes {
    let image = RgbImage::from_pixel(width, height, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(out.into_inner())
}

fn multipart(frames: Vec<Bytes>) -> Vec<Bytes> {
    frames
        .into_iter()
        .map(|frame| {
            let mut part = format!(
                "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
                frame.len()
            )
            .into_bytes();
            part.extend_from_slice(&frame);
            part.extend_from_slice(b"\r\n");
            Bytes::from(part)
        })
        .collect()
}

#[derive(serde::Deserialize)]
struct StreamQuery {
    topic: String,
}

/// Serves `/stream?topic=/red` and `/stream?topic=/green` as three-part
/// multipart JPEG streams and `/stream?topic=/still` as a single JPEG; any
/// other topic is a 404.
pub async fn mjpeg_server() -> SocketAddr {
    async fn stream(Query(query): Query<StreamQuery>) -> axum::response::Response {
        let color = match query.topic.as_str() {
            "/still" => {
                return (
                    [(header::CONTENT_TYPE, "image/jpeg")],
                    jpeg([0, 0, 255], 64, 48),
                )
                    .into_response()
            }
            "/red" => [255, 0, 0],
            "/green" => [0, 255, 0],
            _ => return (StatusCode::NOT_FOUND, "no such topic").into_response(),
        };
        let parts = multipart(vec![jpeg(color, 64, 48); 3]);
        let body = Body::from_stream(futures::stream::iter(
            parts.into_iter().map(Ok::<_, std::io::Error>),
        ));
        (
            [(
                header::CONTENT_TYPE,
                format!("multipart/x-mixed-replace;boundary={BOUNDARY}"),
            )],
            body,
        )
            .into_response()
    }

    let app = Router::new().route("/stream", get(stream));
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
