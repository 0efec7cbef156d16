use std::sync::Arc;
use std::time::Duration;

use streamcanvas::{Canvas, HttpLoader, LoadState, StreamView, Target};

mod common;
use common::{mjpeg_server, stream_config, Counter};

async fn wait_for<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

#[tokio::test]
async fn test_multipart_frames_reach_the_canvas() {
    let addr = mjpeg_server().await;
    let view = StreamView::new(
        stream_config(&addr.ip().to_string(), addr.port(), "/red"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        Arc::new(HttpLoader),
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();

    assert!(wait_for(|| view.load_state() == Some(LoadState::Ready)).await);
    view.draw();
    let warnings = counter.warnings();
    view.draw();
    assert_eq!(counter.warnings(), warnings);

    let pixel = view.canvas().lock().pixel(160, 120).unwrap();
    assert!(pixel.0[0] > 200 && pixel.0[1] < 60 && pixel.0[2] < 60);
}

#[tokio::test]
async fn test_single_image_response() {
    let addr = mjpeg_server().await;
    let view = StreamView::new(
        stream_config(&addr.ip().to_string(), addr.port(), "/still"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        Arc::new(HttpLoader),
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();

    assert!(wait_for(|| view.load_state() == Some(LoadState::Ready)).await);
    view.draw();
    view.draw();
    assert_eq!(counter.warnings(), 0);
    let pixel = view.canvas().lock().pixel(160, 120).unwrap();
    assert!(pixel.0[2] > 200 && pixel.0[0] < 60);
}

#[tokio::test]
async fn test_switch_to_another_topic() {
    let addr = mjpeg_server().await;
    let view = StreamView::new(
        stream_config(&addr.ip().to_string(), addr.port(), "/red"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        Arc::new(HttpLoader),
    )
    .unwrap();
    view.start().unwrap();
    assert!(wait_for(|| view.load_state() == Some(LoadState::Ready)).await);

    view.change_stream("/green");
    assert_eq!(view.load_state(), Some(LoadState::Loading));
    assert!(wait_for(|| view.load_state() == Some(LoadState::Ready)).await);
    view.draw();
    let pixel = view.canvas().lock().pixel(160, 120).unwrap();
    assert!(pixel.0[1] > 200 && pixel.0[0] < 60);
}

#[tokio::test]
async fn test_missing_topic_warns_until_closed() {
    let addr = mjpeg_server().await;
    let view = StreamView::new(
        stream_config(&addr.ip().to_string(), addr.port(), "/missing"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        Arc::new(HttpLoader),
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();

    assert!(wait_for(|| matches!(view.load_state(), Some(LoadState::Errored(_)))).await);
    assert!(wait_for(|| counter.warnings() >= 2).await);

    view.close();
    let warnings = counter.warnings();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(counter.warnings(), warnings);
}

#[tokio::test]
async fn test_dead_server_warns() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let view = StreamView::new(
        stream_config("127.0.0.1", port, "/cam"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        Arc::new(HttpLoader),
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();

    assert!(wait_for(|| matches!(view.load_state(), Some(LoadState::Errored(_)))).await);
    let before = counter.warnings();
    assert!(wait_for(|| counter.warnings() >= before + 2).await);
}
