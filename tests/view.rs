use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use streamcanvas::{Canvas, Container, LoadState, StreamConfig, StreamView, Target};

mod common;
use common::{stream_config, Counter, ScriptedLoader};

#[tokio::test(start_paused = true)]
async fn test_warns_once_per_tick() {
    let loader = Arc::new(ScriptedLoader::default());
    let view = StreamView::new(
        stream_config("h", 8080, "/cam"),
        Target::Container(Container::new("video")),
        loader,
    )
    .unwrap();
    assert_eq!(view.period(), Duration::from_millis(100));
    let counter = Counter::attach(view.events());

    view.start().unwrap();
    assert_eq!(counter.changes(), vec!["/cam".to_string()]);
    assert_eq!(counter.warnings(), 0);

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(counter.warnings(), 3);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counter.warnings(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_fast_rate_uses_interval() {
    let cfg = StreamConfig {
        refresh_rate: 50.0,
        interval: 10,
        ..stream_config("h", 8080, "/cam")
    };
    let loader = Arc::new(ScriptedLoader::default());
    let view = StreamView::new(cfg, Target::Canvas(Canvas::new(1, 1).shared()), loader).unwrap();
    assert_eq!(view.period(), Duration::from_millis(20));
    let counter = Counter::attach(view.events());

    view.start().unwrap();
    tokio::time::sleep(Duration::from_millis(105)).await;
    assert_eq!(counter.warnings(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_frame_stops_warnings() {
    let green = Rgba([0, 255, 0, 255]);
    let loader = Arc::new(ScriptedLoader::with_frame(RgbaImage::from_pixel(16, 12, green)));
    let view = StreamView::new(
        stream_config("h", 8080, "/cam"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        loader,
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();
    assert_eq!(view.load_state(), Some(LoadState::Ready));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(counter.warnings(), 0);

    let canvas = view.canvas();
    let canvas = canvas.lock();
    assert_eq!((canvas.width(), canvas.height()), (320, 240));
    assert_eq!(canvas.pixel(160, 120), Some(green));
}

#[tokio::test(start_paused = true)]
async fn test_late_frame_replaces_placeholder() {
    let loader = Arc::new(ScriptedLoader::default());
    let view = StreamView::new(
        stream_config("h", 8080, "/cam"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        loader.clone(),
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(counter.warnings(), 1);

    loader.sink(0).push(RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(counter.warnings(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_switch_raises_one_change_and_cancels() {
    let loader = Arc::new(ScriptedLoader::default());
    let view = StreamView::new(
        stream_config("h", 8080, "/a"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        loader.clone(),
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();

    view.change_stream("/b");
    assert_eq!(counter.changes(), vec!["/a".to_string(), "/b".to_string()]);
    assert!(loader.sink(0).is_cancelled());
    assert!(!loader.sink(1).is_cancelled());
    assert_eq!(
        loader.sources(),
        vec![
            "http://h:8080/stream?topic=/a&width=320&height=240".to_string(),
            "http://h:8080/stream?topic=/b&width=320&height=240".to_string(),
        ]
    );

    view.change_stream("/b");
    assert_eq!(counter.changes().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_src_for_every_topic() {
    let cfg = StreamConfig {
        src: Some("http://cam.local/live.mjpg".to_string()),
        ..stream_config("h", 8080, "/a")
    };
    let loader = Arc::new(ScriptedLoader::default());
    let view = StreamView::new(cfg, Target::Canvas(Canvas::new(1, 1).shared()), loader.clone()).unwrap();
    view.start().unwrap();
    view.change_stream("/b");
    assert_eq!(
        loader.sources(),
        vec!["http://cam.local/live.mjpg".to_string(); 2]
    );
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_everything() {
    let loader = Arc::new(ScriptedLoader::default());
    let view = StreamView::new(
        stream_config("h", 8080, "/cam"),
        Target::Canvas(Canvas::new(1, 1).shared()),
        loader.clone(),
    )
    .unwrap();
    let counter = Counter::attach(view.events());
    view.start().unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(counter.warnings(), 2);

    view.close();
    assert!(loader.sink(0).is_cancelled());
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(counter.warnings(), 2);
    assert!(view.start().is_err());
}
