//! View controller behavior against recording fake capabilities.

use async_trait::async_trait;
use paintaplace::capture::{CaptureOptions, RegionRasterizer, SnapshotCapturer};
use paintaplace::controller::{GenerationStatus, MapView, Rejection, SearchStatus};
use paintaplace::map::{FrameOrigin, RenderedFrame};
use paintaplace::{
    ActionOutcome, AddressResolver, Capabilities, Coordinate, ErrorKind, ImageFormat, MapOptions,
    MapRegion, MapRenderer, PaintError, Painting, PaintingGenerator, PaintingMetadata,
    RasterImage, RenderHandle, ResolvedPlace, Result, Suggestion, ViewController,
};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::RgbaImage::from_pixel(width, height, image::Rgba([shade, shade, 200, 255]))
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn seoul() -> ResolvedPlace {
    ResolvedPlace::at(Coordinate::new(37.5665, 126.978).unwrap())
        .with_address("Seoul, South Korea")
}

#[derive(Default)]
struct FakeResolver {
    places: HashMap<String, ResolvedPlace>,
    suggestions: Vec<Suggestion>,
    service_down: bool,
    delay: Option<Duration>,
    resolve_calls: AtomicUsize,
    suggest_calls: AtomicUsize,
    select_calls: AtomicUsize,
}

impl FakeResolver {
    fn with_place(mut self, query: &str, place: ResolvedPlace) -> Self {
        self.places.insert(query.to_string(), place);
        self
    }

    fn calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
            + self.suggest_calls.load(Ordering::SeqCst)
            + self.select_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressResolver for FakeResolver {
    async fn resolve(&self, address: &str) -> Result<ResolvedPlace> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.service_down {
            return Err(PaintError::Service("OVER_QUERY_LIMIT: quota exhausted".into()));
        }
        self.places
            .get(address)
            .cloned()
            .ok_or_else(|| PaintError::NotFound {
                query: address.to_string(),
            })
    }

    async fn suggest(&self, _input: &str) -> Result<Vec<Suggestion>> {
        self.suggest_calls.fetch_add(1, Ordering::SeqCst);
        if self.service_down {
            return Err(PaintError::Service("OVER_QUERY_LIMIT: quota exhausted".into()));
        }
        Ok(self.suggestions.clone())
    }

    async fn select(&self, suggestion: &Suggestion) -> Result<ResolvedPlace> {
        self.select_calls.fetch_add(1, Ordering::SeqCst);
        self.places
            .get(&suggestion.place_id)
            .cloned()
            .ok_or_else(|| PaintError::NotFound {
                query: suggestion.description.clone(),
            })
    }

    fn name(&self) -> &str {
        "fake resolver"
    }
}

#[derive(Default)]
struct FakeRenderer {
    calls: Mutex<Vec<(Coordinate, MapOptions)>>,
    fail: AtomicBool,
}

impl FakeRenderer {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MapRenderer for FakeRenderer {
    async fn render(
        &self,
        region: &MapRegion,
        center: Coordinate,
        options: &MapOptions,
    ) -> Result<RenderHandle> {
        self.calls.lock().unwrap().push((center, options.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(PaintError::Render("tile server unavailable".into()));
        }
        let (w, h) = region.size();
        let sequence = region
            .present(RenderedFrame {
                image: RasterImage::new(png(w, h, 90), ImageFormat::Png),
                center,
                options: options.clone(),
                origin: FrameOrigin::CrossOrigin {
                    host: "tiles.example".into(),
                },
                rendered_at: SystemTime::now(),
            })
            .ok_or_else(|| PaintError::Render("display region is not mounted".into()))?;
        Ok(RenderHandle {
            center,
            zoom: options.zoom,
            sequence,
        })
    }

    fn name(&self) -> &str {
        "fake renderer"
    }
}

#[derive(Default)]
struct CountingCapturer {
    inner: RegionRasterizer,
    calls: AtomicUsize,
}

#[async_trait]
impl SnapshotCapturer for CountingCapturer {
    async fn capture(&self, region: &MapRegion, options: &CaptureOptions) -> Result<RasterImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.capture(region, options).await
    }
}

#[derive(Clone, Copy, PartialEq)]
enum PainterMode {
    Paint,
    Fail,
    TextOnly,
}

struct FakePainter {
    mode: Mutex<PainterMode>,
    received: Mutex<Vec<(RasterImage, String)>>,
    calls: AtomicUsize,
}

impl Default for FakePainter {
    fn default() -> Self {
        Self {
            mode: Mutex::new(PainterMode::Paint),
            received: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakePainter {
    fn set_mode(&self, mode: PainterMode) {
        *self.mode.lock().unwrap() = mode;
    }
}

#[async_trait]
impl PaintingGenerator for FakePainter {
    async fn generate(&self, image: &RasterImage, instruction: &str) -> Result<Painting> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.received
            .lock()
            .unwrap()
            .push((image.clone(), instruction.to_string()));
        let mode = *self.mode.lock().unwrap();
        match mode {
            PainterMode::Paint => Ok(Painting::new(
                RasterImage::new(png(4, 4, n as u8), ImageFormat::Png),
                PaintingMetadata {
                    model: Some("fake-painter".into()),
                    ..Default::default()
                },
            )),
            PainterMode::Fail => Err(PaintError::Generation("HTTP 500: internal".into())),
            PainterMode::TextOnly => Err(PaintError::NoImageReturned {
                text: Some("Sorry, I can only describe it.".into()),
            }),
        }
    }

    fn name(&self) -> &str {
        "fake painter"
    }
}

struct Harness {
    resolver: Arc<FakeResolver>,
    renderer: Arc<FakeRenderer>,
    capturer: Arc<CountingCapturer>,
    painter: Arc<FakePainter>,
    controller: ViewController,
}

impl Harness {
    fn new(resolver: FakeResolver) -> Self {
        let resolver = Arc::new(resolver);
        let renderer = Arc::new(FakeRenderer::default());
        let capturer = Arc::new(CountingCapturer::default());
        let painter = Arc::new(FakePainter::default());
        let caps = Capabilities {
            resolver: resolver.clone(),
            renderer: renderer.clone(),
            capturer: capturer.clone(),
            painter: painter.clone(),
        };
        let controller = ViewController::new(caps, MapRegion::new(64, 50));
        Self {
            resolver,
            renderer,
            capturer,
            painter,
            controller,
        }
    }

    fn seoul() -> Self {
        Self::new(FakeResolver::default().with_place("Seoul, South Korea", seoul()))
    }

    fn external_calls(&self) -> usize {
        self.resolver.calls()
            + self.renderer.call_count()
            + self.capturer.calls.load(Ordering::SeqCst)
            + self.painter.calls.load(Ordering::SeqCst)
    }

    async fn searched(self) -> Self {
        self.controller.set_query("Seoul, South Korea");
        assert_eq!(self.controller.search().await, ActionOutcome::Completed);
        self
    }
}

#[tokio::test]
async fn test_seoul_end_to_end() {
    let h = Harness::seoul();
    h.controller.set_query("Seoul, South Korea");

    assert_eq!(h.controller.search().await, ActionOutcome::Completed);
    {
        let calls = h.renderer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, seoul().coordinate);
        assert_eq!(calls[0].1.zoom, 20);
    }
    assert!(h.controller.state().can_generate());

    assert_eq!(h.controller.generate_painting().await, ActionOutcome::Completed);

    let received = h.painter.received.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    let (snapshot, instruction) = &received[0];
    assert!(snapshot.data.starts_with(&PNG_SIGNATURE));
    assert_eq!(snapshot.dimensions(), Some((64, 50)));
    assert!(instruction.contains("Minhwa"));

    let painting = h.controller.painting().expect("painting shown");
    assert!(painting.image.data.starts_with(&PNG_SIGNATURE));

    let text = h.controller.view().to_string();
    assert!(text.contains("Your Painting:"));
    assert!(text.contains("Seoul, South Korea"));
    assert!(h.controller.state().error.is_none());
}

#[tokio::test]
async fn test_blank_search_makes_no_calls() {
    for blank in ["", "   ", "\t\n"] {
        let h = Harness::seoul();
        h.controller.set_query(blank);

        assert_eq!(
            h.controller.search().await,
            ActionOutcome::Rejected(Rejection::BlankQuery)
        );
        let state = h.controller.state();
        assert_eq!(state.error.as_deref(), Some("Please enter an address."));
        assert_eq!(state.search, SearchStatus::Idle);
        assert_eq!(h.external_calls(), 0);
    }
}

#[tokio::test]
async fn test_unknown_address_leaves_map_unrendered() {
    let h = Harness::seoul();
    h.controller.set_query("asdkjaslkdj");

    let outcome = h.controller.search().await;
    let expected = "Could not find a location for \"asdkjaslkdj\".";
    assert_eq!(outcome, ActionOutcome::Failed(expected.into()));

    let state = h.controller.state();
    assert_eq!(state.error.as_deref(), Some(expected));
    assert_eq!(state.search, SearchStatus::Idle);
    assert_eq!(h.renderer.call_count(), 0);
    assert!(!h.controller.region().has_frame());
    assert!(matches!(h.controller.view().map, MapView::Placeholder(_)));
    assert!(h.controller.view().generate_button.is_none());
}

#[tokio::test]
async fn test_generation_disabled_before_first_render() {
    let h = Harness::seoul();
    assert_eq!(
        h.controller.generate_painting().await,
        ActionOutcome::Rejected(Rejection::MapNotReady)
    );

    h.renderer.fail.store(true, Ordering::SeqCst);
    h.controller.set_query("Seoul, South Korea");
    let outcome = h.controller.search().await;
    assert_eq!(
        outcome,
        ActionOutcome::Failed("map rendering failed: tile server unavailable".into())
    );
    assert_eq!(h.controller.state().generation, GenerationStatus::Unavailable);
    assert_eq!(
        h.controller.generate_painting().await,
        ActionOutcome::Rejected(Rejection::MapNotReady)
    );
    assert_eq!(h.painter.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.capturer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failed_generation_keeps_map() {
    let h = Harness::seoul().searched().await;
    let sequence = h.controller.region().sequence();

    h.painter.set_mode(PainterMode::Fail);
    let outcome = h.controller.generate_painting().await;
    assert_eq!(
        outcome,
        ActionOutcome::Failed("painting generation failed: HTTP 500: internal".into())
    );

    let state = h.controller.state();
    assert_eq!(state.generation, GenerationStatus::Ready);
    assert!(state.error.is_some());
    assert!(state.painting.is_none());
    assert_eq!(h.controller.region().sequence(), sequence);
    assert!(h.controller.region().has_frame());

    // Manual retry works.
    h.painter.set_mode(PainterMode::Paint);
    assert_eq!(h.controller.generate_painting().await, ActionOutcome::Completed);
    assert!(h.controller.state().error.is_none());
}

#[tokio::test]
async fn test_text_only_response_is_reported() {
    let h = Harness::seoul().searched().await;
    h.painter.set_mode(PainterMode::TextOnly);

    let outcome = h.controller.generate_painting().await;
    let ActionOutcome::Failed(message) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(message.contains("returned no image"));
    assert!(message.contains("Sorry, I can only describe it."));
}

#[tokio::test]
async fn test_new_painting_replaces_old() {
    let h = Harness::seoul().searched().await;

    h.controller.generate_painting().await;
    let first = h.controller.painting().unwrap();
    h.controller.generate_painting().await;
    let second = h.controller.painting().unwrap();

    assert_ne!(first, second);
    assert_eq!(h.painter.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_overlapping_generation_is_rejected() {
    let h = Harness::seoul().searched().await;

    let (a, b) = tokio::join!(
        h.controller.generate_painting(),
        h.controller.generate_painting()
    );
    assert_eq!(a, ActionOutcome::Completed);
    assert_eq!(b, ActionOutcome::Rejected(Rejection::GenerationInFlight));
    assert_eq!(h.painter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_overlapping_search_is_rejected() {
    let resolver = FakeResolver {
        delay: Some(Duration::from_millis(20)),
        ..FakeResolver::default()
    }
    .with_place("Seoul, South Korea", seoul());
    let h = Harness::new(resolver);
    h.controller.set_query("Seoul, South Korea");

    let (a, b) = tokio::join!(h.controller.search(), h.controller.search());
    assert_eq!(a, ActionOutcome::Completed);
    assert_eq!(b, ActionOutcome::Rejected(Rejection::SearchInFlight));
    assert_eq!(h.resolver.resolve_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.renderer.call_count(), 1);
}

#[tokio::test]
async fn test_new_search_replaces_map() {
    let busan = ResolvedPlace::at(Coordinate::new(35.1796, 129.0756).unwrap());
    let h = Harness::new(
        FakeResolver::default()
            .with_place("Seoul, South Korea", seoul())
            .with_place("Busan", busan.clone()),
    )
    .searched()
    .await;

    h.controller.set_query("Busan");
    assert_eq!(h.controller.search().await, ActionOutcome::Completed);

    let frame = h.controller.region().frame().unwrap();
    assert_eq!(frame.center, busan.coordinate);
    assert_eq!(h.controller.region().sequence(), 2);
    assert_eq!(h.controller.state().location, Some(busan));
}

#[tokio::test]
async fn test_failed_search_keeps_previous_map() {
    let busan = ResolvedPlace::at(Coordinate::new(35.1796, 129.0756).unwrap());
    let h = Harness::new(
        FakeResolver::default()
            .with_place("Seoul, South Korea", seoul())
            .with_place("Busan", busan),
    )
    .searched()
    .await;
    let before = h.controller.region().frame().unwrap();

    // Nothing found.
    h.controller.set_query("asdkjaslkdj");
    assert!(matches!(h.controller.search().await, ActionOutcome::Failed(_)));

    // Found, but the map could not be drawn.
    h.renderer.fail.store(true, Ordering::SeqCst);
    h.controller.set_query("Busan");
    assert_eq!(
        h.controller.search().await,
        ActionOutcome::Failed("map rendering failed: tile server unavailable".into())
    );

    let state = h.controller.state();
    assert_eq!(state.location, Some(seoul()));
    assert_eq!(
        state.error.as_deref(),
        Some("map rendering failed: tile server unavailable")
    );
    assert!(state.can_generate());
    assert!(state.can_search());

    let after = h.controller.region().frame().unwrap();
    assert_eq!(h.controller.region().sequence(), 1);
    assert_eq!(after.center, before.center);
    assert_eq!(after.image, before.image);

    // The old map can still be painted.
    h.renderer.fail.store(false, Ordering::SeqCst);
    assert_eq!(h.controller.generate_painting().await, ActionOutcome::Completed);
}

#[tokio::test]
async fn test_last_snapshot_is_what_the_painter_got() {
    let h = Harness::seoul().searched().await;
    assert!(h.controller.last_snapshot().is_none());

    h.controller.generate_painting().await;
    let sent = h.painter.received.lock().unwrap()[0].0.clone();
    assert_eq!(h.controller.last_snapshot(), Some(sent));

    // Kept even when the painter fails.
    h.painter.set_mode(PainterMode::Fail);
    h.controller.generate_painting().await;
    let sent = h.painter.received.lock().unwrap()[1].0.clone();
    assert_eq!(h.controller.last_snapshot(), Some(sent));
}

#[tokio::test]
async fn test_suggestion_failure_sets_message() {
    let h = Harness::new(FakeResolver {
        service_down: true,
        ..FakeResolver::default()
    });
    h.controller.set_query("Seo");

    let outcome = h.controller.refresh_suggestions().await;
    let expected = "address lookup failed: OVER_QUERY_LIMIT: quota exhausted";
    assert_eq!(outcome, ActionOutcome::Failed(expected.into()));

    let state = h.controller.state();
    assert_eq!(state.error.as_deref(), Some(expected));
    assert!(state.suggestions.is_empty());
    assert_eq!(state.search, SearchStatus::Idle);
    assert!(h.controller.view().to_string().contains(expected));
}

#[tokio::test]
async fn test_service_error_is_surfaced() {
    let h = Harness::new(FakeResolver {
        service_down: true,
        ..FakeResolver::default()
    });
    h.controller.set_query("Seoul, South Korea");

    let outcome = h.controller.search().await;
    assert_eq!(
        outcome,
        ActionOutcome::Failed("address lookup failed: OVER_QUERY_LIMIT: quota exhausted".into())
    );
    assert!(h.controller.state().can_search());
}

#[tokio::test]
async fn test_suggestion_flow() {
    let pick = Suggestion {
        place_id: "seoul-id".into(),
        description: "Seoul, South Korea".into(),
    };
    let h = Harness::new(FakeResolver {
        suggestions: vec![pick],
        ..FakeResolver::default()
    }
    .with_place("seoul-id", seoul()));

    h.controller.set_query("Seo");
    assert_eq!(h.controller.refresh_suggestions().await, ActionOutcome::Completed);
    assert_eq!(h.controller.view().suggestions, vec!["Seoul, South Korea"]);

    assert_eq!(
        h.controller.select_suggestion(3).await,
        ActionOutcome::Rejected(Rejection::UnknownSuggestion)
    );

    assert_eq!(h.controller.select_suggestion(0).await, ActionOutcome::Completed);
    let state = h.controller.state();
    assert_eq!(state.query, "Seoul, South Korea");
    assert!(state.can_generate());
    // Selection resolves directly, without a text geocode.
    assert_eq!(h.resolver.resolve_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.resolver.select_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.renderer.call_count(), 1);
}

#[tokio::test]
async fn test_blank_suggestions_make_no_calls() {
    let h = Harness::seoul();
    h.controller.set_query("  ");
    assert_eq!(h.controller.refresh_suggestions().await, ActionOutcome::Completed);
    assert_eq!(h.external_calls(), 0);
}

#[tokio::test]
async fn test_capture_failure_is_generation_failure() {
    let h = Harness::seoul().searched().await;
    h.controller.region().unmount();

    let outcome = h.controller.generate_painting().await;
    let ActionOutcome::Failed(message) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(message.starts_with("snapshot capture failed"));
    assert_eq!(h.painter.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.controller.state().generation, GenerationStatus::Ready);
}

#[tokio::test]
async fn test_cross_origin_capture_can_be_disabled() {
    let h = Harness::seoul();
    let controller = ViewController::new(
        Capabilities {
            resolver: h.resolver.clone(),
            renderer: h.renderer.clone(),
            capturer: h.capturer.clone(),
            painter: h.painter.clone(),
        },
        MapRegion::new(32, 32),
    )
    .with_capture_options(CaptureOptions {
        allow_cross_origin: false,
        ..Default::default()
    });

    controller.set_query("Seoul, South Korea");
    controller.search().await;
    let err = controller.snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capture);
}

#[tokio::test]
async fn test_session_drives_controller() {
    use paintaplace::session::Session;

    let h = Harness::seoul();
    let input: &[u8] = b"/paint\n/search Seoul, South Korea\n/paint\n/quit\n/search ignored\n";
    let mut output = Vec::new();

    Session::new(&h.controller)
        .run(input, &mut output)
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Map will appear here"));
    assert!(text.contains("(search for an address first)"));
    assert!(text.contains("Your Painting:"));
    assert!(text.trim_end().ends_with("bye"));
    // Lines after /quit are not read.
    assert_eq!(h.resolver.resolve_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.painter.calls.load(Ordering::SeqCst), 1);
}
