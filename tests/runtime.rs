use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel as channel;
use dpi::PhysicalSize;
use frame_pipeline::{
    Acknowledgment, Frame, FrameCompletion, FrameProducer, InvalidationSource, PipelineConfig,
    PipelineError, PipelineRuntime, Renderer, RuntimeConfig, StampedScene, ViewportMetrics,
};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(150);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Submits an increasing counter every frame and reports viewport changes.
struct CountingProducer {
    next: u32,
    viewports: channel::Sender<ViewportMetrics>,
}

impl FrameProducer<u32> for CountingProducer {
    fn set_viewport_metrics(&mut self, metrics: &ViewportMetrics) {
        let _ = self.viewports.send(*metrics);
    }

    fn begin_frame(&mut self, _frame_time: Instant, frame: &mut Frame<'_, u32>) {
        assert!(frame.submit(self.next));
        assert!(!frame.submit(u32::MAX));
        self.next += 1;
    }
}

/// Completes every frame as soon as it is drawn.
struct PromptRenderer(channel::Sender<u32>);

impl Renderer<u32> for PromptRenderer {
    fn draw(&mut self, scene: StampedScene<u32>, completion: FrameCompletion) {
        let _ = self.0.send(scene.into_inner());
        completion.complete();
    }
}

/// Keeps completions until the test releases them.
struct HoldingRenderer(Arc<Mutex<Vec<FrameCompletion>>>);

impl Renderer<u32> for HoldingRenderer {
    fn draw(&mut self, _scene: StampedScene<u32>, completion: FrameCompletion) {
        self.0.lock().expect("poisoned").push(completion);
    }
}

#[derive(Clone, Default)]
struct CountingHost(Arc<AtomicUsize>);

impl InvalidationSource for CountingHost {
    fn request_invalidation(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct ChannelHost(channel::Sender<()>);

impl InvalidationSource for ChannelHost {
    fn request_invalidation(&mut self) {
        let _ = self.0.send(());
    }
}

fn producer(viewports: channel::Sender<ViewportMetrics>) -> impl FnOnce() -> CountingProducer + Send {
    move || CountingProducer { next: 0, viewports }
}

fn ack(tx: &channel::Sender<usize>, n: usize) -> Acknowledgment {
    let tx = tx.clone();
    Acknowledgment::new(move || {
        let _ = tx.send(n);
    })
}

fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Fills a max-3 pipeline with held frames and sends a fourth signal, whose ack is deferred.
fn fill_pipeline(
    surface: &frame_pipeline::SurfaceHandle<u32>,
    held: &Arc<Mutex<Vec<FrameCompletion>>>,
    ack_tx: &channel::Sender<usize>,
    ack_rx: &channel::Receiver<usize>,
) {
    for n in 0..3 {
        surface.invalidate(None, ack(ack_tx, n));
        assert_eq!(ack_rx.recv_timeout(WAIT), Ok(n));
    }
    wait_until(|| held.lock().expect("poisoned").len() == 3);

    surface.invalidate(None, ack(ack_tx, 3));
    assert!(ack_rx.recv_timeout(QUIET).is_err());
}

#[test]
fn every_ack_arrives_and_scenes_draw_in_order() {
    init_tracing();
    let mut runtime = PipelineRuntime::<u32>::new(RuntimeConfig::default()).expect("runtime");

    let (viewport_tx, _viewport_rx) = channel::unbounded();
    let (drawn_tx, drawn_rx) = channel::unbounded();
    let surface = runtime
        .create_surface(
            ViewportMetrics::new(PhysicalSize::new(640, 480), 2.0),
            producer(viewport_tx),
            PromptRenderer(drawn_tx),
            CountingHost::default(),
        )
        .expect("surface");

    let (ack_tx, ack_rx) = channel::unbounded();
    for n in 0..50 {
        surface.invalidate(None, ack(&ack_tx, n));
        assert_eq!(ack_rx.recv_timeout(WAIT), Ok(n));
    }

    drop(surface);
    runtime.shutdown();

    let drawn: Vec<u32> = drawn_rx.try_iter().collect();
    assert!(!drawn.is_empty());
    let expected: Vec<u32> = (0..drawn.len() as u32).collect();
    assert_eq!(drawn, expected);
}

#[test]
fn full_pipeline_defers_ack_until_recovery_depth() {
    init_tracing();
    let runtime = PipelineRuntime::<u32>::new(RuntimeConfig::default()).expect("runtime");

    let (viewport_tx, _viewport_rx) = channel::unbounded();
    let held = Arc::new(Mutex::new(Vec::new()));
    let host = CountingHost::default();
    let requests = host.0.clone();
    let surface = runtime
        .create_surface(
            ViewportMetrics::default(),
            producer(viewport_tx),
            HoldingRenderer(held.clone()),
            host,
        )
        .expect("surface");

    let (ack_tx, ack_rx) = channel::unbounded();
    fill_pipeline(&surface, &held, &ack_tx, &ack_rx);

    let mut completions: Vec<FrameCompletion> = held.lock().expect("poisoned").drain(..).collect();

    // 3 -> 2 is still above the recovery depth.
    completions.remove(0).complete();
    assert!(ack_rx.recv_timeout(QUIET).is_err());
    assert_eq!(requests.load(Ordering::SeqCst), 0);

    // 2 -> 1 recovers: the host is asked for a frame before the ack is released.
    completions.remove(0).complete();
    assert_eq!(ack_rx.recv_timeout(WAIT), Ok(3));
    assert_eq!(requests.load(Ordering::SeqCst), 1);

    drop(completions);
    drop(surface);
}

#[test]
fn destroying_a_surface_flushes_its_deferred_ack() {
    init_tracing();
    let runtime = PipelineRuntime::<u32>::new(RuntimeConfig::default()).expect("runtime");

    let (viewport_tx, _viewport_rx) = channel::unbounded();
    let held = Arc::new(Mutex::new(Vec::new()));
    let surface = runtime
        .create_surface(
            ViewportMetrics::default(),
            producer(viewport_tx),
            HoldingRenderer(held.clone()),
            CountingHost::default(),
        )
        .expect("surface");

    let (ack_tx, ack_rx) = channel::unbounded();
    fill_pipeline(&surface, &held, &ack_tx, &ack_rx);

    drop(surface);
    assert_eq!(ack_rx.recv_timeout(WAIT), Ok(3));

    // Late completions for the destroyed surface are discarded.
    for completion in held.lock().expect("poisoned").drain(..) {
        completion.complete();
    }
    assert!(ack_rx.recv_timeout(QUIET).is_err());
}

#[test]
fn destroy_returns_after_the_surface_is_torn_down() {
    init_tracing();
    let runtime = PipelineRuntime::<u32>::new(RuntimeConfig::default()).expect("runtime");

    let (viewport_tx, _viewport_rx) = channel::unbounded();
    let held = Arc::new(Mutex::new(Vec::new()));
    let renderer = HoldingRenderer(held.clone());
    let renderer_alive = Arc::downgrade(&held);
    let surface = runtime
        .create_surface(
            ViewportMetrics::default(),
            producer(viewport_tx),
            renderer,
            CountingHost::default(),
        )
        .expect("surface");

    let (ack_tx, ack_rx) = channel::unbounded();
    fill_pipeline(&surface, &held, &ack_tx, &ack_rx);
    let completions: Vec<FrameCompletion> = held.lock().expect("poisoned").drain(..).collect();
    drop(held);

    surface.destroy();

    // Both the deferred ack and the renderer's release happened before `destroy` returned.
    assert_eq!(ack_rx.try_recv(), Ok(3));
    assert!(renderer_alive.upgrade().is_none());
    drop(completions);
}

#[test]
fn shutdown_flushes_deferred_acks() {
    init_tracing();
    let mut runtime = PipelineRuntime::<u32>::new(RuntimeConfig::default()).expect("runtime");

    let (viewport_tx, _viewport_rx) = channel::unbounded();
    let held = Arc::new(Mutex::new(Vec::new()));
    let surface = runtime
        .create_surface(
            ViewportMetrics::default(),
            producer(viewport_tx),
            HoldingRenderer(held.clone()),
            CountingHost::default(),
        )
        .expect("surface");

    let (ack_tx, ack_rx) = channel::unbounded();
    fill_pipeline(&surface, &held, &ack_tx, &ack_rx);

    runtime.shutdown();
    assert_eq!(ack_rx.try_recv(), Ok(3));

    // After shutdown the ack runs on the calling thread.
    surface.invalidate(None, ack(&ack_tx, 4));
    assert_eq!(ack_rx.try_recv(), Ok(4));
}

#[test]
fn request_frame_reaches_the_host_once_per_pending_request() {
    init_tracing();
    let runtime = PipelineRuntime::<u32>::new(RuntimeConfig::default()).expect("runtime");

    let (viewport_tx, _viewport_rx) = channel::unbounded();
    let (drawn_tx, _drawn_rx) = channel::unbounded();
    let (request_tx, request_rx) = channel::unbounded();
    let surface = runtime
        .create_surface(
            ViewportMetrics::default(),
            producer(viewport_tx),
            PromptRenderer(drawn_tx),
            ChannelHost(request_tx),
        )
        .expect("surface");

    surface.request_frame();
    surface.request_frame();
    assert!(request_rx.recv_timeout(WAIT).is_ok());
    assert!(request_rx.recv_timeout(QUIET).is_err());

    // An invalidation clears the pending request.
    let (ack_tx, ack_rx) = channel::unbounded();
    surface.invalidate(None, ack(&ack_tx, 0));
    assert_eq!(ack_rx.recv_timeout(WAIT), Ok(0));

    surface.request_frame();
    assert!(request_rx.recv_timeout(WAIT).is_ok());
}

#[test]
fn zero_sized_surface_uses_the_default_size() {
    init_tracing();
    let config = RuntimeConfig {
        default_size: PhysicalSize::new(800, 600),
        ..RuntimeConfig::default()
    };
    let runtime = PipelineRuntime::<u32>::new(config).expect("runtime");

    let (viewport_tx, viewport_rx) = channel::unbounded();
    let (drawn_tx, _drawn_rx) = channel::unbounded();
    let _surface = runtime
        .create_surface(
            ViewportMetrics::new(PhysicalSize::new(0, 0), 1.5),
            producer(viewport_tx),
            PromptRenderer(drawn_tx),
            CountingHost::default(),
        )
        .expect("surface");

    let viewport = viewport_rx.recv_timeout(WAIT).expect("initial viewport");
    assert_eq!(viewport.physical_size, PhysicalSize::new(800, 600));
    assert_eq!(viewport.device_pixel_ratio, 1.5);
}

#[test]
fn invalid_depths_are_rejected() {
    let config = RuntimeConfig {
        pipeline: PipelineConfig {
            max_pipeline_depth: 2,
            recovery_pipeline_depth: 2,
        },
        ..RuntimeConfig::default()
    };
    assert!(matches!(
        PipelineRuntime::<u32>::new(config),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn surfaces_cannot_be_created_after_shutdown() {
    let mut runtime = PipelineRuntime::<u32>::new(RuntimeConfig::default()).expect("runtime");
    runtime.shutdown();

    let (viewport_tx, _viewport_rx) = channel::unbounded();
    let (drawn_tx, _drawn_rx) = channel::unbounded();
    let result = runtime.create_surface(
        ViewportMetrics::default(),
        producer(viewport_tx),
        PromptRenderer(drawn_tx),
        CountingHost::default(),
    );
    assert!(matches!(result, Err(PipelineError::ShuttingDown)));
}
