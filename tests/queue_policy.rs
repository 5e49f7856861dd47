#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use queuebar::bar_ref::BarState;
use queuebar::config::{BarConfig, BarOptions, QueueConfig};
use queuebar::error::{Error, SurfaceError};
use queuebar::service::{QueueBarService, SimpleBarContent};
use queuebar::surface::{Announcer, Container, Surface, SurfaceFactory, SurfaceOptions};
use queuebar::types::Politeness;
use tokio::sync::oneshot;

struct TestFactory {
    created: AtomicUsize,
    surface: Arc<TestSurface>,
}

impl TestFactory {
    fn new() -> Arc<Self> {
        Self::with_surface(TestSurface::new(false))
    }

    /// Factory whose containers never finish entering until released.
    fn holding() -> Arc<Self> {
        Self::with_surface(TestSurface::new(true))
    }

    fn with_surface(surface: TestSurface) -> Arc<Self> {
        Arc::new(Self {
            created: AtomicUsize::new(0),
            surface: Arc::new(surface),
        })
    }

    fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl SurfaceFactory<SimpleBarContent> for TestFactory {
    fn create(&self, _options: &SurfaceOptions) -> queuebar::Result<Arc<dyn Surface<SimpleBarContent>>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.surface) as Arc<dyn Surface<SimpleBarContent>>)
    }
}

struct TestSurface {
    hold_enter: bool,
    held: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
    containers: AtomicUsize,
}

impl TestSurface {
    fn new(hold_enter: bool) -> Self {
        Self {
            hold_enter,
            held: Arc::new(Mutex::new(Vec::new())),
            containers: AtomicUsize::new(0),
        }
    }

    fn containers(&self) -> usize {
        self.containers.load(Ordering::SeqCst)
    }

    fn release_entrances(&self) {
        for done in self.held.lock().unwrap().drain(..) {
            let _ = done.send(());
        }
    }
}

impl Surface<SimpleBarContent> for TestSurface {
    fn new_container(&self, _content: SimpleBarContent) -> queuebar::Result<Box<dyn Container>> {
        self.containers.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TestContainer {
            hold_enter: self.hold_enter,
            held: Arc::clone(&self.held),
        }))
    }
}

struct TestContainer {
    hold_enter: bool,
    held: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
}

impl Container for TestContainer {
    fn enter(&mut self, done: oneshot::Sender<()>) {
        if self.hold_enter {
            self.held.lock().unwrap().push(done);
        } else {
            let _ = done.send(());
        }
    }

    fn exit(&mut self, done: oneshot::Sender<()>) {
        let _ = done.send(());
    }
}

#[derive(Default)]
struct RecordingAnnouncer {
    messages: Mutex<Vec<(String, Politeness)>>,
    cleared: AtomicUsize,
}

impl RecordingAnnouncer {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn messages(&self) -> Vec<(String, Politeness)> {
        self.messages.lock().unwrap().clone()
    }

    fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, message: &str, politeness: Politeness) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), politeness));
    }

    fn clear(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

struct FailingFactory;

impl SurfaceFactory<SimpleBarContent> for FailingFactory {
    fn create(&self, _options: &SurfaceOptions) -> queuebar::Result<Arc<dyn Surface<SimpleBarContent>>> {
        Err(SurfaceError::Create("display server unavailable".to_string()).into())
    }
}

fn service(
    factory: Arc<TestFactory>,
    announcer: Arc<RecordingAnnouncer>,
    max_open: usize,
) -> QueueBarService<SimpleBarContent> {
    QueueBarService::new(
        factory,
        announcer,
        QueueConfig {
            max_open,
            wrapper_class: None,
        },
        BarConfig::default(),
    )
    .expect("valid queue config")
}

fn content(message: &str) -> SimpleBarContent {
    SimpleBarContent {
        message: message.to_string(),
        action: None,
    }
}

fn timed(ms: u64) -> BarOptions<SimpleBarContent> {
    BarOptions {
        duration: Some(Duration::from_millis(ms)),
        ..BarOptions::default()
    }
}

#[tokio::test(start_paused = true)]
async fn eviction_dismisses_the_oldest_timed_bar() {
    let factory = TestFactory::new();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 2);

    let first = service.open(content("one"), timed(1000)).unwrap();
    let second = service.open(content("two"), timed(1000)).unwrap();
    let third = service.open(content("three"), timed(1000)).unwrap();

    // Admission and eviction are synchronous: the head is already dismissing.
    assert_eq!(first.state(), BarState::Dismissing);
    first.after_dismissed().await;

    let remaining: Vec<_> = service.timed_bars().iter().map(|bar| bar.id()).collect();
    assert_eq!(remaining, vec![second.id(), third.id()]);
    assert_eq!(service.active_counts().total(), 2);
}

#[tokio::test(start_paused = true)]
async fn untimed_overflow_keeps_every_bar() {
    let factory = TestFactory::new();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 1);

    let first = service.open(content("one"), BarOptions::default()).unwrap();
    let second = service.open(content("two"), BarOptions::default()).unwrap();
    first.after_opened().await;
    second.after_opened().await;

    // Nothing is evictable, so the cap is exceeded (a warning is logged).
    let counts = service.active_counts();
    assert_eq!(counts.timed, 0);
    assert_eq!(counts.untimed, 2);
    assert_eq!(first.state(), BarState::Open);
    assert_eq!(second.state(), BarState::Open);
}

#[tokio::test(start_paused = true)]
async fn timed_bar_auto_dismisses_after_its_duration() {
    let factory = TestFactory::new();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 4);

    let bar = service.open(content("soon gone"), timed(500)).unwrap();
    let dismissals = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&dismissals);
    bar.on_dismissed(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bar.after_opened().await;
    assert_eq!(service.active_counts().timed, 1);

    bar.after_dismissed().await;
    assert_eq!(dismissals.load(Ordering::SeqCst), 1);
    assert_eq!(service.active_counts().total(), 0);
}

#[tokio::test(start_paused = true)]
async fn open_message_announces_the_message() {
    let factory = TestFactory::new();
    let announcer = RecordingAnnouncer::new();
    let service = service(Arc::clone(&factory), Arc::clone(&announcer), 4);

    let bar = service
        .open_message("Saved", Some("Undo"), BarOptions::default())
        .unwrap();
    assert_eq!(
        announcer.messages(),
        vec![("Saved".to_string(), Politeness::Polite)]
    );

    bar.dismiss();
    bar.after_dismissed().await;
    assert_eq!(announcer.cleared(), 1);
}

#[tokio::test(start_paused = true)]
async fn the_shared_surface_is_created_once() {
    let factory = TestFactory::new();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 4);

    service.open(content("one"), BarOptions::default()).unwrap();
    service.open(content("two"), timed(100)).unwrap();

    assert_eq!(factory.created(), 1);
    assert_eq!(factory.surface.containers(), 2);
}

#[tokio::test(start_paused = true)]
async fn dismissal_is_idempotent_across_triggers() {
    let factory = TestFactory::new();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 4);

    let bar = service.open(content("once"), timed(500)).unwrap();
    let dismissals = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&dismissals);
    bar.on_dismissed(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    bar.dismiss();
    bar.dismiss();
    bar.after_dismissed().await;

    // The auto-dismiss deadline passing later must not fire a second event.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(dismissals.load(Ordering::SeqCst), 1);
    assert_eq!(service.active_counts().total(), 0);
}

#[tokio::test(start_paused = true)]
async fn evicting_an_opening_bar_skips_its_opened_event() {
    let factory = TestFactory::holding();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 1);

    let first = service.open(content("one"), timed(1000)).unwrap();
    let opened = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&opened);
    first.on_opened(move || {
        flag.store(true, Ordering::SeqCst);
    });

    let second = service.open(content("two"), timed(1000)).unwrap();
    first.after_dismissed().await;

    // Let the second entrance driver park its ack before releasing it.
    tokio::task::yield_now().await;
    factory.surface.release_entrances();
    second.after_opened().await;

    assert!(!opened.load(Ordering::SeqCst));
    assert_eq!(first.state(), BarState::Dismissed);
    let remaining: Vec<_> = service.timed_bars().iter().map(|bar| bar.id()).collect();
    assert_eq!(remaining, vec![second.id()]);
}

#[tokio::test(start_paused = true)]
async fn untimed_bar_leaves_its_set_on_dismissal() {
    let factory = TestFactory::new();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 4);

    let bar = service.open(content("sticky"), BarOptions::default()).unwrap();
    assert_eq!(service.active_counts().untimed, 1);

    bar.dismiss();
    bar.after_dismissed().await;
    assert_eq!(service.active_counts().untimed, 0);
}

#[tokio::test(start_paused = true)]
async fn custom_target_surface_renders_the_container() {
    let factory = TestFactory::new();
    let service = service(Arc::clone(&factory), RecordingAnnouncer::new(), 4);
    let target = Arc::new(TestSurface::new(false));

    let options = BarOptions {
        target: Some(Arc::clone(&target) as Arc<dyn Surface<SimpleBarContent>>),
        ..BarOptions::default()
    };
    let bar = service.open(content("elsewhere"), options).unwrap();
    bar.after_opened().await;

    assert_eq!(target.containers(), 1);
    assert_eq!(factory.surface.containers(), 0);
    // The shared surface still exists and the bar shares its bookkeeping.
    assert_eq!(factory.created(), 1);
    assert_eq!(service.active_counts().untimed, 1);
}

#[tokio::test(start_paused = true)]
async fn surface_creation_failure_propagates() {
    let service = QueueBarService::<SimpleBarContent>::new(
        Arc::new(FailingFactory),
        RecordingAnnouncer::new(),
        QueueConfig::default(),
        BarConfig::default(),
    )
    .expect("valid queue config");

    let err = service
        .open(content("never shown"), BarOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::Surface(SurfaceError::Create(_))));
    assert_eq!(service.active_counts().total(), 0);
}
