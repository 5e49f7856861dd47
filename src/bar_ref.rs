use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;
use uuid::Uuid;

use crate::queue::Queue;
use crate::surface::Container;

/// Lifecycle of one opened bar.
///
/// `Created → Opening → Open → Dismissing → Dismissed`, with one shortcut:
/// a bar evicted before its entrance completes goes from `Created`/`Opening`
/// straight to `Dismissing` and its after-opened event never fires.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum BarState {
    Created,
    Opening,
    Open,
    Dismissing,
    Dismissed,
}

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Caller-facing reference to one opened bar. Clones share the same bar.
#[derive(Clone)]
pub struct BarRef {
    inner: Arc<BarInner>,
}

struct BarInner {
    id: Uuid,
    queue: Arc<Queue>,
    container: Mutex<Box<dyn Container>>,
    shared: Mutex<Shared>,
    opened_tx: watch::Sender<bool>,
    opened_rx: watch::Receiver<bool>,
    dismissed_tx: watch::Sender<bool>,
    dismissed_rx: watch::Receiver<bool>,
}

struct Shared {
    state: BarState,
    opened_fired: bool,
    opened_callbacks: Vec<Callback>,
    dismissed_callbacks: Vec<Callback>,
    timer: Option<JoinHandle<()>>,
}

impl BarRef {
    pub(crate) fn new(queue: Arc<Queue>, container: Box<dyn Container>) -> Self {
        let (opened_tx, opened_rx) = watch::channel(false);
        let (dismissed_tx, dismissed_rx) = watch::channel(false);
        Self {
            inner: Arc::new(BarInner {
                id: Uuid::new_v4(),
                queue,
                container: Mutex::new(container),
                shared: Mutex::new(Shared {
                    state: BarState::Created,
                    opened_fired: false,
                    opened_callbacks: Vec::new(),
                    dismissed_callbacks: Vec::new(),
                    timer: None,
                }),
                opened_tx,
                opened_rx,
                dismissed_tx,
                dismissed_rx,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn state(&self) -> BarState {
        self.inner.lock().state
    }

    /// Start the entrance transition. No-op when dismissal already began
    /// (a bar can be evicted before it was ever shown).
    pub(crate) fn begin_enter(&self) {
        {
            let mut shared = self.inner.lock();
            if shared.state >= BarState::Dismissing {
                return;
            }
            shared.state = BarState::Opening;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let ack = {
                let (done, ack) = oneshot::channel();
                inner.container_mut().enter(done);
                ack
            };
            let _ = ack.await;

            let callbacks = {
                let mut shared = inner.lock();
                if shared.state >= BarState::Dismissing {
                    // Evicted mid-entrance; the opened event never fires.
                    return;
                }
                shared.state = BarState::Open;
                shared.opened_fired = true;
                std::mem::take(&mut shared.opened_callbacks)
            };
            trace!(bar = %inner.id, "entrance transition complete");
            for callback in callbacks {
                callback();
            }
            let _ = inner.opened_tx.send(true);
        });
    }

    /// Begin dismissing this bar. Idempotent: once dismissal has started,
    /// further calls (explicit, timer-driven, or eviction-driven) are no-ops
    /// and exactly one after-dismissed event ever fires.
    pub fn dismiss(&self) {
        {
            let mut shared = self.inner.lock();
            if shared.state >= BarState::Dismissing {
                return;
            }
            shared.state = BarState::Dismissing;
            if let Some(timer) = shared.timer.take() {
                timer.abort();
            }
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let ack = {
                let (done, ack) = oneshot::channel();
                inner.container_mut().exit(done);
                ack
            };
            let _ = ack.await;

            let callbacks = {
                let mut shared = inner.lock();
                shared.state = BarState::Dismissed;
                std::mem::take(&mut shared.dismissed_callbacks)
            };
            inner.queue.release(inner.id);
            trace!(bar = %inner.id, "exit transition complete");
            for callback in callbacks {
                callback();
            }
            let _ = inner.dismissed_tx.send(true);
        });
    }

    /// Schedule a `dismiss` call `duration` after the opened event. A bar has
    /// at most one pending timer: arming again replaces the previous one, and
    /// dismissal cancels it.
    pub fn dismiss_after(&self, duration: Duration) {
        let bar = self.clone();
        let mut shared = self.inner.lock();
        if shared.state >= BarState::Dismissing {
            return;
        }
        if let Some(previous) = shared.timer.take() {
            previous.abort();
        }
        shared.timer = Some(tokio::spawn(async move {
            bar.after_opened().await;
            sleep(duration).await;
            bar.dismiss();
        }));
    }

    /// Resolves once the entrance transition has completed. Fires at most
    /// once per bar; resolves immediately when the bar is already open.
    pub async fn after_opened(&self) {
        let mut rx = self.inner.opened_rx.clone();
        let _ = rx.wait_for(|opened| *opened).await;
    }

    /// Resolves once the exit transition has completed. Terminal: cleanup
    /// callbacks have already run by the time this resolves.
    pub async fn after_dismissed(&self) {
        let mut rx = self.inner.dismissed_rx.clone();
        let _ = rx.wait_for(|dismissed| *dismissed).await;
    }

    /// Register a one-shot callback for the opened event. Runs immediately if
    /// the bar already opened; never runs if the bar is dismissed before its
    /// entrance completes.
    pub fn on_opened(&self, callback: impl FnOnce() + Send + 'static) {
        let mut shared = self.inner.lock();
        if shared.opened_fired {
            drop(shared);
            callback();
        } else if shared.state < BarState::Dismissing {
            shared.opened_callbacks.push(Box::new(callback));
        }
    }

    /// Register a one-shot callback for the dismissed event. Callbacks run
    /// after the transition, before async waiters are released; registering
    /// after dismissal runs the callback immediately.
    pub fn on_dismissed(&self, callback: impl FnOnce() + Send + 'static) {
        let mut shared = self.inner.lock();
        if shared.state == BarState::Dismissed {
            drop(shared);
            callback();
        } else {
            shared.dismissed_callbacks.push(Box::new(callback));
        }
    }
}

impl fmt::Debug for BarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarRef")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .finish()
    }
}

impl BarInner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn container_mut(&self) -> MutexGuard<'_, Box<dyn Container>> {
        self.container.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
