use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::Result;
use crate::bar_ref::BarRef;
use crate::config::{BarConfig, BarOptions, QueueConfig};
use crate::queue::Queue;
use crate::surface::{Announcer, Surface, SurfaceFactory, SurfaceOptions};

/// Content of the default bar used by [`QueueBarService::open_message`]: a
/// message and an optional action label.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SimpleBarContent {
    pub message: String,
    pub action: Option<String>,
}

/// Snapshot of the active-set sizes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ActiveCounts {
    pub timed: usize,
    pub untimed: usize,
}

impl ActiveCounts {
    pub fn total(self) -> usize {
        self.timed + self.untimed
    }
}

/// Shared surface and its queue. Created together on the first `open` call,
/// never one without the other.
struct Display<C> {
    surface: Arc<dyn Surface<C>>,
    queue: Arc<Queue>,
}

impl<C> Clone for Display<C> {
    fn clone(&self) -> Self {
        Self {
            surface: Arc::clone(&self.surface),
            queue: Arc::clone(&self.queue),
        }
    }
}

struct ServiceState<C> {
    display: Option<Display<C>>,
    timed: Vec<BarRef>,
    untimed: Vec<BarRef>,
}

/// Queuing service over a transient-notification display surface.
///
/// Opened bars are tracked in two active sets (timed and untimed, arrival
/// order). When a new bar would push the total past the configured
/// `max_open`, the oldest timed bar is dismissed to make room; when every
/// active bar is untimed there is nothing safe to evict, so the limit is
/// temporarily exceeded and a warning is logged.
///
/// Transitions, timers and cleanup run as spawned tasks, so the service must
/// be used from within a Tokio runtime.
pub struct QueueBarService<C> {
    factory: Arc<dyn SurfaceFactory<C>>,
    announcer: Arc<dyn Announcer>,
    global: QueueConfig,
    defaults: BarConfig,
    state: Arc<Mutex<ServiceState<C>>>,
}

impl<C: 'static> QueueBarService<C> {
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError::InvalidField`] when `global`
    /// fails validation.
    pub fn new(
        factory: Arc<dyn SurfaceFactory<C>>,
        announcer: Arc<dyn Announcer>,
        global: QueueConfig,
        defaults: BarConfig,
    ) -> Result<Self> {
        global.validate()?;
        Ok(Self {
            factory,
            announcer,
            global,
            defaults,
            state: Arc::new(Mutex::new(ServiceState {
                display: None,
                timed: Vec::new(),
                untimed: Vec::new(),
            })),
        })
    }

    /// Open a new bar showing `content`.
    ///
    /// Admission, eviction and registration happen before this returns; the
    /// entrance transition, auto-dismiss timer and dismissal cleanup run
    /// afterwards on the runtime.
    ///
    /// # Errors
    ///
    /// Propagates surface-collaborator failures (surface creation, container
    /// rendering). The queuing policy itself never fails.
    pub fn open(&self, content: C, options: BarOptions<C>) -> Result<BarRef> {
        let (config, target) = options.resolve(&self.defaults);
        let display = self.ensure_display(&config)?;
        let surface = target.unwrap_or_else(|| Arc::clone(&display.surface));

        let container = surface.new_container(content)?;
        let bar = BarRef::new(Arc::clone(&display.queue), container);
        let timed = config.is_timed();

        {
            let mut state = self.lock_state();
            if timed {
                state.timed.push(bar.clone());
            } else {
                state.untimed.push(bar.clone());
            }

            let total = state.timed.len() + state.untimed.len();
            if total > self.global.max_open {
                if let Some(oldest) = state.timed.first().cloned() {
                    debug!(bar = %oldest.id(), "evicting oldest timed bar to honor the open limit");
                    oldest.dismiss();
                } else {
                    warn!(
                        max_open = self.global.max_open,
                        open = total,
                        "unable to keep the limit of open bars: every active bar is untimed (duration = 0)"
                    );
                }
            }
        }

        display.queue.register(bar.id());
        bar.begin_enter();

        // Dismissal is the single cleanup trigger: drop the bar from its
        // active set and clear the announcement region if one was made.
        let state = Arc::clone(&self.state);
        let announcer = Arc::clone(&self.announcer);
        let announced = config.announcement.is_some();
        let bar_id = bar.id();
        bar.on_dismissed(move || {
            {
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                let list = if timed {
                    &mut state.timed
                } else {
                    &mut state.untimed
                };
                if let Some(pos) = list.iter().position(|entry| entry.id() == bar_id) {
                    list.remove(pos);
                }
            }
            if announced {
                announcer.clear();
            }
        });

        // The timer counts from the opened event, not from now: opening can
        // itself be asynchronous.
        if let Some(duration) = config.duration.filter(|duration| !duration.is_zero()) {
            let timed_bar = bar.clone();
            bar.on_opened(move || timed_bar.dismiss_after(duration));
        }

        if let Some(message) = &config.announcement {
            self.announcer.announce(message, config.politeness);
        }

        Ok(bar)
    }

    pub fn active_counts(&self) -> ActiveCounts {
        let state = self.lock_state();
        ActiveCounts {
            timed: state.timed.len(),
            untimed: state.untimed.len(),
        }
    }

    /// Currently active timed bars, oldest first.
    pub fn timed_bars(&self) -> Vec<BarRef> {
        self.lock_state().timed.clone()
    }

    /// Currently active untimed bars, oldest first.
    pub fn untimed_bars(&self) -> Vec<BarRef> {
        self.lock_state().untimed.clone()
    }

    fn ensure_display(&self, config: &BarConfig) -> Result<Display<C>> {
        let mut state = self.lock_state();
        if let Some(display) = &state.display {
            return Ok(display.clone());
        }
        let options = SurfaceOptions {
            direction: config.direction,
            horizontal_position: config.horizontal_position,
            vertical_position: config.vertical_position,
            wrapper_class: self.global.wrapper_class.clone(),
        };
        let surface = self.factory.create(&options)?;
        let display = Display {
            surface,
            queue: Arc::new(Queue::new()),
        };
        state.display = Some(display.clone());
        Ok(display)
    }

    fn lock_state(&self) -> MutexGuard<'_, ServiceState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: From<SimpleBarContent> + 'static> QueueBarService<C> {
    /// Open a bar with a plain message and an optional action label. When the
    /// options carry no announcement text, the message is announced.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::open`].
    pub fn open_message(
        &self,
        message: impl Into<String>,
        action: Option<&str>,
        mut options: BarOptions<C>,
    ) -> Result<BarRef> {
        let message = message.into();
        if options.announcement.is_none() {
            options.announcement = Some(message.clone());
        }
        let content = SimpleBarContent {
            message,
            action: action.map(str::to_string),
        };
        self.open(C::from(content), options)
    }
}

impl<C: 'static> std::fmt::Debug for QueueBarService<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts = self.active_counts();
        f.debug_struct("QueueBarService")
            .field("global", &self.global)
            .field("active", &counts)
            .finish()
    }
}
