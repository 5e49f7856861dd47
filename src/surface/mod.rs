//! Collaborator seams for the queuing core.
//!
//! Rendering, animation and accessibility announcements live outside this
//! crate; the service only needs "create a surface once", "render a container
//! that can enter and exit", and "announce text". The traits here are that
//! boundary. [`headless`] provides implementations with no rendering at all,
//! used by the test suite and the demo's dry-run mode.

mod headless;

pub use headless::{HeadlessFactory, HeadlessSurface};

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::Result;
use crate::types::{HorizontalPosition, Politeness, TextDirection, VerticalPosition};

/// Positioning settings handed to the factory when the shared surface is
/// first created. Later opens reuse the surface, so only the first caller's
/// placement takes effect.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SurfaceOptions {
    pub direction: TextDirection,
    pub horizontal_position: HorizontalPosition,
    pub vertical_position: VerticalPosition,
    pub wrapper_class: Option<String>,
}

/// One rendered notification on a surface.
///
/// `enter` and `exit` start the respective transition and must send on `done`
/// once the transition has completed; the queuing core advances the handle's
/// state only on that acknowledgement. A dropped `done` counts as completed.
/// `exit` may be called while an entrance is still pending (eviction of a bar
/// that is not yet fully shown) and implementations must tolerate it.
pub trait Container: Send {
    fn enter(&mut self, done: oneshot::Sender<()>);
    fn exit(&mut self, done: oneshot::Sender<()>);
}

/// A display surface rendering containers for content of type `C`.
pub trait Surface<C>: Send + Sync {
    /// Render `content` into a fresh container, not yet entered.
    ///
    /// # Errors
    ///
    /// Implementations return [`crate::error::SurfaceError::Container`] when
    /// the content cannot be rendered.
    fn new_container(&self, content: C) -> Result<Box<dyn Container>>;
}

/// Creates the shared display surface. The service invokes this at most once
/// per service instance, on the first `open` call.
pub trait SurfaceFactory<C>: Send + Sync {
    /// # Errors
    ///
    /// Implementations return [`crate::error::SurfaceError::Create`] when the
    /// surface cannot be brought up.
    fn create(&self, options: &SurfaceOptions) -> Result<Arc<dyn Surface<C>>>;
}

/// Accessibility announcement sink.
pub trait Announcer: Send + Sync {
    fn announce(&self, message: &str, politeness: Politeness);
    /// Clear the announcement region. Called when a bar that announced
    /// something finishes dismissing.
    fn clear(&self);
}

/// Announcer that drops every announcement.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn announce(&self, _message: &str, _politeness: Politeness) {}

    fn clear(&self) {}
}

/// Announcer that forwards announcements to the tracing pipeline. Useful for
/// headless deployments where no assistive technology is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAnnouncer;

impl Announcer for LogAnnouncer {
    fn announce(&self, message: &str, politeness: Politeness) {
        debug!(%politeness, message, "announce");
    }

    fn clear(&self) {
        debug!("clear announcement region");
    }
}
