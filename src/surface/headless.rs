use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::Result;

use super::{Container, Surface, SurfaceFactory, SurfaceOptions};

/// Surface with no rendering: containers complete their entrance and exit
/// transitions immediately. The demo uses it under `--dry-run`; the tests use
/// it wherever transition timing does not matter.
pub struct HeadlessSurface<C> {
    _content: PhantomData<fn(C)>,
}

impl<C> HeadlessSurface<C> {
    pub fn new() -> Self {
        Self {
            _content: PhantomData,
        }
    }
}

impl<C> Default for HeadlessSurface<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Debug for HeadlessSurface<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessSurface").finish()
    }
}

impl<C: Debug + Send + 'static> Surface<C> for HeadlessSurface<C> {
    fn new_container(&self, content: C) -> Result<Box<dyn Container>> {
        debug!(content = ?content, "headless container created");
        Ok(Box::new(HeadlessContainer))
    }
}

pub struct HeadlessFactory<C> {
    _content: PhantomData<fn(C)>,
}

impl<C> HeadlessFactory<C> {
    pub fn new() -> Self {
        Self {
            _content: PhantomData,
        }
    }
}

impl<C> Default for HeadlessFactory<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Debug for HeadlessFactory<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessFactory").finish()
    }
}

impl<C: Debug + Send + 'static> SurfaceFactory<C> for HeadlessFactory<C> {
    fn create(&self, options: &SurfaceOptions) -> Result<Arc<dyn Surface<C>>> {
        debug!(?options, "headless surface created");
        Ok(Arc::new(HeadlessSurface::new()))
    }
}

struct HeadlessContainer;

impl Container for HeadlessContainer {
    fn enter(&mut self, done: oneshot::Sender<()>) {
        let _ = done.send(());
    }

    fn exit(&mut self, done: oneshot::Sender<()>) {
        let _ = done.send(());
    }
}
