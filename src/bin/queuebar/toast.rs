use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use notify_rust::{Notification, Timeout};
use queuebar::Result;
use queuebar::service::SimpleBarContent;
use queuebar::surface::{Container, Surface, SurfaceFactory, SurfaceOptions};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Desktop toast backend: each container is one notification on the session
/// bus. The queue controls lifetimes, so toasts are shown without their own
/// timeout and closed when the bar dismisses.
pub struct ToastFactory {
    appname: String,
}

impl ToastFactory {
    pub fn new(appname: String) -> Self {
        Self { appname }
    }
}

impl SurfaceFactory<SimpleBarContent> for ToastFactory {
    fn create(&self, options: &SurfaceOptions) -> Result<Arc<dyn Surface<SimpleBarContent>>> {
        debug!(?options, "creating toast surface");
        Ok(Arc::new(ToastSurface {
            appname: self.appname.clone(),
        }))
    }
}

struct ToastSurface {
    appname: String,
}

impl Surface<SimpleBarContent> for ToastSurface {
    fn new_container(&self, content: SimpleBarContent) -> Result<Box<dyn Container>> {
        Ok(Box::new(ToastContainer {
            appname: self.appname.clone(),
            content,
            close: None,
        }))
    }
}

struct ToastContainer {
    appname: String,
    content: SimpleBarContent,
    close: Option<mpsc::Sender<oneshot::Sender<()>>>,
}

impl Container for ToastContainer {
    fn enter(&mut self, done: oneshot::Sender<()>) {
        let (close_tx, close_rx) = mpsc::channel::<oneshot::Sender<()>>();
        self.close = Some(close_tx);
        let appname = self.appname.clone();
        let content = self.content.clone();
        // show() blocks on the bus; drive each toast from its own thread.
        thread::spawn(move || {
            let mut builder = Notification::new();
            builder
                .summary(&content.message)
                .appname(&appname)
                .timeout(Timeout::Never);
            if let Some(action) = &content.action {
                builder.action("action", action);
            }
            match builder.show() {
                Ok(handle) => {
                    let _ = done.send(());
                    match close_rx.recv() {
                        Ok(ack) => {
                            handle.close();
                            let _ = ack.send(());
                        }
                        Err(_) => handle.close(),
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to show toast");
                    let _ = done.send(());
                }
            }
        });
    }

    fn exit(&mut self, done: oneshot::Sender<()>) {
        if let Some(close) = self.close.take() {
            if let Err(returned) = close.send(done) {
                let _ = returned.0.send(());
            }
        } else {
            let _ = done.send(());
        }
    }
}
