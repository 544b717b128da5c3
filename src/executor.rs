//! UI-affine and background execution contexts
//!
//! Every device callback boundary hands its work to one of the two contexts
//! explicitly instead of relying on whichever thread the callback arrived on.

use crate::errors::CameraError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Mutex;
use std::thread::{JoinHandle, ThreadId};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::mpsc;

/// Unit of work handed across a thread boundary
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Executor: Send + Sync {
    /// Run `task` on the UI-affine thread, after everything already queued there
    fn dispatch_ui(&self, task: Task);

    /// Run `task` off the UI thread
    fn dispatch_background(&self, task: Task);

    /// True when the caller is already on the UI-affine thread
    fn is_ui_thread(&self) -> bool;
}

/// A dedicated UI thread fed in FIFO order, plus a tokio blocking pool.
pub struct ThreadedExecutor {
    ui_tx: Mutex<Option<mpsc::UnboundedSender<Task>>>,
    ui_thread: Mutex<Option<JoinHandle<()>>>,
    ui_thread_id: ThreadId,
    handle: Handle,
    runtime: Option<Runtime>,
}

impl ThreadedExecutor {
    /// Spawn the UI thread and an owned multi-threaded runtime for background work
    pub fn new() -> Result<Self, CameraError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("camkit-worker")
            .enable_all()
            .build()
            .map_err(|e| CameraError::Executor(format!("failed to build runtime: {}", e)))?;
        let handle = runtime.handle().clone();
        Self::build(handle, Some(runtime))
    }

    /// Spawn the UI thread and use an existing runtime for background work
    pub fn with_handle(handle: Handle) -> Result<Self, CameraError> {
        Self::build(handle, None)
    }

    fn build(handle: Handle, runtime: Option<Runtime>) -> Result<Self, CameraError> {
        let (ui_tx, mut ui_rx) = mpsc::unbounded_channel::<Task>();

        let ui_thread = std::thread::Builder::new()
            .name("camkit-ui".to_string())
            .spawn(move || {
                while let Some(task) = ui_rx.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(task)).is_err() {
                        log::error!("UI task panicked; continuing with the next one");
                    }
                }
                log::debug!("UI thread exiting");
            })
            .map_err(|e| CameraError::Executor(format!("failed to spawn UI thread: {}", e)))?;

        Ok(Self {
            ui_tx: Mutex::new(Some(ui_tx)),
            ui_thread_id: ui_thread.thread().id(),
            ui_thread: Mutex::new(Some(ui_thread)),
            handle,
            runtime,
        })
    }

    /// Stop accepting UI work and let the UI thread drain what is queued
    pub fn shutdown(&self) {
        let sender = match self.ui_tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => return,
        };
        drop(sender);

        // The UI thread can't join itself.
        if self.is_ui_thread() {
            return;
        }
        let thread = self.ui_thread.lock().ok().and_then(|mut guard| guard.take());
        if let Some(thread) = thread {
            if thread.join().is_err() {
                log::warn!("UI thread terminated abnormally");
            }
        }
    }
}

impl Executor for ThreadedExecutor {
    fn dispatch_ui(&self, task: Task) {
        let guard = match self.ui_tx.lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::error!("UI queue lock poisoned; dropping task");
                return;
            }
        };
        match guard.as_ref() {
            Some(tx) => {
                if tx.send(task).is_err() {
                    log::warn!("UI thread gone; dropping task");
                }
            }
            None => log::warn!("Executor shut down; dropping UI task"),
        }
    }

    fn dispatch_background(&self, task: Task) {
        // Detached: completion is reported through the task's own continuations.
        let _ = self.handle.spawn_blocking(task);
    }

    fn is_ui_thread(&self) -> bool {
        std::thread::current().id() == self.ui_thread_id
    }
}

impl Drop for ThreadedExecutor {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
