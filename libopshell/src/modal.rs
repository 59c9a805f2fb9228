//! Exclusive modal registry
//!
//! At most one dialog is live across the whole application, no matter which
//! page opened it. Opening a dialog first tears down the one already shown;
//! closing is idempotent and guarded by a latch so that two overlapping close
//! requests never destroy the same dialog twice. A close that finds the latch
//! held waits for the other close to finish, then closes whatever was opened
//! in the meantime.
//!
//! The registry owns every dialog it shows. Callers get back a lightweight
//! [`ModalHandle`] that identifies the dialog without keeping it alive.
//!
//! # Examples
//!
//! ```
//! use libopshell::mock::MockDialog;
//! use libopshell::modal::ModalRegistry;
//!
//! # async fn example() -> Result<(), libopshell::error::DialogError> {
//! let registry = ModalRegistry::new();
//!
//! let first = registry.open(|| MockDialog::new("confirm")).await?;
//! let second = registry.open(|| MockDialog::new("details")).await?;
//!
//! assert!(!registry.is_active(&first));
//! assert!(registry.is_active(&second));
//!
//! registry.close_active().await;
//! assert!(!registry.has_active());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::error::DialogError;
use crate::events::{EventBus, ShellEvent};

/// Anything the registry can show as a modal
///
/// Construction may leave the dialog not yet ready; the registry always
/// awaits [`init`](Dialog::init) before [`show`](Dialog::show).
#[async_trait]
pub trait Dialog: Send {
    fn name(&self) -> &str;

    /// Asynchronous preparation before the dialog is shown
    async fn init(&mut self) -> Result<(), DialogError> {
        Ok(())
    }

    async fn show(&mut self) -> Result<(), DialogError>;

    /// Soft close: hide the dialog
    async fn close(&mut self) -> Result<(), DialogError>;

    /// Full teardown
    ///
    /// Dialogs without a destructor inherit this default, which falls back to
    /// [`close`](Dialog::close). Must be idempotent and must not fail on a
    /// dialog that was never shown.
    async fn destroy(&mut self) -> Result<(), DialogError> {
        self.close().await
    }
}

/// Identifies one dialog shown by a [`ModalRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModalHandle {
    id: u64,
    name: String,
}

impl ModalHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

struct ActiveModal {
    handle: ModalHandle,
    dialog: Box<dyn Dialog>,
}

/// Releases the close latch when dropped, whatever the close outcome
struct LatchRelease<'a> {
    closing: &'a AtomicBool,
    released: &'a Notify,
}

impl Drop for LatchRelease<'_> {
    fn drop(&mut self) {
        self.closing.store(false, Ordering::Release);
        self.released.notify_waiters();
    }
}

/// Single-slot owner of the current dialog
pub struct ModalRegistry {
    active: Mutex<Option<ActiveModal>>,
    closing: AtomicBool,
    released: Notify,
    next_id: AtomicU64,
    events: EventBus,
}

impl ModalRegistry {
    /// Registry with a private event bus
    pub fn new() -> Self {
        Self::with_events(EventBus::default())
    }

    /// Registry reporting to a shared event bus
    pub fn with_events(events: EventBus) -> Self {
        Self {
            active: Mutex::new(None),
            closing: AtomicBool::new(false),
            released: Notify::new(),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ActiveModal>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open a dialog, tearing down whichever one is active first
    ///
    /// The previous dialog is detached from the registry before `factory`
    /// runs. The new dialog is initialized and shown before it is registered;
    /// if either step fails it is destroyed and the error returned, leaving
    /// no active dialog.
    pub async fn open<F, D>(&self, factory: F) -> Result<ModalHandle, DialogError>
    where
        F: FnOnce() -> D,
        D: Dialog + 'static,
    {
        let previous = self.slot().take();
        if let Some(previous) = previous {
            debug!(dialog = previous.handle.name(), "replacing active dialog");
            self.teardown(previous).await;
        }

        let mut dialog: Box<dyn Dialog> = Box::new(factory());
        let handle = ModalHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            name: dialog.name().to_string(),
        };

        if let Err(e) = prepare(dialog.as_mut()).await {
            warn!(dialog = handle.name(), error = %e, "dialog failed to open");
            if let Err(destroy_error) = dialog.destroy().await {
                warn!(
                    dialog = handle.name(),
                    error = %destroy_error,
                    "failed to destroy dialog that never opened"
                );
            }
            return Err(e);
        }

        // Another open may have completed while this one was awaiting
        let displaced = self.slot().replace(ActiveModal {
            handle: handle.clone(),
            dialog,
        });
        if let Some(displaced) = displaced {
            self.teardown(displaced).await;
        }

        debug!(dialog = handle.name(), id = handle.id(), "dialog opened");
        self.events.emit(ShellEvent::DialogOpened {
            dialog: handle.name().to_string(),
        });
        Ok(handle)
    }

    /// Take the close latch, waiting out any close already in flight
    async fn latch(&self) -> LatchRelease<'_> {
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            // Registered before the swap so a release in between is not missed
            released.as_mut().enable();

            if !self.closing.swap(true, Ordering::AcqRel) {
                return LatchRelease {
                    closing: &self.closing,
                    released: &self.released,
                };
            }
            debug!("dialog close already in flight, waiting for it");
            released.await;
        }
    }

    /// Tear down the active dialog, if any
    ///
    /// A call made while another close is in flight waits for it, then tears
    /// down whatever is active by then (usually nothing). Returns whether this
    /// call tore a dialog down. Teardown errors are logged, never returned;
    /// once this resolves there is no active dialog.
    pub async fn close_active(&self) -> bool {
        let _latch = self.latch().await;

        let active = self.slot().take();
        match active {
            Some(active) => {
                self.teardown(active).await;
                true
            }
            None => false,
        }
    }

    /// Close the dialog behind `handle`, only if it is still the active one
    pub async fn close(&self, handle: &ModalHandle) -> bool {
        let _latch = self.latch().await;

        let active = {
            let mut slot = self.slot();
            let is_current = slot
                .as_ref()
                .map(|active| active.handle == *handle)
                .unwrap_or(false);
            if is_current {
                slot.take()
            } else {
                None
            }
        };
        match active {
            Some(active) => {
                self.teardown(active).await;
                true
            }
            None => false,
        }
    }

    /// Destroy a detached dialog; failures are logged and swallowed
    async fn teardown(&self, mut active: ActiveModal) {
        let name = active.handle.name().to_string();
        match active.dialog.destroy().await {
            Ok(()) => {
                debug!(dialog = %name, "dialog closed");
                self.events.emit(ShellEvent::DialogClosed { dialog: name });
            }
            Err(e) => {
                warn!(dialog = %name, error = %e, "dialog teardown failed, releasing it anyway");
                self.events.emit(ShellEvent::DialogDestroyFailed {
                    dialog: name,
                    error: e.to_string(),
                });
            }
        }
    }

    pub fn has_active(&self) -> bool {
        self.slot().is_some()
    }

    pub fn is_active(&self, handle: &ModalHandle) -> bool {
        self.slot()
            .as_ref()
            .map(|active| active.handle == *handle)
            .unwrap_or(false)
    }

    pub fn active_handle(&self) -> Option<ModalHandle> {
        self.slot().as_ref().map(|active| active.handle.clone())
    }

    /// Is a close currently in flight?
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }
}

impl Default for ModalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

async fn prepare(dialog: &mut dyn Dialog) -> Result<(), DialogError> {
    dialog.init().await?;
    dialog.show().await
}

/// Dialog with an exit animation
///
/// Awaits `delay` inside its own `close`/`destroy` before delegating, so the
/// caller of [`ModalRegistry::close_active`] can await the whole removal.
/// Teardown runs at most once.
pub struct AnimatedDialog<D> {
    inner: D,
    delay: Duration,
    torn_down: bool,
}

impl<D: Dialog> AnimatedDialog<D> {
    pub fn new(inner: D, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            torn_down: false,
        }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: Dialog> Dialog for AnimatedDialog<D> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn init(&mut self) -> Result<(), DialogError> {
        self.inner.init().await
    }

    async fn show(&mut self) -> Result<(), DialogError> {
        self.torn_down = false;
        self.inner.show().await
    }

    async fn close(&mut self) -> Result<(), DialogError> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        tokio::time::sleep(self.delay).await;
        self.inner.close().await
    }

    async fn destroy(&mut self) -> Result<(), DialogError> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        tokio::time::sleep(self.delay).await;
        self.inner.destroy().await
    }
}
