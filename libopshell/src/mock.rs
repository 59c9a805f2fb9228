//! Mock pages and dialogs for testing
//!
//! Configurable stand-ins for real page modules and dialog widgets. They can
//! simulate failures, slow or hanging loads, slow teardown, and pages that
//! open dialogs or request further navigation. Every call is recorded in a
//! shared [`CallLog`] as `"<call>:<name>"` so tests can assert on ordering
//! across several mocks.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::controller::NavigationRequest;
use crate::error::{DialogError, PageError, Result};
use crate::modal::Dialog;
use crate::page::{Cleanup, Page, PageContext};
use crate::route::Params;

/// Ordered record of calls shared between mocks
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.lock().push(call.into());
    }

    /// Every call recorded so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// How many times `call` was recorded
    pub fn count(&self, call: &str) -> usize {
        self.lock().iter().filter(|c| c.as_str() == call).count()
    }

    /// Index of the first occurrence of `call`
    pub fn position(&self, call: &str) -> Option<usize> {
        self.lock().iter().position(|c| c == call)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Mock dialog
#[derive(Debug, Clone)]
pub struct MockDialog {
    name: String,
    log: CallLog,
    has_destructor: bool,
    init_fails: bool,
    destroy_fails: bool,
    init_delay: Duration,
    teardown_delay: Duration,
}

impl MockDialog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: CallLog::default(),
            has_destructor: true,
            init_fails: false,
            destroy_fails: false,
            init_delay: Duration::ZERO,
            teardown_delay: Duration::ZERO,
        }
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// Only supports the soft close
    pub fn without_destructor(mut self) -> Self {
        self.has_destructor = false;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.init_fails = true;
        self
    }

    pub fn failing_destroy(mut self) -> Self {
        self.destroy_fails = true;
        self
    }

    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    /// Delay applied to both `close` and `destroy`
    pub fn with_teardown_delay(mut self, delay: Duration) -> Self {
        self.teardown_delay = delay;
        self
    }

    fn record(&self, call: &str) {
        self.log.record(format!("{}:{}", call, self.name));
    }
}

#[async_trait]
impl Dialog for MockDialog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn init(&mut self) -> std::result::Result<(), DialogError> {
        self.record("init");
        if !self.init_delay.is_zero() {
            sleep(self.init_delay).await;
        }
        if self.init_fails {
            return Err(DialogError::Init {
                dialog: self.name.clone(),
                message: "mock init failure".to_string(),
            });
        }
        Ok(())
    }

    async fn show(&mut self) -> std::result::Result<(), DialogError> {
        self.record("show");
        Ok(())
    }

    async fn close(&mut self) -> std::result::Result<(), DialogError> {
        self.record("close");
        if !self.teardown_delay.is_zero() {
            sleep(self.teardown_delay).await;
        }
        Ok(())
    }

    async fn destroy(&mut self) -> std::result::Result<(), DialogError> {
        if !self.has_destructor {
            return self.close().await;
        }

        self.record("destroy");
        if !self.teardown_delay.is_zero() {
            sleep(self.teardown_delay).await;
        }
        if self.destroy_fails {
            return Err(DialogError::Destroy {
                dialog: self.name.clone(),
                message: "mock destroy failure".to_string(),
            });
        }
        Ok(())
    }
}

/// Mock page module
///
/// Renders its name into the view on a successful load. A failing load
/// renders `"<name> (partial)"` first, the way a real page might leave half
/// its content behind before hitting an error.
#[derive(Debug)]
pub struct MockPage {
    name: String,
    log: CallLog,
    load_error: Option<String>,
    cleanup_error: Option<String>,
    hangs: bool,
    load_delay: Duration,
    cleanup_delay: Duration,
    opens_dialog: Option<String>,
    follow_up: Option<NavigationRequest>,
    load_count: AtomicUsize,
    cleanup_count: AtomicUsize,
    dirty_loads: AtomicUsize,
    last_params: Mutex<Option<Params>>,
}

impl MockPage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: CallLog::default(),
            load_error: None,
            cleanup_error: None,
            hangs: false,
            load_delay: Duration::ZERO,
            cleanup_delay: Duration::ZERO,
            opens_dialog: None,
            follow_up: None,
            load_count: AtomicUsize::new(0),
            cleanup_count: AtomicUsize::new(0),
            dirty_loads: AtomicUsize::new(0),
            last_params: Mutex::new(None),
        }
    }

    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    pub fn failing_load(mut self, message: impl Into<String>) -> Self {
        self.load_error = Some(message.into());
        self
    }

    pub fn failing_cleanup(mut self, message: impl Into<String>) -> Self {
        self.cleanup_error = Some(message.into());
        self
    }

    /// `load` never completes
    pub fn hanging(mut self) -> Self {
        self.hangs = true;
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = delay;
        self
    }

    /// Open a [`MockDialog`] with this name during `load`
    pub fn opening_dialog(mut self, name: impl Into<String>) -> Self {
        self.opens_dialog = Some(name.into());
        self
    }

    /// Queue this navigation from inside `load`
    pub fn requesting(mut self, request: NavigationRequest) -> Self {
        self.follow_up = Some(request);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanup_count.load(Ordering::SeqCst)
    }

    /// Loads that started with something already in the view container
    pub fn dirty_loads(&self) -> usize {
        self.dirty_loads.load(Ordering::SeqCst)
    }

    pub fn last_params(&self) -> Option<Params> {
        self.last_params
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Page for MockPage {
    async fn load(&self, ctx: PageContext) -> Result<()> {
        self.log.record(format!("load:{}", self.name));
        self.load_count.fetch_add(1, Ordering::SeqCst);
        if !ctx.view().is_empty() {
            self.dirty_loads.fetch_add(1, Ordering::SeqCst);
        }
        *self
            .last_params
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(ctx.params().clone());

        if !self.load_delay.is_zero() {
            sleep(self.load_delay).await;
        }
        if self.hangs {
            std::future::pending::<()>().await;
        }

        if let Some(dialog) = &self.opens_dialog {
            let dialog = MockDialog::new(dialog.clone()).with_log(self.log.clone());
            ctx.modals().open(move || dialog).await?;
        }

        if let Some(message) = &self.load_error {
            ctx.render(format!("{} (partial)", self.name));
            return Err(PageError::load(ctx.location(), message.clone()).into());
        }

        ctx.render(self.name.clone());

        if let Some(request) = &self.follow_up {
            ctx.navigate(request.clone())?;
        }
        Ok(())
    }
}

#[async_trait]
impl Cleanup for MockPage {
    async fn cleanup(&self) -> Result<()> {
        self.log.record(format!("cleanup:{}", self.name));
        self.cleanup_count.fetch_add(1, Ordering::SeqCst);

        if !self.cleanup_delay.is_zero() {
            sleep(self.cleanup_delay).await;
        }
        if let Some(message) = &self.cleanup_error {
            return Err(PageError::cleanup(self.name.clone(), message.clone()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_log_is_shared_between_clones() {
        let log = CallLog::default();
        let other = log.clone();
        log.record("load:a");
        other.record("load:b");

        assert_eq!(log.calls(), vec!["load:a", "load:b"]);
        assert_eq!(other.position("load:b"), Some(1));
        assert_eq!(log.count("load:a"), 1);

        other.clear();
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mock_dialog_without_destructor_closes_instead() {
        let log = CallLog::default();
        let mut dialog = MockDialog::new("toast")
            .without_destructor()
            .with_log(log.clone());

        dialog.destroy().await.unwrap();
        assert_eq!(log.calls(), vec!["close:toast"]);
    }

    #[tokio::test]
    async fn test_mock_page_cleanup_failure() {
        let page = MockPage::new("jobs").failing_cleanup("timer leaked");
        let result = page.cleanup().await;

        assert!(result.is_err());
        assert_eq!(page.cleanup_count(), 1);
    }
}
