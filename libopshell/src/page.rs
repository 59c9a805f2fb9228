//! Page module contract
//!
//! Every leaf feature (a table view, a detail view, ...) is driven by the
//! controller through two calls: [`Page::load`] renders into the shared view
//! container, and the optional [`Cleanup::cleanup`] releases whatever `load`
//! acquired outside that container (timers, widget instances, listeners).
//!
//! Pages never read ambient globals. Everything they may touch is handed to
//! them in a [`PageContext`].
//!
//! # Examples
//!
//! ```
//! use libopshell::page::{cleanup_fn, page_fn, PageContext};
//! use libopshell::route::RouteEntry;
//!
//! let entry = RouteEntry::new(
//!     "jobs/:id",
//!     page_fn(|ctx: PageContext| async move {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         ctx.render(format!("job {}", id));
//!         Ok(())
//!     }),
//! )
//! .with_cleanup(cleanup_fn(|| async { Ok(()) }));
//!
//! assert!(entry.has_cleanup());
//! ```

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

use crate::controller::NavigationRequest;
use crate::debounce::DebounceGuard;
use crate::error::{NavigationError, Result};
use crate::modal::ModalRegistry;
use crate::navigator::Navigator;
use crate::route::Params;
use crate::view::SharedView;

/// Builds a page's content
#[async_trait]
pub trait Page: Send + Sync {
    /// Render into `ctx.view()`
    ///
    /// Must not assume anything about what was on screen before; the
    /// container is always empty when this is called.
    async fn load(&self, ctx: PageContext) -> Result<()>;
}

/// Releases a page's private resources
#[async_trait]
pub trait Cleanup: Send + Sync {
    /// Must be safe to call even if `load` failed halfway
    async fn cleanup(&self) -> Result<()>;
}

#[async_trait]
impl<T: Page + ?Sized> Page for Arc<T> {
    async fn load(&self, ctx: PageContext) -> Result<()> {
        (**self).load(ctx).await
    }
}

#[async_trait]
impl<T: Cleanup + ?Sized> Cleanup for Arc<T> {
    async fn cleanup(&self) -> Result<()> {
        (**self).cleanup().await
    }
}

/// Everything a page is allowed to touch while loading
#[derive(Clone)]
pub struct PageContext {
    location: String,
    pattern: String,
    params: Params,
    view: SharedView,
    modals: Arc<ModalRegistry>,
    debounce: Arc<DebounceGuard>,
    navigator: Option<Navigator>,
}

impl PageContext {
    pub fn new(
        location: impl Into<String>,
        pattern: impl Into<String>,
        params: Params,
        view: SharedView,
        modals: Arc<ModalRegistry>,
        debounce: Arc<DebounceGuard>,
    ) -> Self {
        Self {
            location: location.into(),
            pattern: pattern.into(),
            params,
            view,
            modals,
            debounce,
            navigator: None,
        }
    }

    pub fn with_navigator(mut self, navigator: Option<Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// The location being loaded, normalized
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Pattern of the route that matched
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn view(&self) -> &SharedView {
        &self.view
    }

    /// Shorthand for `ctx.view().render(..)`
    pub fn render(&self, fragment: impl Into<String>) {
        self.view.render(fragment.into());
    }

    pub fn modals(&self) -> &Arc<ModalRegistry> {
        &self.modals
    }

    pub fn debounce(&self) -> &Arc<DebounceGuard> {
        &self.debounce
    }

    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }

    /// Queue a navigation to run after the current transition finishes
    ///
    /// Pages must not wait for the result: the transition that would apply
    /// it is the one currently running their `load`.
    pub fn navigate(&self, request: NavigationRequest) -> std::result::Result<(), NavigationError> {
        match &self.navigator {
            Some(navigator) => navigator.navigate(request),
            None => Err(NavigationError::DriverClosed),
        }
    }
}

/// Page backed by an async closure
pub struct PageFn<F> {
    load: F,
}

/// Wrap an async closure as a [`Page`]
pub fn page_fn<F, Fut>(load: F) -> PageFn<F>
where
    F: Fn(PageContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    PageFn { load }
}

#[async_trait]
impl<F, Fut> Page for PageFn<F>
where
    F: Fn(PageContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn load(&self, ctx: PageContext) -> Result<()> {
        (self.load)(ctx).await
    }
}

/// Cleanup backed by an async closure
pub struct CleanupFn<F> {
    cleanup: F,
}

/// Wrap an async closure as a [`Cleanup`]
pub fn cleanup_fn<F, Fut>(cleanup: F) -> CleanupFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    CleanupFn { cleanup }
}

#[async_trait]
impl<F, Fut> Cleanup for CleanupFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn cleanup(&self) -> Result<()> {
        (self.cleanup)().await
    }
}
