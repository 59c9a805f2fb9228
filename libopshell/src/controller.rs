//! Lifecycle orchestrator
//!
//! The controller is the only thing that moves the application from one page
//! to another. Every transition runs the same sequence:
//!
//! 1. skip if the target is already current (unless a reload was forced)
//! 2. force-close any live dialog
//! 3. run the outgoing page's cleanup
//! 4. clear the view container
//! 5. resolve the target through the route table
//! 6. load the destination, falling back to the default route on failure
//!
//! Steps 2 and 3 are fail-soft: their errors are logged and reported as
//! events, never returned. Steps 2 to 4 always finish before step 6 starts.
//!
//! # Reentrancy
//!
//! Every transition takes `&mut self`, so a controller cannot run two
//! transitions at once. Code that needs to navigate while a transition is
//! running (a page's `load`, an event handler) goes through a
//! [`Navigator`](crate::navigator::Navigator), whose requests are applied
//! one after another by the [`NavigationDriver`](crate::navigator::NavigationDriver).

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::ShellConfig;
use crate::debounce::DebounceGuard;
use crate::error::{NavigationError, PageError, ShellError};
use crate::events::{EventBus, EventReceiver, ShellEvent};
use crate::history::History;
use crate::modal::ModalRegistry;
use crate::navigator::WeakNavigator;
use crate::page::{Cleanup, PageContext};
use crate::route::{normalize_location, Params, ResolvedRoute, RouteTable};
use crate::view::SharedView;

/// Programmatic navigation request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub target: String,
    /// Extra parameters handed to the destination's `load`, e.g. an entity
    /// id and a `return_to` key. They override parameters parsed from the
    /// location on collision.
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub force_reload: bool,
}

impl NavigationRequest {
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn reload(mut self) -> Self {
        self.force_reload = true;
        self
    }
}

/// Inputs that can start a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationTrigger {
    /// The location changed outside the application (address bar, link)
    LocationChanged(String),
    /// Explicit request from application code
    Navigate(NavigationRequest),
    Back,
    Forward,
    /// Re-run the current page
    Reload,
}

impl NavigationTrigger {
    /// Triggers that may be collapsed when queued back to back
    pub fn is_coalescable(&self) -> bool {
        !matches!(self, NavigationTrigger::Back | NavigationTrigger::Forward)
    }
}

/// What a transition ended up doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// Target was already current; nothing was touched
    Unchanged { route: String },
    /// Target loaded and is now current
    Loaded { route: String, pattern: String },
    /// Target failed; the default route was loaded instead
    FellBack {
        requested: String,
        route: String,
        error: String,
    },
    /// Back/forward at the end of history
    Ignored,
}

impl TransitionOutcome {
    /// Key the controller ended on, if it moved
    pub fn route(&self) -> Option<&str> {
        match self {
            TransitionOutcome::Unchanged { route }
            | TransitionOutcome::Loaded { route, .. }
            | TransitionOutcome::FellBack { route, .. } => Some(route),
            TransitionOutcome::Ignored => None,
        }
    }
}

/// Controller phase
///
/// Only `Idle` is observable between calls. Entering `Recovering` is
/// announced with [`ShellEvent::RecoveryStarted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning,
    /// Loading the default route after the target failed
    Recovering,
}

/// Cleanup registered by the page currently on screen
#[derive(Clone)]
pub struct ActiveCleanup {
    pub route: String,
    pub cleanup: Arc<dyn Cleanup>,
}

impl std::fmt::Debug for ActiveCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveCleanup")
            .field("route", &self.route)
            .finish()
    }
}

/// State owned exclusively by the controller
///
/// `active_cleanup`, when set, always belongs to the page whose content is
/// in the view container.
#[derive(Debug, Clone, Default)]
pub struct NavigationState {
    pub current_route_key: String,
    pub active_cleanup: Option<ActiveCleanup>,
    pub force_reload: bool,
}

/// Tunables for a [`Controller`]
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Watchdog on a destination's `load`; exceeding it counts as a failure
    pub load_timeout: Option<Duration>,
    pub history_limit: usize,
    pub debounce_threshold: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            load_timeout: None,
            history_limit: 50,
            debounce_threshold: Duration::from_millis(300),
        }
    }
}

impl From<&ShellConfig> for ControllerOptions {
    fn from(config: &ShellConfig) -> Self {
        Self {
            load_timeout: config.navigation.load_timeout,
            history_limit: config.navigation.history_limit,
            debounce_threshold: config.debounce.threshold,
        }
    }
}

/// Navigation and resource-lifecycle controller
pub struct Controller {
    routes: Arc<RouteTable>,
    view: SharedView,
    modals: Arc<ModalRegistry>,
    debounce: Arc<DebounceGuard>,
    events: EventBus,
    navigator: Option<WeakNavigator>,
    history: History,
    state: NavigationState,
    phase: Phase,
    options: ControllerOptions,
}

impl Controller {
    /// Controller with default options and its own event bus
    pub fn new(routes: RouteTable, view: SharedView) -> Self {
        Self::with_options(routes, view, ControllerOptions::default())
    }

    pub fn with_options(routes: RouteTable, view: SharedView, options: ControllerOptions) -> Self {
        let events = EventBus::default();
        let modals = Arc::new(ModalRegistry::with_events(events.clone()));
        let debounce = Arc::new(DebounceGuard::new(options.debounce_threshold));
        Self {
            routes: Arc::new(routes),
            view,
            modals,
            debounce,
            events,
            navigator: None,
            history: History::new(options.history_limit),
            state: NavigationState::default(),
            phase: Phase::Idle,
            options,
        }
    }

    /// Share an existing event bus; the modal registry is rebuilt onto it
    ///
    /// Call before any dialog is opened.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.modals = Arc::new(ModalRegistry::with_events(events.clone()));
        self.events = events;
        self
    }

    /// Navigator injected into every page context
    pub(crate) fn attach_navigator(&mut self, navigator: WeakNavigator) {
        self.navigator = Some(navigator);
    }

    /// Load the initial location
    ///
    /// Forces the transition so that booting onto the default key still
    /// runs its page.
    pub async fn start(
        &mut self,
        location: &str,
    ) -> Result<TransitionOutcome, NavigationError> {
        self.history.push(normalize_location(location));
        self.state.force_reload = true;
        self.transition(location).await
    }

    /// Single entry point for every navigation trigger
    pub async fn handle(
        &mut self,
        trigger: NavigationTrigger,
    ) -> Result<TransitionOutcome, NavigationError> {
        debug!(?trigger, "navigation trigger");
        match trigger {
            NavigationTrigger::LocationChanged(location) => {
                self.history.push(normalize_location(&location));
                self.transition(&location).await
            }
            NavigationTrigger::Navigate(request) => {
                self.history.push(normalize_location(&request.target));
                self.navigate(request).await
            }
            NavigationTrigger::Back => match self.history.back().map(str::to_string) {
                Some(location) => self.transition(&location).await,
                None => Ok(TransitionOutcome::Ignored),
            },
            NavigationTrigger::Forward => match self.history.forward().map(str::to_string) {
                Some(location) => self.transition(&location).await,
                None => Ok(TransitionOutcome::Ignored),
            },
            NavigationTrigger::Reload => {
                self.state.force_reload = true;
                let current = self.state.current_route_key.clone();
                self.transition(&current).await
            }
        }
    }

    /// Transition to a location
    pub async fn transition(
        &mut self,
        target: &str,
    ) -> Result<TransitionOutcome, NavigationError> {
        self.navigate(NavigationRequest::to(target)).await
    }

    /// Transition with request parameters
    ///
    /// Only fails when the default route itself fails to load while
    /// recovering from another failure.
    pub async fn navigate(
        &mut self,
        request: NavigationRequest,
    ) -> Result<TransitionOutcome, NavigationError> {
        if request.force_reload {
            self.state.force_reload = true;
        }

        let target = normalize_location(&request.target);
        if target == self.state.current_route_key && !self.state.force_reload {
            debug!(route = %target, "already current, skipping transition");
            self.events.emit(ShellEvent::TransitionSkipped { to: target.clone() });
            return Ok(TransitionOutcome::Unchanged { route: target });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("transition", id = %id, target = %target);
        self.run_transition(id, target, request.params)
            .instrument(span)
            .await
    }

    async fn run_transition(
        &mut self,
        id: String,
        target: String,
        params: Params,
    ) -> Result<TransitionOutcome, NavigationError> {
        self.phase = Phase::Transitioning;
        info!(from = %self.state.current_route_key, "transition started");
        self.events.emit(ShellEvent::TransitionStarted {
            id: id.clone(),
            from: self.state.current_route_key.clone(),
            to: target.clone(),
        });

        self.teardown_current().await;

        let resolved = self.routes.resolve(&target);
        if resolved.is_fallback {
            debug!("no route matched, loading default route");
        }
        let mut load_params = resolved.params.clone();
        load_params.extend(params);

        match self.load(&target, &resolved, load_params).await {
            Ok(()) => {
                self.state.current_route_key = target.clone();
                self.state.active_cleanup =
                    resolved.cleanup.clone().map(|cleanup| ActiveCleanup {
                        route: target.clone(),
                        cleanup,
                    });
                self.state.force_reload = false;
                self.phase = Phase::Idle;

                info!(pattern = %resolved.pattern, "transition completed");
                self.events.emit(ShellEvent::TransitionCompleted {
                    id,
                    route: target.clone(),
                });
                Ok(TransitionOutcome::Loaded {
                    route: target,
                    pattern: resolved.pattern,
                })
            }
            Err(e) => self.recover(id, target, &resolved, e).await,
        }
    }

    /// Steps 2 to 4: close dialogs, clean up the outgoing page, clear the view
    async fn teardown_current(&mut self) {
        self.modals.close_active().await;

        // Taken before running so the state never points at a page that is gone
        if let Some(active) = self.state.active_cleanup.take() {
            self.run_cleanup(&active.route, active.cleanup.as_ref()).await;
        }

        self.view.clear();
    }

    async fn run_cleanup(&self, route: &str, cleanup: &dyn Cleanup) {
        if let Err(e) = cleanup.cleanup().await {
            warn!(route, error = %e, "page cleanup failed, continuing navigation");
            self.events.emit(ShellEvent::CleanupFailed {
                route: route.to_string(),
                error: e.to_string(),
            });
        }
    }

    async fn load(
        &self,
        location: &str,
        resolved: &ResolvedRoute,
        params: Params,
    ) -> Result<(), ShellError> {
        let ctx = self.context(location, &resolved.pattern, params);
        let load = resolved.page.load(ctx);

        match self.options.load_timeout {
            Some(after) => match tokio::time::timeout(after, load).await {
                Ok(result) => result,
                Err(_) => Err(PageError::Timeout {
                    route: location.to_string(),
                    after,
                }
                .into()),
            },
            None => load.await,
        }
    }

    /// Load the default route after the target failed
    async fn recover(
        &mut self,
        id: String,
        requested: String,
        failed: &ResolvedRoute,
        failure: ShellError,
    ) -> Result<TransitionOutcome, NavigationError> {
        self.phase = Phase::Recovering;
        error!(route = %requested, error = %failure, "page failed to load, falling back to default route");
        self.events.emit(ShellEvent::RecoveryStarted {
            id: id.clone(),
            requested: requested.clone(),
        });

        // Whatever the failed page managed to acquire is released before the
        // default page starts, so it sees a clean slate too
        self.modals.close_active().await;
        if let Some(cleanup) = &failed.cleanup {
            self.run_cleanup(&requested, cleanup.as_ref()).await;
        }
        self.view.clear();

        let default_key = self.routes.default_key();
        let default = self.routes.default_route();
        let fallback = if Arc::ptr_eq(&failed.page, &default.page) {
            // The page that just failed is the default one; loading it again
            // would only repeat the failure
            Err(failure.to_string())
        } else {
            let ctx = self.context(&default_key, &default.pattern, Params::new());
            default.page.load(ctx).await.map_err(|e| e.to_string())
        };

        match fallback {
            Ok(()) => {
                self.state.current_route_key = default_key.clone();
                self.state.active_cleanup = None;
                self.state.force_reload = false;
                self.phase = Phase::Idle;
                if self.history.current() == Some(requested.as_str()) {
                    self.history.replace_current(default_key.clone());
                }

                let error = failure.to_string();
                self.events.emit(ShellEvent::TransitionFellBack {
                    id,
                    requested: requested.clone(),
                    error: error.clone(),
                });
                Ok(TransitionOutcome::FellBack {
                    requested,
                    route: default_key,
                    error,
                })
            }
            Err(default_failure) => {
                error!(error = %default_failure, "default route failed to load");
                // Nothing trustworthy is on screen; the next transition must run
                self.state.current_route_key = default_key;
                self.state.active_cleanup = None;
                self.state.force_reload = true;
                self.phase = Phase::Idle;
                Err(NavigationError::DefaultRouteFailed {
                    requested,
                    source_message: default_failure,
                })
            }
        }
    }

    fn context(&self, location: &str, pattern: &str, params: Params) -> PageContext {
        PageContext::new(
            location,
            pattern,
            params,
            Arc::clone(&self.view),
            Arc::clone(&self.modals),
            Arc::clone(&self.debounce),
        )
        .with_navigator(self.navigator.as_ref().and_then(WeakNavigator::upgrade))
    }

    /// Make the next same-key transition run anyway
    pub fn set_force_reload(&mut self) {
        self.state.force_reload = true;
    }

    pub fn current_route_key(&self) -> &str {
        &self.state.current_route_key
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn view(&self) -> &SharedView {
        &self.view
    }

    pub fn modals(&self) -> &Arc<ModalRegistry> {
        &self.modals
    }

    pub fn debounce(&self) -> &Arc<DebounceGuard> {
        &self.debounce
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{CallLog, MockDialog, MockPage};
    use crate::page::page_fn;
    use crate::route::RouteEntry;
    use crate::view::{MemoryView, ViewContainer};
    use std::sync::Mutex;

    fn controller(log: &CallLog) -> Controller {
        let routes = RouteTable::new(RouteEntry::module(
            "",
            MockPage::new("home").with_log(log.clone()).shared(),
        ))
        .and_then(|t| {
            t.route(RouteEntry::module(
                "jobs",
                MockPage::new("jobs").with_log(log.clone()).shared(),
            ))
        })
        .and_then(|t| {
            t.route(RouteEntry::module(
                "jobs/:id",
                MockPage::new("job").with_log(log.clone()).shared(),
            ))
        })
        .unwrap();
        Controller::new(routes, MemoryView::shared())
    }

    #[tokio::test]
    async fn test_initial_state() {
        let log = CallLog::default();
        let controller = controller(&log);

        assert_eq!(controller.current_route_key(), "");
        assert_eq!(controller.phase(), Phase::Idle);
        assert!(controller.state().active_cleanup.is_none());
        assert!(!controller.state().force_reload);
    }

    #[tokio::test]
    async fn test_start_loads_default_even_though_key_matches() {
        let log = CallLog::default();
        let mut controller = controller(&log);

        let outcome = controller.start("").await.unwrap();

        assert!(matches!(outcome, TransitionOutcome::Loaded { .. }));
        assert_eq!(log.count("load:home"), 1);
        assert!(!controller.state().force_reload);
    }

    #[tokio::test]
    async fn test_same_key_is_noop() {
        let log = CallLog::default();
        let mut controller = controller(&log);

        controller.transition("jobs").await.unwrap();
        let outcome = controller.transition("#/jobs").await.unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Unchanged {
                route: "jobs".to_string()
            }
        );
        assert_eq!(log.count("load:jobs"), 1);
        assert_eq!(log.count("cleanup:jobs"), 0);
    }

    #[tokio::test]
    async fn test_params_reach_the_page() {
        let log = CallLog::default();
        let page = MockPage::new("job").with_log(log.clone()).shared();
        let routes = RouteTable::new(RouteEntry::new("", MockPage::new("home").shared()))
            .and_then(|t| t.route(RouteEntry::module("jobs/:id", page.clone())))
            .unwrap();
        let mut controller = Controller::new(routes, MemoryView::shared());

        controller
            .navigate(NavigationRequest::to("jobs/42").param("return_to", "jobs"))
            .await
            .unwrap();

        let params = page.last_params().unwrap();
        assert_eq!(params["id"], "42");
        assert_eq!(params["return_to"], "jobs");
    }

    #[tokio::test]
    async fn test_transition_closes_open_dialog() {
        let log = CallLog::default();
        let mut controller = controller(&log);
        controller.transition("jobs").await.unwrap();

        let dialog = MockDialog::new("confirm").with_log(log.clone());
        controller.modals().open(move || dialog).await.unwrap();

        controller.transition("jobs/7").await.unwrap();

        assert!(!controller.modals().has_active());
        let calls = log.calls();
        let destroyed = calls.iter().position(|c| c == "destroy:confirm").unwrap();
        let cleaned = calls.iter().position(|c| c == "cleanup:jobs").unwrap();
        let loaded = calls.iter().position(|c| c == "load:job").unwrap();
        assert!(destroyed < cleaned && cleaned < loaded);
    }

    #[tokio::test]
    async fn test_view_is_cleared_between_pages() {
        let log = CallLog::default();
        let mut controller = controller(&log);

        controller.transition("jobs").await.unwrap();
        controller.transition("jobs/1").await.unwrap();

        assert_eq!(controller.view().snapshot(), vec!["job"]);
    }

    #[tokio::test]
    async fn test_active_cleanup_tracks_current_page() {
        let log = CallLog::default();
        let routes = RouteTable::new(RouteEntry::new("", MockPage::new("home").shared()))
            .and_then(|t| {
                t.route(RouteEntry::module(
                    "jobs",
                    MockPage::new("jobs").with_log(log.clone()).shared(),
                ))
            })
            .unwrap();
        let mut controller = Controller::new(routes, MemoryView::shared());

        controller.transition("jobs").await.unwrap();
        assert_eq!(
            controller.state().active_cleanup.as_ref().map(|a| a.route.as_str()),
            Some("jobs")
        );

        controller.transition("").await.unwrap();
        assert!(controller.state().active_cleanup.is_none());
        assert_eq!(log.count("cleanup:jobs"), 1);
    }

    #[tokio::test]
    async fn test_reload_trigger_reruns_current_page() {
        let log = CallLog::default();
        let mut controller = controller(&log);

        controller.transition("jobs").await.unwrap();
        controller.handle(NavigationTrigger::Reload).await.unwrap();

        assert_eq!(log.count("load:jobs"), 2);
        assert_eq!(log.count("cleanup:jobs"), 1);
        assert!(!controller.state().force_reload);
    }

    #[tokio::test]
    async fn test_back_and_forward_follow_history() {
        let log = CallLog::default();
        let mut controller = controller(&log);

        controller.start("").await.unwrap();
        controller
            .handle(NavigationTrigger::LocationChanged("jobs".to_string()))
            .await
            .unwrap();
        controller
            .handle(NavigationTrigger::LocationChanged("jobs/3".to_string()))
            .await
            .unwrap();

        controller.handle(NavigationTrigger::Back).await.unwrap();
        assert_eq!(controller.current_route_key(), "jobs");

        controller.handle(NavigationTrigger::Back).await.unwrap();
        assert_eq!(controller.current_route_key(), "");

        let outcome = controller.handle(NavigationTrigger::Back).await.unwrap();
        assert_eq!(outcome, TransitionOutcome::Ignored);

        controller.handle(NavigationTrigger::Forward).await.unwrap();
        assert_eq!(controller.current_route_key(), "jobs");
    }

    #[tokio::test]
    async fn test_unknown_location_loads_default_page_under_requested_key() {
        let log = CallLog::default();
        let mut controller = controller(&log);

        let outcome = controller.transition("reports").await.unwrap();

        assert_eq!(
            outcome,
            TransitionOutcome::Loaded {
                route: "reports".to_string(),
                pattern: String::new(),
            }
        );
        assert_eq!(log.count("load:home"), 1);
    }

    #[tokio::test]
    async fn test_events_describe_transition() {
        let log = CallLog::default();
        let mut controller = controller(&log);
        let mut events = controller.subscribe();

        controller.transition("jobs").await.unwrap();
        controller.transition("jobs").await.unwrap();

        assert!(matches!(
            events.recv().await.unwrap(),
            ShellEvent::TransitionStarted { ref to, .. } if to == "jobs"
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            ShellEvent::TransitionCompleted { ref route, .. } if route == "jobs"
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            ShellEvent::TransitionSkipped { .. }
        ));
    }

    #[tokio::test]
    async fn test_dialog_opened_during_in_flight_close_does_not_survive_transition() {
        let log = CallLog::default();
        let mut controller = controller(&log);
        controller.transition("jobs").await.unwrap();

        let slow = MockDialog::new("x")
            .with_teardown_delay(Duration::from_millis(100))
            .with_log(log.clone());
        controller.modals().open(move || slow).await.unwrap();
        let closing = {
            let modals = Arc::clone(controller.modals());
            tokio::spawn(async move { modals.close_active().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let late = MockDialog::new("y").with_log(log.clone());
        controller.modals().open(move || late).await.unwrap();

        controller.transition("jobs/7").await.unwrap();

        assert!(!controller.modals().has_active());
        assert!(closing.await.unwrap());
        assert_eq!(log.count("destroy:x"), 1);
        assert_eq!(log.count("destroy:y"), 1);
        let calls = log.calls();
        let destroyed = calls.iter().position(|c| c == "destroy:y").unwrap();
        let loaded = calls.iter().position(|c| c == "load:job").unwrap();
        assert!(destroyed < loaded);
    }

    #[tokio::test]
    async fn test_default_page_loads_while_recovering() {
        let seen = CallLog::default();
        let recorder = seen.clone();
        let receiver: Arc<Mutex<Option<EventReceiver>>> = Arc::new(Mutex::new(None));
        let observed = Arc::clone(&receiver);
        let home = page_fn(move |_ctx: PageContext| {
            if let Some(events) = observed.lock().unwrap().as_mut() {
                while let Ok(event) = events.try_recv() {
                    if let ShellEvent::RecoveryStarted { requested, .. } = event {
                        recorder.record(format!("recovering:{}", requested));
                    }
                }
            }
            async { Ok(()) }
        });
        let routes = RouteTable::new(RouteEntry::new("", home))
            .and_then(|t| t.route(RouteEntry::new("broken", MockPage::new("broken").failing_load("x"))))
            .unwrap();
        let mut controller = Controller::new(routes, MemoryView::shared());
        *receiver.lock().unwrap() = Some(controller.subscribe());

        let outcome = controller.transition("broken").await.unwrap();

        assert!(matches!(outcome, TransitionOutcome::FellBack { .. }));
        assert_eq!(seen.calls(), vec!["recovering:broken"]);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_back_after_fallback_leaves_default_page() {
        let log = CallLog::default();
        let routes = RouteTable::new(RouteEntry::module(
            "",
            MockPage::new("home").with_log(log.clone()).shared(),
        ))
        .and_then(|t| {
            t.route(RouteEntry::module(
                "jobs",
                MockPage::new("jobs").with_log(log.clone()).shared(),
            ))
        })
        .and_then(|t| t.route(RouteEntry::new("broken", MockPage::new("broken").failing_load("x"))))
        .unwrap();
        let mut controller = Controller::new(routes, MemoryView::shared());

        controller.start("jobs").await.unwrap();
        for location in ["", "broken"] {
            controller
                .handle(NavigationTrigger::LocationChanged(location.to_string()))
                .await
                .unwrap();
        }
        assert_eq!(controller.history().entries(), &["jobs", ""]);

        let back = controller.handle(NavigationTrigger::Back).await.unwrap();
        assert_eq!(back.route(), Some("jobs"));
        assert_eq!(controller.current_route_key(), "jobs");
        assert_eq!(log.count("load:jobs"), 2);
    }

    #[test]
    fn test_options_from_config() {
        let mut config = ShellConfig::default();
        config.navigation.load_timeout = Some(Duration::from_secs(2));
        config.navigation.history_limit = 5;

        let options = ControllerOptions::from(&config);
        assert_eq!(options.load_timeout, Some(Duration::from_secs(2)));
        assert_eq!(options.history_limit, 5);
        assert_eq!(options.debounce_threshold, Duration::from_millis(300));
    }

    #[test]
    fn test_coalescable_triggers() {
        assert!(NavigationTrigger::Reload.is_coalescable());
        assert!(NavigationTrigger::LocationChanged("a".to_string()).is_coalescable());
        assert!(!NavigationTrigger::Back.is_coalescable());
        assert!(!NavigationTrigger::Forward.is_coalescable());
    }
}
