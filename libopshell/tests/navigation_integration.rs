//! Integration tests for queued navigation, history, dialogs and debouncing
//!
//! These go through the `NavigationDriver` the way an application would.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use libopshell::controller::{NavigationTrigger, TransitionOutcome};
use libopshell::mock::{CallLog, MockDialog, MockPage};
use libopshell::page::{page_fn, PageContext};
use libopshell::{
    Controller, DebounceGuard, MemoryView, ModalRegistry, NavigationDriver, NavigationRequest,
    RouteEntry, RouteTable,
};

fn routes(log: &CallLog) -> RouteTable {
    RouteTable::new(RouteEntry::module(
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
            MockPage::new("job")
                .with_load_delay(Duration::from_millis(20))
                .with_log(log.clone())
                .shared(),
        ))
    })
    .unwrap()
}

#[tokio::test]
async fn test_page_can_redirect_through_navigator() {
    let log = CallLog::default();
    let target = MockPage::new("invoice").with_log(log.clone()).shared();
    let routes = RouteTable::new(RouteEntry::new("", MockPage::new("home").shared()))
        .and_then(|t| {
            t.route(RouteEntry::module(
                "legacy",
                MockPage::new("legacy")
                    .requesting(NavigationRequest::to("invoices/9").param("return_to", "legacy"))
                    .with_log(log.clone())
                    .shared(),
            ))
        })
        .and_then(|t| t.route(RouteEntry::module("invoices/:id", target.clone())))
        .unwrap();
    let (driver, navigator) = NavigationDriver::new(Controller::new(routes, MemoryView::shared()));
    let handle = tokio::spawn(driver.run());

    navigator
        .request(NavigationTrigger::LocationChanged("legacy".to_string()))
        .await
        .unwrap();
    // The redirect was queued behind the first transition; this lands after it
    let settled = navigator
        .request(NavigationTrigger::LocationChanged("invoices/9".to_string()))
        .await
        .unwrap();
    assert!(matches!(settled, TransitionOutcome::Unchanged { .. }));
    navigator.shutdown().unwrap();
    let controller = handle.await.unwrap();

    let params = target.last_params().unwrap();
    assert_eq!(params["id"], "9");
    assert_eq!(params["return_to"], "legacy");
    assert!(log.position("load:legacy").unwrap() < log.position("cleanup:legacy").unwrap());
    assert!(log.position("cleanup:legacy").unwrap() < log.position("load:invoice").unwrap());
    assert_eq!(controller.history().entries(), &["legacy", "invoices/9"]);
}

#[tokio::test]
async fn test_concurrent_requests_never_overlap() {
    let log = CallLog::default();
    let (driver, navigator) =
        NavigationDriver::new(Controller::new(routes(&log), MemoryView::shared()));
    let handle = tokio::spawn(driver.run());

    let requests = (1..=5).map(|id| {
        let navigator = navigator.clone();
        async move {
            navigator
                .request(NavigationTrigger::LocationChanged(format!("jobs/{}", id)))
                .await
        }
    });
    let outcomes = join_all(requests).await;
    navigator.shutdown().unwrap();
    let controller = handle.await.unwrap();

    assert!(outcomes.iter().all(|o| o.is_ok()));
    // Every load but the last was followed by its cleanup before the next load
    let calls = log.calls();
    let relevant: Vec<&str> = calls
        .iter()
        .map(String::as_str)
        .filter(|c| *c == "load:job" || *c == "cleanup:job")
        .collect();
    let expected: Vec<&str> = ["load:job", "cleanup:job"]
        .iter()
        .copied()
        .cycle()
        .take(9)
        .collect();
    assert_eq!(relevant, expected);
    assert!(controller.current_route_key().starts_with("jobs/"));
}

#[tokio::test]
async fn test_duplicate_location_events_collapse_to_one_load() {
    let log = CallLog::default();
    let (driver, navigator) =
        NavigationDriver::new(Controller::new(routes(&log), MemoryView::shared()));

    for _ in 0..4 {
        navigator.go("jobs").unwrap();
    }
    navigator.shutdown().unwrap();
    driver.run().await;

    assert_eq!(log.count("load:jobs"), 1);
}

#[tokio::test]
async fn test_back_and_forward_rederive_target() {
    let log = CallLog::default();
    let (driver, navigator) =
        NavigationDriver::new(Controller::new(routes(&log), MemoryView::shared()));
    let handle = tokio::spawn(driver.run());

    navigator
        .request(NavigationTrigger::LocationChanged("jobs".to_string()))
        .await
        .unwrap();
    navigator
        .request(NavigationTrigger::LocationChanged("jobs/3".to_string()))
        .await
        .unwrap();

    let back = navigator.request(NavigationTrigger::Back).await.unwrap();
    assert_eq!(back.route(), Some("jobs"));
    let again = navigator.request(NavigationTrigger::Back).await.unwrap();
    assert_eq!(again, TransitionOutcome::Ignored);
    let forward = navigator.request(NavigationTrigger::Forward).await.unwrap();
    assert_eq!(forward.route(), Some("jobs/3"));

    navigator.shutdown().unwrap();
    handle.await.unwrap();
    assert_eq!(log.count("load:jobs"), 2);
}

#[tokio::test]
async fn test_fallback_replaces_failed_history_entry() {
    let routes = RouteTable::new(RouteEntry::new("", MockPage::new("home").shared()))
        .and_then(|t| t.route(RouteEntry::new("jobs", MockPage::new("jobs"))))
        .and_then(|t| t.route(RouteEntry::new("broken", MockPage::new("broken").failing_load("x"))))
        .unwrap();
    let mut controller = Controller::new(routes, MemoryView::shared());

    controller.start("jobs").await.unwrap();
    controller
        .handle(NavigationTrigger::LocationChanged("broken".to_string()))
        .await
        .unwrap();

    assert_eq!(controller.history().entries(), &["jobs", ""]);
    controller.handle(NavigationTrigger::Back).await.unwrap();
    assert_eq!(controller.current_route_key(), "jobs");
}

#[tokio::test]
async fn test_at_most_one_dialog_across_pages() {
    let log = CallLog::default();
    let registry = Arc::new(ModalRegistry::new());

    let mut handles = Vec::new();
    for name in ["picker", "confirm", "details"] {
        let dialog = MockDialog::new(name).with_log(log.clone());
        handles.push(registry.open(move || dialog).await.unwrap());
    }

    let active: Vec<_> = handles.iter().filter(|h| registry.is_active(h)).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name(), "details");
    assert_eq!(log.count("destroy:picker"), 1);
    assert_eq!(log.count("destroy:confirm"), 1);

    registry.close_active().await;
    registry.close_active().await;
    assert!(!registry.has_active());
    assert_eq!(log.count("destroy:details"), 1);
}

#[tokio::test]
async fn test_nested_click_fires_once_through_page_context() {
    let fired = CallLog::default();
    let recorder = fired.clone();
    let page = page_fn(move |ctx: PageContext| {
        let recorder = recorder.clone();
        async move {
            // Row and its nested button both report the same activation
            let now = Instant::now();
            for _ in 0..2 {
                if ctx
                    .debounce()
                    .should_fire_at("open-row-7", Duration::from_millis(300), now)
                {
                    recorder.record("open:row-7");
                }
            }
            Ok(())
        }
    });
    let routes = RouteTable::new(RouteEntry::new("", page)).unwrap();
    let mut controller = Controller::new(routes, MemoryView::shared());

    controller.start("").await.unwrap();
    assert_eq!(fired.count("open:row-7"), 1);
}

#[test]
fn test_debounce_threshold_separates_activations() {
    let guard = DebounceGuard::new(Duration::from_millis(300));
    let start = Instant::now();

    assert!(guard.should_fire_at("save", Duration::from_millis(300), start));
    assert!(!guard.should_fire_at("save", Duration::from_millis(300), start + Duration::from_millis(100)));
    assert!(guard.should_fire_at("save", Duration::from_millis(300), start + Duration::from_millis(400)));
}
