//! Demo page modules and dialog for the script runner

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use libopshell::error::{DialogError, PageError, Result, RouteError};
use libopshell::modal::Dialog;
use libopshell::page::{Cleanup, Page, PageContext};
use libopshell::{RouteEntry, RouteTable};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Route table used by `opshell-nav`
pub fn routes(default_route: &str) -> std::result::Result<RouteTable, RouteError> {
    RouteTable::new(RouteEntry::new(default_route, Dashboard))?
        .route(RouteEntry::module("jobs", Arc::new(JobList::default())))?
        .route(RouteEntry::module("jobs/:id", Arc::new(JobDetail::default())))?
        .route(RouteEntry::new("invoices", Invoices))?
        .route(RouteEntry::new("broken", Broken))
}

pub struct Dashboard;

#[async_trait]
impl Page for Dashboard {
    async fn load(&self, ctx: PageContext) -> Result<()> {
        ctx.render("dashboard: 3 open jobs, 1 overdue invoice");
        Ok(())
    }
}

/// Job list with a background refresh
///
/// The refresh task lives outside the view container, so it is released in
/// `cleanup`.
#[derive(Default)]
pub struct JobList {
    refresh: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl Page for JobList {
    async fn load(&self, ctx: PageContext) -> Result<()> {
        ctx.render("jobs: #41 pending, #42 running, #43 done");

        let task = tokio::spawn(async {
            let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
            loop {
                ticker.tick().await;
                debug!("refreshing job list");
            }
        });
        let previous = self
            .refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }
}

#[async_trait]
impl Cleanup for JobList {
    async fn cleanup(&self) -> Result<()> {
        let task = self
            .refresh
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
            debug!("stopped job list refresh");
        }
        Ok(())
    }
}

/// Single job, addressed as `jobs/:id`
#[derive(Default)]
pub struct JobDetail {
    viewing: Mutex<Option<String>>,
}

#[async_trait]
impl Page for JobDetail {
    async fn load(&self, ctx: PageContext) -> Result<()> {
        let id = ctx
            .param("id")
            .ok_or_else(|| PageError::load(ctx.location(), "missing job id"))?
            .to_string();

        ctx.render(format!("job #{}", id));
        if let Some(return_to) = ctx.param("return_to") {
            ctx.render(format!("back to: {}", return_to));
        }

        *self
            .viewing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(id);
        Ok(())
    }
}

#[async_trait]
impl Cleanup for JobDetail {
    async fn cleanup(&self) -> Result<()> {
        let viewing = self
            .viewing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(id) = viewing {
            debug!(job = %id, "released job detail");
        }
        Ok(())
    }
}

pub struct Invoices;

#[async_trait]
impl Page for Invoices {
    async fn load(&self, ctx: PageContext) -> Result<()> {
        ctx.render("invoices: INV-7 overdue");
        Ok(())
    }
}

/// Always fails, to exercise the fallback path
pub struct Broken;

#[async_trait]
impl Page for Broken {
    async fn load(&self, ctx: PageContext) -> Result<()> {
        ctx.render("broken: loading...");
        Err(PageError::load(ctx.location(), "backend returned 503").into())
    }
}

/// Dialog that only logs its lifecycle
pub struct DemoDialog {
    name: String,
}

impl DemoDialog {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Dialog for DemoDialog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn show(&mut self) -> std::result::Result<(), DialogError> {
        info!(dialog = %self.name, "dialog shown");
        Ok(())
    }

    async fn close(&mut self) -> std::result::Result<(), DialogError> {
        info!(dialog = %self.name, "dialog closed");
        Ok(())
    }
}
