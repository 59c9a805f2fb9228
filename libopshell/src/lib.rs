//! opshell - navigation and resource lifecycle for an operations console
//!
//! This library decides which page module is on screen and makes sure the
//! previous one is fully torn down first: its dialog closed, its private
//! resources released, its content cleared. Pages plug in through the
//! [`Page`] and [`Cleanup`] traits and are registered in a [`RouteTable`].

pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod events;
pub mod history;
pub mod logging;
pub mod mock;
pub mod modal;
pub mod navigator;
pub mod page;
pub mod route;
pub mod view;

// Re-export commonly used types
pub use config::ShellConfig;
pub use controller::{
    Controller, ControllerOptions, NavigationRequest, NavigationTrigger, TransitionOutcome,
};
pub use debounce::DebounceGuard;
pub use error::{NavigationError, Result, ShellError};
pub use events::{EventBus, ShellEvent};
pub use modal::{AnimatedDialog, Dialog, ModalHandle, ModalRegistry};
pub use navigator::{NavigationDriver, Navigator};
pub use page::{Cleanup, Page, PageContext};
pub use route::{Params, RouteEntry, RouteTable};
pub use view::{MemoryView, SharedView, ViewContainer};
