//! Queued navigation
//!
//! A [`Controller`] only runs one transition at a time because it is borrowed
//! mutably for the duration. The [`NavigationDriver`] owns the controller and
//! applies triggers from a channel one after another; [`Navigator`] is the
//! cloneable sending half handed to pages and UI code.
//!
//! When several identical triggers are already waiting in the queue they are
//! applied once and every requester receives the same outcome.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::controller::{Controller, NavigationRequest, NavigationTrigger, TransitionOutcome};
use crate::error::NavigationError;

type Responder = oneshot::Sender<Result<TransitionOutcome, NavigationError>>;

#[derive(Debug)]
enum Command {
    Trigger {
        trigger: NavigationTrigger,
        respond_to: Option<Responder>,
    },
    Shutdown,
}

/// Handle for queueing navigation triggers
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: mpsc::UnboundedSender<Command>,
}

impl Navigator {
    /// Queue a trigger without waiting for it to run
    pub fn send(&self, trigger: NavigationTrigger) -> Result<(), NavigationError> {
        self.tx
            .send(Command::Trigger {
                trigger,
                respond_to: None,
            })
            .map_err(|_| NavigationError::DriverClosed)
    }

    /// Queue a trigger and wait for the transition it caused
    ///
    /// Never call this from inside a page's `load`: the driver is busy
    /// running that very load and would wait on itself.
    pub async fn request(
        &self,
        trigger: NavigationTrigger,
    ) -> Result<TransitionOutcome, NavigationError> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(Command::Trigger {
                trigger,
                respond_to: Some(respond_to),
            })
            .map_err(|_| NavigationError::DriverClosed)?;
        response.await.map_err(|_| NavigationError::DriverClosed)?
    }

    /// Report a location change, as the address bar would
    pub fn go(&self, location: impl Into<String>) -> Result<(), NavigationError> {
        self.send(NavigationTrigger::LocationChanged(location.into()))
    }

    pub fn navigate(&self, request: NavigationRequest) -> Result<(), NavigationError> {
        self.send(NavigationTrigger::Navigate(request))
    }

    pub fn back(&self) -> Result<(), NavigationError> {
        self.send(NavigationTrigger::Back)
    }

    pub fn forward(&self) -> Result<(), NavigationError> {
        self.send(NavigationTrigger::Forward)
    }

    pub fn reload(&self) -> Result<(), NavigationError> {
        self.send(NavigationTrigger::Reload)
    }

    /// Ask the driver to stop after the triggers queued before this one
    pub fn shutdown(&self) -> Result<(), NavigationError> {
        self.tx
            .send(Command::Shutdown)
            .map_err(|_| NavigationError::DriverClosed)
    }

    pub(crate) fn downgrade(&self) -> WeakNavigator {
        WeakNavigator {
            tx: self.tx.downgrade(),
        }
    }
}

/// Navigator that does not keep the driver alive
///
/// Held by the controller so that dropping every external [`Navigator`]
/// still ends [`NavigationDriver::run`].
#[derive(Debug, Clone)]
pub(crate) struct WeakNavigator {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl WeakNavigator {
    pub(crate) fn upgrade(&self) -> Option<Navigator> {
        self.tx.upgrade().map(|tx| Navigator { tx })
    }
}

/// Owns a controller and applies queued triggers in order
pub struct NavigationDriver {
    controller: Controller,
    rx: mpsc::UnboundedReceiver<Command>,
    held: Option<Command>,
}

impl NavigationDriver {
    pub fn new(mut controller: Controller) -> (Self, Navigator) {
        let (tx, rx) = mpsc::unbounded_channel();
        let navigator = Navigator { tx };
        controller.attach_navigator(navigator.downgrade());
        (
            Self {
                controller,
                rx,
                held: None,
            },
            navigator,
        )
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    async fn next_command(&mut self) -> Option<Command> {
        match self.held.take() {
            Some(command) => Some(command),
            None => self.rx.recv().await,
        }
    }

    /// Apply triggers until shut down or every navigator is dropped
    ///
    /// Returns the controller so its final state can be inspected.
    pub async fn run(mut self) -> Controller {
        info!("navigation driver started");

        while let Some(command) = self.next_command().await {
            let (trigger, respond_to) = match command {
                Command::Shutdown => {
                    info!("navigation driver shutting down");
                    break;
                }
                Command::Trigger {
                    trigger,
                    respond_to,
                } => (trigger, respond_to),
            };

            let mut responders: Vec<Responder> = respond_to.into_iter().collect();
            if trigger.is_coalescable() {
                self.absorb_duplicates(&trigger, &mut responders);
            }

            let result = self.controller.handle(trigger).await;
            if let Err(e) = &result {
                warn!(error = %e, "navigation failed");
            }
            for responder in responders {
                // Requester may have stopped waiting
                let _ = responder.send(result.clone());
            }
        }

        info!("navigation driver stopped");
        self.controller
    }

    /// Pull identical triggers already waiting behind `trigger`
    fn absorb_duplicates(&mut self, trigger: &NavigationTrigger, responders: &mut Vec<Responder>) {
        let mut absorbed = 0usize;
        while let Ok(next) = self.rx.try_recv() {
            let duplicate = matches!(
                &next,
                Command::Trigger { trigger: queued, .. } if queued == trigger
            );
            if !duplicate {
                self.held = Some(next);
                break;
            }
            if let Command::Trigger {
                respond_to: Some(respond_to),
                ..
            } = next
            {
                responders.push(respond_to);
            }
            absorbed += 1;
        }
        if absorbed > 0 {
            debug!(?trigger, absorbed, "coalesced duplicate triggers");
        }
    }
}
