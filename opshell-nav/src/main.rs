//! opshell-nav - Replay navigation scripts against the lifecycle controller

mod demo;
mod script;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use libopshell::controller::{ControllerOptions, TransitionOutcome};
use libopshell::logging::LoggingConfig;
use libopshell::{
    AnimatedDialog, Controller, MemoryView, ModalRegistry, NavigationDriver, Navigator,
    ShellConfig, ShellError, ViewContainer,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::script::{Command, Step};

#[derive(Parser, Debug)]
#[command(name = "opshell-nav")]
#[command(version)]
#[command(about = "Replay navigation scripts against the opshell lifecycle controller")]
#[command(long_about = "\
opshell-nav - Replay navigation scripts against the opshell lifecycle controller

DESCRIPTION:
    Reads navigation commands, one per line, and applies them to a demo
    console with a dashboard, a job list, job details, invoices, and a page
    that always fails to load. Prints what each command did.

COMMANDS:
    go <location>                  Location changed (address bar, link)
    open <target> [key=value ...]  Programmatic navigation with parameters
    back | forward                 Move through history
    reload                         Re-run the current page
    dialog <name>                  Open a dialog
    close                          Close the active dialog

    Blank lines and lines starting with # are ignored.

USAGE:
    printf 'go jobs\\nopen jobs/42 return_to=jobs\\nback\\n' | opshell-nav
    opshell-nav --script walk.nav --format json

CONFIGURATION:
    Configuration file: ~/.config/opshell/config.toml (or OPSHELL_CONFIG)

EXIT CODES:
    0 - Script completed
    1 - Navigation or dialog error
    2 - Configuration error
    3 - Invalid script
")]
struct Cli {
    /// Script file (reads from stdin if not provided)
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Configuration file (overrides OPSHELL_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// What one script line did
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Effect {
    Transition {
        #[serde(flatten)]
        outcome: TransitionOutcome,
    },
    DialogOpened {
        dialog: String,
        id: u64,
    },
    DialogClosed {
        closed: bool,
    },
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    line: usize,
    command: &'a str,
    #[serde(flatten)]
    effect: Effect,
    view: Vec<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<ShellError>()
            .map(ShellError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.format != "text" && cli.format != "json" {
        return Err(ShellError::InvalidInput(format!(
            "Invalid output format '{}'. Valid options: text, json",
            cli.format
        ))
        .into());
    }

    let config = match &cli.config {
        Some(path) => ShellConfig::load_from_path(path)?,
        None => ShellConfig::load()?,
    };
    init_logging(&config, cli.verbose);

    let source = read_script(cli.script.as_ref())?;
    let steps = script::parse(&source)?;
    debug!(steps = steps.len(), "parsed navigation script");

    let routes = demo::routes(&config.navigation.default_route).map_err(ShellError::from)?;
    let view = MemoryView::shared();
    let mut controller = Controller::with_options(
        routes,
        view.clone(),
        ControllerOptions::from(&config),
    );
    let modals = Arc::clone(controller.modals());

    let initial = controller
        .start(&config.navigation.default_route)
        .await
        .map_err(ShellError::from)?;
    info!(route = ?initial.route(), "console started");

    let (driver, navigator) = NavigationDriver::new(controller);
    let driver = tokio::spawn(driver.run());

    let json = cli.format == "json";
    let result = replay(&steps, &navigator, &modals, &config, &*view, json).await;

    navigator.shutdown().map_err(ShellError::from)?;
    driver.await.context("navigation driver panicked")?;
    result
}

async fn replay(
    steps: &[Step],
    navigator: &Navigator,
    modals: &ModalRegistry,
    config: &ShellConfig,
    view: &dyn ViewContainer,
    json: bool,
) -> anyhow::Result<()> {
    for step in steps {
        let effect = match &step.command {
            Command::Navigate(trigger) => {
                let outcome = navigator
                    .request(trigger.clone())
                    .await
                    .map_err(ShellError::from)?;
                Effect::Transition { outcome }
            }
            Command::OpenDialog(name) => {
                let dialog = demo::DemoDialog::new(name.clone());
                let close_delay = config.dialogs.close_delay;
                let handle = modals
                    .open(move || AnimatedDialog::new(dialog, close_delay))
                    .await
                    .map_err(ShellError::from)?;
                Effect::DialogOpened {
                    dialog: handle.name().to_string(),
                    id: handle.id(),
                }
            }
            Command::CloseDialog => Effect::DialogClosed {
                closed: modals.close_active().await,
            },
        };

        let report = Report {
            line: step.line,
            command: &step.text,
            effect,
            view: view.snapshot(),
        };
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_text(&report);
        }
    }
    Ok(())
}

fn print_text(report: &Report<'_>) {
    let summary = match &report.effect {
        Effect::Transition { outcome } => match outcome {
            TransitionOutcome::Loaded { route, pattern } => {
                format!("loaded '{}' via '{}'", route, pattern)
            }
            TransitionOutcome::Unchanged { route } => format!("already on '{}'", route),
            TransitionOutcome::FellBack {
                requested,
                route,
                error,
            } => format!("'{}' failed ({}), fell back to '{}'", requested, error, route),
            TransitionOutcome::Ignored => "nothing to go to".to_string(),
        },
        Effect::DialogOpened { dialog, id } => format!("opened dialog '{}' (#{})", dialog, id),
        Effect::DialogClosed { closed: true } => "closed dialog".to_string(),
        Effect::DialogClosed { closed: false } => "no dialog open".to_string(),
    };

    println!("{:>3}: {} -> {}", report.line, report.command, summary);
    for fragment in &report.view {
        println!("     | {}", fragment);
    }
}

fn read_script(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("failed to read script from stdin")?;
            Ok(source)
        }
    }
}

/// Initialize logging from the `[logging]` section; output goes to stderr
fn init_logging(config: &ShellConfig, verbose: bool) {
    if let Err(e) = LoggingConfig::from_shell_config(config, verbose).try_init() {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
}
