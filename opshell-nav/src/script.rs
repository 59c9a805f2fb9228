//! Navigation script parsing
//!
//! One command per line. Blank lines and lines starting with `#` are skipped.

use std::str::FromStr;

use libopshell::controller::{NavigationRequest, NavigationTrigger};
use libopshell::ShellError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Navigate(NavigationTrigger),
    OpenDialog(String),
    CloseDialog,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| "empty command".to_string())?;
        let args: Vec<&str> = words.collect();

        match (verb, args.as_slice()) {
            // `go` alone means the default location
            ("go", []) => Ok(Command::Navigate(NavigationTrigger::LocationChanged(
                String::new(),
            ))),
            ("go", [token]) => Ok(Command::Navigate(NavigationTrigger::LocationChanged(
                token.to_string(),
            ))),
            ("open", [target, params @ ..]) => {
                let mut request = NavigationRequest::to(*target);
                for pair in params {
                    let (key, value) = pair
                        .split_once('=')
                        .ok_or_else(|| format!("expected key=value, got '{}'", pair))?;
                    if key.is_empty() {
                        return Err(format!("empty parameter name in '{}'", pair));
                    }
                    request = request.param(key, value);
                }
                Ok(Command::Navigate(NavigationTrigger::Navigate(request)))
            }
            ("back", []) => Ok(Command::Navigate(NavigationTrigger::Back)),
            ("forward", []) => Ok(Command::Navigate(NavigationTrigger::Forward)),
            ("reload", []) => Ok(Command::Navigate(NavigationTrigger::Reload)),
            ("dialog", [name]) => Ok(Command::OpenDialog(name.to_string())),
            ("close", []) => Ok(Command::CloseDialog),
            ("go" | "open" | "back" | "forward" | "reload" | "dialog" | "close", _) => {
                Err(format!("wrong number of arguments for '{}'", verb))
            }
            _ => Err(format!("unknown command '{}'", verb)),
        }
    }
}

/// A parsed command with the text and line it came from
#[derive(Debug, Clone)]
pub struct Step {
    pub line: usize,
    pub text: String,
    pub command: Command,
}

/// Parse a whole script, rejecting it at the first bad line
pub fn parse(script: &str) -> Result<Vec<Step>, ShellError> {
    let mut steps = Vec::new();
    for (index, raw) in script.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let command = text
            .parse::<Command>()
            .map_err(|e| ShellError::InvalidInput(format!("line {}: {}", index + 1, e)))?;
        steps.push(Step {
            line: index + 1,
            text: text.to_string(),
            command,
        });
    }
    Ok(steps)
}
