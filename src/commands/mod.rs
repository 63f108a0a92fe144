//! Prefix command router shared by the Discord and Minecraft sides.
//!
//! Each side registers an explicit list of handlers at startup. The
//! registry is immutable afterwards.

use std::collections::HashMap;

use serenity::async_trait;
use tracing::{info, warn};

use crate::common::error::CommandError;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Who typed the command (Discord display name or player name).
    pub actor: String,
    /// Lower-cased command name as typed (may be an alias).
    pub name: String,
    pub args: Vec<String>,
    /// The full original line, prefix included.
    pub raw: String,
}

impl Invocation {
    /// Arguments re-joined with single spaces.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }
}

/// A single command.
#[async_trait]
pub trait CommandHandler<C: Send + Sync>: Send + Sync {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn description(&self) -> &'static str;

    async fn on_command(&self, ctx: &C, invocation: &Invocation) -> anyhow::Result<()>;
}

/// Name, aliases and description of a registered command, for help output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSummary {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
}

impl CommandSummary {
    pub fn of<C: Send + Sync>(handler: &dyn CommandHandler<C>) -> Self {
        Self {
            name: handler.name(),
            aliases: handler.aliases(),
            description: handler.description(),
        }
    }
}

/// Boxed handler list, in registration order.
pub type Registry<C> = Vec<Box<dyn CommandHandler<C>>>;

/// Dispatches prefixed lines to registered handlers.
pub struct CommandRouter<C: Send + Sync> {
    prefix: String,
    handlers: Registry<C>,
    by_name: HashMap<&'static str, usize>,
}

impl<C: Send + Sync> CommandRouter<C> {
    /// Build a router. Fails if two handlers share a name.
    pub fn new(prefix: impl Into<String>, handlers: Registry<C>) -> Result<Self, CommandError> {
        let mut by_name = HashMap::with_capacity(handlers.len());

        for (index, handler) in handlers.iter().enumerate() {
            if by_name.insert(handler.name(), index).is_some() {
                return Err(CommandError::DuplicateName {
                    name: handler.name().to_string(),
                });
            }
        }

        // Aliases resolve in registration order, so an alias taken by an
        // earlier handler (or by any name) is unreachable for later ones.
        for (index, handler) in handlers.iter().enumerate() {
            for alias in handler.aliases() {
                let shadowed_by = by_name.get(alias).copied().or_else(|| {
                    handlers[..index]
                        .iter()
                        .position(|earlier| earlier.aliases().contains(alias))
                });
                if let Some(owner) = shadowed_by {
                    warn!(
                        alias = alias,
                        command = handler.name(),
                        owner = handlers[owner].name(),
                        "Command alias is already taken and will never dispatch here"
                    );
                }
            }
        }

        Ok(Self {
            prefix: prefix.into(),
            handlers,
            by_name,
        })
    }

    #[cfg(test)]
    pub fn summaries(&self) -> Vec<CommandSummary> {
        self.handlers
            .iter()
            .map(|handler| CommandSummary::of(handler.as_ref()))
            .collect()
    }

    fn find(&self, name: &str) -> Option<&dyn CommandHandler<C>> {
        if let Some(index) = self.by_name.get(name) {
            return Some(self.handlers[*index].as_ref());
        }
        self.handlers
            .iter()
            .find(|handler| handler.aliases().contains(&name))
            .map(|handler| handler.as_ref())
    }

    /// Parse `raw` and dispatch it.
    ///
    /// Returns `Ok(false)` when the line is not a known command. Once a
    /// handler is matched the result is `Ok(true)` unless the handler
    /// itself returned an error.
    pub async fn handle(&self, ctx: &C, actor: &str, raw: &str) -> anyhow::Result<bool> {
        let Some(body) = raw.strip_prefix(self.prefix.as_str()) else {
            return Ok(false);
        };

        let mut tokens = body.split_whitespace();
        let Some(name) = tokens.next().map(str::to_lowercase) else {
            return Ok(false);
        };

        let Some(handler) = self.find(&name) else {
            return Ok(false);
        };

        info!("{} - [{}] {}", actor, handler.name(), raw);

        let invocation = Invocation {
            actor: actor.to_string(),
            name,
            args: tokens.map(str::to_string).collect(),
            raw: raw.to_string(),
        };
        handler.on_command(ctx, &invocation).await?;

        Ok(true)
    }
}

/// Render a help listing, one line per command.
pub fn help_lines(prefix: &str, summaries: &[CommandSummary]) -> Vec<String> {
    summaries
        .iter()
        .map(|summary| {
            let aliases = if summary.aliases.is_empty() {
                String::new()
            } else {
                format!(" ({})", summary.aliases.join(", "))
            };
            format!("{}{}{} - {}", prefix, summary.name, aliases, summary.description)
        })
        .collect()
}
