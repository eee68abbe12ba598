//! Command tree dispatch
//!
//! A [`Router`] owns an immutable tree of [`Command`]s. Input tokens are matched
//! level by level against command names; the first command without children
//! receives the remaining tokens as parameters. Running out of input on a group
//! prints that group's children as a menu instead.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};

use log::debug;
use thiserror::Error;

/// Function invoked with the parameters left over after resolution
pub type Handler<E> = Box<dyn Fn(&[String]) -> Result<(), E> + Send + Sync>;

/// What a command does when it is reached
pub enum Kind<E> {
    Group(Vec<Command<E>>),
    Leaf(Handler<E>),
}

/// A named node in the command tree
pub struct Command<E> {
    pub name: String,
    pub description: String,
    pub kind: Kind<E>,
}

impl<E> Command<E> {
    #[must_use]
    pub fn group(
        name: impl Into<String>,
        description: impl Into<String>,
        children: Vec<Command<E>>,
    ) -> Self {
        Command {
            name: name.into(),
            description: description.into(),
            kind: Kind::Group(children),
        }
    }

    #[must_use]
    pub fn leaf<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[String]) -> Result<(), E> + Send + Sync + 'static,
    {
        Command {
            name: name.into(),
            description: description.into(),
            kind: Kind::Leaf(Box::new(handler)),
        }
    }

    /// Child commands; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Command<E>] {
        match &self.kind {
            Kind::Group(children) => children,
            Kind::Leaf(_) => &[],
        }
    }
}

impl<E> fmt::Debug for Command<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Command");
        s.field("name", &self.name)
            .field("description", &self.description);
        match &self.kind {
            Kind::Group(children) => s.field("children", children),
            Kind::Leaf(_) => s.field("handler", &"<fn>"),
        };
        s.finish()
    }
}

/// Errors that can occur while building a router or dispatching input
#[derive(Error, Debug)]
pub enum RouteError<E> {
    #[error("invalid input. {0} is not valid")]
    UnknownCommand(String),
    #[error("invalid command tree: {0}")]
    InvalidTree(String),
    #[error(transparent)]
    Handler(E),
}

/// Where a sequence of input tokens leads
pub enum Resolution<'a, E> {
    /// Show these commands as a menu
    Menu(&'a [Command<E>]),
    /// Call `command`'s handler with `params`
    Invoke {
        command: &'a Command<E>,
        handler: &'a Handler<E>,
        params: &'a [String],
    },
}

/// Dispatches input tokens onto a command tree
pub struct Router<E> {
    commands: Vec<Command<E>>,
}

impl<E> fmt::Debug for Router<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("commands", &self.commands)
            .finish()
    }
}

impl<E> Router<E> {
    /// Take ownership of a command tree after validating it.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::InvalidTree` if a command has an empty name or two
    /// siblings share a name.
    pub fn new(commands: Vec<Command<E>>) -> Result<Self, RouteError<E>> {
        validate_level(&commands, "")?;
        Ok(Router { commands })
    }

    /// Walk the tree along `input` without running anything.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::UnknownCommand` with the first token that matches no
    /// command at its level.
    pub fn resolve<'a>(&'a self, input: &'a [String]) -> Result<Resolution<'a, E>, RouteError<E>> {
        let mut level: &[Command<E>] = &self.commands;
        let mut matched = None;
        let mut consumed = 0;

        for token in input {
            let command = find_command(token, level)
                .ok_or_else(|| RouteError::UnknownCommand(token.clone()))?;
            consumed += 1;
            matched = Some(command);
            let children = command.children();
            if children.is_empty() {
                break;
            }
            level = children;
        }

        let Some(command) = matched else {
            return Ok(Resolution::Menu(&self.commands));
        };
        debug!(
            "Resolved '{}' after {consumed} of {} tokens",
            command.name,
            input.len()
        );

        Ok(match &command.kind {
            Kind::Leaf(handler) => Resolution::Invoke {
                command,
                handler,
                params: &input[consumed..],
            },
            Kind::Group(children) => Resolution::Menu(children),
        })
    }

    /// Resolve `input` and run the handler it leads to, writing menus to `out`.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::UnknownCommand` for unmatched input and
    /// `RouteError::Handler` with whatever the handler failed with.
    pub fn run_to<W: Write>(&self, input: &[String], out: &mut W) -> Result<(), RouteError<E>> {
        match self.resolve(input)? {
            Resolution::Menu(commands) => {
                write_menu(out, commands);
                Ok(())
            }
            Resolution::Invoke {
                handler, params, ..
            } => handler(params).map_err(RouteError::Handler),
        }
    }

    /// Like [`Router::run_to`], with menus going to stdout.
    ///
    /// # Errors
    ///
    /// See [`Router::run_to`].
    pub fn run(&self, input: &[String]) -> Result<(), RouteError<E>> {
        // Not locked: handlers print from worker threads while this call is blocked.
        self.run_to(input, &mut io::stdout())
    }
}

fn find_command<'a, E>(name: &str, commands: &'a [Command<E>]) -> Option<&'a Command<E>> {
    commands.iter().find(|c| c.name == name)
}

fn validate_level<E>(commands: &[Command<E>], path: &str) -> Result<(), RouteError<E>> {
    let mut seen = HashSet::new();
    for command in commands {
        if command.name.trim().is_empty() {
            return Err(RouteError::InvalidTree(format!(
                "command with an empty name under '{path}'"
            )));
        }
        if !seen.insert(command.name.as_str()) {
            return Err(RouteError::InvalidTree(format!(
                "duplicate command '{path}{}'",
                command.name
            )));
        }
        validate_level(command.children(), &format!("{path}{} ", command.name))?;
    }
    Ok(())
}

/// Write one `name: description` line per command, in order.
pub fn write_menu<W: Write, E>(out: &mut W, commands: &[Command<E>]) {
    for command in commands {
        // A closed stdout is not worth failing a menu over
        let _ = writeln!(out, "{}: {}", command.name, command.description);
    }
}
