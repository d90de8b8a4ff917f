use std::io;
use thiserror::Error;

/// Errors that end an interactive session.
///
/// Apart from the I/O variants, every error points at a command tree that was
/// assembled incorrectly by the host program.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A command with an action also has children.
    #[error("command `{0}` should not define an action and have children")]
    ActionWithChildren(String),
    /// A leaf command was entered as if it had its own loop.
    #[error("command `{0}` runs an action and has no menu to enter")]
    NotAMenu(String),
    /// A command entered as a menu has neither an action nor children.
    #[error("command `{0}` has neither an action nor children")]
    Empty(String),
    /// A command was typed that has nothing to run and nothing to enter.
    #[error("missing action for `{0}` command")]
    MissingAction(String),
    /// The line source failed for a reason other than end of input.
    #[error("failed to read input")]
    Read(#[source] io::Error),
    /// Writing a prompt or message to the output sink failed.
    #[error("failed to write output")]
    Output(#[from] io::Error),
}
