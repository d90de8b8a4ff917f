//! An embeddable interactive command-line interpreter built around a tree of
//! named commands.
//!
//! A host program declares commands with [`Command`], stores them in a
//! [`CommandTree`] and links them with [`CommandTree::add_child`]. Leaf
//! commands run an action; menu commands open a nested prompt over their own
//! children. The [`Interpreter`] then drives a read-eval-print loop starting
//! at a root command:
//!
//! - the prompt shows the path to the current menu, e.g. `root(config)>`;
//! - each line is split into arguments, double quotes grouping words;
//! - the first argument selects a command of the current menu;
//! - every menu gets `help` and `exit` commands, shared with its ancestors
//!   when they already have them.
//!
//! Lines come from any [`LineSource`]: [`Terminal`] wraps `rustyline` for
//! interactive use, [`ScriptSource`] reads from any buffered reader.

pub mod builtin;
pub mod command;
mod error;
mod input;
mod interpreter;
pub mod lexer;
mod tree;

pub use command::{Action, Command, CommandId, CommandKind, Invocation, OnEnter, Parameter};
pub use error::ShellError;
pub use input::{LineSource, ScriptSource, Terminal};
pub use interpreter::Interpreter;
pub use tree::CommandTree;
