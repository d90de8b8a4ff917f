use crate::tree::CommandTree;
use argh::{EarlyExit, FromArgs};
use log::debug;
use std::fmt;
use std::io::Write;

/// Handle to a command stored in a [`CommandTree`].
///
/// Handles are only meaningful for the tree that returned them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub(crate) usize);

/// Behavior executed when a leaf command is typed.
///
/// Receives the invocation context, the arguments following the command name,
/// and the output sink of the running session. An `Err` is reported to the
/// output sink and the session keeps going.
pub type Action = Box<dyn Fn(&Invocation<'_>, &[String], &mut dyn Write) -> anyhow::Result<()>>;

/// Hook run once, right before a menu's own loop starts for the first time.
///
/// Typically used to populate the menu's children lazily.
pub type OnEnter = Box<dyn FnOnce(&mut CommandTree, CommandId)>;

/// What a command does when it is selected.
pub enum CommandKind {
    /// Runs an action with the remaining arguments.
    Leaf(Action),
    /// Enters a nested loop over the command's children.
    Menu {
        /// Consumed the first time the menu is entered.
        on_enter: Option<OnEnter>,
    },
    /// Leaves the loop that owns or inherited this command.
    Exit,
}

impl fmt::Debug for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Leaf(_) => f.write_str("Leaf"),
            CommandKind::Menu { on_enter } => f
                .debug_struct("Menu")
                .field("on_enter", &on_enter.is_some())
                .finish(),
            CommandKind::Exit => f.write_str("Exit"),
        }
    }
}

/// Descriptive parameter of a command, shown by `help <command>`.
///
/// Parameters are not validated by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Name shown in the parameter list, e.g. `key`.
    pub name: String,
    /// One-line description of the parameter.
    pub help: String,
    /// Marks the parameter with `(optional)` in help output.
    pub optional: bool,
}

impl Parameter {
    /// A parameter that must be given.
    pub fn required(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            optional: false,
        }
    }

    /// A parameter that may be omitted.
    pub fn optional(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            optional: true,
        }
    }
}

/// A node of the command tree.
///
/// Commands are built with [`Command::leaf`], [`Command::menu`],
/// [`Command::lazy_menu`] or [`Command::typed`], inserted into a
/// [`CommandTree`] and linked together with [`CommandTree::add_child`].
#[derive(Debug)]
pub struct Command {
    pub(crate) name: String,
    pub(crate) short_help: String,
    pub(crate) long_help: String,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) kind: CommandKind,
    pub(crate) children: Vec<CommandId>,
    pub(crate) parent: Option<CommandId>,
    pub(crate) exit: Option<CommandId>,
    pub(crate) help: Option<CommandId>,
}

impl Command {
    /// Panics if `name` is empty.
    fn new(name: String, short_help: String, kind: CommandKind) -> Self {
        assert!(!name.is_empty(), "command name must not be empty");
        Self {
            name,
            short_help,
            long_help: String::new(),
            parameters: Vec::new(),
            kind,
            children: Vec::new(),
            parent: None,
            exit: None,
            help: None,
        }
    }

    /// A command running `action` when typed.
    pub fn leaf<F>(name: impl Into<String>, short_help: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Invocation<'_>, &[String], &mut dyn Write) -> anyhow::Result<()> + 'static,
    {
        Self::new(name.into(), short_help.into(), CommandKind::Leaf(Box::new(action)))
    }

    /// A sub-menu; its children are attached with [`CommandTree::add_child`].
    pub fn menu(name: impl Into<String>, short_help: impl Into<String>) -> Self {
        Self::new(
            name.into(),
            short_help.into(),
            CommandKind::Menu { on_enter: None },
        )
    }

    /// A sub-menu whose children are produced by `on_enter` on first entry.
    pub fn lazy_menu<F>(name: impl Into<String>, short_help: impl Into<String>, on_enter: F) -> Self
    where
        F: FnOnce(&mut CommandTree, CommandId) + 'static,
    {
        Self::new(
            name.into(),
            short_help.into(),
            CommandKind::Menu {
                on_enter: Some(Box::new(on_enter)),
            },
        )
    }

    /// A leaf command whose arguments are parsed into `T` with [`argh`].
    ///
    /// Parse failures and `--help` print argh's message to the output sink
    /// instead of running `run`.
    pub fn typed<T, F>(name: impl Into<String>, short_help: impl Into<String>, run: F) -> Self
    where
        T: FromArgs + 'static,
        F: Fn(T, &Invocation<'_>, &mut dyn Write) -> anyhow::Result<()> + 'static,
    {
        let name = name.into();
        let command_name = name.clone();
        Self::leaf(name, short_help, move |invocation, args, out| {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            match T::from_args(&[command_name.as_str()], &args) {
                Ok(parsed) => run(parsed, invocation, out),
                Err(EarlyExit { output, status }) => {
                    debug!("{command_name}: early exit, success = {}", status.is_ok());
                    write!(out, "{output}")?;
                    if !output.ends_with('\n') {
                        writeln!(out)?;
                    }
                    Ok(())
                }
            }
        })
    }

    pub(crate) fn exit(name: impl Into<String>, short_help: impl Into<String>) -> Self {
        Self::new(name.into(), short_help.into(), CommandKind::Exit)
    }

    /// Sets the text printed by `help <command>`.
    pub fn with_long_help(mut self, long_help: impl Into<String>) -> Self {
        self.long_help = long_help.into();
        self
    }

    /// Appends a parameter to the list printed by `help <command>`.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Name typed to select this command.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line description used in command listings.
    pub fn short_help(&self) -> &str {
        &self.short_help
    }

    /// Long help, falling back to the short help when none was given.
    pub fn long_help(&self) -> &str {
        if self.long_help.is_empty() {
            &self.short_help
        } else {
            &self.long_help
        }
    }

    /// Declared parameters, in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// What happens when this command is selected.
    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Returns `true` if this command runs an action.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, CommandKind::Leaf(_))
    }

    /// Child commands in attach order.
    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    /// Command this one is attached to; `None` for a root.
    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    /// Exit command resolved for this command's loop, if it has been entered.
    pub fn exit_node(&self) -> Option<CommandId> {
        self.exit
    }

    /// Help command resolved for this command's loop, if it has been entered.
    pub fn help_node(&self) -> Option<CommandId> {
        self.help
    }
}

/// Context handed to a running [`Action`].
pub struct Invocation<'a> {
    pub(crate) tree: &'a CommandTree,
    pub(crate) command: CommandId,
    pub(crate) menu: CommandId,
}

impl<'a> Invocation<'a> {
    /// Tree the command belongs to.
    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    /// The command being run.
    pub fn command(&self) -> &'a Command {
        &self.tree[self.command]
    }

    /// Handle of the command being run.
    pub fn command_id(&self) -> CommandId {
        self.command
    }

    /// The menu whose loop resolved the command.
    pub fn menu_id(&self) -> CommandId {
        self.menu
    }
}
