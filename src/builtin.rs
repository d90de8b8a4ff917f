//! The `help` and `exit` commands synthesized for menus that lack them.

use crate::command::{Command, CommandId, Invocation, Parameter};
use crate::tree::CommandTree;
use anyhow::Result;
use std::io::Write;

/// Name of the synthesized exit command.
pub const EXIT: &str = "exit";
/// Name of the synthesized help command.
pub const HELP: &str = "help";

/// Creates an `exit` command under `parent` and records it as the exit
/// command of `parent`'s loop.
pub fn attach_exit(tree: &mut CommandTree, parent: CommandId) -> CommandId {
    let exit = tree.insert(Command::exit(EXIT, "Leave this menu"));
    tree.add_child(parent, exit);
    tree.node_mut(parent).exit = Some(exit);
    exit
}

/// Creates a `help` command running [`default_help`] under `parent` and
/// records it as the help command of `parent`'s loop.
pub fn attach_help(tree: &mut CommandTree, parent: CommandId) -> CommandId {
    let help = tree.insert(
        Command::leaf(HELP, "Show an overview help", default_help).with_parameter(
            Parameter::optional("command", "Show help of specified command"),
        ),
    );
    tree.add_child(parent, help);
    tree.node_mut(parent).help = Some(help);
    help
}

/// Without arguments, lists the commands of the menu being run. With one
/// argument, prints the long help and parameters of that command.
pub fn default_help(invocation: &Invocation<'_>, args: &[String], out: &mut dyn Write) -> Result<()> {
    let tree = invocation.tree();
    let menu = invocation.menu_id();

    match args {
        [] => {
            let about = tree[menu].long_help();
            if !about.is_empty() {
                writeln!(out, "{about}\n")?;
            }
            writeln!(out, "Available commands:")?;
            let rows: Vec<(&str, String)> = tree
                .visible_commands(menu)
                .into_iter()
                .map(|id| (tree[id].name(), tree[id].short_help().to_string()))
                .collect();
            write_columns(out, &rows)?;
        }
        [name] => {
            let Some(selected) = tree.resolve(menu, name) else {
                writeln!(out, "The command {name} cannot be found")?;
                return Ok(());
            };

            let command = &tree[selected];
            writeln!(out, "{}", command.long_help())?;
            if command.parameters().is_empty() {
                return Ok(());
            }
            writeln!(out, "\nAvailable parameters:")?;
            let rows: Vec<(&str, String)> = command
                .parameters()
                .iter()
                .map(|p| {
                    let marker = if p.optional { " (optional)" } else { "" };
                    (p.name.as_str(), format!("{}{marker}", p.help))
                })
                .collect();
            write_columns(out, &rows)?;
        }
        _ => writeln!(out, "The help command cannot take more than 1 parameter")?,
    }
    Ok(())
}

fn write_columns(out: &mut dyn Write, rows: &[(&str, String)]) -> std::io::Result<()> {
    let width = rows
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, text) in rows {
        writeln!(out, "  {name:<width$}  {text}")?;
    }
    Ok(())
}
