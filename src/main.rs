use anyhow::{Context, Result};
use argh::FromArgs;
use log::info;
use menu_shell::{
    Command, CommandId, CommandTree, Interpreter, LineSource, Parameter, ScriptSource, Terminal,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(FromArgs)]
/// Interactive demo of a nested command menu.
struct Options {
    #[argh(option)]
    /// read commands from this file instead of the terminal.
    script: Option<PathBuf>,

    #[argh(option)]
    /// file used to keep line history between sessions.
    history: Option<PathBuf>,

    #[argh(switch, short = 'v')]
    /// log what the interpreter does.
    verbose: bool,
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    args: Vec<String>,
}

fn main() -> Result<()> {
    let options: Options = argh::from_env();
    let default_filter = if options.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let (tree, root) = demo_tree();
    match options.script {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("can't open script {}", path.display()))?;
            let mut shell = Interpreter::new(tree, ScriptSource::new(BufReader::new(file)), io::stdout());
            shell.execute(root)?;
        }
        None => {
            let mut terminal = Terminal::new()?;
            if let Some(path) = options.history {
                terminal = terminal.with_history(path);
            }
            let mut shell = Interpreter::new(tree, terminal, io::stdout());
            run_then(&mut shell, root, |terminal| Ok(terminal.save_history()?))?;
        }
    }
    info!("session ended");
    Ok(())
}

/// Runs the loop of `root`, then `after` on the line source whether or not
/// the session failed. The session error wins over an `after` error.
fn run_then<I, O, F>(shell: &mut Interpreter<I, O>, root: CommandId, after: F) -> Result<()>
where
    I: LineSource,
    O: Write,
    F: FnOnce(&mut I) -> Result<()>,
{
    let session = shell.execute(root);
    let finished = after(shell.input_mut());
    session?;
    finished
}

fn demo_tree() -> (CommandTree, CommandId) {
    let mut tree = CommandTree::new();
    let root = tree.insert(
        Command::menu("demo", "Nested command menu demo")
            .with_long_help("Type a command name, or a menu name to enter it."),
    );

    let status = tree.insert(Command::leaf("status", "Print the service status", |_, _, out| {
        writeln!(out, "OK")?;
        Ok(())
    }));

    let echo = tree.insert(
        Command::typed("echo", "Print the arguments", |echo: Echo, _, out| {
            write!(out, "{}", echo.args.join(" "))?;
            if !echo.no_newline {
                writeln!(out)?;
            }
            Ok(())
        })
        .with_parameter(Parameter::optional("-n", "Do not print the trailing newline"))
        .with_parameter(Parameter::optional("values", "Words to print")),
    );

    let config = config_menu(&mut tree);

    let tools = tree.insert(Command::lazy_menu("tools", "Tools loaded on first use", |tree, id| {
        let version = tree.insert(Command::leaf("version", "Print the demo version", |_, _, out| {
            writeln!(out, "{}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }));
        let tree_size = tree.insert(Command::leaf(
            "commands",
            "Count the commands known so far",
            |invocation, _, out| {
                writeln!(out, "{}", invocation.tree().len())?;
                Ok(())
            },
        ));
        tree.add_children(id, [version, tree_size]);
    }));

    tree.add_children(root, [status, echo, config, tools]);
    (tree, root)
}

fn config_menu(tree: &mut CommandTree) -> CommandId {
    let values = Rc::new(RefCell::new(BTreeMap::<String, String>::new()));
    let config = tree.insert(Command::menu("config", "Edit settings"));

    let show = {
        let values = Rc::clone(&values);
        Command::leaf("show", "Print every setting", move |_, _, out| {
            let values = values.borrow();
            if values.is_empty() {
                writeln!(out, "no settings")?;
            }
            for (key, value) in values.iter() {
                writeln!(out, "{key} = {value}")?;
            }
            Ok(())
        })
    };

    let set = Command::leaf("set", "Change a setting", move |_, args, out| {
        let [key, value] = args else {
            anyhow::bail!("expected a key and a value, see `help set`");
        };
        values.borrow_mut().insert(key.clone(), value.clone());
        writeln!(out, "{key} = {value}")?;
        Ok(())
    })
    .with_long_help("Change a setting; quote values containing spaces.")
    .with_parameter(Parameter::required("key", "Name of the setting"))
    .with_parameter(Parameter::required("value", "New value"));

    let show = tree.insert(show);
    let set = tree.insert(set);
    tree.add_children(config, [show, set]);
    config
}
