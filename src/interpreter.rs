use crate::builtin;
use crate::command::{CommandId, CommandKind, Invocation};
use crate::error::ShellError;
use crate::input::LineSource;
use crate::lexer;
use crate::tree::CommandTree;
use log::{debug, trace, warn};
use std::io::Write;

/// Interactive loop over a [`CommandTree`].
///
/// Reads lines from a [`LineSource`], resolves the first argument against the
/// commands of the current menu and either runs a leaf action or enters a
/// nested loop for a sub-menu.
///
/// Example
/// ```
/// use menu_shell::{Command, CommandTree, Interpreter, ScriptSource};
/// use std::io::{Cursor, Write};
///
/// let mut tree = CommandTree::new();
/// let root = tree.insert(Command::menu("root", "Example"));
/// let status = tree.insert(Command::leaf("status", "Print status", |_, _, out| {
///     writeln!(out, "OK")?;
///     Ok(())
/// }));
/// tree.add_child(root, status);
///
/// let input = ScriptSource::new(Cursor::new("status\nexit\n"));
/// let mut shell = Interpreter::new(tree, input, Vec::new());
/// shell.execute(root).unwrap();
/// assert_eq!(shell.into_output(), b"root>OK\nroot>");
/// ```
pub struct Interpreter<I, O> {
    tree: CommandTree,
    input: I,
    output: O,
}

enum Flow {
    Continue,
    Exit,
}

enum Target {
    Leaf,
    SubMenu,
    Missing,
}

impl<I: LineSource, O: Write> Interpreter<I, O> {
    /// Create an interpreter over `tree` reading lines from `input` and
    /// writing prompts and messages to `output`.
    pub fn new(tree: CommandTree, input: I, output: O) -> Self {
        Self {
            tree,
            input,
            output,
        }
    }

    /// The command tree, including builtins created so far.
    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// Mutable access to the tree; must not be used while a loop is running.
    pub fn tree_mut(&mut self) -> &mut CommandTree {
        &mut self.tree
    }

    /// The line source, e.g. to save a [`crate::Terminal`]'s history.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Consume the interpreter and return its output sink.
    pub fn into_output(self) -> O {
        self.output
    }

    /// Consume the interpreter and return the tree, line source and output sink.
    pub fn into_parts(self) -> (CommandTree, I, O) {
        (self.tree, self.input, self.output)
    }

    /// Runs the loop of `id` until its exit command is typed or the input
    /// ends.
    ///
    /// Sub-menus are run by recursive calls; any error from a nested loop ends
    /// every enclosing loop too.
    pub fn execute(&mut self, id: CommandId) -> Result<(), ShellError> {
        self.prepare(id)?;
        debug!("entering `{}`", self.tree[id].name());

        loop {
            let prompt = self.tree.prompt(id);
            if !self.input.renders_prompt() {
                write!(self.output, "{prompt}")?;
                self.output.flush()?;
            }

            let line = match self.input.read_line(&prompt) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("input ended in `{}`", self.tree[id].name());
                    return Ok(());
                }
                Err(err) => return Err(ShellError::Read(err)),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let args = lexer::split_into_args(line);
            trace!("arguments: {args:?}");
            let Some((name, rest)) = args.split_first() else {
                continue;
            };

            if let Flow::Exit = self.dispatch(id, name, rest)? {
                debug!("leaving `{}`", self.tree[id].name());
                return Ok(());
            }
        }
    }

    /// Validates the command about to run its loop, runs its on-enter hook and
    /// resolves its help and exit commands.
    fn prepare(&mut self, id: CommandId) -> Result<(), ShellError> {
        let command = &self.tree[id];
        if command.is_leaf() {
            if !command.children().is_empty() {
                return Err(ShellError::ActionWithChildren(command.name().to_string()));
            }
            return Err(ShellError::NotAMenu(command.name().to_string()));
        }

        if let Some(on_enter) = self.tree.take_on_enter(id) {
            debug!("loading `{}`", self.tree[id].name());
            on_enter(&mut self.tree, id);
        }

        let command = &self.tree[id];
        if command.children().is_empty() {
            return Err(ShellError::Empty(command.name().to_string()));
        }

        if self.tree[id].help_node().is_none() {
            match self.tree.inherited_help(id) {
                Some(help) => self.tree.node_mut(id).help = Some(help),
                None => {
                    debug!("creating help for `{}`", self.tree[id].name());
                    builtin::attach_help(&mut self.tree, id);
                }
            }
        }
        if self.tree[id].exit_node().is_none() {
            match self.tree.inherited_exit(id) {
                Some(exit) => self.tree.node_mut(id).exit = Some(exit),
                None => {
                    debug!("creating exit for `{}`", self.tree[id].name());
                    builtin::attach_exit(&mut self.tree, id);
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, menu: CommandId, name: &str, args: &[String]) -> Result<Flow, ShellError> {
        let Some(selected) = self.tree.resolve(menu, name) else {
            let help = self.tree[menu]
                .help_node()
                .map_or(builtin::HELP, |help| self.tree[help].name());
            writeln!(
                self.output,
                "Invalid command, type {help} for available commands"
            )?;
            return Ok(Flow::Continue);
        };

        if self.tree[menu].exit_node() == Some(selected) {
            return Ok(Flow::Exit);
        }

        let command = &self.tree[selected];
        let target = match command.kind() {
            CommandKind::Leaf(_) => Target::Leaf,
            CommandKind::Menu { on_enter } if on_enter.is_some() => Target::SubMenu,
            CommandKind::Menu { .. } if !command.children().is_empty() => Target::SubMenu,
            CommandKind::Menu { .. } | CommandKind::Exit => Target::Missing,
        };

        match target {
            Target::Missing => Err(ShellError::MissingAction(name.to_string())),
            Target::SubMenu => {
                self.execute(selected)?;
                Ok(Flow::Continue)
            }
            Target::Leaf => {
                debug!("running `{name}` with {} argument(s)", args.len());
                if let CommandKind::Leaf(action) = self.tree[selected].kind() {
                    let invocation = Invocation {
                        tree: &self.tree,
                        command: selected,
                        menu,
                    };
                    if let Err(err) = action(&invocation, args, &mut self.output) {
                        warn!("`{name}` failed: {err:#}");
                        writeln!(self.output, "{name}: {err:#}")?;
                    }
                }
                Ok(Flow::Continue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::input::ScriptSource;
    use std::cell::{Cell, RefCell};
    use std::io::Cursor;
    use std::rc::Rc;

    type Session = Interpreter<ScriptSource<Cursor<String>>, Vec<u8>>;

    fn print(name: &str, text: &'static str) -> Command {
        Command::leaf(name, format!("Print {text}"), move |_, _, out| {
            writeln!(out, "{text}")?;
            Ok(())
        })
    }

    /// root: status, config { show }
    fn sample() -> (CommandTree, CommandId, CommandId) {
        let mut tree = CommandTree::new();
        let root = tree.insert(Command::menu("root", "Sample root"));
        let status = tree.insert(print("status", "OK"));
        let config = tree.insert(Command::menu("config", "Configuration"));
        let show = tree.insert(print("show", "cfg"));
        tree.add_child(config, show);
        tree.add_children(root, [status, config]);
        (tree, root, config)
    }

    fn session(tree: CommandTree, script: &str) -> Session {
        Interpreter::new(
            tree,
            ScriptSource::new(Cursor::new(script.to_string())),
            Vec::new(),
        )
    }

    fn run(tree: CommandTree, root: CommandId, script: &str) -> (Result<(), ShellError>, String) {
        let mut shell = session(tree, script);
        let res = shell.execute(root);
        (res, String::from_utf8(shell.into_output()).unwrap())
    }

    #[test]
    fn test_end_to_end_session() {
        let (tree, root, _) = sample();
        let (res, out) = run(tree, root, "status\nconfig\nshow\nexit\nexit\n");
        assert!(res.is_ok());
        assert_eq!(out, "root>OK\nroot>root(config)>cfg\nroot(config)>root>");
    }

    #[test]
    fn test_exit_only_leaves_current_loop() {
        let (tree, root, _) = sample();
        let (res, out) = run(tree, root, "config\nexit\nstatus\nexit\nstatus\n");
        assert!(res.is_ok());
        assert_eq!(out, "root>root(config)>root>OK\nroot>");
    }

    #[test]
    fn test_end_of_input_ends_every_loop() {
        let (tree, root, _) = sample();
        let (res, out) = run(tree, root, "config\n");
        assert!(res.is_ok());
        assert_eq!(out, "root>root(config)>root>");
    }

    #[test]
    fn test_blank_lines_reprompt() {
        let (tree, root, _) = sample();
        let (res, out) = run(tree, root, "\n   \n\t\nexit\n");
        assert!(res.is_ok());
        assert_eq!(out, "root>root>root>root>");
    }

    #[test]
    fn test_unknown_command_is_reported() {
        let (tree, root, _) = sample();
        let (res, out) = run(tree, root, "bogus\nStatus\nexit\n");
        assert!(res.is_ok());
        assert_eq!(
            out,
            "root>Invalid command, type help for available commands\n\
             root>Invalid command, type help for available commands\n\
             root>"
        );
    }

    #[test]
    fn test_root_gets_fresh_builtins() {
        let (tree, root, _) = sample();
        let mut shell = session(tree, "exit\n");
        shell.execute(root).unwrap();

        let tree = shell.tree();
        let help = tree[root].help_node().unwrap();
        let exit = tree[root].exit_node().unwrap();
        assert_eq!(tree[help].parent(), Some(root));
        assert_eq!(tree[exit].parent(), Some(root));
        assert_eq!(tree[root].children().len(), 4);
    }

    #[test]
    fn test_sub_menu_inherits_builtins() {
        let (tree, root, config) = sample();
        let mut shell = session(tree, "config\nexit\nconfig\nexit\nexit\n");
        shell.execute(root).unwrap();

        let tree = shell.tree();
        assert_eq!(tree[config].exit_node(), tree[root].exit_node());
        assert_eq!(tree[config].help_node(), tree[root].help_node());
        assert_eq!(tree[config].children().len(), 1);
    }

    #[test]
    fn test_sub_menu_keeps_its_own_exit() {
        let (mut tree, root, config) = sample();
        let back = tree.insert(Command::exit("back", "Back to root"));
        tree.add_child(config, back);
        tree.node_mut(config).exit = Some(back);

        let (res, out) = run(tree, root, "config\nexit\nback\nexit\n");
        assert!(res.is_ok());
        assert_eq!(
            out,
            "root>root(config)>Invalid command, type help for available commands\n\
             root(config)>root>"
        );
    }

    #[test]
    fn test_arguments_reach_the_action() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut tree = CommandTree::new();
        let root = tree.insert(Command::menu("root", "Sample root"));
        let record = {
            let seen = Rc::clone(&seen);
            Command::leaf("say", "Record arguments", move |invocation, args, _| {
                assert_eq!(invocation.command().name(), "say");
                seen.borrow_mut().push(args.to_vec());
                Ok(())
            })
        };
        let say = tree.insert(record);
        tree.add_child(root, say);

        let (res, _) = run(tree, root, "say a \"b c\" d\n  say  \nexit\n");
        assert!(res.is_ok());
        assert_eq!(
            *seen.borrow(),
            vec![
                vec!["a".to_string(), "b c".to_string(), "d".to_string()],
                vec![]
            ]
        );
    }

    #[test]
    fn test_failing_action_does_not_end_session() {
        let mut tree = CommandTree::new();
        let root = tree.insert(Command::menu("root", "Sample root"));
        let fail = tree.insert(Command::leaf("fail", "Always fails", |_, _, _| {
            anyhow::bail!("boom")
        }));
        tree.add_child(root, fail);

        let (res, out) = run(tree, root, "fail\nexit\n");
        assert!(res.is_ok());
        assert_eq!(out, "root>fail: boom\nroot>");
    }

    #[test]
    fn test_help_lists_current_menu() {
        let (tree, root, _) = sample();
        let (res, out) = run(tree, root, "config\nhelp\nexit\nexit\n");
        assert!(res.is_ok());
        assert!(out.contains("Available commands:\n  show  Print cfg\n"));
        assert!(!out.contains("status"));
    }

    #[test]
    fn test_action_with_children_is_rejected() {
        let mut tree = CommandTree::new();
        let leaf = tree.insert(print("leaf", "leaf"));
        let child = tree.insert(print("child", "child"));
        tree.add_child(leaf, child);

        let (res, out) = run(tree, leaf, "exit\n");
        assert!(matches!(res, Err(ShellError::ActionWithChildren(name)) if name == "leaf"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_leaf_has_no_loop_of_its_own() {
        let mut tree = CommandTree::new();
        let leaf = tree.insert(print("leaf", "leaf"));
        let mut shell = session(tree, "exit\nexit\n");

        for _ in 0..2 {
            let res = shell.execute(leaf);
            assert!(matches!(res, Err(ShellError::NotAMenu(name)) if name == "leaf"));
        }
        assert!(shell.tree()[leaf].children().is_empty());
        assert_eq!(shell.tree()[leaf].help_node(), None);
        assert!(shell.into_output().is_empty());
    }

    #[test]
    fn test_menu_without_children_is_rejected() {
        let mut tree = CommandTree::new();
        let root = tree.insert(Command::menu("root", "Nothing here"));

        let (res, _) = run(tree, root, "exit\n");
        assert!(matches!(res, Err(ShellError::Empty(name)) if name == "root"));
    }

    #[test]
    fn test_missing_action_ends_session() {
        let (mut tree, root, config) = sample();
        let broken = tree.insert(Command::menu("broken", "Nothing to run"));
        tree.add_child(config, broken);

        let (res, out) = run(tree, root, "config\nbroken\nstatus\n");
        assert!(matches!(res, Err(ShellError::MissingAction(name)) if name == "broken"));
        assert_eq!(out, "root>root(config)>");
    }

    #[test]
    fn test_on_enter_runs_once() {
        let loads = Rc::new(Cell::new(0));
        let mut tree = CommandTree::new();
        let root = tree.insert(Command::menu("root", "Sample root"));
        let tools = {
            let loads = Rc::clone(&loads);
            Command::lazy_menu("tools", "Lazily loaded", move |tree, id| {
                loads.set(loads.get() + 1);
                let item = tree.insert(print("item", "loaded"));
                tree.add_child(id, item);
            })
        };
        let tools = tree.insert(tools);
        tree.add_child(root, tools);

        let mut shell = session(tree, "tools\nitem\nexit\ntools\nexit\nexit\n");
        shell.execute(root).unwrap();

        assert_eq!(loads.get(), 1);
        assert_eq!(shell.tree()[tools].children().len(), 1);
        let out = String::from_utf8(shell.into_output()).unwrap();
        assert_eq!(
            out,
            "root>root(tools)>loaded\nroot(tools)>root>root(tools)>root>"
        );
    }

    #[test]
    fn test_on_enter_without_children_is_rejected() {
        let mut tree = CommandTree::new();
        let root = tree.insert(Command::menu("root", "Sample root"));
        let empty = tree.insert(Command::lazy_menu("empty", "Loads nothing", |_, _| {}));
        tree.add_child(root, empty);

        let (res, _) = run(tree, root, "empty\n");
        assert!(matches!(res, Err(ShellError::Empty(name)) if name == "empty"));
    }

    #[test]
    fn test_read_error_ends_session() {
        struct Broken;

        impl LineSource for Broken {
            fn read_line(&mut self, _prompt: &str) -> std::io::Result<Option<String>> {
                Err(std::io::Error::other("device gone"))
            }
        }

        let (tree, root, _) = sample();
        let mut shell = Interpreter::new(tree, Broken, Vec::new());
        assert!(matches!(shell.execute(root), Err(ShellError::Read(_))));
    }

    #[test]
    fn test_prompt_is_left_to_rendering_sources() {
        struct Rendering(Vec<String>);

        impl LineSource for Rendering {
            fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
                self.0.push(prompt.to_string());
                Ok(None)
            }

            fn renders_prompt(&self) -> bool {
                true
            }
        }

        let (tree, root, _) = sample();
        let mut shell = Interpreter::new(tree, Rendering(Vec::new()), Vec::new());
        shell.execute(root).unwrap();

        let (_, input, output) = shell.into_parts();
        assert_eq!(input.0, vec!["root>".to_string()]);
        assert!(output.is_empty());
    }
}
