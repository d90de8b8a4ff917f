use crate::command::{Command, CommandId, CommandKind, OnEnter};
use log::warn;
use std::ops::Index;

/// Arena owning every [`Command`] of an interpreter.
///
/// Ownership flows from parent to children through [`CommandId`] lists; the
/// parent link is a plain handle and never keeps anything alive.
#[derive(Debug, Default)]
pub struct CommandTree {
    nodes: Vec<Command>,
}

impl CommandTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a detached command and returns its handle.
    pub fn insert(&mut self, command: Command) -> CommandId {
        let id = CommandId(self.nodes.len());
        self.nodes.push(command);
        id
    }

    pub(crate) fn node_mut(&mut self, id: CommandId) -> &mut Command {
        &mut self.nodes[id.0]
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// A child that already has a parent is detached from it first. Sibling
    /// names are not required to be unique; [`CommandTree::find`] returns the
    /// first match.
    ///
    /// # Panics
    ///
    /// If `child` is `parent` itself or one of its ancestors.
    pub fn add_child(&mut self, parent: CommandId, child: CommandId) {
        if child == parent {
            panic!("command `{}` can't be a child of itself", self[child].name);
        }
        if self.walk_up(parent, |node, _, _| node == child) {
            panic!(
                "command `{}` can't be a child of its own descendant `{}`",
                self[child].name, self[parent].name
            );
        }

        if let Some(previous) = self[child].parent {
            self.node_mut(previous).children.retain(|&id| id != child);
        }
        if self.find(parent, &self[child].name).is_some() {
            warn!(
                "`{}` already has a child named `{}`, the first one wins",
                self[parent].name, self[child].name
            );
        }

        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Attaches every command of `children` to `parent`, preserving order.
    pub fn add_children(&mut self, parent: CommandId, children: impl IntoIterator<Item = CommandId>) {
        for child in children {
            self.add_child(parent, child);
        }
    }

    /// First child of `id` named exactly `name`.
    pub fn find(&self, id: CommandId, name: &str) -> Option<CommandId> {
        self[id]
            .children
            .iter()
            .copied()
            .find(|&child| self[child].name == name)
    }

    /// Resolves a typed command name from the loop of `menu`: its own children
    /// first, then its help and exit commands, which may be inherited.
    pub fn resolve(&self, menu: CommandId, name: &str) -> Option<CommandId> {
        self.find(menu, name).or_else(|| {
            [self[menu].help, self[menu].exit]
                .into_iter()
                .flatten()
                .find(|&builtin| self[builtin].name == name)
        })
    }

    /// Every command reachable from the loop of `menu`, in listing order.
    pub fn visible_commands(&self, menu: CommandId) -> Vec<CommandId> {
        let mut commands = self[menu].children.clone();
        for builtin in [self[menu].help, self[menu].exit].into_iter().flatten() {
            if !commands.contains(&builtin) {
                commands.push(builtin);
            }
        }
        commands
    }

    /// Visits `start` and then each of its ancestors up to the root.
    ///
    /// `visit` receives the command, whether it is `start` and whether it is
    /// the root. Returns `true` as soon as `visit` does, `false` once the root
    /// was visited without success.
    pub fn walk_up<F>(&self, start: CommandId, mut visit: F) -> bool
    where
        F: FnMut(CommandId, bool, bool) -> bool,
    {
        let mut current = start;
        let mut first = true;
        loop {
            let parent = self[current].parent;
            if visit(current, first, parent.is_none()) {
                return true;
            }
            match parent {
                Some(parent) => {
                    current = parent;
                    first = false;
                }
                None => return false,
            }
        }
    }

    /// Prompt of the loop running `id`: `root>` for a root, `root(a/b)>` for
    /// a command nested under `root` and `a`.
    pub fn prompt(&self, id: CommandId) -> String {
        if self[id].parent.is_none() {
            return format!("{}>", self[id].name);
        }

        let mut prompt = String::new();
        self.walk_up(id, |node, first, last| {
            let name = &self[node].name;
            prompt = if first {
                format!("{name})>")
            } else if last {
                format!("{name}({prompt}")
            } else {
                format!("{name}/{prompt}")
            };
            false
        });
        prompt
    }

    /// Nearest exit command owned by `id` or one of its ancestors.
    pub fn inherited_exit(&self, id: CommandId) -> Option<CommandId> {
        let mut found = None;
        self.walk_up(id, |node, _, _| {
            found = self[node].exit;
            found.is_some()
        });
        found
    }

    /// Nearest help command owned by `id` or one of its ancestors.
    pub fn inherited_help(&self, id: CommandId) -> Option<CommandId> {
        let mut found = None;
        self.walk_up(id, |node, _, _| {
            found = self[node].help;
            found.is_some()
        });
        found
    }

    pub(crate) fn take_on_enter(&mut self, id: CommandId) -> Option<OnEnter> {
        match &mut self.node_mut(id).kind {
            CommandKind::Menu { on_enter } => on_enter.take(),
            _ => None,
        }
    }

    /// Number of commands stored, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no command was inserted yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Index<CommandId> for CommandTree {
    type Output = Command;

    /// Panics if `id` was not returned by this tree.
    fn index(&self, id: CommandId) -> &Command {
        &self.nodes[id.0]
    }
}
