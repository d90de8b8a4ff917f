use log::debug;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, BufRead};
use std::path::PathBuf;

/// Source of input lines for the interpreter.
pub trait LineSource {
    /// Reads the next line without its trailing line terminator.
    ///
    /// Returns `Ok(None)` on a clean end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Whether `read_line` displays `prompt` itself. When it doesn't, the
    /// interpreter writes the prompt to its output sink.
    fn renders_prompt(&self) -> bool {
        false
    }
}

/// Line source reading from any buffered reader, e.g. a script file or an
/// in-memory buffer.
pub struct ScriptSource<R> {
    reader: R,
}

impl<R: BufRead> ScriptSource<R> {
    /// Create a source reading lines from `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(len);
        Ok(Some(line))
    }
}

/// Interactive line source backed by [`rustyline`], with line editing and
/// history.
///
/// Ctrl-D and Ctrl-C end only the loop that is currently reading: the
/// enclosing loop prompts again and keeps reading from the terminal.
pub struct Terminal {
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl Terminal {
    /// Create a terminal source with an empty in-memory history.
    pub fn new() -> rustyline::Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            history: None,
        })
    }

    /// Loads history from `path` if it exists; [`Terminal::save_history`]
    /// writes it back.
    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if let Err(err) = self.editor.load_history(&path) {
            debug!("no history loaded from {}: {err}", path.display());
        }
        self.history = Some(path);
        self
    }

    /// Write the history to the file given to [`Terminal::with_history`], if any.
    pub fn save_history(&mut self) -> rustyline::Result<()> {
        match &self.history {
            Some(path) => self.editor.save_history(path),
            None => Ok(()),
        }
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor
                        .add_history_entry(line.as_str())
                        .map_err(io::Error::other)?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Eof) => {
                debug!("end of input");
                Ok(None)
            }
            Err(ReadlineError::Interrupted) => {
                debug!("interrupted");
                Ok(None)
            }
            Err(ReadlineError::Io(err)) => Err(err),
            Err(err) => Err(io::Error::other(err)),
        }
    }

    fn renders_prompt(&self) -> bool {
        true
    }
}
