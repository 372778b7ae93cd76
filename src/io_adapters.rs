//! Line-source adapters for driving a session.
//!
//! Every input a session reads from — the interactive terminal, a script
//! file, an in-memory buffer — implements [`LineSource`].

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A sequence of newline-terminated lines with a definite end.
///
/// `next_line` returns `Ok(None)` once the source is exhausted. The prompt
/// is passed down because the interactive editor renders it itself;
/// non-interactive sources ignore it.
pub trait LineSource {
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Interactive source backed by the rustyline editor, with history.
pub struct InteractiveSource {
    editor: DefaultEditor,
}

impl InteractiveSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl LineSource for InteractiveSource {
    fn next_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            // Ctrl-D and Ctrl-C both end the session.
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Source reading the lines of a script file.
pub struct ScriptSource {
    reader: BufReader<File>,
}

impl ScriptSource {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
        })
    }
}

impl LineSource for ScriptSource {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// A source that is exhausted from the start.
///
/// Stands in for a nested script that could not be opened, so the nested
/// session still runs (and terminates) normally.
pub struct EmptySource;

impl LineSource for EmptySource {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Memory-backed line source.
///
/// Public so embedders and tests can feed a session from a string.
pub struct MemSource {
    lines: std::vec::IntoIter<String>,
}

impl MemSource {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(str::to_string)
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

impl LineSource for MemSource {
    fn next_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.lines.next())
    }
}
