//! Classification of tokenized lines into directives and commands.

use std::path::PathBuf;

/// What a tokenized line tells the session to do.
#[derive(Debug, PartialEq, Eq)]
pub enum Directive {
    /// Blank line or comment; nothing to execute.
    Ignore,
    /// Stop the session unconditionally.
    Exit,
    /// Run the named file as a fresh serial session.
    NestedSerial(PathBuf),
    /// Run the named file as a fresh parallel session.
    NestedParallel(PathBuf),
    /// An argument vector to hand to the process launcher.
    Command(Vec<String>),
}

/// Errors produced while classifying a line.
#[derive(Debug, PartialEq, Eq)]
pub enum ClassifyError {
    /// A `SERIAL`/`PARALLEL` line without its file-path argument.
    /// Holds the directive keyword.
    MissingPath(String),
}

impl std::fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifyError::MissingPath(keyword) => {
                write!(f, "{}: missing file path", keyword)
            }
        }
    }
}

impl std::error::Error for ClassifyError {}

/// Decide what to do with one argument vector.
///
/// Empty vectors and `#`-comments classify as [`Directive::Ignore`]; the
/// `exit`, `SERIAL` and `PARALLEL` keywords are recognized in first
/// position only. Anything else is a command to execute as-is.
pub fn classify(mut words: Vec<String>) -> Result<Directive, ClassifyError> {
    if words.is_empty() || words[0].starts_with('#') {
        return Ok(Directive::Ignore);
    }
    if words[0] == "exit" {
        // Trailing words after `exit` are ignored.
        return Ok(Directive::Exit);
    }
    if words[0] == "SERIAL" || words[0] == "PARALLEL" {
        let parallel = words[0] == "PARALLEL";
        if words.len() < 2 {
            return Err(ClassifyError::MissingPath(words.swap_remove(0)));
        }
        let path = PathBuf::from(std::mem::take(&mut words[1]));
        return Ok(if parallel {
            Directive::NestedParallel(path)
        } else {
            Directive::NestedSerial(path)
        });
    }
    Ok(Directive::Command(words))
}
