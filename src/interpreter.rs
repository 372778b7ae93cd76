//! The session loop: read a line, classify it, dispatch it, reap children.

use crate::env::Environment;
use crate::external::{self, ChildHandle};
use crate::io_adapters::{EmptySource, LineSource, ScriptSource};
use crate::lexer;
use crate::parser::{self, Directive};
use anyhow::Result;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Whether each command is reaped before the next line is read, or all
/// commands are collected and reaped together at end-of-input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serial,
    Parallel,
}

/// One run of the read-classify-dispatch loop over a single line source.
///
/// A session owns its pending child handles; a nested session gets a fresh,
/// independent set. Consuming `self` in the terminating paths makes the
/// ownership rule checkable: a session that ends via `exit` or a nested
/// directive drops its pending handles unreaped, and only end-of-input
/// drains them.
///
/// Example
/// ```
/// use parsh::{Mode, Session};
/// use parsh::env::Environment;
/// use parsh::io_adapters::MemSource;
///
/// let env = Environment::new();
/// let mut out: Vec<u8> = Vec::new();
/// let mut source = MemSource::new("# comments spawn nothing\n");
/// Session::new(Mode::Serial, "").run(&mut source, &mut out, &env).unwrap();
/// assert!(out.is_empty());
/// ```
pub struct Session {
    mode: Mode,
    prompt: String,
    pending: Vec<ChildHandle>,
}

impl Session {
    pub fn new(mode: Mode, prompt: impl Into<String>) -> Self {
        Self {
            mode,
            prompt: prompt.into(),
            pending: Vec::new(),
        }
    }

    /// Drive the session until its source is exhausted or a directive
    /// terminates it.
    ///
    /// Per-line failures (bad quoting, malformed directives, unlaunchable
    /// programs) are reported to `out` and never end the session.
    pub fn run(
        mut self,
        source: &mut dyn LineSource,
        out: &mut dyn Write,
        env: &Environment,
    ) -> Result<()> {
        while let Some(line) = source.next_line(&self.prompt)? {
            let words = match lexer::tokenize(&line) {
                Ok(words) => words,
                Err(err) => {
                    writeln!(out, "parsh: {}", err)?;
                    continue;
                }
            };
            match parser::classify(words) {
                Ok(Directive::Ignore) => continue,
                Ok(Directive::Exit) => {
                    // Unconditional stop: outstanding children stay unreaped.
                    debug!(pending = self.pending.len(), "exit directive");
                    return Ok(());
                }
                Ok(Directive::NestedSerial(path)) => {
                    return self.replace_with(Mode::Serial, &path, out, env);
                }
                Ok(Directive::NestedParallel(path)) => {
                    return self.replace_with(Mode::Parallel, &path, out, env);
                }
                Ok(Directive::Command(words)) => self.dispatch(words, out, env)?,
                Err(err) => writeln!(out, "parsh: {}", err)?,
            }
        }
        self.drain(out)
    }

    /// Launch one command. Serial mode reaps and reports it immediately;
    /// parallel mode queues the handle for the end-of-input drain.
    fn dispatch(&mut self, words: Vec<String>, out: &mut dyn Write, env: &Environment) -> Result<()> {
        let handle = match external::launch(&words, env) {
            Ok(handle) => handle,
            Err(err) => {
                writeln!(out, "parsh: {}", err)?;
                return Ok(());
            }
        };
        match self.mode {
            Mode::Serial => report(out, handle)?,
            Mode::Parallel => self.pending.push(handle),
        }
        Ok(())
    }

    /// Run the named file as a fresh session in `mode`, then let this
    /// session terminate without returning to its read loop.
    fn replace_with(
        self,
        mode: Mode,
        path: &Path,
        out: &mut dyn Write,
        env: &Environment,
    ) -> Result<()> {
        let nested = Session::new(mode, "");
        match ScriptSource::open(path) {
            Ok(mut script) => nested.run(&mut script, out, env),
            Err(err) => {
                // A script that cannot be opened behaves as an empty one.
                warn!(path = %path.display(), %err, "cannot open nested script");
                nested.run(&mut EmptySource, out, env)
            }
        }
    }

    /// Reap every pending handle in insertion order, reporting each one
    /// before blocking on the next.
    fn drain(self, out: &mut dyn Write) -> Result<()> {
        for handle in self.pending {
            report(out, handle)?;
        }
        Ok(())
    }
}

/// Report one command: its argument vector joined by spaces, then its exit
/// code once the child has been reaped.
fn report(out: &mut dyn Write, handle: ChildHandle) -> Result<()> {
    writeln!(out, "Running: {}", handle.command_line())?;
    let code = handle.wait()?;
    writeln!(out, "Exit code: {}", code)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::MemSource;
    use std::path::PathBuf;

    /// Run a script through a fresh session and return what it wrote to
    /// its output sink.
    fn run_script(mode: Mode, script: &str) -> String {
        let env = Environment::new();
        let mut out: Vec<u8> = Vec::new();
        let mut source = MemSource::new(script);
        Session::new(mode, "")
            .run(&mut source, &mut out, &env)
            .expect("session run");
        String::from_utf8(out).expect("utf8 output")
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("interpreter_tests_{}_{}", std::process::id(), tag))
    }

    #[test]
    #[cfg(unix)]
    fn serial_command_reports_command_line_and_exit_code() {
        let out = run_script(Mode::Serial, "echo hi\nexit\n");
        assert_eq!(out, "Running: echo hi\nExit code: 0\n");
    }

    #[test]
    #[cfg(unix)]
    fn serial_failure_code_is_reported() {
        let out = run_script(Mode::Serial, "false\n");
        assert_eq!(out, "Running: false\nExit code: 1\n");
    }

    #[test]
    fn exit_stops_the_session_before_later_lines() {
        let out = run_script(Mode::Serial, "exit\necho never-runs\n");
        assert_eq!(out, "");
    }

    #[test]
    fn ignored_lines_spawn_nothing() {
        let out = run_script(Mode::Serial, "# a comment\n\n   \t \n#another\n");
        assert_eq!(out, "");
    }

    #[test]
    #[cfg(unix)]
    fn unknown_command_is_reported_and_session_continues() {
        let out = run_script(Mode::Serial, "no-such-program-xyz\ntrue\n");
        assert!(out.contains("command not found: no-such-program-xyz"));
        assert!(out.contains("Running: true\nExit code: 0\n"));
    }

    #[test]
    #[cfg(unix)]
    fn malformed_directive_is_reported_and_session_continues() {
        let out = run_script(Mode::Serial, "SERIAL\ntrue\n");
        assert!(out.contains("SERIAL: missing file path"));
        assert!(out.contains("Running: true\nExit code: 0\n"));
    }

    #[test]
    #[cfg(unix)]
    fn unterminated_quote_is_reported_and_session_continues() {
        let out = run_script(Mode::Serial, "echo \"oops\ntrue\n");
        assert!(out.contains("unterminated quote"));
        assert!(out.contains("Running: true\nExit code: 0\n"));
    }

    #[test]
    #[cfg(unix)]
    fn parallel_reports_exit_codes_in_launch_order() {
        // The first child outlives the second; its report still comes first.
        let out = run_script(
            Mode::Parallel,
            "sh -c \"sleep 0.3; exit 3\"\nsh -c \"exit 5\"\n",
        );
        assert_eq!(
            out,
            "Running: sh -c sleep 0.3; exit 3\nExit code: 3\n\
             Running: sh -c exit 5\nExit code: 5\n"
        );
    }

    #[test]
    #[cfg(unix)]
    fn serial_children_run_one_at_a_time() {
        let marker = temp_path("serial_marker");
        let _ = std::fs::remove_file(&marker);
        let script = format!(
            "sh -c \"sleep 0.3; echo a >> {m}\"\nsh -c \"echo b >> {m}\"\n",
            m = marker.display()
        );
        run_script(Mode::Serial, &script);
        let content = std::fs::read_to_string(&marker).expect("marker file");
        assert_eq!(content, "a\nb\n");
        let _ = std::fs::remove_file(marker);
    }

    #[test]
    #[cfg(unix)]
    fn parallel_children_overlap() {
        let marker = temp_path("parallel_marker");
        let _ = std::fs::remove_file(&marker);
        let script = format!(
            "sh -c \"sleep 0.3; echo a >> {m}\"\nsh -c \"echo b >> {m}\"\n",
            m = marker.display()
        );
        run_script(Mode::Parallel, &script);
        // The second child finished first, so both were outstanding at once.
        let content = std::fs::read_to_string(&marker).expect("marker file");
        assert_eq!(content, "b\na\n");
        let _ = std::fs::remove_file(marker);
    }

    #[test]
    #[cfg(unix)]
    fn exit_in_parallel_mode_abandons_pending_children() {
        let out = run_script(Mode::Parallel, "sh -c \"exit 9\"\nexit\n");
        assert_eq!(out, "");
    }

    #[test]
    #[cfg(unix)]
    fn nested_directive_replaces_the_enclosing_session() {
        let script = temp_path("nested_serial.txt");
        std::fs::write(&script, "true\n").expect("write nested script");

        let out = run_script(
            Mode::Serial,
            &format!("SERIAL {}\necho resumed\n", script.display()),
        );
        assert_eq!(out, "Running: true\nExit code: 0\n");
        assert!(!out.contains("resumed"));

        let _ = std::fs::remove_file(script);
    }

    #[test]
    #[cfg(unix)]
    fn nested_parallel_directive_drains_in_launch_order() {
        let script = temp_path("nested_parallel.txt");
        std::fs::write(&script, "true\nfalse\n").expect("write nested script");

        let out = run_script(Mode::Serial, &format!("PARALLEL {}\n", script.display()));
        assert_eq!(
            out,
            "Running: true\nExit code: 0\nRunning: false\nExit code: 1\n"
        );

        let _ = std::fs::remove_file(script);
    }

    #[test]
    fn missing_nested_file_is_an_empty_session() {
        let out = run_script(Mode::Serial, "SERIAL /no/such/dir/batch-xyz.txt\ntrue\n");
        // The nested session sees immediate end-of-input and the enclosing
        // session still terminates instead of resuming.
        assert_eq!(out, "");
    }
}
