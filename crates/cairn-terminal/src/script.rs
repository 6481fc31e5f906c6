//! Script files: loading, cursor movement, and the line-by-line run loop.
//!
//! A script is a plain text file with one command line per line. Blank
//! lines are dropped at load time; `goto` counts the remaining lines, while
//! error reports keep the line number from the file.

use std::path::{Path, PathBuf};

use cairn_types::error::{Result, ShellError};

use crate::context::ExecutionContext;

/// One non-empty line of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    /// 1-based line number in the source file.
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    Running,
    Paused,
    Finished,
    Aborted,
}

/// A loaded script and its execution cursor.
#[derive(Debug)]
pub struct ScriptState {
    path: PathBuf,
    lines: Vec<ScriptLine>,
    /// Number of lines consumed; the next line is `lines[position]`.
    position: usize,
    /// Stop at the first failing line instead of reporting and moving on.
    pub break_on_error: bool,
    status: ScriptStatus,
}

impl ScriptState {
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::from_source(path, &source))
    }

    pub fn from_source(path: impl Into<PathBuf>, source: &str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| ScriptLine {
                number: i + 1,
                text: l.trim().to_string(),
            })
            .collect();
        Self {
            path: path.into(),
            lines,
            position: 0,
            break_on_error: false,
            status: ScriptStatus::Running,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn status(&self) -> ScriptStatus {
        self.status
    }

    /// Move to the next line and return it, or `None` at the end.
    pub fn advance(&mut self) -> Option<&ScriptLine> {
        if self.position < self.lines.len() {
            self.position += 1;
            self.lines.get(self.position - 1)
        } else {
            None
        }
    }

    /// The line most recently returned by [`advance`](Self::advance).
    pub fn current(&self) -> Option<&ScriptLine> {
        self.position.checked_sub(1).and_then(|i| self.lines.get(i))
    }

    /// Rewind to before the first line.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Place the cursor so the next [`advance`](Self::advance) returns the
    /// `n`th non-blank line (0 counts as 1). Past the last line the script
    /// simply ends.
    pub fn goto(&mut self, n: usize) {
        self.position = n.saturating_sub(1).min(self.lines.len());
        log::debug!("script {} jumps to line {n}", self.path.display());
    }

    pub fn set_paused(&mut self, paused: bool) {
        if matches!(self.status, ScriptStatus::Running | ScriptStatus::Paused) {
            self.status = if paused {
                ScriptStatus::Paused
            } else {
                ScriptStatus::Running
            };
        }
    }

    fn finish(&mut self) {
        self.status = ScriptStatus::Finished;
    }

    fn abort(&mut self) {
        self.status = ScriptStatus::Aborted;
    }
}

fn is_comment(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .is_some_and(|w| w.eq_ignore_ascii_case("rem"))
}

/// Run the script at `path` line by line in the context's session.
///
/// Comment lines (`rem ...`) are skipped. A failing line is reported and
/// skipped, or, after `onerror break`, ends the script with an error naming
/// the line. A pending cancel stops the script before the next line.
pub fn run_script(ctx: &mut ExecutionContext<'_>, path: &Path) -> Result<ScriptStatus> {
    let mut script = ScriptState::load(path)?;
    let interpreter = ctx.interpreter;
    log::debug!(
        "running script {} ({} lines)",
        path.display(),
        script.lines().len()
    );

    loop {
        if interpreter.cancellation().is_cancel_pending() {
            ctx.debug(format!("script {} cancelled", path.display()));
            script.abort();
            break;
        }
        let Some(line) = script.advance().cloned() else {
            script.finish();
            break;
        };
        if is_comment(&line.text) {
            ctx.debug(format!(
                "Line {} \"{}\" commented out",
                line.number, line.text
            ));
            continue;
        }

        let result = interpreter.interpret_line(
            &line.text,
            &mut *ctx.env,
            &mut *ctx.proxy,
            Some(&mut script),
        );
        match result {
            Ok(()) => {},
            Err(e) if !e.is_recoverable() => {
                script.abort();
                return Err(e);
            },
            Err(e) if script.break_on_error => {
                script.abort();
                return Err(ShellError::execution(
                    "*\\run",
                    format!(
                        "Error in line {} in script {}: \"{}\"",
                        line.number,
                        path.display(),
                        line.text
                    ),
                    Some(e),
                ));
            },
            Err(e) => {
                ctx.warn(format!(
                    "Error in line {} in script {}: {e}",
                    line.number,
                    path.display()
                ));
                log::debug!("{e:?}");
            },
        }

        if ctx.env.exit_pending() {
            script.finish();
            break;
        }
    }
    Ok(script.status())
}
