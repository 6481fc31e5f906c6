//! Per-invocation execution context and the terminal output channel.
//!
//! Every command execution, including each pipeline segment, gets a fresh
//! [`ExecutionContext`]. Commands write through [`ExecutionContext::info`]
//! and friends; where the lines end up depends on the [`OutputMode`] the
//! interpreter chose for that segment.

use std::cell::{Cell, RefCell};
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;

use cairn_types::error::{Result, ShellError};
use terminal_size::{Height, Width};

use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::proxy::ConnectionProxy;
use crate::script::ScriptState;

/// Severity of a terminal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// The user-facing console.
pub trait Terminal {
    fn write_line(&mut self, level: Level, text: &str);

    /// Clear the screen.
    fn clear(&mut self) {}

    /// Block until the user acknowledges.
    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    /// `(columns, rows)` of the visible window.
    fn size(&self) -> (usize, usize) {
        DEFAULT_SIZE
    }
}

/// Window size assumed when the real one is unknown.
pub const DEFAULT_SIZE: (usize, usize) = (80, 25);

/// Terminal on the process's standard streams.
#[derive(Debug, Default)]
pub struct StdTerminal;

impl Terminal for StdTerminal {
    fn write_line(&mut self, level: Level, text: &str) {
        match level {
            Level::Info => println!("{text}"),
            Level::Warn | Level::Error => eprintln!("{text}"),
        }
    }

    fn clear(&mut self) {
        print!("\x1b[2J\x1b[H");
        let _ = io::stdout().flush();
    }

    fn pause(&mut self) -> Result<()> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }

    fn size(&self) -> (usize, usize) {
        match terminal_size::terminal_size() {
            Some((Width(w), Height(h))) => (usize::from(w), usize::from(h)),
            None => DEFAULT_SIZE,
        }
    }
}

/// In-memory terminal. Clones share the same buffer, so a test can keep a
/// handle while the shell owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTerminal {
    entries: Rc<RefCell<Vec<(Level, String)>>>,
    pauses: Rc<Cell<usize>>,
    size: Rc<Cell<Option<(usize, usize)>>>,
}

impl MemoryTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written, regardless of level.
    pub fn lines(&self) -> Vec<String> {
        self.entries.borrow().iter().map(|(_, l)| l.clone()).collect()
    }

    /// Lines written at `level`.
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(lv, _)| *lv == level)
            .map(|(_, l)| l.clone())
            .collect()
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.get()
    }

    /// Pretend the window is `columns` x `rows`.
    pub fn set_size(&self, columns: usize, rows: usize) {
        self.size.set(Some((columns, rows)));
    }

    pub fn reset(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Terminal for MemoryTerminal {
    fn write_line(&mut self, level: Level, text: &str) {
        self.entries.borrow_mut().push((level, text.to_string()));
    }

    fn clear(&mut self) {
        self.entries.borrow_mut().clear();
    }

    fn pause(&mut self) -> Result<()> {
        self.pauses.set(self.pauses.get() + 1);
        Ok(())
    }

    fn size(&self) -> (usize, usize) {
        self.size.get().unwrap_or(DEFAULT_SIZE)
    }
}

/// Where a command's output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Straight to the terminal.
    Console,
    /// Collected as lines, to be piped into the next segment.
    Capture,
    /// Appended line by line to a file.
    Redirect(PathBuf),
}

struct Output {
    mode: OutputMode,
    captured: Vec<String>,
    file: Option<BufWriter<File>>,
    failure: Option<io::Error>,
}

impl Output {
    fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            captured: Vec::new(),
            file: None,
            failure: None,
        }
    }

    fn append_to_file(&mut self, path: &PathBuf, text: &str) -> io::Result<()> {
        if self.file.is_none() {
            let f = OpenOptions::new().create(true).append(true).open(path)?;
            self.file = Some(BufWriter::new(f));
        }
        match self.file.as_mut() {
            Some(w) => writeln!(w, "{text}"),
            None => Ok(()),
        }
    }
}

/// Everything one command invocation may touch.
pub struct ExecutionContext<'a> {
    pub env: &'a mut Environment,
    pub proxy: &'a mut dyn ConnectionProxy,
    /// Arguments left after the command keyword was removed, plus any lines
    /// piped in from the previous segment.
    pub args: Vec<String>,
    /// The running script, when the command was issued from one.
    pub script: Option<&'a mut ScriptState>,
    pub interpreter: &'a Interpreter,
    output: Output,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        interpreter: &'a Interpreter,
        env: &'a mut Environment,
        proxy: &'a mut dyn ConnectionProxy,
        args: Vec<String>,
        script: Option<&'a mut ScriptState>,
        mode: OutputMode,
    ) -> Self {
        Self {
            env,
            proxy,
            args,
            script,
            interpreter,
            output: Output::new(mode),
        }
    }

    pub fn mode(&self) -> &OutputMode {
        &self.output.mode
    }

    pub fn info(&mut self, text: impl AsRef<str>) {
        self.emit(Level::Info, text.as_ref());
    }

    pub fn warn(&mut self, text: impl AsRef<str>) {
        self.emit(Level::Warn, &format!("WARNING - {}", text.as_ref()));
    }

    pub fn error(&mut self, text: impl AsRef<str>) {
        self.emit(Level::Error, &format!("ERROR - {}", text.as_ref()));
    }

    /// Diagnostic detail; goes to the log only.
    pub fn debug(&self, text: impl AsRef<str>) {
        log::debug!("{}", text.as_ref());
    }

    pub fn is_cancel_pending(&self) -> bool {
        self.interpreter.cancellation().is_cancel_pending()
    }

    fn emit(&mut self, level: Level, text: &str) {
        match self.output.mode.clone() {
            OutputMode::Console => self.env.terminal.write_line(level, text),
            OutputMode::Capture => self.output.captured.push(text.to_string()),
            OutputMode::Redirect(path) => {
                if self.output.failure.is_some() {
                    return;
                }
                if let Err(e) = self.output.append_to_file(&path, text) {
                    log::debug!("redirect to {} failed: {e}", path.display());
                    self.output.failure = Some(e);
                }
            },
        }
    }

    /// Close the context: flush redirected output and hand back captured
    /// lines.
    pub fn finish(mut self) -> Result<Vec<String>> {
        if let OutputMode::Redirect(path) = &self.output.mode {
            if let Some(mut w) = self.output.file.take()
                && let Err(e) = w.flush()
                && self.output.failure.is_none()
            {
                self.output.failure = Some(e);
            }
            if let Some(source) = self.output.failure.take() {
                return Err(ShellError::OutputRedirection {
                    path: path.clone(),
                    source,
                });
            }
        }
        Ok(std::mem::take(&mut self.output.captured))
    }
}
