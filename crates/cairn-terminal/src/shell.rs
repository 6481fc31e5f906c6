//! One shell session: interpreter, environment and connection proxy, plus
//! the batch and interactive dispatch loops.

use std::path::Path;
use std::sync::Arc;

use cairn_types::config::ShellConfig;
use cairn_types::error::{Result, ShellError, format_error_chain};

use crate::cancel::CancellationState;
use crate::context::{Level, Terminal};
use crate::environment::{Environment, RunningMode};
use crate::global_commands::libs_variable;
use crate::interpreter::Interpreter;
use crate::perf::PerfMonitor;
use crate::proxy::ConnectionProxy;
use crate::registry::CommandRegistry;

/// Log target for raw input lines.
pub const INPUT_TARGET: &str = "cairn::terminal::input";

/// Source of interactive input lines.
pub trait LineSource {
    /// Show `prompt` and read one line; `None` at end of input. `category`
    /// is the current category, for completion.
    fn read_line(&mut self, prompt: &str, category: &str) -> Option<String>;
}

/// Candidates for `word` typed in `category`; `..` is offered on an empty
/// word outside the root.
pub fn completion_candidates(registry: &CommandRegistry, category: &str, word: &str) -> Vec<String> {
    let mut out = registry.completions(category, word);
    if !category.is_empty() && word.is_empty() {
        out.push("..".to_string());
    }
    out
}

pub struct Shell {
    interpreter: Interpreter,
    env: Environment,
    proxy: Box<dyn ConnectionProxy>,
    shut_down: bool,
}

impl Shell {
    pub fn new(
        registry: Arc<CommandRegistry>,
        cancel: Arc<CancellationState>,
        terminal: Box<dyn Terminal>,
        config: &ShellConfig,
    ) -> Self {
        let proxy = registry.proxy_factory().create_proxy();
        let mut env = Environment::new(Arc::clone(&registry), terminal)
            .with_temp_root(config.temp_root.clone());

        let temp = config
            .temp_root
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        env.variables.set("TEMP", temp.display().to_string());
        if let Ok(cd) = std::env::current_dir() {
            env.variables.set("CD", cd.display().to_string());
        }
        env.variables.set("LIBS", libs_variable(&registry));
        for (name, value) in &config.variables {
            env.variables.set(name, value.clone());
        }

        Self {
            interpreter: Interpreter::new(registry, cancel),
            env,
            proxy,
            shut_down: false,
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    pub fn proxy(&self) -> &dyn ConnectionProxy {
        self.proxy.as_ref()
    }

    /// Interpret one line and return any error unreported.
    pub fn interpret_line(&mut self, line: &str) -> Result<()> {
        self.interpreter
            .interpret_line(line, &mut self.env, self.proxy.as_mut(), None)
    }

    /// Interpret one line as typed by the user. Recoverable errors are
    /// reported on the terminal; anything else is returned.
    pub fn input_line(&mut self, line: &str) -> Result<()> {
        log::debug!(target: INPUT_TARGET, "{line}");
        match self.interpret_line(line) {
            Err(e) if e.is_recoverable() => {
                self.report(&e);
                Ok(())
            },
            other => other,
        }
    }

    pub fn args_contain_commands(&self, args: &[String]) -> bool {
        self.interpreter
            .args_contain_commands(self.env.category(), args)
    }

    /// Connect with `-login:` launch arguments. Failures are reported and
    /// the shell stays disconnected.
    pub fn login(&mut self, args: &[String]) {
        if let Err(e) = self.proxy.connect(args) {
            log::debug!("{e:?}");
            self.env
                .terminal
                .write_line(Level::Error, &format!("Login failed: {e}"));
        }
    }

    /// Run the startup script if it exists. Nothing it does is fatal.
    pub fn run_startup_script(&mut self, path: &Path) {
        if !path.is_file() {
            log::debug!("no startup script at {}", path.display());
            return;
        }
        let _perf = PerfMonitor::start("Startup script execution time");
        let line = format!("run \"{}\"", path.display());
        if let Err(e) = self.input_line(&line) {
            log::error!("startup script {} failed: {e}", path.display());
            self.report(&e);
        }
    }

    /// Execute launch arguments once. Recoverable errors are reported and
    /// end the run.
    pub fn run_batch(&mut self, args: Vec<String>, force_interactive: bool) -> Result<()> {
        self.env.running_mode = if force_interactive {
            RunningMode::Interactive
        } else {
            RunningMode::Batch
        };
        let _perf = PerfMonitor::start("Total execution time");
        log::debug!(target: INPUT_TARGET, "{}", args.join(" "));
        let result = self
            .interpreter
            .interpret_args(args, &mut self.env, self.proxy.as_mut(), None);
        match result {
            Err(e) if e.is_recoverable() => {
                self.report(&e);
                Ok(())
            },
            other => other,
        }
    }

    /// Read and interpret lines until `exit` or end of input.
    pub fn run_interactive(&mut self, source: &mut dyn LineSource) -> Result<()> {
        self.env.running_mode = RunningMode::Interactive;
        while !self.env.exit_pending() {
            let prompt = self.prompt();
            let Some(line) = source.read_line(&prompt, self.env.category()) else {
                log::debug!("end of input");
                break;
            };
            self.input_line(&line)?;
        }
        Ok(())
    }

    /// `user@servers\category>`
    pub fn prompt(&self) -> String {
        format!(
            "{}@{}\\{}>",
            self.proxy.connected_user(),
            self.proxy.server_list(),
            self.env.category()
        )
    }

    /// Completion candidates for the last word of `text`.
    pub fn completions(&self, text: &str) -> Vec<String> {
        let words = self.interpreter.parse_line(text, &self.env.variables);
        let last = if text.ends_with(char::is_whitespace) {
            ""
        } else {
            words.last().map(String::as_str).unwrap_or("")
        };
        completion_candidates(self.interpreter.registry(), self.env.category(), last)
    }

    /// Disconnect and delete temp folders. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if self.proxy.is_logged_in()
            && let Err(e) = self.proxy.disconnect()
        {
            log::warn!("disconnect at shutdown failed: {e}");
        }
        self.env.temp_folders().release_all();
        log::debug!("shell shut down");
    }

    fn report(&mut self, err: &ShellError) {
        let headline = match err {
            ShellError::UnknownCommand { .. } => {
                self.env.terminal.write_line(Level::Error, "Unknown command");
                log::debug!("{err:?}");
                return;
            },
            ShellError::CommandExecution { command, .. } => {
                format!("An exception occurred while processing command \"{command}\"")
            },
            ShellError::CommandLineInterpretation { .. } => {
                "An exception occurred while processing command line".to_string()
            },
            ShellError::ServerConnection(_) => {
                "An exception occurred while connecting to server".to_string()
            },
            ShellError::OutputRedirection { .. } => {
                "An exception occurred while redirecting command output".to_string()
            },
            _ => "An error occurred".to_string(),
        };
        log::debug!("{err:?}");
        let text = format_error_chain(&headline, err);
        for line in text.lines() {
            self.env.terminal.write_line(Level::Error, line);
        }
    }
}

impl Drop for Shell {
    fn drop(&mut self) {
        self.shutdown();
    }
}
