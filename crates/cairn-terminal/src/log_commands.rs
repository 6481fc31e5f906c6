//! The `log` library: write messages to the output and the log facade.

use cairn_types::error::Result;

use crate::context::ExecutionContext;
use crate::interpreter::Command;
use crate::registry::{CommandDescriptor, CommandLibrary};

const LOG_CATEGORY: &str = "Log";
const LOG_TARGET: &str = "cairn::script";

/// Library registered on demand with `load log`.
#[derive(Debug, Default)]
pub struct LogLibrary;

impl CommandLibrary for LogLibrary {
    fn name(&self) -> &str {
        "log"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new(LOG_CATEGORY, "info", info)
                .description("Log an informational message")
                .example("Log\\info Backup started"),
            CommandDescriptor::new(LOG_CATEGORY, "warn", warn)
                .description("Log a warning")
                .example("Log\\warn Disk almost full"),
            CommandDescriptor::new(LOG_CATEGORY, "error", error)
                .description("Log an error")
                .example("Log\\error Backup failed"),
            CommandDescriptor::new(LOG_CATEGORY, "debug", debug)
                .description("Log a debug message, shown only with debug logging enabled")
                .example("Log\\debug value=%X%"),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
enum Severity {
    Info,
    Warn,
    Error,
    Debug,
}

fn info() -> Box<dyn Command> {
    Box::new(LogCmd(Severity::Info))
}
fn warn() -> Box<dyn Command> {
    Box::new(LogCmd(Severity::Warn))
}
fn error() -> Box<dyn Command> {
    Box::new(LogCmd(Severity::Error))
}
fn debug() -> Box<dyn Command> {
    Box::new(LogCmd(Severity::Debug))
}

struct LogCmd(Severity);

impl Command for LogCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let message = ctx.args.join(" ");
        match self.0 {
            Severity::Info => {
                log::info!(target: LOG_TARGET, "{message}");
                ctx.info(message);
            },
            Severity::Warn => {
                log::warn!(target: LOG_TARGET, "{message}");
                ctx.warn(message);
            },
            Severity::Error => {
                log::error!(target: LOG_TARGET, "{message}");
                ctx.error(message);
            },
            Severity::Debug => log::debug!(target: LOG_TARGET, "{message}"),
        }
        Ok(())
    }
}
