//! Script control commands: `run`, `goto`, `onerror`, `rem`, `sleep`, `pause`.

use std::path::Path;
use std::time::{Duration, Instant};

use cairn_types::error::{Result, ShellError};

use crate::context::ExecutionContext;
use crate::environment::RunningMode;
use crate::interpreter::Command;
use crate::perf::PerfMonitor;
use crate::registry::{CommandDescriptor, WILDCARD_CATEGORY};
use crate::script::{self, ScriptState};

/// Granularity of cancellation polling while sleeping.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

pub(crate) fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(WILDCARD_CATEGORY, "run", run)
            .description("Run a script file line by line")
            .parameter("Path: script file")
            .example("run myscript.txt"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "goto", goto)
            .description("Continue the script at the given line")
            .parameter("LineNumber: 1-based line of the script, blank lines not counted")
            .example("goto 1"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "onerror", on_error)
            .description("Choose whether a failing line stops the script")
            .parameter("break: stop at the first error")
            .parameter("continue: report the error and go on (default)")
            .example("onerror break"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "rem", remark)
            .description("Comment line, ignored")
            .example("rem this line does nothing"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "sleep", sleep)
            .description("Wait for a number of seconds")
            .parameter("Seconds: time to wait")
            .example("sleep 5"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "pause", pause)
            .description("Wait until the user presses enter")
            .example("pause"),
    ]
}

fn run() -> Box<dyn Command> {
    Box::new(RunCmd)
}
fn goto() -> Box<dyn Command> {
    Box::new(GotoCmd)
}
fn on_error() -> Box<dyn Command> {
    Box::new(OnErrorCmd)
}
fn remark() -> Box<dyn Command> {
    Box::new(RemCmd)
}
fn sleep() -> Box<dyn Command> {
    Box::new(SleepCmd)
}
fn pause() -> Box<dyn Command> {
    Box::new(PauseCmd)
}

fn current_script<'s>(ctx: &'s mut ExecutionContext<'_>) -> Result<&'s mut ScriptState> {
    ctx.script
        .as_deref_mut()
        .ok_or_else(|| ShellError::NotSupported("only available inside a script".to_string()))
}

struct RunCmd;
impl Command for RunCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let path = ctx
            .args
            .iter()
            .find(|a| Path::new(a).is_file())
            .cloned()
            .ok_or_else(|| {
                ShellError::InvalidArgument(format!(
                    "Cannot find script file: {}",
                    ctx.args.join(" ")
                ))
            })?;
        let _perf = PerfMonitor::start(format!("Script {path} execution time"));
        let status = script::run_script(ctx, Path::new(&path))?;
        ctx.debug(format!("script {path} ended as {status:?}"));
        Ok(())
    }
}

struct GotoCmd;
impl Command for GotoCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let target = ctx.args.first().cloned().unwrap_or_default();
        let line: usize = target
            .parse()
            .map_err(|_| ShellError::InvalidArgument(format!("not a line number: {target}")))?;
        current_script(ctx)?.goto(line);
        Ok(())
    }

    fn script_only(&self) -> bool {
        true
    }
}

struct OnErrorCmd;
impl Command for OnErrorCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let break_on_error = match ctx.args.as_slice() {
            [] => {
                return Err(ShellError::InvalidArgument(
                    "This command does not take 0 arguments".to_string(),
                ));
            },
            args if args.iter().any(|a| a.eq_ignore_ascii_case("break")) => true,
            args if args.iter().any(|a| a.eq_ignore_ascii_case("continue")) => false,
            args => {
                return Err(ShellError::OutOfRange(format!(
                    "Invalid value: {}",
                    args.join(" ")
                )));
            },
        };
        current_script(ctx)?.break_on_error = break_on_error;
        Ok(())
    }

    fn script_only(&self) -> bool {
        true
    }
}

struct RemCmd;
impl Command for RemCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        ctx.debug(format!("commented out: {}", ctx.args.join(" ")));
        Ok(())
    }

    fn script_only(&self) -> bool {
        true
    }
}

struct SleepCmd;
impl Command for SleepCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let arg = ctx.args.first().cloned().unwrap_or_default();
        let total = arg
            .parse::<f64>()
            .ok()
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .ok_or_else(|| ShellError::InvalidArgument(format!("not a duration: {arg}")))?;
        let start = Instant::now();
        while let Some(left) = total.checked_sub(start.elapsed()) {
            if left.is_zero() || ctx.is_cancel_pending() {
                break;
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
        Ok(())
    }

    fn script_only(&self) -> bool {
        true
    }
}

struct PauseCmd;
impl Command for PauseCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        if ctx.env.running_mode != RunningMode::Interactive || !ctx.env.run_in_console {
            ctx.debug("pause skipped outside an interactive console");
            return Ok(());
        }
        ctx.info("Press enter to continue...");
        if let Some(s) = ctx.script.as_deref_mut() {
            s.set_paused(true);
        }
        let result = ctx.env.terminal.pause();
        if let Some(s) = ctx.script.as_deref_mut() {
            s.set_paused(false);
        }
        result
    }
}
