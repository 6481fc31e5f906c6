//! The `system` library: process environment and base64 helpers.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cairn_types::error::{Result, ShellError};

use crate::context::ExecutionContext;
use crate::interpreter::Command;
use crate::registry::{CommandDescriptor, CommandLibrary};

const SYSTEM_CATEGORY: &str = "System";

/// Library registered on demand with `load system`.
#[derive(Debug, Default)]
pub struct SystemLibrary;

impl CommandLibrary for SystemLibrary {
    fn name(&self) -> &str {
        "system"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        vec![
            CommandDescriptor::new(SYSTEM_CATEGORY, "getvar", get_var)
                .description("Write the value of an operating system environment variable")
                .parameter("Name: variable name")
                .example("System\\getvar PATH"),
            CommandDescriptor::new(SYSTEM_CATEGORY, "tobase64", to_base64)
                .description("Encode the arguments, joined by spaces, as base64")
                .parameter("Text: data to encode")
                .example("System\\tobase64 hello world"),
            CommandDescriptor::new(SYSTEM_CATEGORY, "frombase64", from_base64)
                .description("Decode each argument from base64")
                .parameter("Data: base64 strings")
                .example("System\\frombase64 aGVsbG8="),
        ]
    }
}

fn get_var() -> Box<dyn Command> {
    Box::new(GetVarCmd)
}
fn to_base64() -> Box<dyn Command> {
    Box::new(ToBase64Cmd)
}
fn from_base64() -> Box<dyn Command> {
    Box::new(FromBase64Cmd)
}

// ---------------------------------------------------------------------------
// getvar
// ---------------------------------------------------------------------------

struct GetVarCmd;
impl Command for GetVarCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let Some(name) = ctx.args.first().cloned() else {
            return Err(ShellError::InvalidArgument(
                "a variable name is expected".to_string(),
            ));
        };
        match std::env::var(&name) {
            Ok(value) => ctx.info(value),
            Err(_) => ctx.debug(format!("environment variable {name} is not set")),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// tobase64 / frombase64
// ---------------------------------------------------------------------------

struct ToBase64Cmd;
impl Command for ToBase64Cmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let encoded = STANDARD.encode(ctx.args.join(" "));
        ctx.info(encoded);
        Ok(())
    }
}

struct FromBase64Cmd;
impl Command for FromBase64Cmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let mut decoded = Vec::with_capacity(ctx.args.len());
        for arg in &ctx.args {
            let bytes = STANDARD
                .decode(arg)
                .map_err(|e| ShellError::InvalidArgument(format!("not base64: {arg} ({e})")))?;
            decoded.push(String::from_utf8_lossy(&bytes).into_owned());
        }
        for line in decoded {
            if ctx.is_cancel_pending() {
                break;
            }
            ctx.info(line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestSession;

    fn session() -> TestSession {
        let mut s = TestSession::new();
        s.run("load system").unwrap();
        s.term.reset();
        s
    }

    #[test]
    fn base64_pipeline() {
        let mut s = session();
        s.run("System\\tobase64 hello world").unwrap();
        s.run("System\\tobase64 hello world | System\\frombase64").unwrap();
        assert_eq!(s.term.lines(), vec!["aGVsbG8gd29ybGQ=", "hello world"]);
    }

    #[test]
    fn invalid_base64_fails() {
        let mut s = session();
        let err = s.run("System\\frombase64 !!!").unwrap_err();
        assert_eq!(err.kind(), "CommandExecution");
    }

    #[test]
    fn getvar_reads_process_environment() {
        let mut s = session();
        let path = std::env::var("PATH").unwrap_or_default();
        s.run("System\\getvar PATH").unwrap();
        s.run("System\\getvar CAIRN_SURELY_UNSET_VARIABLE").unwrap();
        if path.is_empty() {
            assert!(s.term.lines().is_empty());
        } else {
            assert_eq!(s.term.lines(), vec![path]);
        }
    }
}
