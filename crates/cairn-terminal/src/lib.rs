//! Command engine for the cairn shell.
//!
//! Commands are described by [`CommandDescriptor`]s grouped into
//! [`CommandLibrary`]s and registered into a [`CommandRegistry`]. The
//! [`Interpreter`] parses lines, resolves keywords against the registry and
//! dispatches [`Command::execute`] with a fresh [`ExecutionContext`]. A
//! [`Shell`] ties interpreter, environment and connection proxy into one
//! session.

use std::sync::Arc;

pub mod cancel;
pub mod context;
pub mod environment;
mod global_commands;
pub mod interpreter;
pub mod log_commands;
pub mod perf;
pub mod proxy;
pub mod registry;
pub mod script;
mod script_commands;
pub mod server_commands;
pub mod shell;
pub mod system_commands;
pub mod temp;

#[cfg(test)]
mod test_utils;

/// Process-wide cancellation counters.
pub use cancel::CancellationState;
/// Per-invocation state handed to commands.
pub use context::{ExecutionContext, Level, MemoryTerminal, OutputMode, StdTerminal, Terminal};
/// Session state shared by all commands.
pub use environment::{Environment, RunningMode, Variables};
/// A single executable command and the line interpreter.
pub use interpreter::{Command, Interpreter};
pub use log_commands::LogLibrary;
/// Connection proxy seam.
pub use proxy::{ConnectionProxy, NullProxy, ProxyFactory};
/// Category/keyword command table.
pub use registry::{CommandDescriptor, CommandLibrary, CommandRegistry, LibraryInfo};
pub use script::{ScriptState, ScriptStatus};
pub use shell::{LineSource, Shell, completion_candidates};
pub use system_commands::SystemLibrary;

/// The commands every shell has: global, scripting and session commands.
#[derive(Debug, Default)]
pub struct CoreLibrary;

impl CommandLibrary for CoreLibrary {
    fn name(&self) -> &str {
        "core"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn commands(&self) -> Vec<CommandDescriptor> {
        let mut commands = global_commands::descriptors();
        commands.extend(script_commands::descriptors());
        commands.extend(server_commands::descriptors());
        commands
    }
}

/// Register the core commands and make the optional libraries available
/// to `load`. Returns the number of commands registered.
pub fn register_builtins(registry: &CommandRegistry) -> usize {
    registry.add_to_catalog(Arc::new(LogLibrary));
    registry.add_to_catalog(Arc::new(SystemLibrary));
    registry.register(&CoreLibrary)
}
