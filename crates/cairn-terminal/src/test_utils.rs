//! Shared helpers for unit tests.

use std::sync::Arc;

use cairn_types::error::{Result, ShellError};

use crate::cancel::CancellationState;
use crate::context::MemoryTerminal;
use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::proxy::ConnectionProxy;
use crate::registry::CommandRegistry;

/// Proxy that accepts `connect(server, user)` and records calls.
#[derive(Debug, Default)]
pub struct MockProxy {
    pub logged_in: bool,
    pub user: String,
    pub servers: String,
    pub disconnects: usize,
}

impl ConnectionProxy for MockProxy {
    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn connected_user(&self) -> String {
        self.user.clone()
    }

    fn server_list(&self) -> String {
        self.servers.clone()
    }

    fn connect(&mut self, args: &[String]) -> Result<()> {
        let Some(server) = args.first() else {
            return Err(ShellError::ServerConnection(
                "no server given".to_string(),
            ));
        };
        self.servers = server.clone();
        self.user = args.get(1).cloned().unwrap_or_default();
        self.logged_in = true;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.logged_in = false;
        self.user.clear();
        self.servers.clear();
        self.disconnects += 1;
        Ok(())
    }
}

/// Interpreter, environment and proxy wired over a registry holding the
/// core commands, with `log` and `system` available to `load`.
pub struct TestSession {
    pub interp: Interpreter,
    pub env: Environment,
    pub proxy: MockProxy,
    pub term: MemoryTerminal,
}

impl TestSession {
    pub fn new() -> Self {
        let registry = Arc::new(CommandRegistry::new());
        crate::register_builtins(&registry);
        let interp = Interpreter::new(Arc::clone(&registry), Arc::new(CancellationState::new()));
        let term = MemoryTerminal::new();
        let env = Environment::new(registry, Box::new(term.clone()));
        Self {
            interp,
            env,
            proxy: MockProxy::default(),
            term,
        }
    }

    pub fn run(&mut self, line: &str) -> Result<()> {
        self.interp
            .interpret_line(line, &mut self.env, &mut self.proxy, None)
    }
}
