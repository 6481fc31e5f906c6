//! Session commands in the `Servers` category.

use cairn_types::error::Result;

use crate::context::ExecutionContext;
use crate::interpreter::Command;
use crate::registry::CommandDescriptor;

pub const SERVERS_CATEGORY: &str = "Servers";

pub(crate) fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(SERVERS_CATEGORY, "login", login)
            .description("Open a session, closing the current one first")
            .parameter("Connection arguments understood by the active proxy")
            .example("Servers\\login server1 user1"),
        CommandDescriptor::new(SERVERS_CATEGORY, "logout", logout)
            .description("Close the current session")
            .example("Servers\\logout")
            .requires_connection(),
    ]
}

fn login() -> Box<dyn Command> {
    Box::new(LoginCmd)
}
fn logout() -> Box<dyn Command> {
    Box::new(LogoutCmd)
}

struct LoginCmd;
impl Command for LoginCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        if ctx.proxy.is_logged_in() {
            ctx.proxy.disconnect()?;
        }
        let args = ctx.args.clone();
        ctx.proxy.connect(&args)?;
        let line = format!(
            "Logged in as {} on {}",
            ctx.proxy.connected_user(),
            ctx.proxy.server_list()
        );
        ctx.info(line);
        Ok(())
    }
}

struct LogoutCmd;
impl Command for LogoutCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        ctx.proxy.disconnect()?;
        ctx.info("Client logged off");
        Ok(())
    }
}
