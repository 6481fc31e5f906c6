//! Launch flags.
//!
//! Flags are matched case-insensitively and removed from the argument list;
//! whatever remains is a command line for batch mode.

pub const USAGE: &str = "\
Usage: cairn [options] [command line]

Options:
  -?, -h, /?, /h       Show this help and exit
  -forceInteractive    Stay interactive after running the command line
  -noStartUpScript     Skip the startup script
  -nologo              Do not print the version banner
  -IoRedirected        Read plain lines from stdin instead of the line editor
  -login:<arg>         Connect to a server before running anything";

const LOGIN_PREFIX: &str = "-login:";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub show_usage: bool,
    pub force_interactive: bool,
    pub no_startup_script: bool,
    pub no_logo: bool,
    pub io_redirected: bool,
    /// `-login:` arguments, verbatim, for the connection proxy.
    pub login_args: Vec<String>,
    /// Everything that is not a launch flag.
    pub command: Vec<String>,
}

impl LaunchOptions {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let mut opts = Self::default();
        for arg in args {
            let lower = arg.to_lowercase();
            match lower.as_str() {
                "-?" | "-h" | "/?" | "/h" => opts.show_usage = true,
                "-forceinteractive" => opts.force_interactive = true,
                "-nostartupscript" => opts.no_startup_script = true,
                "-nologo" => opts.no_logo = true,
                "-ioredirected" => opts.io_redirected = true,
                _ if lower.starts_with(LOGIN_PREFIX) => opts.login_args.push(arg),
                _ => opts.command.push(arg),
            }
        }
        opts
    }
}
