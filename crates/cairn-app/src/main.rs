//! cairn entry point.
//!
//! Runs a command line given on the process arguments once in batch mode,
//! otherwise (or with `-forceInteractive`) drops into the interactive
//! read-eval loop. Ctrl-C requests cancellation of the running command
//! instead of killing the process.

mod editor;
mod options;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use cairn_terminal::{CancellationState, CommandRegistry, Shell, StdTerminal, register_builtins};
use cairn_types::config::ShellConfig;

use editor::{LineEditor, StdinLines};
use options::{LaunchOptions, USAGE};

fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> Result<()> {
    let opts = LaunchOptions::parse(std::env::args().skip(1));

    let exe_dir = exe_dir();
    let config_path = ShellConfig::locate(&exe_dir);
    let loaded = ShellConfig::load(&config_path);
    let config = match &loaded {
        Ok(Some(config)) => config.clone(),
        Ok(None) | Err(_) => ShellConfig::default(),
    };

    // The default log filter comes from the config.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();
    match &loaded {
        Ok(Some(_)) => log::debug!("config loaded from {}", config_path.display()),
        Ok(None) => log::debug!("no config at {}, using defaults", config_path.display()),
        Err(e) => log::error!("ignoring config {}: {e}", config_path.display()),
    }

    if opts.show_usage {
        println!("{USAGE}");
        return Ok(());
    }

    // Set up the command registry.
    let registry = Arc::new(CommandRegistry::new());
    let count = register_builtins(&registry);
    log::debug!("registered {count} core commands");
    for name in &config.autoload {
        match registry.load(name) {
            Ok(n) => log::debug!("autoloaded {name} ({n} commands)"),
            Err(e) => log::error!("autoload of {name} failed: {e}"),
        }
    }

    let cancel = Arc::new(CancellationState::new());
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || cancel.signal_cancel())?;
    }

    if !opts.no_logo {
        println!(
            "Cairn command shell [Version {}]",
            env!("CARGO_PKG_VERSION")
        );
    }

    let mut shell = Shell::new(
        Arc::clone(&registry),
        cancel,
        Box::new(StdTerminal),
        &config,
    );
    shell.env_mut().run_in_console = !opts.io_redirected;

    if !opts.login_args.is_empty() {
        shell.login(&opts.login_args);
    }

    if !opts.no_startup_script {
        shell.run_startup_script(&exe_dir.join(&config.startup_script));
    }

    if shell.args_contain_commands(&opts.command) {
        shell.run_batch(opts.command, opts.force_interactive)?;
        if !opts.force_interactive || shell.env().exit_pending() {
            shell.shutdown();
            return Ok(());
        }
    }

    if opts.io_redirected {
        shell.run_interactive(&mut StdinLines)?;
    } else {
        let mut editor = LineEditor::new(registry, config.history_file.clone())?;
        let result = shell.run_interactive(&mut editor);
        editor.save_history();
        result?;
    }

    shell.shutdown();
    Ok(())
}
