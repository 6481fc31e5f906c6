//! Command trait, line parsing, and dispatch.
//!
//! A line goes through four steps: `%NAME%` variables are substituted, the
//! text is split into tokens, the tokens are split into pipeline segments
//! and an optional redirect, and each segment is resolved against the
//! registry and executed. Output of a segment followed by `|` is captured
//! and appended to the next segment's arguments.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use cairn_types::error::{Result, ShellError};
use regex::{Captures, Regex};

use crate::cancel::CancellationState;
use crate::context::{ExecutionContext, OutputMode};
use crate::environment::{Environment, Variables};
use crate::perf::PerfMonitor;
use crate::proxy::ConnectionProxy;
use crate::registry::{CommandDescriptor, CommandRegistry};
use crate::script::ScriptState;

/// A single executable command. A fresh instance is created for every
/// execution from its descriptor's factory.
pub trait Command {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()>;

    /// Script-only commands print their help instead of running when issued
    /// outside a script.
    fn script_only(&self) -> bool {
        false
    }
}

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[\w\-]+%").expect("constant pattern"));

/// Replace every `%NAME%` with the variable's value. Unknown names are left
/// as written.
pub fn expand_variables(line: &str, vars: &Variables) -> String {
    VARIABLE
        .replace_all(line, |caps: &Captures<'_>| {
            let token = &caps[0];
            let name = &token[1..token.len() - 1];
            match vars.get(name) {
                Some(value) => value.to_string(),
                None => token.to_string(),
            }
        })
        .into_owned()
}

/// Split `line` on whitespace. A double-quoted span is one token, with the
/// quotes removed; a quote also ends any token it touches. Tokens are trimmed
/// and empty ones dropped.
pub fn tokenize(line: &str) -> Vec<String> {
    fn flush(tokens: &mut Vec<String>, text: &str) {
        let t = text.trim();
        if !t.is_empty() {
            tokens.push(t.to_string());
        }
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                flush(&mut tokens, &current);
                current.clear();
                let quoted: String = chars.by_ref().take_while(|&c| c != '"').collect();
                flush(&mut tokens, &quoted);
            },
            c if c.is_whitespace() => {
                flush(&mut tokens, &current);
                current.clear();
            },
            c => current.push(c),
        }
    }
    flush(&mut tokens, &current);
    tokens
}

/// Output redirect parsed from a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: PathBuf,
    pub append: bool,
}

/// A line split at its flow-control tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowControl {
    /// Pipeline segments in execution order. Never empty.
    pub segments: Vec<Vec<String>>,
    pub redirect: Option<Redirect>,
}

/// Split tokens at `|` into segments and pull off a whole-line redirect.
///
/// Everything from the first `>` or `>>` onwards belongs to the redirect;
/// the last operator in that tail that is followed by a path decides the
/// target and mode.
pub fn split_flow_control(mut args: Vec<String>) -> Result<FlowControl> {
    let is_redirect = |t: &String| t == ">" || t == ">>";
    let redirect = match args.iter().position(is_redirect) {
        None => None,
        Some(at) => {
            let tail = args.split_off(at);
            let op = tail.iter().rposition(is_redirect).unwrap_or(0);
            match tail.get(op + 1) {
                Some(path) => Some(Redirect {
                    path: PathBuf::from(path),
                    append: tail[op] == ">>",
                }),
                None => {
                    args.extend(tail);
                    return Err(ShellError::interpretation(
                        &args,
                        "Missing file name after output redirection operator",
                        None,
                    ));
                },
            }
        },
    };

    let segments = args
        .split(|t| t == "|")
        .map(<[String]>::to_vec)
        .collect::<Vec<_>>();
    Ok(FlowControl { segments, redirect })
}

/// Resolves and executes command lines.
pub struct Interpreter {
    registry: Arc<CommandRegistry>,
    cancel: Arc<CancellationState>,
}

impl Interpreter {
    pub fn new(registry: Arc<CommandRegistry>, cancel: Arc<CancellationState>) -> Self {
        Self { registry, cancel }
    }

    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    pub fn cancellation(&self) -> &Arc<CancellationState> {
        &self.cancel
    }

    /// Substitute variables and tokenize.
    pub fn parse_line(&self, line: &str, vars: &Variables) -> Vec<String> {
        tokenize(&expand_variables(line, vars))
    }

    /// Whether any token resolves to a command from the current category.
    pub fn args_contain_commands(&self, category: &str, args: &[String]) -> bool {
        args.iter().any(|a| self.registry.command_exists(category, a))
    }

    /// Parse and execute one line.
    pub fn interpret_line(
        &self,
        line: &str,
        env: &mut Environment,
        proxy: &mut dyn ConnectionProxy,
        script: Option<&mut ScriptState>,
    ) -> Result<()> {
        let args = self.parse_line(line, &env.variables);
        self.interpret_args(args, env, proxy, script)
    }

    /// Execute an already tokenized line. Errors outside the interpreter
    /// taxonomy are wrapped into `CommandLineInterpretation`.
    pub fn interpret_args(
        &self,
        args: Vec<String>,
        env: &mut Environment,
        proxy: &mut dyn ConnectionProxy,
        mut script: Option<&mut ScriptState>,
    ) -> Result<()> {
        if args.is_empty() {
            return Ok(());
        }
        let _scope = self.cancel.enter_scope();
        let line_args = args.clone();
        let flow = split_flow_control(args)?;

        if let Some(r) = &flow.redirect
            && !r.append
        {
            truncate_target(&r.path)?;
        }

        let last = flow.segments.len() - 1;
        let mut piped: Vec<String> = Vec::new();
        for (i, mut segment) in flow.segments.into_iter().enumerate() {
            if self.cancel.is_cancel_pending() {
                log::debug!("cancel pending, skipping remaining pipeline segments");
                return Ok(());
            }
            segment.append(&mut piped);
            let mode = match (&flow.redirect, i == last) {
                (_, false) => OutputMode::Capture,
                (Some(r), true) => OutputMode::Redirect(r.path.clone()),
                (None, true) => OutputMode::Console,
            };
            piped = self
                .execute_segment(segment, env, proxy, script.as_deref_mut(), mode)
                .map_err(|e| {
                    if e.is_interpreter_kind() {
                        e
                    } else {
                        ShellError::interpretation(
                            &line_args,
                            format!("Error interpreting command line \"{}\"", line_args.join(" ")),
                            Some(e),
                        )
                    }
                })?;
        }
        Ok(())
    }

    /// Find the first token that names a command and remove it from `args`.
    fn resolve_segment(
        &self,
        category: &str,
        mut args: Vec<String>,
    ) -> Result<(Arc<CommandDescriptor>, Vec<String>)> {
        let found = args
            .iter()
            .enumerate()
            .find_map(|(i, a)| self.registry.resolve(category, a).map(|d| (i, d)));
        match found {
            Some((i, desc)) => {
                args.remove(i);
                Ok((desc, args))
            },
            None => Err(ShellError::UnknownCommand { args }),
        }
    }

    fn execute_segment(
        &self,
        args: Vec<String>,
        env: &mut Environment,
        proxy: &mut dyn ConnectionProxy,
        script: Option<&mut ScriptState>,
        mode: OutputMode,
    ) -> Result<Vec<String>> {
        let (desc, args) = self.resolve_segment(env.category(), args)?;
        let name = desc.qualified_name();
        let _perf = PerfMonitor::start(format!("Command \"{name}\" execution time"));
        log::debug!("executing {name} with {} argument(s)", args.len());

        if desc.requires_connection && !proxy.is_logged_in() {
            return Err(ShellError::execution(
                &name,
                "A connection to a server is required to process this command",
                None,
            ));
        }

        let command = desc.instantiate();
        let in_script = script.is_some();
        let mut ctx = ExecutionContext::new(self, env, proxy, args, script, mode);
        let result = if command.script_only() && !in_script {
            for line in desc.help_lines() {
                ctx.info(line);
            }
            Ok(())
        } else {
            command.execute(&mut ctx)
        };
        let output = ctx.finish();

        match result {
            Ok(()) => output,
            Err(e) if e.is_interpreter_kind() => Err(e),
            Err(e) => Err(ShellError::execution(
                &name,
                format!("Failed to process command {name}"),
                Some(e),
            )),
        }
    }
}

fn truncate_target(path: &PathBuf) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(ShellError::OutputRedirection {
            path: path.clone(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MemoryTerminal;
    use crate::proxy::NullProxy;
    use crate::registry::CommandLibrary;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    // -- Parsing --

    #[test]
    fn tokenize_simple() {
        assert_eq!(tokenize("echo hello world"), strings(&["echo", "hello", "world"]));
    }

    #[test]
    fn tokenize_quoted_span() {
        assert_eq!(
            tokenize(r#"echo "hello world" x"#),
            strings(&["echo", "hello world", "x"])
        );
    }

    #[test]
    fn tokenize_drops_empty_and_trims_quotes() {
        assert_eq!(tokenize(r#"a "" "  b  " c"#), strings(&["a", "b", "c"]));
    }

    #[test]
    fn tokenize_quote_splits_adjacent_text() {
        assert_eq!(tokenize(r#"abc"d e"f"#), strings(&["abc", "d e", "f"]));
    }

    #[test]
    fn tokenize_unterminated_quote_takes_rest() {
        assert_eq!(tokenize(r#"echo "a b"#), strings(&["echo", "a b"]));
    }

    #[test]
    fn tokenize_whitespace_only() {
        assert!(tokenize(" \t  ").is_empty());
    }

    #[test]
    fn expand_known_and_unknown() {
        let mut vars = Variables::new();
        vars.set("X", "hello");
        vars.set("my-var_2", "v");
        assert_eq!(expand_variables("echo %X% %Y%", &vars), "echo hello %Y%");
        assert_eq!(expand_variables("%x%%MY-VAR_2%", &vars), "hellov");
        assert_eq!(expand_variables("100% done", &vars), "100% done");
    }

    #[test]
    fn expanded_value_is_tokenized() {
        let mut vars = Variables::new();
        vars.set("X", "a b");
        let interp = Interpreter::new(
            Arc::new(CommandRegistry::new()),
            Arc::new(CancellationState::new()),
        );
        assert_eq!(interp.parse_line("echo %X%", &vars), strings(&["echo", "a", "b"]));
    }

    #[test]
    fn flow_pipes() {
        let f = split_flow_control(strings(&["a", "1", "|", "b", "|", "c", "2"])).unwrap();
        assert_eq!(
            f.segments,
            vec![strings(&["a", "1"]), strings(&["b"]), strings(&["c", "2"])]
        );
        assert!(f.redirect.is_none());
    }

    #[test]
    fn flow_redirect_modes() {
        let f = split_flow_control(strings(&["echo", "x", ">", "out.txt"])).unwrap();
        assert_eq!(
            f.redirect,
            Some(Redirect {
                path: "out.txt".into(),
                append: false
            })
        );
        assert_eq!(f.segments, vec![strings(&["echo", "x"])]);

        let f = split_flow_control(strings(&["echo", "x", ">>", "out.txt"])).unwrap();
        assert!(f.redirect.unwrap().append);
    }

    #[test]
    fn flow_last_redirect_wins() {
        let f = split_flow_control(strings(&["echo", ">", "a", ">>", "b"])).unwrap();
        let r = f.redirect.unwrap();
        assert_eq!(r.path, PathBuf::from("b"));
        assert!(r.append);
    }

    #[test]
    fn flow_dangling_redirect_is_error() {
        let err = split_flow_control(strings(&["echo", ">"])).unwrap_err();
        assert_eq!(err.kind(), "CommandLineInterpretation");
    }

    // -- Dispatch --

    struct Echo;
    impl Command for Echo {
        fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
            let line = ctx.args.join(" ");
            ctx.info(line);
            Ok(())
        }
    }

    struct Fail;
    impl Command for Fail {
        fn execute(&self, _ctx: &mut ExecutionContext<'_>) -> Result<()> {
            Err(ShellError::InvalidArgument("bad".to_string()))
        }
    }

    struct ScriptOnly;
    impl Command for ScriptOnly {
        fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
            ctx.info("ran");
            Ok(())
        }
        fn script_only(&self) -> bool {
            true
        }
    }

    fn echo() -> Box<dyn Command> {
        Box::new(Echo)
    }
    fn fail() -> Box<dyn Command> {
        Box::new(Fail)
    }
    fn script_only() -> Box<dyn Command> {
        Box::new(ScriptOnly)
    }

    struct Lib;
    impl CommandLibrary for Lib {
        fn name(&self) -> &str {
            "test"
        }
        fn version(&self) -> &str {
            "0"
        }
        fn commands(&self) -> Vec<CommandDescriptor> {
            vec![
                CommandDescriptor::new("*", "echo", echo),
                CommandDescriptor::new("*", "fail", fail),
                CommandDescriptor::new("*", "only", script_only).example("only 1"),
                CommandDescriptor::new("Servers", "logout", echo).requires_connection(),
            ]
        }
    }

    fn setup() -> (Interpreter, Environment, MemoryTerminal) {
        let registry = Arc::new(CommandRegistry::new());
        registry.register(&Lib);
        let interp = Interpreter::new(Arc::clone(&registry), Arc::new(CancellationState::new()));
        let term = MemoryTerminal::new();
        let env = Environment::new(registry, Box::new(term.clone()));
        (interp, env, term)
    }

    #[test]
    fn keyword_need_not_be_first() {
        let (interp, mut env, term) = setup();
        interp
            .interpret_line("hello echo world", &mut env, &mut NullProxy, None)
            .unwrap();
        assert_eq!(term.lines(), vec!["hello world"]);
    }

    #[test]
    fn unknown_command() {
        let (interp, mut env, _) = setup();
        let err = interp
            .interpret_line("nothing here", &mut env, &mut NullProxy, None)
            .unwrap_err();
        match err {
            ShellError::UnknownCommand { args } => assert_eq!(args, strings(&["nothing", "here"])),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_line_is_noop() {
        let (interp, mut env, term) = setup();
        interp.interpret_line("   ", &mut env, &mut NullProxy, None).unwrap();
        assert!(term.lines().is_empty());
    }

    #[test]
    fn pipe_appends_output_to_next_args() {
        let (interp, mut env, term) = setup();
        interp
            .interpret_line("echo a b | echo first", &mut env, &mut NullProxy, None)
            .unwrap();
        assert_eq!(term.lines(), vec!["first a b"]);
    }

    #[test]
    fn body_error_is_wrapped_as_execution() {
        let (interp, mut env, _) = setup();
        let err = interp
            .interpret_line("fail", &mut env, &mut NullProxy, None)
            .unwrap_err();
        match &err {
            ShellError::CommandExecution {
                command,
                message,
                source,
            } => {
                assert_eq!(command, "*\\fail");
                assert_eq!(message, "Failed to process command *\\fail");
                assert_eq!(source.as_ref().unwrap().kind(), "InvalidArgument");
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn connection_required() {
        let (interp, mut env, term) = setup();
        let err = interp
            .interpret_line("Servers\\logout", &mut env, &mut NullProxy, None)
            .unwrap_err();
        assert_eq!(err.kind(), "CommandExecution");
        assert!(err.to_string().contains("A connection to a server is required"));
        assert!(term.lines().is_empty());
    }

    #[test]
    fn script_only_prints_help_outside_script() {
        let (interp, mut env, term) = setup();
        interp.interpret_line("only", &mut env, &mut NullProxy, None).unwrap();
        let lines = term.lines();
        assert!(!lines.contains(&"ran".to_string()));
        assert!(lines.iter().any(|l| l == "  Example:...... only 1"));
    }

    #[test]
    fn script_only_runs_inside_script() {
        let (interp, mut env, term) = setup();
        let mut script = ScriptState::from_source("t.script", "only");
        interp
            .interpret_line("only", &mut env, &mut NullProxy, Some(&mut script))
            .unwrap();
        assert_eq!(term.lines(), vec!["ran"]);
    }

    #[test]
    fn redirect_truncates_then_appends() {
        let (interp, mut env, term) = setup();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old\n").unwrap();
        let p = path.display().to_string();

        interp
            .interpret_line(&format!("echo one > \"{p}\""), &mut env, &mut NullProxy, None)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\n");
        interp
            .interpret_line(&format!("echo two >> \"{p}\""), &mut env, &mut NullProxy, None)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        assert!(term.lines().is_empty());
    }

    #[test]
    fn redirect_into_directory_fails() {
        let (interp, mut env, _) = setup();
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().display().to_string();
        let err = interp
            .interpret_line(&format!("echo x > \"{p}\""), &mut env, &mut NullProxy, None)
            .unwrap_err();
        assert_eq!(err.kind(), "OutputRedirection");
    }

    #[test]
    fn cancel_skips_remaining_segments() {
        struct Cancel;
        impl Command for Cancel {
            fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
                ctx.interpreter.cancellation().signal_cancel();
                ctx.info("cancelled");
                Ok(())
            }
        }
        fn cancel() -> Box<dyn Command> {
            Box::new(Cancel)
        }
        struct CancelLib;
        impl CommandLibrary for CancelLib {
            fn name(&self) -> &str {
                "cancel"
            }
            fn version(&self) -> &str {
                "0"
            }
            fn commands(&self) -> Vec<CommandDescriptor> {
                vec![CommandDescriptor::new("*", "cancel", cancel)]
            }
        }

        let (interp, mut env, term) = setup();
        interp.registry().register(&CancelLib);
        interp
            .interpret_line("cancel | echo after", &mut env, &mut NullProxy, None)
            .unwrap();
        assert!(term.lines().is_empty());
        assert!(!interp.cancellation().is_cancel_pending());
        assert_eq!(interp.cancellation().active_scopes(), 0);
    }

    #[test]
    fn args_contain_commands_checks_every_token() {
        let (interp, _, _) = setup();
        assert!(interp.args_contain_commands("", &strings(&["-NoLogo", "echo"])));
        assert!(!interp.args_contain_commands("", &strings(&["-NoLogo"])));
    }

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn arb_word() -> impl Strategy<Value = String> {
            "[A-Za-z0-9_.\\\\-]{1,8}"
        }

        fn arb_phrase() -> impl Strategy<Value = String> {
            proptest::collection::vec("[a-z0-9]{1,5}", 1..4).prop_map(|w| w.join(" "))
        }

        proptest! {
            #[test]
            fn plain_words_survive(words in proptest::collection::vec(arb_word(), 0..10)) {
                prop_assert_eq!(tokenize(&words.join("  ")), words);
            }

            #[test]
            fn quoted_phrases_survive(phrases in proptest::collection::vec(arb_phrase(), 0..6)) {
                let line = phrases
                    .iter()
                    .map(|p| format!("\"{p}\""))
                    .collect::<Vec<_>>()
                    .join(" ");
                prop_assert_eq!(tokenize(&line), phrases);
            }

            #[test]
            fn expansion_without_markers_is_identity(line in "[^%]{0,40}") {
                let mut vars = Variables::new();
                vars.set("X", "y");
                prop_assert_eq!(expand_variables(&line, &vars), line);
            }
        }
    }
}
