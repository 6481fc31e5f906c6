//! Commands available from every category.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use cairn_types::error::{Result, ShellError};
use chrono::NaiveDate;
use regex::Regex;

use crate::context::{ExecutionContext, Level, OutputMode};
use crate::environment::RunningMode;
use crate::interpreter::Command;
use crate::registry::{CommandDescriptor, CommandRegistry, WILDCARD_CATEGORY};

pub(crate) fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::new(WILDCARD_CATEGORY, "echo", echo)
            .description("Write the arguments to the output")
            .parameter("Text: any number of words")
            .example("echo Hello %USERNAME%"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "help", help)
            .description("Show the commands of a category or details of one command")
            .parameter("Command or category name (optional)")
            .parameter("-d: detailed help for every listed command")
            .example("help cc"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "cc", change_category)
            .description("Change the current command category")
            .parameter("CategoryName: category to switch to")
            .parameter("\\ or ..: return to the root category")
            .example("cc [CategoryName]"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "cd", change_category)
            .description("Alias to cc")
            .example("cd [CategoryName]")
            .hidden(),
        CommandDescriptor::new(WILDCARD_CATEGORY, "exit", exit)
            .description("Leave the shell")
            .example("exit"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "set", set)
            .description("Set a shell variable, or list all variables")
            .parameter("VariableName=: name of the variable")
            .parameter("Value: new value, may be several words")
            .example("set VarName= value"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "count", count)
            .description("Write the number of arguments")
            .example("rdtxt file.txt | count"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "limit", limit)
            .description("Write at most N of the remaining arguments")
            .parameter("N: maximum number of items")
            .example("rdtxt file.txt | limit 10"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "grep", grep)
            .description("Write the part of each argument that matches a regular expression")
            .parameter("Pattern: regular expression")
            .parameter("Data: items to search")
            .example("rdtxt file.txt | grep \"^\\d+\""),
        CommandDescriptor::new(WILDCARD_CATEGORY, "fdate", filter_by_date)
            .description("Filter the input based on a date")
            .parameter("d=dd/mm/yyyy: the date value to which the filter is applied")
            .parameter("min=dd/mm/yyyy: filtered dates are on or after this date")
            .parameter("max=dd/mm/yyyy: filtered dates are on or before this date")
            .example("fdate d=01/01/2012 [d=02/01/2012 d=...] [min=10/12/2011] [max=10/01/2012]"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "more", more)
            .description("Page through the arguments, or the lines of a file")
            .parameter("File or items")
            .example("help | more"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "rdtxt", read_text)
            .description("Write the lines of one or more text files")
            .parameter("Path: files to read")
            .example("rdtxt readme.txt"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "ver", version)
            .description("Show the shell version and the loaded libraries")
            .example("ver"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "load", load)
            .description("Register the commands of an available library")
            .parameter("LibraryName: name of the library")
            .example("load system"),
        CommandDescriptor::new(WILDCARD_CATEGORY, "cls", clear)
            .description("Clear the screen")
            .example("cls"),
    ]
}

fn echo() -> Box<dyn Command> {
    Box::new(EchoCmd)
}
fn help() -> Box<dyn Command> {
    Box::new(HelpCmd)
}
fn change_category() -> Box<dyn Command> {
    Box::new(CcCmd)
}
fn exit() -> Box<dyn Command> {
    Box::new(ExitCmd)
}
fn set() -> Box<dyn Command> {
    Box::new(SetCmd)
}
fn count() -> Box<dyn Command> {
    Box::new(CountCmd)
}
fn limit() -> Box<dyn Command> {
    Box::new(LimitCmd)
}
fn grep() -> Box<dyn Command> {
    Box::new(GrepCmd)
}
fn filter_by_date() -> Box<dyn Command> {
    Box::new(FdateCmd)
}
fn more() -> Box<dyn Command> {
    Box::new(MoreCmd)
}
fn read_text() -> Box<dyn Command> {
    Box::new(RdtxtCmd)
}
fn version() -> Box<dyn Command> {
    Box::new(VerCmd)
}
fn load() -> Box<dyn Command> {
    Box::new(LoadCmd)
}
fn clear() -> Box<dyn Command> {
    Box::new(ClsCmd)
}

/// `"name, version";` for every registered library, shell first.
pub(crate) fn libs_variable(registry: &CommandRegistry) -> String {
    let mut out = format!("\"cairn, {}\";", env!("CARGO_PKG_VERSION"));
    for lib in registry.libraries() {
        out.push_str(&format!("\"{}, {}\";", lib.name, lib.version));
    }
    out
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let line = ctx.args.join(" ");
        ctx.info(line);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;

impl HelpCmd {
    fn show_category(
        ctx: &mut ExecutionContext<'_>,
        registry: &CommandRegistry,
        name: &str,
        detailed: bool,
    ) -> Result<()> {
        let commands = registry.list_commands(name, false)?;
        if commands.is_empty() {
            return Ok(());
        }
        ctx.info(format!("@\\{name}\\>"));
        for d in commands {
            if ctx.is_cancel_pending() {
                return Ok(());
            }
            if detailed {
                for line in d.help_lines() {
                    ctx.info(line);
                }
            } else {
                ctx.info(d.summary_line());
            }
        }
        ctx.info("");
        Ok(())
    }
}

impl Command for HelpCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let registry = Arc::clone(ctx.env.registry());
        let detailed = ctx.args.iter().any(|a| a.eq_ignore_ascii_case("-d"));
        let topic = ctx
            .args
            .iter()
            .find(|a| !a.eq_ignore_ascii_case("-d"))
            .cloned();
        let category = ctx.env.category().to_string();

        if let Some(topic) = topic {
            if let Some(desc) = registry.resolve(&category, &topic) {
                for line in desc.help_lines() {
                    ctx.info(line);
                }
                return Ok(());
            }
            if registry.category_exists(&topic, false) {
                let name = registry.category_name(&topic).unwrap_or(topic);
                return Self::show_category(ctx, &registry, &name, detailed);
            }
            return Err(ShellError::InvalidArgument(format!(
                "No command or category named {topic}"
            )));
        }

        ctx.info("Commands:");
        if category.is_empty() {
            for cat in registry.list_categories(false) {
                Self::show_category(ctx, &registry, &cat, detailed)?;
            }
            Ok(())
        } else {
            Self::show_category(ctx, &registry, WILDCARD_CATEGORY, detailed)?;
            Self::show_category(ctx, &registry, &category, detailed)
        }
    }
}

// ---------------------------------------------------------------------------
// cc / cd
// ---------------------------------------------------------------------------

struct CcCmd;
impl Command for CcCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let target = match ctx.args.first() {
            Some(t) if t == "\\" || t == ".." => String::new(),
            Some(t) => t.clone(),
            None => {
                return Err(ShellError::InvalidArgument(
                    "a category name is expected".to_string(),
                ));
            },
        };
        ctx.env.set_category(&target)
    }
}

// ---------------------------------------------------------------------------
// exit
// ---------------------------------------------------------------------------

struct ExitCmd;
impl Command for ExitCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        ctx.env.request_exit();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

struct SetCmd;
impl Command for SetCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let Some((first, rest)) = ctx.args.split_first() else {
            let listing: Vec<String> = ctx
                .env
                .variables
                .iter()
                .map(|(n, v)| format!("{n}={v}"))
                .collect();
            for line in listing {
                ctx.info(line);
            }
            return Ok(());
        };

        let (name, inline) = first.split_once('=').unwrap_or((first.as_str(), ""));
        if !is_variable_name(name) {
            return Err(ShellError::InvalidArgument(format!(
                "Invalid variable name: {name}"
            )));
        }
        let value = std::iter::once(inline)
            .filter(|s| !s.is_empty())
            .chain(rest.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        let name = name.to_string();
        ctx.debug(format!("variable {name} set to \"{value}\""));
        ctx.env.variables.set(&name, value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// count / limit
// ---------------------------------------------------------------------------

struct CountCmd;
impl Command for CountCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let n = ctx.args.len();
        ctx.info(n.to_string());
        Ok(())
    }
}

struct LimitCmd;
impl Command for LimitCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let Some((first, rest)) = ctx.args.split_first() else {
            return Err(ShellError::InvalidArgument(
                "a maximum item count is expected".to_string(),
            ));
        };
        let max: usize = first
            .parse()
            .map_err(|_| ShellError::InvalidArgument(format!("not a count: {first}")))?;
        let items: Vec<String> = rest.iter().take(max).cloned().collect();
        for item in items {
            if ctx.is_cancel_pending() {
                break;
            }
            ctx.info(item);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

struct GrepCmd;
impl Command for GrepCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let Some((pattern, data)) = ctx.args.split_first() else {
            return Err(ShellError::InvalidArgument(
                "a search pattern is expected".to_string(),
            ));
        };
        let re = Regex::new(pattern)
            .map_err(|e| ShellError::InvalidArgument(format!("invalid pattern: {e}")))?;
        let matches: Vec<String> = data
            .iter()
            .filter_map(|d| re.find(d).map(|m| m.as_str().to_string()))
            .collect();
        for m in matches {
            if ctx.is_cancel_pending() {
                break;
            }
            ctx.info(m);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// fdate
// ---------------------------------------------------------------------------

static DATE_VALUE: LazyLock<Regex> = LazyLock::new(|| date_pattern("d"));
static DATE_MIN: LazyLock<Regex> = LazyLock::new(|| date_pattern("min"));
static DATE_MAX: LazyLock<Regex> = LazyLock::new(|| date_pattern("max"));

fn date_pattern(key: &str) -> Regex {
    Regex::new(&format!(
        r"(?i){key}=(?P<val>[0-9]{{1,4}}[/\-.][0-9]{{1,4}}[/\-.][0-9]{{1,4}})"
    ))
    .expect("constant pattern")
}

/// Day-first dates, or year-first when the year leads. `-` and `.` work as
/// separators too.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.replace(['-', '.'], "/");
    ["%d/%m/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(&text, f).ok())
}

fn captured_date(re: &Regex, arg: &str) -> Option<NaiveDate> {
    re.captures(arg)
        .and_then(|c| c.name("val"))
        .and_then(|m| parse_date(m.as_str()))
}

struct FdateCmd;
impl Command for FdateCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let min = ctx.args.iter().find_map(|a| captured_date(&DATE_MIN, a));
        let max = ctx.args.iter().find_map(|a| captured_date(&DATE_MAX, a));
        let kept: Vec<String> = ctx
            .args
            .iter()
            .filter(|a| {
                captured_date(&DATE_VALUE, a).is_some_and(|d| {
                    min.is_none_or(|m| d >= m) && max.is_none_or(|m| d <= m)
                })
            })
            .cloned()
            .collect();
        for item in kept {
            if ctx.is_cancel_pending() {
                break;
            }
            ctx.info(item);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// more / rdtxt
// ---------------------------------------------------------------------------

const MORE_PROMPT: &str = "-- More --";

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ShellError::InvalidArgument(format!("Cannot find file: {}", path.display()))
        } else {
            ShellError::Io(e)
        }
    })?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

struct MoreCmd;
impl Command for MoreCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let items = match ctx.args.as_slice() {
            [single] if Path::new(single).is_file() => read_lines(Path::new(single))?,
            args => args.to_vec(),
        };
        let paged = ctx.env.running_mode == RunningMode::Interactive
            && ctx.env.run_in_console
            && *ctx.mode() == OutputMode::Console;
        let (columns, rows) = ctx.env.terminal.size();
        // Rows used so far, counting the prompt line above the output.
        let mut shown = 2;
        for item in items {
            if ctx.is_cancel_pending() {
                break;
            }
            if paged && shown >= rows {
                ctx.env.terminal.write_line(Level::Info, MORE_PROMPT);
                ctx.env.terminal.pause()?;
                shown = 1;
            }
            shown += 1 + item.chars().count() / columns.max(1);
            ctx.info(item);
        }
        Ok(())
    }
}

struct RdtxtCmd;
impl Command for RdtxtCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let paths: Vec<String> = ctx
            .args
            .iter()
            .filter(|a| !a.starts_with('-'))
            .cloned()
            .collect();
        if paths.is_empty() {
            return Err(ShellError::InvalidArgument(
                "at least one file path is expected".to_string(),
            ));
        }
        for path in paths {
            for line in read_lines(Path::new(&path))? {
                if ctx.is_cancel_pending() {
                    return Ok(());
                }
                ctx.info(line);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ver / load
// ---------------------------------------------------------------------------

struct VerCmd;
impl Command for VerCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        ctx.info(format!("cairn - {}", env!("CARGO_PKG_VERSION")));
        let libraries = ctx.env.registry().libraries();
        for lib in libraries {
            ctx.info(format!("{} - {}", lib.name, lib.version));
        }
        Ok(())
    }
}

struct LoadCmd;
impl Command for LoadCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        let Some(name) = ctx.args.first().cloned() else {
            return Err(ShellError::InvalidArgument(format!(
                "a library name is expected, available: {}",
                ctx.env.registry().catalog_names().join(", ")
            )));
        };
        let registry = Arc::clone(ctx.env.registry());
        let added = registry.load(&name)?;
        if added == 0 {
            ctx.info(format!("No commands found in {name}"));
        } else {
            ctx.info(format!("Successfully registered {added} command(s)"));
        }
        ctx.env.variables.set("LIBS", libs_variable(&registry));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// cls
// ---------------------------------------------------------------------------

struct ClsCmd;
impl Command for ClsCmd {
    fn execute(&self, ctx: &mut ExecutionContext<'_>) -> Result<()> {
        ctx.env.terminal.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Level;
    use crate::test_utils::TestSession;

    #[test]
    fn echo_joins_arguments() {
        let mut s = TestSession::new();
        s.run("echo  a   b").unwrap();
        assert_eq!(s.term.lines(), vec!["a b"]);
    }

    #[test]
    fn help_for_command_shows_descriptor() {
        let mut s = TestSession::new();
        s.run("help cc").unwrap();
        let lines = s.term.lines();
        assert!(lines.iter().any(|l| l.starts_with(" _[*\\cc]_")));
        assert!(lines.contains(&"  Example:...... cc [CategoryName]".to_string()));
    }

    #[test]
    fn help_lists_wildcard_commands_without_hidden() {
        let mut s = TestSession::new();
        s.run("help").unwrap();
        let lines = s.term.lines();
        assert_eq!(lines[0], "Commands:");
        assert!(lines.contains(&"@\\*\\>".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("echo:")));
        assert!(!lines.iter().any(|l| l.starts_with("cd:")));
    }

    #[test]
    fn help_for_category() {
        let mut s = TestSession::new();
        s.run("help servers").unwrap();
        let lines = s.term.lines();
        assert_eq!(lines[0], "@\\Servers\\>");
        assert!(lines.iter().any(|l| l.starts_with("login:")));
    }

    #[test]
    fn help_unknown_topic() {
        let mut s = TestSession::new();
        let err = s.run("help nothing").unwrap_err();
        assert_eq!(err.kind(), "CommandExecution");
    }

    #[test]
    fn cc_switches_and_returns_to_root() {
        let mut s = TestSession::new();
        s.run("cc servers").unwrap();
        assert_eq!(s.env.category(), "Servers");
        s.run("cc ..").unwrap();
        assert_eq!(s.env.category(), "");
        s.run("cd Servers").unwrap();
        s.run("cc \\").unwrap();
        assert_eq!(s.env.category(), "");
    }

    #[test]
    fn cc_unknown_category_is_range_error() {
        let mut s = TestSession::new();
        let err = s.run("cc NoSuchCategory").unwrap_err();
        assert!(err.is_recoverable());
        match err {
            ShellError::CommandExecution { source, .. } => {
                assert_eq!(source.unwrap().kind(), "OutOfRange");
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cc_refuses_wildcard_category() {
        let mut s = TestSession::new();
        let err = s.run("cc *").unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(s.env.category(), "");
    }

    #[test]
    fn exit_sets_flag() {
        let mut s = TestSession::new();
        s.run("exit").unwrap();
        assert!(s.env.exit_pending());
    }

    #[test]
    fn set_forms() {
        let mut s = TestSession::new();
        s.run("set Greeting= hello world").unwrap();
        assert_eq!(s.env.variables.get("greeting"), Some("hello world"));
        s.run("set other=value").unwrap();
        assert_eq!(s.env.variables.get("OTHER"), Some("value"));
        s.run("echo %greeting%").unwrap();
        assert_eq!(s.term.lines(), vec!["hello world"]);
    }

    #[test]
    fn set_lists_variables() {
        let mut s = TestSession::new();
        s.env.variables.set("A", "1");
        s.env.variables.set("B", "2");
        s.run("set").unwrap();
        assert_eq!(s.term.lines(), vec!["A=1", "B=2"]);
    }

    #[test]
    fn set_rejects_bad_name() {
        let mut s = TestSession::new();
        assert!(s.run("set a.b= 1").is_err());
    }

    #[test]
    fn count_and_limit_over_pipe() {
        let mut s = TestSession::new();
        s.run("count a b c").unwrap();
        s.run("limit 2 x y z").unwrap();
        assert_eq!(s.term.lines(), vec!["3", "x", "y"]);
        assert!(s.run("limit many x").is_err());
    }

    #[test]
    fn grep_outputs_matched_part() {
        let mut s = TestSession::new();
        s.run("grep \\d+ abc12 xyz 7up").unwrap();
        assert_eq!(s.term.lines(), vec!["12", "7"]);
        assert!(s.run("grep ( x").is_err());
    }

    #[test]
    fn rdtxt_and_more_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "one\ntwo\n").unwrap();
        let mut s = TestSession::new();
        s.run(&format!("rdtxt \"{}\" | count", path.display())).unwrap();
        s.run(&format!("more \"{}\"", path.display())).unwrap();
        assert_eq!(s.term.lines(), vec!["2", "one", "two"]);
        assert!(s.run("rdtxt /no/such/file.txt").is_err());
    }

    #[test]
    fn fdate_keeps_dates_within_bounds() {
        let mut s = TestSession::new();
        s.run("fdate d=01/01/2012 d=15/06/2012 D=2013-01-01 d=99/99/2012 x min=01/02/2012 max=31/12/2012")
            .unwrap();
        assert_eq!(s.term.lines(), vec!["d=15/06/2012"]);
    }

    #[test]
    fn fdate_bounds_are_inclusive_and_optional() {
        let mut s = TestSession::new();
        s.run("fdate d=01/01/2012 other d=2013.01.05").unwrap();
        s.run("more d=10/12/2011 d=09/12/2011 | fdate min=10/12/2011").unwrap();
        assert_eq!(
            s.term.lines(),
            vec!["d=01/01/2012", "d=2013.01.05", "d=10/12/2011"]
        );
    }

    #[test]
    fn parse_date_orders() {
        assert_eq!(parse_date("05/01/2012"), NaiveDate::from_ymd_opt(2012, 1, 5));
        assert_eq!(parse_date("2012-01-05"), NaiveDate::from_ymd_opt(2012, 1, 5));
        assert_eq!(parse_date("31/02/2012"), None);
    }

    #[test]
    fn more_pages_in_interactive_console() {
        let mut s = TestSession::new();
        s.term.set_size(80, 5);
        s.run("more a b c d e f g h i j").unwrap();
        assert_eq!(s.term.pause_count(), 2);
        let lines = s.term.lines();
        assert_eq!(lines.iter().filter(|l| *l == MORE_PROMPT).count(), 2);
        assert_eq!(lines[3], MORE_PROMPT);
        assert_eq!(lines.last().unwrap(), "j");
    }

    #[test]
    fn more_counts_wrapped_rows() {
        let mut s = TestSession::new();
        s.term.set_size(10, 5);
        s.run("more aaaaaaaaaaaaaaaaaaaaa b").unwrap();
        assert_eq!(s.term.pause_count(), 1);
    }

    #[test]
    fn more_dumps_without_paging_in_batch_or_redirected() {
        let mut s = TestSession::new();
        s.term.set_size(80, 3);
        s.env.running_mode = RunningMode::Batch;
        s.run("more a b c d e f").unwrap();
        s.env.running_mode = RunningMode::Interactive;
        s.env.run_in_console = false;
        s.run("more a b c d e f").unwrap();
        assert_eq!(s.term.pause_count(), 0);
        assert_eq!(s.term.lines().len(), 12);
    }

    #[test]
    fn ver_lists_libraries() {
        let mut s = TestSession::new();
        s.run("ver").unwrap();
        let lines = s.term.lines();
        assert!(lines[0].starts_with("cairn - "));
        assert!(lines.iter().any(|l| l.starts_with("core - ")));
    }

    #[test]
    fn load_reports_registration() {
        let mut s = TestSession::new();
        s.run("load system").unwrap();
        s.run("load system").unwrap();
        assert_eq!(
            s.term.lines(),
            vec!["Successfully registered 3 command(s)", "No commands found in system"]
        );
        assert!(s.env.variables.get("LIBS").unwrap().contains("\"system, "));
        assert!(s.run("load nothing").is_err());
    }

    #[test]
    fn cls_clears_terminal() {
        let mut s = TestSession::new();
        s.run("echo x").unwrap();
        s.run("cls").unwrap();
        assert!(s.term.lines_at(Level::Info).is_empty());
    }
}
