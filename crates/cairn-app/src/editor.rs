//! Interactive line sources: a `rustyline` editor with tab completion over
//! the command registry, and plain stdin for redirected I/O.

use std::borrow::Cow;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use cairn_terminal::{CommandRegistry, LineSource, completion_candidates};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

/// Start of the word under the cursor.
fn word_start(line: &str) -> usize {
    line.char_indices()
        .rev()
        .find(|&(_, c)| c.is_whitespace() || c == '|')
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}

pub struct ShellHelper {
    registry: Arc<CommandRegistry>,
    category: String,
}

impl ShellHelper {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self {
            registry,
            category: String::new(),
        }
    }

    fn candidates(&self, line: &str) -> (usize, Vec<String>) {
        let start = word_start(line);
        let prefix = line[start..].trim_start_matches('"');
        (
            start,
            completion_candidates(&self.registry, &self.category, prefix),
        )
    }
}

impl Helper for ShellHelper {}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(&line[..pos]);
        let pairs = words
            .into_iter()
            .map(|w| Pair {
                display: w.clone(),
                replacement: w,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for ShellHelper {}

/// `rustyline` editor with persistent history.
pub struct LineEditor {
    editor: Editor<ShellHelper, DefaultHistory>,
    history_file: Option<PathBuf>,
}

impl LineEditor {
    pub fn new(
        registry: Arc<CommandRegistry>,
        history_file: Option<PathBuf>,
    ) -> rustyline::Result<Self> {
        let mut editor = Editor::<ShellHelper, DefaultHistory>::new()?;
        editor.set_helper(Some(ShellHelper::new(registry)));
        if let Some(path) = &history_file
            && let Err(e) = editor.load_history(path)
        {
            log::debug!("no history loaded from {}: {e}", path.display());
        }
        Ok(Self {
            editor,
            history_file,
        })
    }

    pub fn save_history(&mut self) {
        if let Some(path) = &self.history_file
            && let Err(e) = self.editor.save_history(path)
        {
            log::warn!("could not save history to {}: {e}", path.display());
        }
    }
}

impl LineSource for LineEditor {
    fn read_line(&mut self, prompt: &str, category: &str) -> Option<String> {
        if let Some(helper) = self.editor.helper_mut() {
            helper.category = category.to_string();
        }
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            },
            // Ctrl-C at the prompt discards the line.
            Err(ReadlineError::Interrupted) => Some(String::new()),
            Err(ReadlineError::Eof) => None,
            Err(e) => {
                log::error!("line editor failed: {e}");
                None
            },
        }
    }
}

/// Plain lines from stdin, for `-IoRedirected`.
#[derive(Debug, Default)]
pub struct StdinLines;

impl LineSource for StdinLines {
    fn read_line(&mut self, prompt: &str, _category: &str) -> Option<String> {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{prompt}");
        let _ = stdout.flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                log::error!("stdin read failed: {e}");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helper(category: &str) -> ShellHelper {
        let registry = Arc::new(CommandRegistry::new());
        cairn_terminal::register_builtins(&registry);
        let mut h = ShellHelper::new(registry);
        h.category = category.to_string();
        h
    }

    #[test]
    fn word_start_after_space_and_pipe() {
        assert_eq!(word_start("ec"), 0);
        assert_eq!(word_start("echo a|gr"), 7);
        assert_eq!(word_start("help "), 5);
    }

    #[test]
    fn word_start_after_wide_whitespace() {
        assert_eq!(word_start("echo\u{3000}ec"), 7);
        let (start, words) = helper("").candidates("echo\u{3000}ec");
        assert_eq!(start, 7);
        assert_eq!(words, vec!["echo"]);
    }

    #[test]
    fn completes_last_word() {
        let (start, words) = helper("").candidates("rdtxt x | ec");
        assert_eq!(start, 10);
        assert_eq!(words, vec!["echo"]);
    }

    #[test]
    fn parent_offered_inside_category() {
        let (_, words) = helper("Servers").candidates("cc ");
        assert!(words.contains(&"..".to_string()));
        let (_, words) = helper("").candidates("cc ");
        assert!(!words.contains(&"..".to_string()));
    }

    #[test]
    fn completer_returns_pairs() {
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper("").complete("help Se", 7, &ctx).unwrap();
        assert_eq!(start, 5);
        let names: Vec<_> = pairs.iter().map(|p| p.replacement.as_str()).collect();
        assert_eq!(names, vec!["Servers", "set"]);
    }
}
