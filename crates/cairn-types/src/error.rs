//! Error types for the cairn shell.
//!
//! The interpreter recognizes a narrow set of recoverable kinds (see
//! [`ShellError::is_recoverable`]). Everything else is a fault that unwinds
//! out of the dispatch loops.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

/// Errors produced by the cairn shell and its command libraries.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// No registered keyword matched any token of the segment.
    #[error("unknown command")]
    UnknownCommand { args: Vec<String> },

    /// A command body failed.
    #[error("{message}")]
    CommandExecution {
        /// `category\keyword` of the failing command.
        command: String,
        message: String,
        #[source]
        source: Option<Box<ShellError>>,
    },

    /// Parsing or flow-control failure for a whole line.
    #[error("{message}")]
    CommandLineInterpretation {
        args: Vec<String>,
        message: String,
        #[source]
        source: Option<Box<ShellError>>,
    },

    #[error("server connection failed: {0}")]
    ServerConnection(String),

    #[error("failed to redirect output to file {}", path.display())]
    OutputRedirection {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A bounded error tolerance was exceeded. Never recovered.
    #[error("maximum number of errors reached ({0})")]
    MaxErrorReached(usize),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;

impl ShellError {
    /// Build a `CommandExecution` error for `category\keyword`.
    pub fn execution(
        command: impl Into<String>,
        message: impl Into<String>,
        source: Option<ShellError>,
    ) -> Self {
        ShellError::CommandExecution {
            command: command.into(),
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    /// Build a `CommandLineInterpretation` error carrying the offending arguments.
    pub fn interpretation(
        args: &[String],
        message: impl Into<String>,
        source: Option<ShellError>,
    ) -> Self {
        ShellError::CommandLineInterpretation {
            args: args.to_vec(),
            message: message.into(),
            source: source.map(Box::new),
        }
    }

    /// Whether the interpreter's dispatch loops report this error and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShellError::UnknownCommand { .. }
                | ShellError::CommandExecution { .. }
                | ShellError::CommandLineInterpretation { .. }
                | ShellError::ServerConnection(_)
                | ShellError::OutputRedirection { .. }
        )
    }

    /// Whether the error belongs to the interpreter taxonomy and must pass
    /// through command wrapping unchanged.
    pub fn is_interpreter_kind(&self) -> bool {
        self.is_recoverable() || matches!(self, ShellError::MaxErrorReached(_))
    }

    /// Short name of the error kind, used in user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ShellError::UnknownCommand { .. } => "UnknownCommand",
            ShellError::CommandExecution { .. } => "CommandExecution",
            ShellError::CommandLineInterpretation { .. } => "CommandLineInterpretation",
            ShellError::ServerConnection(_) => "ServerConnection",
            ShellError::OutputRedirection { .. } => "OutputRedirection",
            ShellError::MaxErrorReached(_) => "MaxErrorReached",
            ShellError::InvalidArgument(_) => "InvalidArgument",
            ShellError::OutOfRange(_) => "OutOfRange",
            ShellError::NotSupported(_) => "NotSupported",
            ShellError::Config(_) => "Config",
            ShellError::Io(_) => "Io",
            ShellError::TomlParse(_) => "TomlParse",
        }
    }
}

/// Render `headline` followed by one `=> Kind: message` line per link of the
/// error's cause chain.
pub fn format_error_chain(headline: &str, err: &(dyn StdError + 'static)) -> String {
    let mut out = headline.to_string();
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        // Nested causes are stored boxed.
        let shell = e
            .downcast_ref::<ShellError>()
            .or_else(|| e.downcast_ref::<Box<ShellError>>().map(|b| &**b));
        let kind = match shell {
            Some(shell) => shell.kind(),
            None if e.is::<io::Error>() => "IoError",
            None => "Error",
        };
        out.push_str(&format!("\n   => {kind}: {e}"));
        current = e.source();
    }
    out
}
