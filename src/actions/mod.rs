use mockall::automock;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// An action runner that starts subprocesses.
pub mod command;
/// The action sequences for updating and creating mirrors.
pub mod mirror;

/// A custom error for describing the error cases of a single action.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The process could not be started. The parameter contains the error.
    #[error("cannot start process: {0}")]
    SpawnFailure(#[from] std::io::Error),
    /// The process returned a non-zero exit code, or it was killed by a signal (-1).
    #[error("exit status {0}")]
    NonZeroExitcode(i32),
}

/// One external step in an update or creation sequence.
///
/// Actions in a sequence are independent of each other: if one of them fails,
/// the rest still runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Action {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// The working directory, if it is different from the repository.
    pub directory: Option<PathBuf>,
    pub stdin: Option<Arc<[u8]>>,
    /// A missing program is expected (e.g. hook scripts), skipping it is not worth a warning.
    pub optional: bool,
}

impl Action {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Action {
            program: program.into(),
            args: vec![],
            directory: None,
            stdin: None,
            optional: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    pub fn stdin(mut self, stdin: Arc<[u8]>) -> Self {
        self.stdin = Some(stdin);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        write!(f, "]")
    }
}

/// The result of running a sequence of actions.
///
/// The output is only captured for synchronous runs, backgrounded runs leave it empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Every action that was not skipped succeeded.
    pub success: bool,
}

impl RunOutput {
    pub fn new() -> Self {
        RunOutput {
            stdout: vec![],
            stderr: vec![],
            success: true,
        }
    }
}

impl Default for RunOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// A runner executes an ordered list of actions for one repository.
///
/// Runners may include:
///   - running subprocesses ([command::CommandRunner])
///   - etc.
#[automock]
pub trait Runner: Send + Sync {
    /// Run the actions in order in the given directory. If `background` is set,
    /// the output of the actions is discarded.
    fn run(&self, directory: &Path, background: bool, actions: &[Action]) -> RunOutput;
}
