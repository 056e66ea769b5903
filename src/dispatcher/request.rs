use super::DispatchError;
use crate::{
    actions::{Action, RunOutput},
    repository::RepositoryPath,
};
use std::{
    sync::mpsc::{self, Receiver, SyncSender},
    time::Instant,
};

/// What happened to a request after its worker picked it up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The actions ran. The output is empty for backgrounded requests.
    Finished(RunOutput),
    /// A run started after this request was submitted, so nothing ran.
    Redundant,
}

/// One unit of work for a path worker.
#[derive(Debug)]
pub struct UpdateRequest {
    pub path: RepositoryPath,
    pub background: bool,
    pub submitted_at: Instant,
    pub actions: Vec<Action>,
    completion: SyncSender<Outcome>,
}

impl UpdateRequest {
    /// Create a new request submitted right now, with the handle to wait on it.
    pub fn new(path: RepositoryPath, background: bool, actions: Vec<Action>) -> (Self, CompletionHandle) {
        UpdateRequest::submitted_at(path, background, actions, Instant::now())
    }

    pub fn submitted_at(
        path: RepositoryPath,
        background: bool,
        actions: Vec<Action>,
        submitted_at: Instant,
    ) -> (Self, CompletionHandle) {
        // The worker never waits for the caller: there is always room for the only outcome.
        let (completion, rx) = mpsc::sync_channel(1);
        let request = UpdateRequest {
            path,
            background,
            submitted_at,
            actions,
            completion,
        };

        (request, CompletionHandle { rx })
    }

    /// Fire the completion signal. This consumes the request, so it happens at most once.
    pub fn complete(self, outcome: Outcome) {
        // Backgrounded callers usually dropped their handle already.
        let _ = self.completion.try_send(outcome);
    }
}

/// The receiving end of the completion signal of an [UpdateRequest].
#[derive(Debug)]
pub struct CompletionHandle {
    rx: Receiver<Outcome>,
}

impl CompletionHandle {
    /// Block until the worker processed the request.
    pub fn wait(self) -> Result<Outcome, DispatchError> {
        self.rx.recv().map_err(|_| DispatchError::CompletionDropped)
    }
}
