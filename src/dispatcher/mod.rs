//! Route update requests to one serialized worker per repository path.
//!
//! ```ignore
//!                                      +-----------------+
//!                                 +--> | acme/repo queue | --> worker (thread)
//! +--------+    +--------------+  |    +-----------------+
//! | submit | -> | control loop | -+
//! +--------+    +--------------+  |    +-----------------+
//!     |                           +--> | acme/lib queue  | --> worker (thread)
//!     |                                +-----------------+
//!     +-- pushes the request onto the queue itself
//! ```
//!
//! The control loop is the only owner of the path to worker map, so two
//! concurrent submissions for a new path can never create two workers. It only
//! hands out the queue of the worker: the submitting thread pushes the request
//! and blocks if that queue is full, the control loop never does.

use self::{
    request::{CompletionHandle, UpdateRequest},
    worker::PathWorker,
};
use crate::{
    actions::{Action, Runner},
    repository::RepositoryPath,
};
use log::{debug, error, trace};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver, Sender, SyncSender},
        Arc,
    },
    thread,
};
use thiserror::Error;

/// The redundancy filter deciding if a request still has to run.
pub mod filter;
/// The requests and their completion signals.
pub mod request;
/// The worker running the requests of a single path.
pub mod worker;

/// The number of requests that can wait for a path, before submitting blocks.
pub const WORKER_QUEUE_CAPACITY: usize = 10;

/// A custom error for describing the error cases of the dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The control loop stopped, no new requests can be routed.
    #[error("the dispatcher is not running")]
    ControlLoopGone,
    /// The worker of the path stopped and cannot take requests.
    #[error("the worker for {0} is not running")]
    WorkerGone(RepositoryPath),
    /// The request was dropped before its completion signal fired.
    #[error("the request was dropped without completing")]
    CompletionDropped,
    /// The worker thread could not be started.
    #[error("cannot start worker: {0}")]
    SpawnFailure(#[from] std::io::Error),
}

enum ControlMessage {
    Resolve {
        path: RepositoryPath,
        reply: Sender<Result<SyncSender<UpdateRequest>, DispatchError>>,
    },
    WorkerCount {
        reply: Sender<usize>,
    },
}

/// A handle to the dispatcher, it can be cloned and shared between threads.
#[derive(Clone)]
pub struct Dispatcher {
    control: Sender<ControlMessage>,
}

impl Dispatcher {
    /// Start the control loop. Workers are created under `root` when their
    /// path first shows up.
    pub fn start(root: PathBuf, runner: Arc<dyn Runner>) -> Self {
        let (control, rx) = mpsc::channel();
        thread::spawn(move || control_loop(&root, runner, rx));

        Dispatcher { control }
    }

    /// Submit the actions for a path, stamped with the current time.
    pub fn submit(
        &self,
        path: RepositoryPath,
        background: bool,
        actions: Vec<Action>,
    ) -> Result<CompletionHandle, DispatchError> {
        let (request, handle) = UpdateRequest::new(path, background, actions);
        self.submit_request(request)?;

        Ok(handle)
    }

    /// Push a request onto the queue of its path, creating the worker if necessary.
    ///
    /// This blocks while the queue of the path is full.
    pub fn submit_request(&self, request: UpdateRequest) -> Result<(), DispatchError> {
        let queue = self.resolve(&request.path)?;
        let path = request.path.clone();
        trace!("Queueing request for {path}.");
        queue.send(request).map_err(|_| DispatchError::WorkerGone(path))
    }

    /// The number of workers started so far.
    pub fn worker_count(&self) -> Result<usize, DispatchError> {
        let (reply, rx) = mpsc::channel();
        self.control
            .send(ControlMessage::WorkerCount { reply })
            .map_err(|_| DispatchError::ControlLoopGone)?;
        rx.recv().map_err(|_| DispatchError::ControlLoopGone)
    }

    fn resolve(&self, path: &RepositoryPath) -> Result<SyncSender<UpdateRequest>, DispatchError> {
        let (reply, rx) = mpsc::channel();
        self.control
            .send(ControlMessage::Resolve {
                path: path.clone(),
                reply,
            })
            .map_err(|_| DispatchError::ControlLoopGone)?;
        rx.recv().map_err(|_| DispatchError::ControlLoopGone)?
    }
}

fn control_loop(root: &Path, runner: Arc<dyn Runner>, rx: Receiver<ControlMessage>) {
    let mut workers: HashMap<RepositoryPath, SyncSender<UpdateRequest>> = HashMap::new();

    for message in rx {
        match message {
            ControlMessage::Resolve { path, reply } => {
                let queue = match workers.get(&path) {
                    Some(queue) => Ok(queue.clone()),
                    None => spawn_worker(root, &path, runner.clone()).map(|queue| {
                        workers.insert(path.clone(), queue.clone());
                        debug!("Started worker for {path} ({} in total).", workers.len());
                        queue
                    }),
                };
                if let Err(err) = &queue {
                    error!("Cannot start worker for {path}: {err}.");
                }
                let _ = reply.send(queue);
            }
            ControlMessage::WorkerCount { reply } => {
                let _ = reply.send(workers.len());
            }
        }
    }

    debug!("Dispatcher stopped.");
}

fn spawn_worker(
    root: &Path,
    path: &RepositoryPath,
    runner: Arc<dyn Runner>,
) -> Result<SyncSender<UpdateRequest>, DispatchError> {
    let (queue, rx) = mpsc::sync_channel(WORKER_QUEUE_CAPACITY);
    let worker = PathWorker::new(path.clone(), path.directory(root), runner);

    thread::Builder::new()
        .name(format!("worker:{path}"))
        .spawn(move || worker.listen(rx))?;

    Ok(queue)
}
