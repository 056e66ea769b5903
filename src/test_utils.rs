//! Shared helpers for the tests of the dispatcher and the HTTP server.

use crate::actions::{Action, RunOutput, Runner};
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    thread,
    time::{Duration, Instant},
};

/// A single call of the [RecordingRunner].
#[derive(Clone, Debug)]
pub struct RecordedRun {
    pub directory: PathBuf,
    pub background: bool,
    pub actions: Vec<String>,
    pub stdin: Vec<Option<Vec<u8>>>,
    pub started: Instant,
    pub finished: Instant,
}

/// A runner that does not start processes, only records what it was asked to run.
pub struct RecordingRunner {
    delay: Duration,
    runs: Mutex<Vec<RecordedRun>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::with_delay(Duration::ZERO)
    }

    /// Every run takes at least this long.
    pub fn with_delay(delay: Duration) -> Self {
        RecordingRunner {
            delay,
            runs: Mutex::new(vec![]),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().unwrap().clone()
    }

    /// The largest number of runs that were in progress at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl Runner for RecordingRunner {
    fn run(&self, directory: &Path, background: bool, actions: &[Action]) -> RunOutput {
        let started = Instant::now();
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        thread::sleep(self.delay);

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.runs.lock().unwrap().push(RecordedRun {
            directory: directory.to_path_buf(),
            background,
            actions: actions.iter().map(ToString::to_string).collect(),
            stdin: actions
                .iter()
                .map(|action| action.stdin.as_ref().map(|stdin| stdin.to_vec()))
                .collect(),
            started,
            finished: Instant::now(),
        });

        RunOutput::new()
    }
}
