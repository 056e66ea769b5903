use super::{
    filter::should_run,
    request::{Outcome, UpdateRequest},
};
use crate::{actions::Runner, repository::RepositoryPath};
use log::{debug, info, warn};
use std::{
    path::PathBuf,
    sync::{mpsc::Receiver, Arc},
    time::Instant,
};

/// Runs the requests of one repository path, strictly one after the other.
pub struct PathWorker {
    path: RepositoryPath,
    directory: PathBuf,
    runner: Arc<dyn Runner>,
    last_run: Option<Instant>,
}

impl PathWorker {
    pub fn new(path: RepositoryPath, directory: PathBuf, runner: Arc<dyn Runner>) -> Self {
        PathWorker {
            path,
            directory,
            runner,
            last_run: None,
        }
    }

    /// Take requests from the queue in order until every sender is dropped.
    pub fn listen(mut self, rx: Receiver<UpdateRequest>) {
        debug!("Worker for {} started.", self.path);
        while let Ok(request) = rx.recv() {
            self.process(request);
        }
        debug!("Worker for {} stopped.", self.path);
    }

    /// Run a single request, unless a run already started after it was submitted.
    pub fn process(&mut self, request: UpdateRequest) {
        if !should_run(&self.path, request.submitted_at, self.last_run) {
            info!("Skipping redundant update: {}.", self.path);
            request.complete(Outcome::Redundant);
            return;
        }

        // Stamp with the start: anything submitted before this point is covered by this run.
        let started = Instant::now();
        let output = self
            .runner
            .run(&self.directory, request.background, &request.actions);
        self.last_run = Some(started);

        if output.success {
            debug!("Finished update of {} in {:?}.", self.path, started.elapsed());
        } else {
            warn!("Some actions failed while updating {}.", self.path);
        }

        request.complete(Outcome::Finished(output));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Action, MockRunner, RunOutput};
    use std::{
        path::Path,
        sync::{mpsc, Mutex},
        thread,
        time::Duration,
    };

    fn repo() -> RepositoryPath {
        RepositoryPath::parse("acme/repo").unwrap()
    }

    fn output(stdout: &str) -> RunOutput {
        RunOutput {
            stdout: stdout.as_bytes().to_vec(),
            ..RunOutput::new()
        }
    }

    #[test]
    fn it_should_run_the_first_request() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|directory, background, actions| {
                directory == Path::new("/srv/mirrors/acme/repo") && !background && actions.len() == 1
            })
            .times(1)
            .returning(|_, _, _| output("fetched"));
        let mut worker = PathWorker::new(repo(), PathBuf::from("/srv/mirrors/acme/repo"), Arc::new(runner));

        let (request, handle) = UpdateRequest::new(repo(), false, vec![Action::new("/usr/bin/git")]);
        worker.process(request);

        assert_eq!(Outcome::Finished(output("fetched")), handle.wait().unwrap());
    }

    #[test]
    fn it_should_skip_requests_submitted_before_the_last_run() {
        let mut runner = MockRunner::new();
        runner.expect_run().times(1).returning(|_, _, _| RunOutput::new());
        let mut worker = PathWorker::new(repo(), PathBuf::from("."), Arc::new(runner));

        // Both are submitted before the first one starts running.
        let (first, first_handle) = UpdateRequest::new(repo(), false, vec![]);
        let (second, second_handle) = UpdateRequest::new(repo(), false, vec![]);
        worker.process(first);
        worker.process(second);

        assert_eq!(Outcome::Finished(RunOutput::new()), first_handle.wait().unwrap());
        assert_eq!(Outcome::Redundant, second_handle.wait().unwrap());
    }

    #[test]
    fn it_should_run_requests_submitted_during_a_run() {
        let during: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));
        let during_in_run = during.clone();

        let mut runner = MockRunner::new();
        runner.expect_run().times(2).returning(move |_, _, _| {
            let mut during = during_in_run.lock().unwrap();
            if during.is_none() {
                thread::sleep(Duration::from_millis(5));
                *during = Some(Instant::now());
                thread::sleep(Duration::from_millis(5));
            }
            RunOutput::new()
        });
        let mut worker = PathWorker::new(repo(), PathBuf::from("."), Arc::new(runner));

        let (first, _) = UpdateRequest::new(repo(), true, vec![]);
        worker.process(first);

        // Submitted after the first run started, but before it finished.
        let submitted_at = during.lock().unwrap().unwrap();
        let (second, handle) = UpdateRequest::submitted_at(repo(), false, vec![], submitted_at);
        worker.process(second);

        assert_eq!(Outcome::Finished(RunOutput::new()), handle.wait().unwrap());
    }

    #[test]
    fn it_should_always_run_the_root() {
        let mut runner = MockRunner::new();
        runner.expect_run().times(3).returning(|_, _, _| RunOutput::new());
        let mut worker = PathWorker::new(RepositoryPath::root(), PathBuf::from("."), Arc::new(runner));

        let submitted_at = Instant::now();
        for _ in 0..3 {
            let (request, handle) =
                UpdateRequest::submitted_at(RepositoryPath::root(), false, vec![], submitted_at);
            worker.process(request);
            assert!(matches!(handle.wait(), Ok(Outcome::Finished(_))));
        }
    }

    #[test]
    fn it_should_pass_the_background_flag() {
        let mut runner = MockRunner::new();
        runner
            .expect_run()
            .withf(|_, background, _| *background)
            .times(1)
            .returning(|_, _, _| RunOutput::new());
        let mut worker = PathWorker::new(repo(), PathBuf::from("."), Arc::new(runner));

        let (request, handle) = UpdateRequest::new(repo(), true, vec![]);
        worker.process(request);

        assert!(matches!(handle.wait(), Ok(Outcome::Finished(_))));
    }

    #[test]
    fn it_should_process_the_queue_in_order() {
        let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(vec![]));
        let order_in_run = order.clone();

        let mut runner = MockRunner::new();
        runner.expect_run().times(3).returning(move |_, _, actions| {
            order_in_run.lock().unwrap().push(actions[0].to_string());
            RunOutput::new()
        });
        let worker = PathWorker::new(RepositoryPath::root(), PathBuf::from("."), Arc::new(runner));

        let (tx, rx) = mpsc::sync_channel(10);
        let mut handles = vec![];
        for name in ["first", "second", "third"] {
            let (request, handle) =
                UpdateRequest::new(RepositoryPath::root(), false, vec![Action::new(name)]);
            tx.send(request).unwrap();
            handles.push(handle);
        }
        drop(tx);

        worker.listen(rx);

        for handle in handles {
            assert!(handle.wait().is_ok());
        }
        assert_eq!(vec!["[first]", "[second]", "[third]"], *order.lock().unwrap());
    }
}
