use crate::repository::RepositoryPath;
use std::time::Instant;

/// Decide whether a request still has to run.
///
/// A request runs if it was submitted strictly after the last run of its path
/// started, or if the path has never run. Requests on the root path always run.
pub fn should_run(path: &RepositoryPath, submitted_at: Instant, last_run: Option<Instant>) -> bool {
    if path.is_root() {
        return true;
    }

    match last_run {
        Some(last_run) => submitted_at > last_run,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn repo() -> RepositoryPath {
        RepositoryPath::parse("acme/repo").unwrap()
    }

    #[test]
    fn it_should_run_the_first_request() {
        assert!(should_run(&repo(), Instant::now(), None));
    }

    #[test]
    fn it_should_run_requests_after_the_last_run() {
        let last_run = Instant::now();
        let submitted_at = last_run + Duration::from_millis(1);

        assert!(should_run(&repo(), submitted_at, Some(last_run)));
    }

    #[test]
    fn it_should_skip_requests_before_the_last_run() {
        let submitted_at = Instant::now();
        let last_run = submitted_at + Duration::from_millis(1);

        assert!(!should_run(&repo(), submitted_at, Some(last_run)));
    }

    #[test]
    fn it_should_skip_requests_at_the_last_run() {
        let now = Instant::now();

        assert!(!should_run(&repo(), now, Some(now)));
    }

    #[test]
    fn it_should_always_run_the_root() {
        let submitted_at = Instant::now();
        let last_run = submitted_at + Duration::from_secs(60);

        assert!(should_run(&RepositoryPath::root(), submitted_at, Some(last_run)));
        assert!(should_run(&RepositoryPath::root(), submitted_at, Some(submitted_at)));
    }
}
