use super::Action;
use crate::{config::MirrorConfig, repository::RepositoryPath};
use std::sync::Arc;

/// Fetch every remote of an existing mirror, then run the post-fetch hooks.
///
/// The hooks are the repository's own `hooks/post-fetch` and the global
/// `bin/post-fetch` of the working directory, both get the payload on stdin.
pub fn update_sequence(config: &MirrorConfig, path: &RepositoryPath, payload: Arc<[u8]>) -> Vec<Action> {
    let directory = config.directory(path);

    vec![
        Action::new(&config.git).args(["remote", "update", "-p"]),
        Action::new(&config.git).args(["gc", "--auto"]),
        Action::new(directory.join("hooks").join("post-fetch"))
            .stdin(payload.clone())
            .optional(),
        Action::new(config.root.join("bin").join("post-fetch"))
            .stdin(payload)
            .optional(),
    ]
}

/// Clone a new bare mirror, then run the post-clone and post-fetch hooks inside it.
///
/// The sequence is meant for the root worker, the clone itself runs in the
/// working directory.
pub fn create_sequence(
    config: &MirrorConfig,
    path: &RepositoryPath,
    clone_url: &str,
    payload: Arc<[u8]>,
) -> Vec<Action> {
    let directory = config.directory(path);
    let hooks = [
        directory.join("hooks").join("post-clone"),
        config.root.join("bin").join("post-clone"),
        directory.join("hooks").join("post-fetch"),
        config.root.join("bin").join("post-fetch"),
    ];

    let clone = Action::new(&config.git).args([
        String::from("clone"),
        String::from("--mirror"),
        String::from("--bare"),
        clone_url.to_string(),
        directory.to_string_lossy().into_owned(),
    ]);

    std::iter::once(clone)
        .chain(hooks.into_iter().map(|hook| {
            Action::new(hook)
                .directory(&directory)
                .stdin(payload.clone())
                .optional()
        }))
        .collect()
}
