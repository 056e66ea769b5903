//! Keep bare git mirrors up to date, triggered by HTTP pings and GitHub webhooks.
//!
//! ## How it works
//!
//! `gitmirror` is built up from a **server**, a **dispatcher** and **actions**.
//! The server turns HTTP requests into update requests for a repository path
//! (e.g. `GET /acme/repo` or a signed GitHub push event). The dispatcher hands
//! every request to the worker of its path, which runs them one by one and skips
//! the ones that a newer run already covers. Actions are the external commands
//! of an update (`git remote update`, `git gc`, hook scripts).
//!
//! ```ignore
//! +--------+       +------------+       +--------+       +---------+
//! | server | ----> | dispatcher | ----> | worker | ----> | actions |
//! +--------+       +------------+       +--------+       +---------+
//! ```
//!

/// An action is an external command that runs for a repository (e.g. [fetching](actions::mirror::update_sequence)).
pub mod actions;
/// The settings of the mirrors.
pub mod config;
/// The dispatcher routes the update requests to one worker per repository path.
pub mod dispatcher;
/// The validated paths of the mirrored repositories.
pub mod repository;
/// The HTTP server receiving pings and [webhooks](server::webhook).
pub mod server;

#[cfg(test)]
mod test_utils;
