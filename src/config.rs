use crate::repository::RepositoryPath;
use std::path::PathBuf;

const NAME_PLACEHOLDER: &str = "{}";

/// The settings shared by the HTTP front end and the mirror sequences.
#[derive(Clone, Debug)]
pub struct MirrorConfig {
    /// The working directory: every mirror lives under it and the global
    /// hooks are in its `bin/` directory.
    pub root: PathBuf,
    /// The git executable.
    pub git: PathBuf,
    /// Shared secret for the GitHub webhooks, there is no verification without it.
    pub secret: Option<String>,
    /// Clone URL for public repositories, `{}` is replaced with the full name.
    pub public_url: String,
    /// Clone URL for private repositories, `{}` is replaced with the full name.
    pub private_url: String,
}

impl MirrorConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        MirrorConfig {
            root: root.into(),
            git: PathBuf::from("/usr/bin/git"),
            secret: None,
            public_url: String::from("https://github.com/{}.git"),
            private_url: String::from("git@github.com:{}.git"),
        }
    }

    pub fn with_git(mut self, git: impl Into<PathBuf>) -> Self {
        self.git = git.into();
        self
    }

    /// Set the webhook secret, an empty secret disables verification.
    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|secret| !secret.is_empty());
        self
    }

    pub fn with_clone_urls(mut self, public_url: String, private_url: String) -> Self {
        self.public_url = public_url;
        self.private_url = private_url;
        self
    }

    pub fn directory(&self, path: &RepositoryPath) -> PathBuf {
        path.directory(&self.root)
    }

    pub fn clone_url(&self, full_name: &str, private: bool) -> String {
        let template = if private {
            &self.private_url
        } else {
            &self.public_url
        };
        template.replace(NAME_PLACEHOLDER, full_name)
    }
}
