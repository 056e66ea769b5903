use args::parse_args;
use gitmirror::{
    actions::command::CommandRunner,
    config::MirrorConfig,
    dispatcher::Dispatcher,
    server::{signal::stop_on_signal, MirrorServer, ServerError},
};
use log::{info, SetLoggerError};
use logger::init_logger;
use std::{path::PathBuf, process, sync::Arc};
use thiserror::Error;

mod args;
mod logger;

/// A custom error for the failures of the main program
#[derive(Debug, Error)]
pub enum MainError {
    #[error("Cannot set up the logger: {0}.")]
    FailedLogger(#[from] SetLoggerError),
    #[error("Cannot determine the local timezone for the logger.")]
    FailedLoggerTimezones,
    #[error("The working directory {0} does not exist.")]
    MissingDirectory(String),
    #[error("{0}")]
    Server(#[from] ServerError),
}

fn main_inner() -> Result<(), MainError> {
    let args = parse_args();

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    init_logger(&args)?;

    let root = PathBuf::from(&args.dir);
    if !root.is_dir() {
        return Err(MainError::MissingDirectory(args.dir));
    }

    let config = MirrorConfig::new(root.clone())
        .with_git(&args.git)
        .with_secret(args.secret)
        .with_clone_urls(args.public_url, args.private_url);
    if config.secret.is_none() {
        info!("No secret is set, webhooks are accepted without verification.");
    }

    let dispatcher = Dispatcher::start(root, Arc::new(CommandRunner));
    let server = Arc::new(MirrorServer::new(config, dispatcher));

    let listener = MirrorServer::bind(&args.addr)?;
    stop_on_signal(listener.clone())?;
    server.serve(listener);

    info!("Server stopped.");

    Ok(())
}

fn main() {
    if let Err(err) = main_inner() {
        eprintln!("{err}");
        process::exit(1);
    }
}
