use crate::{
    actions::{
        mirror::{create_sequence, update_sequence},
        Action,
    },
    config::MirrorConfig,
    dispatcher::{request::Outcome, Dispatcher},
    repository::RepositoryPath,
};
use log::{debug, error, info, warn};
use std::{io::Read, sync::Arc, thread};
use thiserror::Error;
use tiny_http::{Method, Request, Response, Server};
use url::form_urlencoded;
use webhook::{parse_payload, verify_signature, SIGNATURE_HEADER};

/// Stop the server on termination signals.
pub mod signal;
/// GitHub webhook signatures and payloads.
pub mod webhook;

/// The largest webhook payload that is accepted.
pub const MAX_PAYLOAD_SIZE: u64 = 10 << 20;

const GITHUB_CALLBACK: &str = "/callback/github";

/// A custom error for describing the error cases of the HTTP server
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener cannot be started on the address.
    #[error("cannot start server on {0}: {1}")]
    BindFailure(String, String),
    /// The signal handlers cannot be installed.
    #[error("cannot listen to signals: {0}")]
    SignalFailure(std::io::Error),
    /// Reading the request body failed.
    #[error("cannot read request: {0}")]
    ReadFailure(#[from] std::io::Error),
    /// The request body is larger than [MAX_PAYLOAD_SIZE].
    #[error("http: POST too large")]
    PayloadTooLarge,
}

/// Actions to queue after the client has been answered.
#[derive(Debug, PartialEq, Eq)]
pub struct Job {
    pub path: RepositoryPath,
    pub actions: Vec<Action>,
}

/// The answer to an HTTP request.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// Respond with the status code and the body.
    Respond(u16, String),
    /// Respond with 201 Created, then queue the job in the background, if there is any.
    Accepted(Option<Job>),
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Reply::Respond(status, body.to_string())
    }
}

/// The HTTP front end: turns pings and webhooks into mirror updates.
///
/// Every request is handled on its own thread, so a slow synchronous update
/// does not hold up the others.
pub struct MirrorServer {
    config: MirrorConfig,
    dispatcher: Dispatcher,
}

impl MirrorServer {
    pub fn new(config: MirrorConfig, dispatcher: Dispatcher) -> Self {
        MirrorServer { config, dispatcher }
    }

    /// Start listening on the address, e.g. "0.0.0.0:8124".
    pub fn bind(addr: &str) -> Result<Arc<Server>, ServerError> {
        let listener = Server::http(addr)
            .map_err(|err| ServerError::BindFailure(addr.to_string(), err.to_string()))?;
        info!("Listening on {addr}...");

        Ok(Arc::new(listener))
    }

    /// Handle the incoming requests until the listener is unblocked.
    pub fn serve(self: Arc<Self>, listener: Arc<Server>) {
        for request in listener.incoming_requests() {
            let server = self.clone();
            thread::spawn(move || server.handle(request));
        }
        debug!("Stopped accepting requests.");
    }

    fn handle(&self, mut request: Request) {
        let method = request.method().clone();
        let url = request.url().to_string();
        info!("Handling {method} {url}.");

        let signature = request
            .headers()
            .iter()
            .find(|header| header.field.equiv(SIGNATURE_HEADER))
            .map(|header| header.value.as_str().to_string());

        let body = if method == Method::Post {
            match read_payload(request.as_reader()) {
                Ok(body) => body,
                Err(err) => {
                    warn!("Cannot read request body: {err}.");
                    respond(request, 500, err.to_string());
                    return;
                }
            }
        } else {
            vec![]
        };

        match self.route(&method, &url, signature.as_deref(), body) {
            Reply::Respond(status, body) => respond(request, status, body),
            Reply::Accepted(job) => {
                respond(request, 201, String::new());
                if let Some(Job { path, actions }) = job {
                    if let Err(err) = self.dispatcher.submit(path, true, actions) {
                        error!("Cannot queue background update: {err}.");
                    }
                }
            }
        }
    }

    /// Decide what to do with a request. Synchronous updates run before this returns.
    pub fn route(&self, method: &Method, url: &str, signature: Option<&str>, body: Vec<u8>) -> Reply {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let background = is_background(query);

        match method {
            Method::Get if path == "/favicon.ico" => Reply::text(410, "No favicon"),
            Method::Get => self.handle_ping(path, background),
            Method::Post if path == GITHUB_CALLBACK => {
                self.handle_github_callback(signature, body, background)
            }
            Method::Post => Reply::text(404, "Path not found"),
            _ => Reply::text(405, "Method not allowed"),
        }
    }

    fn handle_ping(&self, raw_path: &str, background: bool) -> Reply {
        let path = match urlencoding::decode(raw_path)
            .map_err(|err| err.to_string())
            .and_then(|decoded| RepositoryPath::parse(&decoded).map_err(|err| err.to_string()))
        {
            Ok(path) => path,
            Err(err) => {
                warn!("Rejecting {raw_path:?}: {err}.");
                return Reply::text(400, "Invalid path");
            }
        };

        self.update(path, background, Arc::from(Vec::new()))
    }

    fn handle_github_callback(&self, signature: Option<&str>, body: Vec<u8>, background: bool) -> Reply {
        if let Some(secret) = &self.config.secret {
            let authorized = signature
                .map(|signature| verify_signature(&body, signature, secret.as_bytes()))
                .unwrap_or(false);
            if !authorized {
                warn!("Rejecting webhook with missing or invalid signature.");
                return Reply::text(401, "not authorized");
            }
        }

        let repository = match parse_payload(&body) {
            Ok(payload) => payload.repository,
            Err(err) => {
                error!("Error unmarshalling data: {err}.");
                return Reply::text(500, "Error parsing JSON");
            }
        };

        let path = match RepositoryPath::parse(&repository.full_name) {
            Ok(path) => path,
            Err(err) => {
                warn!("Rejecting webhook for {:?}: {err}.", repository.full_name);
                return Reply::text(400, "Invalid path");
            }
        };

        let payload: Arc<[u8]> = Arc::from(body);
        if self.config.directory(&path).exists() {
            self.update(path, background, payload)
        } else {
            let clone_url = self.config.clone_url(path.as_str(), repository.private);
            info!("Creating mirror of {path} from {clone_url}.");
            let actions = create_sequence(&self.config, &path, &clone_url, payload);
            self.dispatch(RepositoryPath::root(), background, actions)
        }
    }

    fn update(&self, path: RepositoryPath, background: bool, payload: Arc<[u8]>) -> Reply {
        if !self.config.directory(&path).exists() {
            if background {
                warn!("Not updating {path}, it does not exist.");
                return Reply::Accepted(None);
            }
            return Reply::text(404, "Not found");
        }

        let actions = update_sequence(&self.config, &path, payload);
        self.dispatch(path, background, actions)
    }

    fn dispatch(&self, path: RepositoryPath, background: bool, actions: Vec<Action>) -> Reply {
        if background {
            return Reply::Accepted(Some(Job { path, actions }));
        }

        match self
            .dispatcher
            .submit(path, false, actions)
            .and_then(|handle| handle.wait())
        {
            Ok(outcome) => Reply::Respond(200, render_outcome(&outcome)),
            Err(err) => {
                error!("Update failed: {err}.");
                Reply::text(500, "Internal error")
            }
        }
    }
}

/// Whether the first `bg` value of the query is "true", after percent-decoding.
fn is_background(query: &str) -> bool {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "bg")
        .map(|(_, value)| value == "true")
        .unwrap_or(false)
}

/// Read the whole body, failing if it is larger than [MAX_PAYLOAD_SIZE].
pub fn read_payload<R: Read>(reader: R) -> Result<Vec<u8>, ServerError> {
    let mut body = vec![];
    reader.take(MAX_PAYLOAD_SIZE + 1).read_to_end(&mut body)?;
    if body.len() as u64 > MAX_PAYLOAD_SIZE {
        return Err(ServerError::PayloadTooLarge);
    }

    Ok(body)
}

/// The response body of a synchronous update.
pub fn render_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Finished(output) => format!(
            "---- stdout ----\n{}\n----\n\n\n---- stderr ----\n{}\n----\n",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        ),
        Outcome::Redundant => String::from("Redundant request."),
    }
}

fn respond(request: Request, status: u16, body: String) {
    let response = Response::from_string(body).with_status_code(status);
    if let Err(err) = request.respond(response) {
        warn!("Cannot send response: {err}.");
    }
}
