use super::ServerError;
use log::{debug, info};
use std::{process, sync::Arc, thread, time::Duration};
use tiny_http::Server;

/// Stop accepting requests on the first termination signal, exit on the second one.
#[cfg(unix)]
pub fn stop_on_signal(listener: Arc<Server>) -> Result<(), ServerError> {
    use signal_hook::{consts::TERM_SIGNALS, iterator::Signals};

    let mut signals = Signals::new(TERM_SIGNALS).map_err(ServerError::SignalFailure)?;
    thread::spawn(move || handle_signals(&listener, signals.forever()));

    Ok(())
}

#[cfg(not(unix))]
pub fn stop_on_signal(_listener: Arc<Server>) -> Result<(), ServerError> {
    debug!("Signal handlers are not supported on non-unix systems.");

    Ok(())
}

fn handle_signals<I>(listener: &Server, signals: I)
where
    I: IntoIterator<Item = i32>,
{
    let mut received = 0;
    for signal in signals {
        received += 1;
        if received == 1 {
            info!("Got signal {signal}, stopping the server.");
            listener.unblock();
        } else {
            // Allow a little time for the logs to be written.
            thread::sleep(Duration::from_millis(100));
            debug!("Got signal {signal} again, terminating right now.");
            process::exit(signal);
        }
    }
}
