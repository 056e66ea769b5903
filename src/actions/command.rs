use super::{Action, ActionError, RunOutput, Runner};
use duct::cmd;
use log::{debug, error, info, trace, warn};
use std::{path::Path, process::Output};

/// A runner that starts every action as a subprocess.
///
/// The actions are running one after the other. Actions with a missing program
/// are skipped. If an action fails, the failure is logged (and written to the
/// captured stderr, if the run is synchronous) and the next action is started anyway.
pub struct CommandRunner;

impl CommandRunner {
    fn run_action(action: &Action, directory: &Path, background: bool) -> Result<Output, ActionError> {
        let mut expression = cmd(&action.program, &action.args).dir(directory).unchecked();

        expression = match &action.stdin {
            Some(stdin) => expression.stdin_bytes(stdin.to_vec()),
            None => expression.stdin_null(),
        };

        // Nobody reads the output of backgrounded runs, do not keep it in memory.
        expression = if background {
            expression.stdout_null().stderr_null()
        } else {
            expression.stdout_capture().stderr_capture()
        };

        Ok(expression.run()?)
    }
}

impl Runner for CommandRunner {
    fn run(&self, directory: &Path, background: bool, actions: &[Action]) -> RunOutput {
        let mut output = RunOutput::new();

        for action in actions {
            if !action.program.exists() {
                if action.optional {
                    debug!("Skipping {action}, it does not exist.");
                } else {
                    warn!("Skipping {action}, {} does not exist.", action.program.display());
                }
                continue;
            }

            let action_directory = action.directory.as_deref().unwrap_or(directory);
            info!("Running {action} in {}.", action_directory.display());
            if !background {
                let header = format!("# Running {action}\n");
                output.stdout.extend_from_slice(header.as_bytes());
                output.stderr.extend_from_slice(header.as_bytes());
            }

            let result = CommandRunner::run_action(action, action_directory, background).and_then(
                |result| {
                    output.stdout.extend_from_slice(&result.stdout);
                    output.stderr.extend_from_slice(&result.stderr);
                    if result.status.success() {
                        Ok(())
                    } else {
                        Err(ActionError::NonZeroExitcode(
                            result.status.code().unwrap_or(-1),
                        ))
                    }
                },
            );

            match result {
                Ok(()) => trace!("Finished {action}."),
                Err(err) => {
                    error!(
                        "Error running {action} in {}: {err}.",
                        action_directory.display()
                    );
                    output.success = false;
                    if !background {
                        let notice = format!("\n[gitmirror internal error:  {err}]\n");
                        output.stderr.extend_from_slice(notice.as_bytes());
                    }
                }
            }
        }

        output
    }
}
