//! Preview server for live mode.
//!
//! The server is an external program (by default `python3 -m http.server`)
//! started in the site root. Its stdout and stderr are read line by line on
//! two forwarder threads and re-emitted as [`Event::ServerOutput`]. The
//! returned [`ServerHandle`] owns the child: dropping it kills the process.

use crate::config::ServeConfig;
use crate::event::{Event, emit};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Sender;
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("serve.command is empty")]
    EmptyCommand,
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// A running preview server. Killed on drop.
pub struct ServerHandle {
    child: Child,
    events: Option<Sender<Event>>,
}

impl ServerHandle {
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        // Already-exited children make kill() fail; wait() still reaps them.
        let _ = self.child.kill();
        let _ = self.child.wait();
        emit(self.events.as_ref(), Event::ServerStopped);
    }
}

/// Start the configured server in `cwd`.
pub fn spawn_server(
    config: &ServeConfig,
    cwd: &Path,
    events: Option<&Sender<Event>>,
) -> Result<ServerHandle, ServeError> {
    let argv = config.command_line();
    let (program, args) = argv.split_first().ok_or(ServeError::EmptyCommand)?;

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ServeError::Spawn {
            program: program.clone(),
            source,
        })?;

    emit(events, Event::ServerStarted { url: config.url() });

    if let Some(stdout) = child.stdout.take() {
        forward_lines(stdout, false, events.cloned());
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(stderr, true, events.cloned());
    }

    Ok(ServerHandle {
        child,
        events: events.cloned(),
    })
}

/// Re-emit each line of `stream` until it closes. The thread is not joined;
/// it ends when the child's end of the pipe closes.
fn forward_lines(stream: impl Read + Send + 'static, stderr: bool, events: Option<Sender<Event>>) {
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            emit(events.as_ref(), Event::ServerOutput { line, stderr });
        }
    });
}
