//! Subprocess execution with live output fan-out.
//!
//! One reader thread drains each of the child's standard streams, splitting
//! them into lines and pushing every line into a single channel. The calling
//! thread consumes that channel and hands each line to the fanout, so all
//! sink work happens on one thread and a line is fully dispatched before the
//! next one is taken. Relative order within a stream is preserved; stdout
//! and stderr interleave in arrival order.
//!
//! The dispatch loop ends when both streams reach end-of-file, which means
//! every directive has been applied before [`ScriptEngine::execute`] returns
//! the exit code.

use crate::error::{CapstanError, Result};
use crate::output::OutputFanout;
use crate::script::InterpreterRegistry;
use crate::variables::context::SharedContext;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Outcome of a completed script run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code reported by the interpreter, passed through verbatim.
    /// -1 when the process was terminated without reporting one.
    pub exit_code: i32,
    /// Wall-clock execution time.
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs scripts through registered interpreters.
pub struct ScriptEngine {
    registry: InterpreterRegistry,
}

impl ScriptEngine {
    pub fn new(registry: InterpreterRegistry) -> Self {
        Self { registry }
    }

    /// Execute `script`, streaming its output through `fanout`.
    ///
    /// The context's merged view becomes the child's extra environment, one
    /// entry per variable, values verbatim. Blocks until the script exits
    /// and all of its output has been dispatched.
    pub fn execute(
        &self,
        script: &Path,
        context: &SharedContext,
        fanout: &mut OutputFanout,
    ) -> Result<ExecutionResult> {
        // Checked before any subprocess exists.
        if !script.exists() {
            return Err(CapstanError::ScriptNotFound(script.to_path_buf()));
        }

        let argv = self.registry.resolve(script)?;
        let interpreter = argv[0].clone();

        // Snapshot the environment under a short lock. Directives arriving
        // during the run mutate the context but never the live environment.
        let environment = {
            let context = context.lock().unwrap_or_else(|e| e.into_inner());
            context.merged_view()
        };

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in environment.iter() {
            command.env(key, value);
        }

        let started = Instant::now();
        let mut child = command.spawn().map_err(|e| CapstanError::EngineSpawn {
            interpreter: interpreter.clone(),
            script: script.to_path_buf(),
            detail: format!("{}. Ensure the interpreter is installed and in PATH.", e),
        })?;

        let (sender, receiver) = mpsc::channel::<String>();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, sender.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, sender.clone()));
        }
        // The loop below ends when the readers drop their senders.
        drop(sender);

        for line in receiver {
            fanout.dispatch(&line);
        }

        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait().map_err(|e| CapstanError::EngineSpawn {
            interpreter,
            script: script.to_path_buf(),
            detail: format!("failed to await interpreter: {}", e),
        })?;

        Ok(ExecutionResult {
            exit_code: status.code().unwrap_or(-1),
            duration: started.elapsed(),
        })
    }
}

/// Drain one stream line by line into the channel.
///
/// Lines are split on `\n`; a trailing `\r` is stripped so CRLF output
/// parses the same as LF. Non-UTF-8 bytes are replaced rather than dropped.
fn spawn_line_reader<R: Read + Send + 'static>(
    stream: R,
    sender: mpsc::Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                    }
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf).to_string();
                    if sender.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}
