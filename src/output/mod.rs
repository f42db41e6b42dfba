//! Live fan-out of script output.
//!
//! Every line a script writes, on either standard stream, flows through one
//! [`OutputFanout`] on the controlling thread. The fanout hands the line to
//! each registered [`MessageSink`] in registration order and does not read
//! the next line until all sinks have seen the current one. That single rule
//! gives the protocol its visibility guarantee: when a directive line has
//! been dispatched, every store it touched already holds the new value.

pub mod message;
pub mod sinks;

pub use message::{DIRECTIVE_MARKER, ScriptMessage, encode_directive, parse_line};
pub use sinks::{ConsoleSink, OutputVariableSink, VariableUpdateSink};

/// A consumer of script output lines.
///
/// Sinks are infallible by contract: whatever a line contains, consuming it
/// must not abort the run. Problems are reported as warnings, not errors.
pub trait MessageSink {
    fn consume_line(&mut self, line: &str);
}

/// Delivers each output line to every registered sink, in order.
#[derive(Default)]
pub struct OutputFanout {
    sinks: Vec<Box<dyn MessageSink>>,
}

impl OutputFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink. Dispatch visits sinks in registration order.
    pub fn register(&mut self, sink: Box<dyn MessageSink>) {
        self.sinks.push(sink);
    }

    /// Hand one line to every sink before returning.
    pub fn dispatch(&mut self, line: &str) {
        for sink in &mut self.sinks {
            sink.consume_line(line);
        }
    }
}
