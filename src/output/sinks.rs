//! The built-in message sinks.
//!
//! Three sinks cover a script run: [`ConsoleSink`] echoes every line for a
//! human reader, [`VariableUpdateSink`] applies `set-variable` directives to
//! the live context, and [`OutputVariableSink`] applies
//! `set-output-variable` directives to the output store. The directive sinks
//! parse each line independently and ignore actions addressed to the other
//! one, so a run composes them freely.

use crate::output::MessageSink;
use crate::output::message::{ScriptMessage, parse_line};
use crate::variables::context::SharedContext;
use crate::variables::output::SharedOutputVariables;
use std::io::Write;

/// Echoes script output verbatim, directive lines included.
pub struct ConsoleSink {
    writer: Box<dyn Write>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Echo into an arbitrary writer instead of stdout.
    pub fn with_writer(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSink for ConsoleSink {
    fn consume_line(&mut self, line: &str) {
        // Echo is best-effort: a closed pipe must not abort the script.
        let _ = writeln!(self.writer, "{}", line);
    }
}

/// Applies `set-variable` directives to the live variable context.
pub struct VariableUpdateSink {
    context: SharedContext,
}

impl VariableUpdateSink {
    pub fn new(context: SharedContext) -> Self {
        Self { context }
    }
}

impl MessageSink for VariableUpdateSink {
    fn consume_line(&mut self, line: &str) {
        match parse_line(line) {
            ScriptMessage::SetVariable { name, value } => {
                let mut context = self.context.lock().unwrap_or_else(|e| e.into_inner());
                context.set(name, value);
            }
            ScriptMessage::Malformed { reason } => {
                eprintln!("Warning: ignoring malformed directive: {}", reason);
            }
            ScriptMessage::Plain | ScriptMessage::SetOutputVariable { .. } => {}
        }
    }
}

/// Applies `set-output-variable` directives to the output store.
pub struct OutputVariableSink {
    store: SharedOutputVariables,
}

impl OutputVariableSink {
    pub fn new(store: SharedOutputVariables) -> Self {
        Self { store }
    }
}

impl MessageSink for OutputVariableSink {
    fn consume_line(&mut self, line: &str) {
        match parse_line(line) {
            ScriptMessage::SetOutputVariable { name, value } => {
                let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
                store.set(name, value);
            }
            ScriptMessage::Malformed { reason } => {
                eprintln!("Warning: ignoring malformed directive: {}", reason);
            }
            ScriptMessage::Plain | ScriptMessage::SetVariable { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::message::encode_directive;
    use crate::variables::VariableStore;
    use crate::variables::context::VariableContext;
    use crate::variables::output::OutputVariableStore;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn shared_context() -> SharedContext {
        Arc::new(Mutex::new(VariableContext::new(VariableStore::new())))
    }

    fn shared_output() -> SharedOutputVariables {
        Arc::new(Mutex::new(OutputVariableStore::detached()))
    }

    #[test]
    fn console_sink_echoes_lines_verbatim() {
        let buf = SharedBuf::default();
        let mut sink = ConsoleSink::with_writer(Box::new(buf.clone()));

        sink.consume_line("plain text");
        sink.consume_line("##capstan[set-variable name='A' value='1']");

        assert_eq!(
            buf.contents(),
            "plain text\n##capstan[set-variable name='A' value='1']\n"
        );
    }

    #[test]
    fn variable_update_sink_applies_directives_immediately() {
        let context = shared_context();
        let mut sink = VariableUpdateSink::new(Arc::clone(&context));

        sink.consume_line(&encode_directive("set-variable", "Greeting", "hello"));

        // Visible as soon as consume_line returns.
        assert_eq!(
            context.lock().unwrap().get("Greeting"),
            Some("hello")
        );
    }

    #[test]
    fn variable_update_sink_ignores_output_directives() {
        let context = shared_context();
        let mut sink = VariableUpdateSink::new(Arc::clone(&context));

        sink.consume_line(&encode_directive("set-output-variable", "Url", "x"));
        sink.consume_line("plain text");

        assert!(context.lock().unwrap().get("Url").is_none());
    }

    #[test]
    fn output_variable_sink_captures_directives_immediately() {
        let store = shared_output();
        let mut sink = OutputVariableSink::new(Arc::clone(&store));

        sink.consume_line(&encode_directive(
            "set-output-variable",
            "Deployment.Url",
            "https://web-01",
        ));

        assert_eq!(
            store.lock().unwrap().get("Deployment.Url"),
            Some("https://web-01")
        );
    }

    #[test]
    fn output_variable_sink_ignores_live_context_directives() {
        let store = shared_output();
        let mut sink = OutputVariableSink::new(Arc::clone(&store));

        sink.consume_line(&encode_directive("set-variable", "Step", "3"));

        assert!(store.lock().unwrap().is_empty());
    }

    #[test]
    fn malformed_directive_does_not_stop_later_lines() {
        let store = shared_output();
        let mut sink = OutputVariableSink::new(Arc::clone(&store));

        sink.consume_line("##capstan[set-output-variable name='broken'");
        sink.consume_line(&encode_directive("set-output-variable", "Next", "fine"));

        let store = store.lock().unwrap();
        assert!(store.get("broken").is_none());
        assert_eq!(store.get("Next"), Some("fine"));
    }

    #[test]
    fn later_directives_overwrite_earlier_ones() {
        let store = shared_output();
        let mut sink = OutputVariableSink::new(Arc::clone(&store));

        sink.consume_line(&encode_directive("set-output-variable", "Attempt", "1"));
        sink.consume_line(&encode_directive("set-output-variable", "Attempt", "2"));

        assert_eq!(store.lock().unwrap().get("Attempt"), Some("2"));
    }
}
