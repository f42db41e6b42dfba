//! Tokenizer for the embedded directive protocol.
//!
//! A script talks back to capstan by printing directives inside otherwise
//! free-form output. A directive is a fixed envelope embedded anywhere in a
//! line:
//!
//! ```text
//! ##capstan[set-variable name='ConnectionString' value='Server=db-01']
//! ##capstan[set-output-variable name='Deployment.Url' value='https://web-01']
//! ```
//!
//! Attribute values escape awkward characters with a pipe prefix: `|'` for a
//! quote, `||` for a pipe, `|n` for newline, `|r` for carriage return. An
//! unrecognized pipe sequence is kept verbatim. Attributes may appear in any
//! order; a repeated attribute resolves last-write-wins. Unknown attributes
//! are ignored so older runners tolerate newer scripts.
//!
//! Parsing is total: every line maps to a [`ScriptMessage`], and a line that
//! carries the marker but no usable directive maps to
//! [`ScriptMessage::Malformed`] rather than an error. The running script must
//! never be interrupted by a directive typo.

use regex::Regex;
use std::sync::LazyLock;

/// The sequence that opens a directive envelope.
pub const DIRECTIVE_MARKER: &str = "##capstan[";

static ENVELOPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"##capstan\[([a-z][a-z-]*)((?:[ \t]+[a-z][a-z-]*='(?:[^'|]|\|.)*')*)[ \t]*\]")
        .expect("Invalid directive envelope regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([a-z][a-z-]*)='((?:[^'|]|\|.)*)'").expect("Invalid directive attribute regex")
});

/// What a single line of script output means to the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptMessage {
    /// Ordinary log text, no directive marker present.
    Plain,
    /// Set a variable in the live context.
    SetVariable { name: String, value: String },
    /// Set a variable in the output store.
    SetOutputVariable { name: String, value: String },
    /// The marker was present but no usable directive could be read.
    Malformed { reason: String },
}

/// Classify one line of script output.
///
/// The first well-formed envelope in the line wins; text around it is
/// ignored by directive handling (the console sink still echoes the whole
/// line).
pub fn parse_line(line: &str) -> ScriptMessage {
    if !line.contains(DIRECTIVE_MARKER) {
        return ScriptMessage::Plain;
    }

    let Some(captures) = ENVELOPE.captures(line) else {
        return ScriptMessage::Malformed {
            reason: "directive marker without a well-formed envelope".to_string(),
        };
    };

    let action = &captures[1];
    let mut name = None;
    let mut value = None;
    for attr in ATTRIBUTE.captures_iter(&captures[2]) {
        match &attr[1] {
            "name" => name = Some(unescape(&attr[2])),
            "value" => value = Some(unescape(&attr[2])),
            _ => {}
        }
    }

    let (name, value) = match (name, value) {
        (Some(name), Some(value)) => (name, value),
        (None, _) => {
            return ScriptMessage::Malformed {
                reason: format!("'{}' directive is missing the 'name' attribute", action),
            };
        }
        (_, None) => {
            return ScriptMessage::Malformed {
                reason: format!("'{}' directive is missing the 'value' attribute", action),
            };
        }
    };
    if name.is_empty() {
        return ScriptMessage::Malformed {
            reason: format!("'{}' directive has an empty variable name", action),
        };
    }

    match action {
        "set-variable" => ScriptMessage::SetVariable { name, value },
        "set-output-variable" => ScriptMessage::SetOutputVariable { name, value },
        other => ScriptMessage::Malformed {
            reason: format!("unknown directive action '{}'", other),
        },
    }
}

/// Render a directive line a script could print.
pub fn encode_directive(action: &str, name: &str, value: &str) -> String {
    format!(
        "##capstan[{} name='{}' value='{}']",
        action,
        escape(name),
        escape(value)
    )
}

/// Escape a value for embedding in a directive attribute.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '|' => out.push_str("||"),
            '\'' => out.push_str("|'"),
            '\n' => out.push_str("|n"),
            '\r' => out.push_str("|r"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '|' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('|') => out.push('|'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('|');
                out.push(other);
            }
            None => out.push('|'),
        }
    }
    out
}
