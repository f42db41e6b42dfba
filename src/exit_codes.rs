//! Exit code constants for the capstan CLI.
//!
//! The script's own exit code is always propagated verbatim when the script
//! actually ran, so capstan's own failure codes must stay out of the range
//! scripts conventionally use. Tool-originated failures report BSD sysexits
//! values (64-78), which well-behaved scripts avoid:
//! - 64: usage error (bad flag combination, unsupported script type)
//! - 65: variables file unreadable or malformed
//! - 66: script file not found
//! - 69: interpreter could not be started
//! - 74: output-variables file could not be written
//! - 77: sensitive-variables decryption failed
//! - 78: config file missing or invalid

/// Successful execution (and the pass-through code for a script that exited 0).
pub const SUCCESS: i32 = 0;

/// Usage error: invalid flag combination or no interpreter for the script type.
pub const USAGE: i32 = 64;

/// Variables file error: unreadable, unparseable, or non-string values.
pub const VARIABLES_FILE: i32 = 65;

/// Script file not found (pre-flight, before any subprocess is created).
pub const SCRIPT_NOT_FOUND: i32 = 66;

/// Interpreter binary could not be spawned.
pub const ENGINE_SPAWN: i32 = 69;

/// Output-variables persistence failed after the script completed.
pub const SAVE_FAILURE: i32 = 74;

/// Sensitive-variables file could not be decrypted (bad password or corrupt file).
pub const DECRYPTION: i32 = 77;

/// Config file missing, unparseable, or failed validation.
pub const CONFIG: i32 = 78;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USAGE,
            VARIABLES_FILE,
            SCRIPT_NOT_FOUND,
            ENGINE_SPAWN,
            SAVE_FAILURE,
            DECRYPTION,
            CONFIG,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn failure_codes_stay_in_sysexits_band() {
        for code in [
            USAGE,
            VARIABLES_FILE,
            SCRIPT_NOT_FOUND,
            ENGINE_SPAWN,
            SAVE_FAILURE,
            DECRYPTION,
            CONFIG,
        ] {
            assert!((64..=78).contains(&code), "code {} outside 64-78", code);
        }
    }
}
