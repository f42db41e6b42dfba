//! The `run-script` command.
//!
//! Builds the layered variable context, runs the script through its
//! interpreter, captures output variables from the live output stream,
//! persists them, and exits with the script's own exit code.

use crate::cli::RunScriptArgs;
use crate::config::Config;
use crate::error::{CapstanError, Result};
use crate::journal::{self, RunRecord};
use crate::output::OutputFanout;
use crate::output::sinks::{ConsoleSink, OutputVariableSink, VariableUpdateSink};
use crate::script::{InterpreterRegistry, ScriptEngine};
use crate::variables::context::{SharedContext, VariableContext};
use crate::variables::masking;
use crate::variables::output::{OutputVariableStore, SharedOutputVariables};
use crate::variables::{VariableStore, load_variables_file, sensitive};
use std::sync::{Arc, Mutex};

/// Run a script with the full variable pipeline around it.
///
/// Returns the script's exit code verbatim. Capstan's own failures
/// surface as errors; a script that runs and fails is not one of them.
pub fn cmd_run_script(args: RunScriptArgs) -> Result<i32> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let registry = InterpreterRegistry::from_config(&config)?;

    let mut base = match &args.variables {
        Some(path) => load_variables_file(path)?,
        None => VariableStore::new(),
    };

    // Values captured by earlier runs act as defaults for this one and are
    // visible to the script until it overwrites them.
    let output_store = OutputVariableStore::load(args.output_variables.as_deref())?;
    base.merge_with(output_store.as_store());

    let mut context = VariableContext::new(base);
    if let Some(path) = &args.sensitive_variables {
        let password = args
            .sensitive_variables_password
            .as_deref()
            .ok_or_else(|| {
                CapstanError::Decryption(
                    "a password is required to read a sensitive variables file".to_string(),
                )
            })?;
        context = context.with_sensitive(sensitive::load(path, password)?);
    }
    context.enrich_with_environment();

    if args.print_variables {
        print_variables(&context);
    }

    let context: SharedContext = Arc::new(Mutex::new(context));
    let output_store: SharedOutputVariables = Arc::new(Mutex::new(output_store));

    let mut fanout = OutputFanout::new();
    fanout.register(Box::new(ConsoleSink::new()));
    fanout.register(Box::new(VariableUpdateSink::new(Arc::clone(&context))));
    fanout.register(Box::new(OutputVariableSink::new(Arc::clone(&output_store))));

    let engine = ScriptEngine::new(registry);
    let result = engine.execute(&args.script, &context, &mut fanout)?;

    // Persisted even when the script failed. Partial results from a failed
    // deployment are still results.
    let captured = {
        let store = output_store.lock().unwrap_or_else(|e| e.into_inner());
        store.save()?;
        store.len()
    };

    if let Some(path) = args.journal.as_deref().or(config.journal.as_deref()) {
        let record = RunRecord::new(
            args.script.display().to_string(),
            result.exit_code,
            result.duration,
            captured,
        );
        if let Err(e) = journal::append_record(path, &record) {
            eprintln!("Warning: {}", e);
        }
    }

    Ok(result.exit_code)
}

/// List the merged context with credential-looking values masked.
fn print_variables(context: &VariableContext) {
    let view = context.merged_view();
    println!("The following variables are available:");
    for (key, value) in view.iter() {
        let shown = masking::display_value(key, value, context.is_sensitive(key));
        println!("  {} = {}", key, shown);
    }
}
