//! The `encrypt-variables` command.
//!
//! Turns a plain JSON variables file into the encrypted container that
//! `run-script --sensitive-variables` reads.

use crate::cli::EncryptVariablesArgs;
use crate::error::Result;
use crate::exit_codes;
use crate::variables::{load_variables_file, sensitive};

pub fn cmd_encrypt_variables(args: EncryptVariablesArgs) -> Result<i32> {
    let store = load_variables_file(&args.variables)?;
    sensitive::encrypt_to_file(&args.output, &store, &args.password)?;

    println!(
        "Encrypted {} variable(s) to {}",
        store.len(),
        args.output.display()
    );

    Ok(exit_codes::SUCCESS)
}
