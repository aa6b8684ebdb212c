// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `ctxlint explain`.

use std::process::ExitCode;

use ctxlint_diagnostics::codes::ErrorCodeRegistry;

use crate::error::CliError;
use crate::output;

pub fn cmd_explain(code: Option<&str>) -> Result<ExitCode, CliError> {
    let registry = ErrorCodeRegistry::default();

    let Some(code) = code else {
        for info in registry.all() {
            println!("{}  {:<8} {}", output::code(info.code), info.category.to_string(), info.title);
        }
        return Ok(ExitCode::SUCCESS);
    };

    let info = registry
        .get(&code.to_ascii_uppercase())
        .ok_or_else(|| CliError::UnknownCode(code.to_string()))?;
    println!("{}: {}", output::code(info.code), info.title);
    println!("{}", output::dimmed(&format!("category: {}", info.category)));
    println!();
    println!("{}", info.explanation);
    Ok(ExitCode::SUCCESS)
}
