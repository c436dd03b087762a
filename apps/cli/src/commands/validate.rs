//! `validate`: submit a scanned access code for a verdict

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use turnstile_client::CodeValidator;

use crate::EXIT_DENIED;
use crate::settings::Settings;

/// Arguments for `turnstile validate`
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// The scanned access code
    #[arg(value_name = "CODE")]
    pub code: String,

    /// Print the verdict as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(settings: &Settings, args: ValidateArgs) -> Result<ExitCode> {
    let validator = CodeValidator::new(settings.api_client()?);
    let verdict = validator
        .submit_code(&args.code)
        .await
        .context("submitting code")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else if verdict.accepted {
        println!("accepted: {}", verdict.message);
    } else {
        println!("denied: {}", verdict.message);
    }

    Ok(if verdict.accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_DENIED)
    })
}
