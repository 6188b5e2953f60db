//! Payment gate command-line front end
//!
//! Reads one JSON payment request from the file given as the first argument
//! (stdin when absent or `-`), runs it through the gate and prints the
//! decision as JSON. Refused payments print the error body to stderr and
//! exit with status 2.

use anyhow::{Context, Result};
use payment_gate::{GateConfig, GateError, PaymentGate, PaymentRequest};
use std::io::Read;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("PAYMENT_GATE_LOG_JSON").map_or(false, |v| v == "1") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_request(source: Option<&str>) -> Result<PaymentRequest> {
    let input = match source {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {}", path))?,
    };

    serde_json::from_str(&input).context("Failed to parse payment request")
}

fn run() -> Result<ExitCode> {
    let config = GateConfig::load().context("Failed to load configuration")?;
    let gate = PaymentGate::new(config).context("Failed to build payment gate")?;

    let source = std::env::args().nth(1);
    let request = read_request(source.as_deref())?;

    match gate.admit(&request) {
        Ok(decision) => {
            println!("{}", serde_json::to_string_pretty(&decision)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", refusal_body(&err));
            Ok(ExitCode::from(2))
        }
    }
}

fn refusal_body(err: &GateError) -> String {
    serde_json::to_string_pretty(&err.to_json()).unwrap_or_else(|_| err.to_string())
}

fn main() -> ExitCode {
    init_tracing();
    tracing::info!("Starting payment gate");

    match run() {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
