//! Resolve command

use crate::app::App;
use anyhow::Result;
use owo_colors::OwoColorize;
use portmatch_cli::output::{describe_port, Status};
use portmatch_cli::progress;
use std::process::ExitCode;

/// Resolve one query to its best port
pub async fn run(app: &App, query: &str, json: bool) -> Result<ExitCode> {
    let spinner = (app.is_online() && !json).then(|| progress::spinner(&format!("Resolving {query}...")));
    let port = app.resolver.resolve_port_by_name(query).await;
    if let Some(pb) = &spinner {
        pb.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&port)?);
        return Ok(if port.is_some() { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    match port {
        Some(port) => {
            Status::success(&describe_port(&port));
            println!("  {} {}", "source:".dimmed(), port.source);
            if let Some(locode) = &port.locode {
                println!("  {} {}", "locode:".dimmed(), locode);
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            Status::warning(&format!("No port matched \"{query}\""));
            Ok(ExitCode::FAILURE)
        }
    }
}
