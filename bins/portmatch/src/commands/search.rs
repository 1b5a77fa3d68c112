//! Search command

use crate::app::App;
use anyhow::Result;
use portmatch_cli::output::{format_count, match_line, Status};
use std::process::ExitCode;

/// Print ranked candidates for a query
pub async fn run(app: &App, query: &str, limit: usize, json: bool) -> Result<ExitCode> {
    let snapshot = app.resolver.cached_ports().await;
    let matches = app.resolver.unified_port_search(query, &snapshot, limit).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(ExitCode::SUCCESS);
    }

    if matches.is_empty() {
        Status::warning(&format!("No ports matched \"{query}\""));
        return Ok(ExitCode::FAILURE);
    }

    Status::header(&format!("{} for \"{query}\"", format_count(matches.len(), "match", "matches")));
    for (i, found) in matches.iter().enumerate() {
        println!("{}", match_line(i + 1, found));
    }
    Ok(ExitCode::SUCCESS)
}
