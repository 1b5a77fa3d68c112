//! Batch command

use crate::app::App;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use portmatch_cli::output::{describe_port, format_count, format_duration, Status};
use portmatch_cli::progress;
use portmatch_ports::resolver::counters;
use portmatch_ports::PortEntry;
use portmatch_telemetry::metrics;
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

/// Non-empty, non-comment lines of a batch file
pub fn parse_queries(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

/// Resolve every query in `file`
pub async fn run(app: &App, file: &Path, json: bool) -> Result<ExitCode> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let queries = parse_queries(&content);

    if json {
        let resolved = app.resolver.resolve_many(queries.as_slice()).await;
        let rows: Vec<_> = resolved
            .iter()
            .map(|(query, port)| json!({ "query": query, "port": port }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(ExitCode::SUCCESS);
    }

    let start = Instant::now();
    let pb = progress::batch_progress(queries.len() as u64);
    let mut resolved: Vec<(&str, Option<PortEntry>)> = Vec::with_capacity(queries.len());
    for &query in &queries {
        pb.set_message(query.to_string());
        resolved.push((query, app.resolver.resolve_port_by_name(query).await));
        pb.inc(1);
    }

    let missing = resolved.iter().filter(|(_, port)| port.is_none()).count();
    if missing == 0 {
        progress::finish_success(&pb, "all resolved");
    } else {
        progress::finish_error(&pb, &format!("{missing} unresolved"));
    }

    Status::header(&format!(
        "Resolved {} of {} in {}",
        queries.len() - missing,
        format_count(queries.len(), "query", "queries"),
        format_duration(start.elapsed())
    ));
    for (query, port) in &resolved {
        match port {
            Some(port) => println!("  {} {} {}", query, "→".dimmed(), describe_port(port)),
            None => println!("  {} {} {}", query, "→".dimmed(), "unresolved".red()),
        }
    }

    let registry = metrics();
    Status::info(&format!(
        "local {}, online {} (rejected {}, failed {}), coordinates {}",
        registry.counter(counters::LOCAL_HIT),
        registry.counter(counters::ONLINE_ACCEPTED),
        registry.counter(counters::ONLINE_REJECTED),
        registry.counter(counters::ONLINE_FAILED),
        registry.counter(counters::COORDINATES),
    ));
    if let Some(latency) = registry.histogram_stats(counters::SEARCH_MS) {
        Status::info(&format!("median lookup {:.1}ms, p95 {:.1}ms", latency.p50, latency.p95));
    }

    Ok(ExitCode::SUCCESS)
}
