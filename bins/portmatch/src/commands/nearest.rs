//! Nearest command

use crate::app::App;
use anyhow::Result;
use owo_colors::OwoColorize;
use portmatch_cli::output::{describe_port, Status};
use portmatch_geo::Coordinate;
use serde_json::json;
use std::process::ExitCode;

/// Print the known ports closest to a coordinate
pub fn run(app: &App, lat: f64, lng: f64, limit: usize, json: bool) -> Result<ExitCode> {
    let origin = Coordinate::validated(lat, lng)?;
    let nearest = app.resolver.dataset().nearest(&origin, limit);

    if json {
        let rows: Vec<_> = nearest
            .iter()
            .map(|(port, km)| json!({ "port": port, "distanceKm": km }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(ExitCode::SUCCESS);
    }

    Status::header(&format!("Ports near {origin}"));
    for (port, km) in &nearest {
        println!("  {:>8} {}", format!("{km:.1} km").dimmed(), describe_port(port));
    }
    Ok(ExitCode::SUCCESS)
}
